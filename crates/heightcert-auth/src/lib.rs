//! # heightcert Auth
//!
//! Token claims and JWT helpers.
//!
//! - **Access token** ([`Claims`]): carries the user's role name, one hour by default
//! - **Refresh token** ([`RefreshTokenClaims`]): identity only, seven days by default
//!
//! The role travels as a plain string. [`Claims::role`] parses it into the
//! closed [`heightcert_core::Role`] set; anything unrecognised yields `None`,
//! which every permission check treats as "no permissions".
//!
//! ```ignore
//! use heightcert_auth::{create_access_token, verify_token};
//!
//! let token = create_access_token(user_id, "ana@example.com", Role::Coordinator, &jwt_config)?;
//! let claims = verify_token(&token, &jwt_config)?;
//! assert_eq!(claims.role(), Some(Role::Coordinator));
//! ```

pub mod claims;
pub mod jwt;

pub use claims::{Claims, RefreshTokenClaims};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
