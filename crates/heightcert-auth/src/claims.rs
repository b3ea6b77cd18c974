use heightcert_core::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Access token claims.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    /// Role name, e.g. `"COORDINATOR"`
    pub role: String,
    /// Expiry (Unix timestamp)
    pub exp: usize,
    /// Issued-at (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    /// Known role, or `None` when the claim names a role this build does not know.
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
    /// Unique per token so two refreshes in the same second still differ
    pub jti: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: &str) -> Claims {
        Claims {
            sub: "user-id-123".to_string(),
            email: "ana@example.com".to_string(),
            role: role.to_string(),
            exp: 1234567890,
            iat: 1234567800,
        }
    }

    #[test]
    fn test_claims_serialize() {
        let serialized = serde_json::to_string(&claims("VIEWER")).unwrap();
        assert!(serialized.contains(r#""sub":"user-id-123""#));
        assert!(serialized.contains(r#""role":"VIEWER""#));
    }

    #[test]
    fn test_known_role_parses() {
        assert_eq!(claims("ADMIN").role(), Some(Role::Admin));
        assert_eq!(claims("COORDINATOR").role(), Some(Role::Coordinator));
    }

    #[test]
    fn test_unknown_role_is_none() {
        assert_eq!(claims("SUPERUSER").role(), None);
        assert_eq!(claims("").role(), None);
    }
}
