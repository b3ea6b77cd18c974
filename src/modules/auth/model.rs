pub use heightcert_models::auth::*;
