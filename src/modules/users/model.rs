pub use heightcert_models::users::*;
