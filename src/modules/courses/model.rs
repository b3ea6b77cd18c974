pub use heightcert_models::courses::*;
