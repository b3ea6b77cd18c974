pub use heightcert_models::coaches::*;
