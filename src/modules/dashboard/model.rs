pub use heightcert_models::dashboard::*;
