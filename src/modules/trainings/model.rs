pub use heightcert_models::trainings::*;
