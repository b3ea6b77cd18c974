pub use heightcert_models::collaborators::*;
