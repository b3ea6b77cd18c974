//! # Heightcert CLI
//!
//! Database seeding utilities for local development and demos.
//!
//! ```ignore
//! use heightcert_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::new(200).with_trainings(40);
//! seed_all(&pool, config).await?;
//! ```

pub mod admin;
pub mod seeder;
