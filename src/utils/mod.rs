pub mod db_errors;
pub mod search;
pub mod tracing;
