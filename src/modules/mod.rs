pub mod auth;
pub mod coaches;
pub mod collaborators;
pub mod courses;
pub mod dashboard;
pub mod enrollments;
pub mod trainings;
pub mod users;
