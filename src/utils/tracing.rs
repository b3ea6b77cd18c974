//! Span helpers and event macros shared by services and middleware.

use tracing::Span;

/// Record a user ID on the current span
pub fn record_user_id(user_id: &str) {
    Span::current().record("user.id", user_id);
}

/// Record authentication success/failure on the current span
pub fn record_auth_result(success: bool) {
    Span::current().record("auth.success", success);
}

/// Log a security-relevant event at WARN level: failed logins,
/// authorization denials, refused status changes.
#[macro_export]
macro_rules! security_event {
    ($event:expr, $($field:tt)*) => {
        tracing::warn!(
            security.event = $event,
            $($field)*
        )
    };
}

/// Log an audit event at INFO level for data changes worth reconstructing
/// later: role changes, status changes, certificate uploads.
#[macro_export]
macro_rules! audit_event {
    ($action:expr, $resource:expr, $($field:tt)*) => {
        tracing::info!(
            audit.action = $action,
            audit.resource = $resource,
            $($field)*
        )
    };
}

pub trait ErrorExt {
    /// Log the error and return it unchanged
    fn log_error(self, context: &str) -> Self;
}

impl<T, E: std::fmt::Display> ErrorExt for Result<T, E> {
    fn log_error(self, context: &str) -> Self {
        if let Err(ref e) = self {
            tracing::error!(error = %e, context = context, "Operation failed");
        }
        self
    }
}
