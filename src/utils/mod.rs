// Utility modules for the Miky backend

pub mod audit;
pub mod service_error;
pub mod validation;

pub use audit::AuditLogger;
pub use service_error::ServiceError;
pub use validation::{trim_and_validate_field, trim_optional_field};
