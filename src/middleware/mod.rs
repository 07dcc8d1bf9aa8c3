// Middleware modules for the Miky backend

pub mod webhook_auth;

pub use webhook_auth::{require_valid_signature, sign, SIGNATURE_HEADER};
