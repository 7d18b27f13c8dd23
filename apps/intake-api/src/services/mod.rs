//! Route handlers.

pub mod client_service;
pub mod health_service;
pub mod submission_service;
