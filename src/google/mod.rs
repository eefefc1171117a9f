//! Google API module
//!
//! Contains authentication, the service client factory and the typed
//! Gmail, Calendar and Drive clients.

pub mod auth;
pub mod calendar;
pub mod drive;
pub mod gmail;
pub mod services;
pub mod types;
