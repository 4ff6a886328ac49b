//! HTTP request handlers for the web server.

mod analyze;
mod error;
mod health;

pub use analyze::analyze_document;
pub use health::{health, hello};
