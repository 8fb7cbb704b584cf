//! Request handler module
//!
//! Routes requests and serves archive downloads.

pub mod download;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
