//! HTTP protocol layer module
//!
//! Response builders, body encoding and header helpers, decoupled from the
//! archive logic.

pub mod disposition;
pub mod encoding;
pub mod response;

// Re-export commonly used items
pub use disposition::attachment;
pub use encoding::gzip_encode;
pub use response::{
    build_404_response, build_405_response, build_413_response, build_download_response,
    build_health_response, build_options_response, build_text_response,
};
