//! tiercache library
//!
//! A caching facade with interchangeable memory, file and Redis backends
//! sharing one TTL, plus the configuration, logging and CLI layers around it.

use shadow_rs::shadow;
shadow!(build);

pub mod cache;
pub mod cli;
pub mod config;
pub mod logger;

pub use cache::{Cache, CacheError, CacheResult};

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
