//! Modcache - module source cache
//!
//! Downloads infrastructure module sources through pluggable backends,
//! caches them by a fingerprint of the source reference, and overlays the
//! operator's module directory onto the downloaded copy.

pub mod acquire;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod fsutil;
pub mod hooks;
pub mod options;
pub mod overlay;
pub mod source;

pub use acquire::{Acquirer, Acquisition};
pub use error::{ModcacheError, ModcacheResult};
pub use options::RunOptions;
