//! CLI command implementations

pub mod clean;
pub mod fetch;
pub mod status;

pub use clean::execute as clean;
pub use fetch::execute as fetch;
pub use status::execute as status;
