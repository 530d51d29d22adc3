//! Command implementations.

pub mod config;
pub mod export;
pub mod generate;
pub mod profile;
pub mod stats;

pub use self::config::execute_config;
pub use self::export::execute_export;
pub use self::generate::execute_generate;
pub use self::profile::execute_profile;
pub use self::stats::execute_stats;
