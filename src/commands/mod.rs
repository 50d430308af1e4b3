pub mod analyze;
pub mod check_config;

pub use analyze::analyze;
pub use check_config::check_config;
