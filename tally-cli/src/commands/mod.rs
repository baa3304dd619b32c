pub mod attribute;
pub mod config;
pub mod insights;
pub mod serve;
