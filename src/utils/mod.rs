pub mod error;
pub mod logger;
pub mod monitor;
pub mod quality;
pub mod validation;
