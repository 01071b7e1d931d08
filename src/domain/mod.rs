pub mod client_config;
pub mod error;
pub mod preview;
pub mod report;
pub mod session;
