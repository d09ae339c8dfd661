pub mod embed;
pub mod last_result;
pub mod service;
