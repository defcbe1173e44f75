pub mod export;
pub mod service;
