pub mod config;
pub mod context;
pub mod diagnostic;
pub mod error;
pub mod lifecycle;
