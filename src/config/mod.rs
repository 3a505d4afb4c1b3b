//! Configuration loading with environment overrides

pub mod settings;

pub use settings::*;
