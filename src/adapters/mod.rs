//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod polygon_adapter;
pub mod browser;
#[cfg(feature = "web")]
pub mod web;
