//! gapscope: opening-gap statistics for US equities.
//!
//! Hexagonal architecture: the gap analytics live in [`domain`], port traits
//! in [`ports`], concrete implementations (Polygon client, INI config, web
//! server) in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod cli;
