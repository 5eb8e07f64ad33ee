//! VDT: Valve Datasheet Toolkit
//!
//! Rule-driven generation of fully traceable valve datasheets from compact
//! VDS numbers, using declarative YAML rulebooks and extracted source
//! tables.

pub mod cli;
pub mod config;
pub mod engine;
pub mod model;
pub mod repo;
pub mod server;
pub mod yaml;
