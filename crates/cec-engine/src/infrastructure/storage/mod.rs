//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML configuration file, fills in
//! defaults for anything missing, and validates values that serde alone
//! cannot check (OSD name, physical address, vendor id width).

pub mod config;
