//! # handoff-core
//!
//! Configuration shared by every handoff crate.
//!
//! The bridge is configured from a single YAML file (`handoff.yaml` by default).
//! Every section is optional and falls back to production-safe defaults; the
//! only value without a default is the shared secret, which is resolved from
//! the environment or a file at startup and never stored in the config file.

pub mod config;

pub use config::{
    ClockMode, ConfigError, CookieConfig, HandoffConfig, SameSite, ServerConfig, SessionConfig,
    StoreBackend, StoreConfig, TokenConfig,
};
