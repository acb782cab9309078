//! minisync core library — logical clock, configuration types, store, errors.
//!
//! Public API surface:
//! - [`clock`] — [`LogicalClock`] ordering and transport encoding
//! - [`types`] — the [`Configuration`] document
//! - [`config`] — [`ConfigStore`] read / write / bootstrap
//! - [`error`] — [`ConfigError`], [`ClockError`]

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{compare, LogicalClock};
pub use config::ConfigStore;
pub use error::{ClockError, ConfigError};
pub use types::{Configuration, DEFAULT_REMOTE_COMMAND};
