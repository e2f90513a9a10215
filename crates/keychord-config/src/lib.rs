//! Configuration parsing for keychord
//!
//! This crate parses the daemon's KDL configuration: global settings and the
//! list of chord bindings.

mod error;
mod model;
mod parser;

pub use error::ConfigError;
pub use model::*;
pub use parser::{parse_config, parse_config_str};
