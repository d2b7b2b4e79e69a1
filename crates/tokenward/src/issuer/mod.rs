//! Issuer registration and resolution.

pub mod config;
pub mod resolver;

pub use config::{IssuerConfig, IssuerConfigBuilder, IssuerConfigError, ParserConfig};
pub use resolver::{DEFAULT_WARM_CAPACITY, IssuerConfigResolver};
