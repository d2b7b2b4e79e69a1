//! JWKS acquisition, parsing, and caching.
//!
//! Raw documents go through [`JwksParser`] (structural limits), then
//! [`KeyProcessor`] (per-key validation and key-material parsing), and end
//! up as immutable generations inside a [`JwksKeyStore`] that readers
//! consult lock-free.

pub mod key_processor;
pub mod parser;
pub mod store;

pub use key_processor::{KeyInfo, KeyProcessor, MAX_KEY_ID_LENGTH};
pub use parser::{JwksError, JwksParser, MAX_KEYS, MAX_TOP_LEVEL_PROPERTIES};
pub use store::{JwksKeyStore, JwksKeys, JwksSource, JwksStoreConfig};
