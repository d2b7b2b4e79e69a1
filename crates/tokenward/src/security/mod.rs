//! Security event accounting.
//!
//! Every categorized validation failure increments exactly one counter in a
//! [`SecurityEventCounter`], shared by reference across all pipeline stages
//! of one [`TokenValidator`](crate::TokenValidator). External health and
//! metrics collaborators read the counters; this crate never exports them
//! in a wire format itself.

mod counter;

pub use counter::{SecurityEventCounter, SecurityEventType};
