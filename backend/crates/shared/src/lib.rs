//! Shared Kernel
//!
//! Vocabulary shared by every auth-core crate:
//! - The error classification the request boundary maps to responses
//! - Typed identifiers for the entities the core persists
//!
//! Nothing here knows about OTPs, tokens or permissions beyond their names.

pub mod error {
    pub mod app_error;
    pub mod kind;
}
pub mod id;
