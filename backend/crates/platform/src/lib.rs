//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations for the auth core:
//! - OS-backed random bytes and opaque token encoding

pub mod crypto;
