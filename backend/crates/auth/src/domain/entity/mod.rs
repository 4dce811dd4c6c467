//! Entity Module

pub mod otp;
pub mod permission;
pub mod refresh_token;
pub mod user;
