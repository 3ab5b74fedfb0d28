//! Shared models and request payloads for the coupon verification service.
//!
//! Everything here is plain serde data: the backend produces and consumes these
//! types at the HTTP boundary, and any client can depend on this crate to speak
//! the same JSON.

pub mod model;
pub mod requests;
