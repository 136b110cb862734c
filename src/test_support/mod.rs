//! In-crate test helpers: a scripted HTTP transport, a log capture sink, and
//! the localhost socket guard for wiremock tests.

#![allow(clippy::unwrap_used)]

pub mod logs;
#[path = "../../tests/support/socket_guard.rs"]
pub mod socket_guard;
pub mod stub_transport;
