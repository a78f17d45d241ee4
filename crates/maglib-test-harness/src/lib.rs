//! maglib-test-harness: Test utilities and mock transports for maglib.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! the protocol driver without requiring real card reader hardware.

pub mod mock_transport;

pub use mock_transport::MockTransport;
