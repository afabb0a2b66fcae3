//! Test utilities
//!
//! PGP identity and peer generation for unit tests.

#![cfg(test)]

pub mod pgp_test_keys;

pub use pgp_test_keys::*;
