//! Testing utilities and mock implementations
//!
//! Lets adapters be exercised without contacting a real LLM vendor.

pub mod mocks;

pub use mocks::*;
