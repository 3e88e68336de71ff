//! Merge policy and service.

mod policy;
pub mod service;
