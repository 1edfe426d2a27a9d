//! Policy document parsing and normalization (pure Rust)

mod document;
mod principal;

pub use document::{parse_policy, parse_policy_with};
