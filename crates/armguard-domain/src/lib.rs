//! Pure template evaluation (no IO).
//!
//! Input: an already-parsed template, optional external parameters and a typed control catalog.
//! Output: one verification result per control and resource group, plus summary counts.

#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod expression;
pub mod fingerprint;
pub mod graph;
pub mod json;
pub mod report;
pub mod rules;
pub mod version;

mod engine;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use engine::{EvaluationInput, evaluate};
