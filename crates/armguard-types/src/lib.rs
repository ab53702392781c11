//! Stable DTOs and IDs used across the armguard workspace.
//!
//! This crate is intentionally boring:
//! - data types for the emitted verification results and report
//! - stable string IDs for match kinds and synthetic results
//! - explain registry describing each match kind

#![forbid(unsafe_code)]

pub mod explain;
pub mod ids;
pub mod receipt;

pub use explain::{lookup_explanation, Explanation};
pub use receipt::{
    ControlResult, ControlSeverity, DataMarker, OutcomeCounts, ReportEnvelope, ScanData,
    TemplateScan, ToolMeta, Verdict, VerificationResult, SCHEMA_REPORT_V1,
};
