//! Media facts extracted from analyzer output.

pub mod report;

pub use report::{ProbeFormat, ProbeReport, ProbeStream};
