//! Service layer
//!
//! Trait-based seams for the operations the dispatch workers perform
//! against the outside world. Keeping the analyzer behind a trait lets the
//! worker pool run against an in-memory fake in tests.

mod analyzer;

pub use analyzer::{Analyzer, AnalyzerOutcome, TaintAnalyzer, check_analyzer_available};
