//! Seedsched Core
//!
//! Core types for the seedsched input scheduler.
//!
//! This crate contains:
//! - Domain types: candidate tasks, source categories, and the cross-source
//!   dispatch order
//! - Resume cursors for the external input sources
//! - Rarity log record parsing

pub mod domain;
