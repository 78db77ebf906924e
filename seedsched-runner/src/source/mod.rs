//! Source readers
//!
//! Adapters over the external locations the upstream fuzzing processes
//! write to. Each reader is a pure function from (location, cursor) to
//! (newly discovered tasks, advanced cursor); the poll loop owns the
//! cursors and re-supplies them on every cycle.
//!
//! A source that does not exist yet is not an error: the upstream producer
//! simply has not created it, so the reader reports nothing new and leaves
//! the cursor alone.

pub mod afl;
pub mod rarity;

pub use rarity::RaritySource;
