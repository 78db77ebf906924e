//! Scheduler layer
//!
//! The two halves of the scheduler: the poller feeds the frontier from the
//! external sources, and the dispatch pool drains it into analyzer
//! invocations. They share nothing but the frontier.

pub mod poller;
pub mod workers;

pub use poller::SourcePoller;
pub use workers::DispatchPool;
