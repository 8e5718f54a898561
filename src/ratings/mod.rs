//! Historical rating storage
//!
//! Sorted per-player timelines with point-in-time lookup.

pub mod store;
pub mod timeline;

pub use store::RatingStore;
pub use timeline::RatingTimeline;
