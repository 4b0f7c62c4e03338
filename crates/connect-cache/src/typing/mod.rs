//! Typing indicator tracking

mod tracker;

pub use tracker::TypingTracker;
