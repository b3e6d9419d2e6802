//! Immutable state containers.
//!
//! Store state is held in an [`ImmutableMap`]; every change produces a new
//! version of the map instead of editing the old one.

mod map;

pub use map::ImmutableMap;
