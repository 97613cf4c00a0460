//! Integration test crate for Frameline.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on multiple frameline crates to verify they work together.

#[cfg(test)]
mod audio;

#[cfg(test)]
mod playback;

#[cfg(test)]
mod timeline;
