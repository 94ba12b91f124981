//! Content services built on top of the converter.

pub mod excerpt;
