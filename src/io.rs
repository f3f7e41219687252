//! Input-side file handling: discovery and transparent decompression.

pub mod compression;
pub mod glob;
