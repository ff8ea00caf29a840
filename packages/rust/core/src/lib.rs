//! Core assembly logic for texbuilder.
//!
//! This crate discovers the fragments of a LaTeX project, wraps sections
//! with their macros and subsections, and writes the single compiled
//! document (e.g., [`assembler::assemble`]).

pub mod assembler;
pub mod fs;
pub mod wrapper;

pub use assembler::{AssembleReport, ProgressReporter, SilentProgress, assemble};
pub use fs::{MemoryFs, ProjectFs, StdFs};
pub use wrapper::WrapRequest;
