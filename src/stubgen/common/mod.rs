//! Common utilities shared across the generator stages.
//!
//! This module provides shared functionality used by the parser, the
//! lowering pass and the code generator.

/// Error handling utilities for table processing.
///
/// This module contains the unified error type reported for any defect in a
/// syscall table, together with the source location it is attributed to.
pub mod error;
