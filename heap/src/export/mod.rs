//! Plain-text renderings of the current heap state.
//!
//! Renderers only read; callers decide where the text goes.

pub mod dot;
pub mod snapshot;
