//! Property-based tests for the rewrite engine.
//!
//! Uses proptest to check that rewrites keep graphs well formed, leave
//! observable results unchanged and reach a fixed point.

pub mod generators;
mod rewrite_props;
