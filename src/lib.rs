#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod completion;
pub mod error;
pub mod reporter;
pub mod stopwatch;
