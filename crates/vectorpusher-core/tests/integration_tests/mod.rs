//! Integration tests for the sculpting pipeline.
//!
//! These tests drive the public API end to end with generated tables:
//! - Magnitude invariance, identity at zero strength, angular bound
//! - Weight normalization and self-exclusion
//! - Divergence bound or shrink-budget exhaustion
//! - Concrete orthonormal and attention-sensitivity scenarios
//! - Token-level pipeline over an in-memory provider

mod helpers;
mod pipeline_tests;
mod property_tests;
mod scenario_tests;
