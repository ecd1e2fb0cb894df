//! Common test utilities for the integration suites
//!
//! Fixtures build model responses, document bundles and stores; doubles
//! stand in for the generation and storage collaborators.

#![allow(dead_code)]

pub mod doubles;
pub mod fixtures;

pub use doubles::{FailingStore, ScriptedGenerator};
pub use fixtures::{
    create_test_store, model_response, profile_json, seed_analysis, write_bundle, TestBundle,
};
