//! Test utilities for the varacc workspace
//!
//! Shared fixtures, in-memory store harnesses and assertions so that business logic can
//! be tested without RocksDB.
//!
//! # Features
//!
//! - **Test Environment**: temporary store directories and a matching configuration
//! - **Fixtures**: variant builders and a seeded batch generator
//! - **Store Harness**: legacy and live in-memory repositories, histories and counters
//! - **Assertions**: accessioning invariants

pub mod assertions;
pub mod environment;
pub mod fixtures;
pub mod storage;

pub use environment::TestEnvironment;
pub use fixtures::{
    clustered, generate_submitted_variants, legacy_clustered, legacy_submitted, submitted,
    submitted_in_study, TEST_ASSEMBLY, TEST_TAXONOMY,
};
pub use storage::StoreHarness;

pub use anyhow::{Context, Result};
pub use tempfile;

/// Initialize test logging (safe to call from every test)
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env(varacc_core::logging::LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
