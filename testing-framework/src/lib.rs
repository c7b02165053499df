//! # Zion Testing Framework
//!
//! Declarative case harness for the node manager system contract.
//!
//! Test authors describe ordered cases of contract calls. Each action is
//! classified as mutating or read-only, mutating actions get per-sender
//! nonces in declaration order and are signed, read-only actions become
//! `eth_call` queries. A packed [`cases::Case`] is then dispatched in order
//! by the [`scenarios::CaseRunner`] which checks every declared expectation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use zion_testing_framework::prelude::*;
//!
//! let packer = CasePacker::new(NetworkConfig::default(), MethodRegistry::node_manager());
//! let case = packer.pack(&raw_case)?;
//!
//! let mut runner = CaseRunner::new(backend);
//! let report = runner.run(case).await?;
//! assert!(report.passed());
//! ```

#![warn(clippy::all)]

/// Test actors: address and signing capability
pub mod accounts;

/// Predicates evaluated against query results
pub mod assertions;

/// Node backends (JSON-RPC and in-memory)
pub mod backend;

// Raw and packed cases, method registry, nonce allocation and packing
pub mod cases;

/// Harness configuration file
pub mod config;

/// Top-up of case accounts before a case runs
pub mod funding;

/// Contract call input encoders
pub mod params;

// Case file parser and case runner
pub mod scenarios;

// Convenient re-exports for common usage
pub mod prelude;

/// Framework version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
