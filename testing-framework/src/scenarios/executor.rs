//! Case execution engine
//!
//! Dispatches the actions of a packed case in declaration order and judges
//! every outcome. Expectation mismatches end up in the report; only
//! transport problems (node unreachable, transaction rejected, receipt
//! timeout) abort a run with an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use zion_testing_framework::prelude::*;
//!
//! let case = packer.pack(&raw_case)?;
//! let mut runner = CaseRunner::new(Arc::new(backend));
//! let report = runner.run(case).await?;
//!
//! report.print();
//! assert!(report.passed());
//! ```

use crate::{
    backend::{Backend, CallOutcome},
    cases::{Action, ActionBase, Case, MethodKind, Query, SendTx},
};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::Arc;

/// Verdict on a single action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(Vec<String>),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

#[derive(Debug, Clone)]
pub struct ActionReport {
    pub base: ActionBase,
    pub method: String,
    pub kind: MethodKind,
    pub nonce: Option<u64>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub struct CaseReport {
    pub case_index: u64,
    pub results: Vec<ActionReport>,
    pub log: Vec<String>,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.results.iter().all(|result| result.outcome.is_passed())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ActionReport> {
        self.results
            .iter()
            .filter(|result| !result.outcome.is_passed())
    }

    /// Print report to stdout
    pub fn print(&self) {
        let failed = self.failures().count();
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║  Case Execution Report                                     ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║  Case: {:<51} ║", self.case_index);
        println!("║  Actions: {:<48} ║", self.results.len());
        println!(
            "║  Status: {:<49} ║",
            if failed == 0 {
                "PASSED ✓".to_string()
            } else {
                format!("FAILED ✗ ({} of {})", failed, self.results.len())
            }
        );
        println!("╚════════════════════════════════════════════════════════════╝\n");

        println!("Execution Log:");
        println!("═════════════");
        for entry in &self.log {
            println!("{}", entry);
        }
    }
}

/// Runs packed cases against a backend
pub struct CaseRunner {
    backend: Arc<dyn Backend>,
    log: Vec<String>,
}

impl CaseRunner {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            log: Vec::new(),
        }
    }

    /// Execute a packed case, consuming it
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails to serve an action. Actions after
    /// the failing one are not dispatched.
    pub async fn run(&mut self, case: Case) -> Result<CaseReport> {
        self.log.clear();
        let case_index = case.index();
        self.log(format!("Running case {} ({} actions)", case_index, case.len()));

        let mut results = Vec::with_capacity(case.len());
        for action in case.into_actions() {
            let base = action.base().clone();
            self.log(format!(
                "\n--- Action {}: {} [{}] ---",
                base.index,
                action.method(),
                base.label
            ));

            let report = self.execute_action(action).await.with_context(|| {
                format!(
                    "Case {} failed at action {} ({})",
                    case_index, base.index, base.label
                )
            })?;
            results.push(report);
        }

        let report = CaseReport {
            case_index,
            results,
            log: self.log.clone(),
        };
        if report.passed() {
            info!("Case {} passed", case_index);
        } else {
            warn!(
                "Case {} failed: {} of {} actions did not meet expectations",
                case_index,
                report.failures().count(),
                report.results.len()
            );
        }
        Ok(report)
    }

    async fn execute_action(&mut self, action: Action) -> Result<ActionReport> {
        match action {
            Action::Query(query) => self.execute_query(query).await,
            Action::SendTx(send) => self.execute_send(send).await,
        }
    }

    async fn execute_query(&mut self, query: Query) -> Result<ActionReport> {
        let outcome = self.backend.call(&query.request).await?;

        let verdict = match outcome {
            CallOutcome::Reverted(reason) => {
                self.log(format!("  ✗ Call reverted: {}", reason));
                Outcome::Failed(vec![format!("call reverted: {}", reason)])
            }
            CallOutcome::Returned(output) => {
                self.log(format!("  Returned {} bytes", output.len()));
                let mut failures = Vec::new();
                for assertion in &query.assertions {
                    match assertion.check(&output) {
                        Ok(()) => self.log(format!("  ✓ {:?}", assertion)),
                        Err(reason) => {
                            self.log(format!("  ✗ {}", reason));
                            failures.push(reason);
                        }
                    }
                }
                if failures.is_empty() {
                    Outcome::Passed
                } else {
                    Outcome::Failed(failures)
                }
            }
        };

        Ok(ActionReport {
            base: query.base,
            method: query.method,
            kind: MethodKind::ReadOnly,
            nonce: None,
            outcome: verdict,
        })
    }

    async fn execute_send(&mut self, send: SendTx) -> Result<ActionReport> {
        let nonce = send.tx.nonce();
        debug!(
            "Submitting {} from {} (nonce {})",
            send.method, send.sender, nonce
        );
        let outcome = self.backend.submit(&send.tx).await?;

        let expected = if send.should_succeed { "success" } else { "failure" };
        let actual = if outcome.success { "success" } else { "failure" };
        let verdict = if outcome.success == send.should_succeed {
            self.log(format!(
                "  ✓ Transaction {} (nonce {}) ended in {} as expected",
                outcome.hash, nonce, actual
            ));
            Outcome::Passed
        } else {
            self.log(format!(
                "  ✗ Transaction {} (nonce {}): expected {}, got {}",
                outcome.hash, nonce, expected, actual
            ));
            Outcome::Failed(vec![format!("expected {}, got {}", expected, actual)])
        };

        Ok(ActionReport {
            base: send.base,
            method: send.method,
            kind: MethodKind::Mutating,
            nonce: Some(nonce),
            outcome: verdict,
        })
    }

    /// Add log entry
    fn log(&mut self, message: String) {
        debug!("{}", message.trim_start());
        self.log.push(message);
    }

    /// Get execution log of the last run
    pub fn get_log(&self) -> &[String] {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        accounts::{DevKeyring, SenderIdentity},
        assertions::{CompareOp, ReturnExpect},
        backend::InMemoryBackend,
        cases::{CasePacker, MethodRegistry, RawAction, RawCase},
        config::NetworkConfig,
    };

    const ADD_NODE: u8 = 0x01;
    const GET_NODE_INFO: u8 = 0x02;
    const BROKEN: u8 = 0x03;

    fn packer() -> CasePacker {
        CasePacker::new(
            NetworkConfig::default(),
            MethodRegistry::new()
                .with_mutating("addNode")
                .with_read_only("getNodeInfo"),
        )
    }

    fn word(value: u8) -> Vec<u8> {
        let mut out = vec![0u8; 32];
        out[31] = value;
        out
    }

    fn backend() -> Arc<InMemoryBackend> {
        Arc::new(
            InMemoryBackend::new(&NetworkConfig::default())
                .with_response(vec![GET_NODE_INFO], word(1))
                .with_failing(vec![BROKEN]),
        )
    }

    fn alice() -> Arc<dyn SenderIdentity> {
        Arc::new(DevKeyring::new("runner-tests").derive(1, "alice").unwrap())
    }

    #[tokio::test]
    async fn test_run_passing_case() {
        let alice = alice();
        let raw = RawCase::new(1)
            .with_action(RawAction::new("addNode", vec![ADD_NODE], alice.clone()))
            .with_action(
                RawAction::new("getNodeInfo", vec![GET_NODE_INFO], alice.clone()).with_assertion(
                    ReturnExpect::Word {
                        word: 0,
                        compare: CompareOp::Eq { eq: 1 },
                    },
                ),
            )
            .with_action(RawAction::new("addNode", vec![ADD_NODE], alice.clone()));

        let backend = backend();
        let mut runner = CaseRunner::new(backend.clone());
        let report = runner.run(packer().pack(&raw).unwrap()).await.unwrap();

        assert!(report.passed());
        assert_eq!(report.results.len(), 3);
        let nonces: Vec<Option<u64>> = report.results.iter().map(|r| r.nonce).collect();
        assert_eq!(nonces, vec![Some(0), None, Some(1)]);
        assert_eq!(backend.submitted().len(), 2);
        assert_eq!(backend.calls().len(), 1);
        assert_eq!(backend.nonce(&alice.address()), 2);
        assert!(!runner.get_log().is_empty());
    }

    #[tokio::test]
    async fn test_expected_failure_passes() {
        let raw = RawCase::new(2).with_action(
            RawAction::new("addNode", vec![BROKEN], alice()).expect_success(false),
        );
        let mut runner = CaseRunner::new(backend());
        let report = runner.run(packer().pack(&raw).unwrap()).await.unwrap();
        assert!(report.passed());
    }

    #[tokio::test]
    async fn test_mismatches_are_reported_not_raised() {
        let alice = alice();
        let raw = RawCase::new(3)
            // fails on chain but expected to succeed
            .with_action(RawAction::new("addNode", vec![BROKEN], alice.clone()))
            // succeeds but expected to fail
            .with_action(
                RawAction::new("addNode", vec![ADD_NODE], alice.clone()).expect_success(false),
            )
            .with_action(
                RawAction::new("getNodeInfo", vec![GET_NODE_INFO], alice.clone())
                    .with_assertion(ReturnExpect::Len { len: 64 }),
            )
            // no response programmed: reverts
            .with_action(RawAction::new("getNodeInfo", vec![0x09], alice.clone()));

        let mut runner = CaseRunner::new(backend());
        let report = runner.run(packer().pack(&raw).unwrap()).await.unwrap();

        assert!(!report.passed());
        let failed: Vec<usize> = report.failures().map(|r| r.base.index).collect();
        assert_eq!(failed, vec![0, 1, 2, 3]);
        assert_eq!(
            report.results[0].outcome,
            Outcome::Failed(vec!["expected success, got failure".to_string()])
        );
    }

    #[tokio::test]
    async fn test_backend_error_aborts_run() {
        let alice = alice();
        let raw = RawCase::new(4)
            .with_action(RawAction::new("addNode", vec![ADD_NODE], alice.clone()))
            .with_action(RawAction::new("addNode", vec![ADD_NODE], alice.clone()));

        let backend = backend();
        // Same case packed twice: the second run reuses nonces 0 and 1
        let mut runner = CaseRunner::new(backend.clone());
        runner.run(packer().pack(&raw).unwrap()).await.unwrap();
        let err = runner
            .run(packer().pack(&raw).unwrap())
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid nonce"));
        assert_eq!(backend.submitted().len(), 2);
    }
}
