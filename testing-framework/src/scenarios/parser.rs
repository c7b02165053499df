//! YAML case file parser

use crate::{
    accounts::{DevKeyring, SenderIdentity},
    assertions::{Assertion, ReturnExpect},
    cases::{ActionBase, RawAction, RawCase},
    params::{HexParam, Param, SelectorParam},
};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path, sync::Arc};

/// Parsed case file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFile {
    #[serde(default)]
    pub name: Option<String>,
    pub cases: Vec<CaseDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDef {
    pub index: u64,
    #[serde(default)]
    pub description: Option<String>,
    pub actions: Vec<ActionDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDef {
    pub method: String,
    pub sender: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub input: Option<InputDef>,
    #[serde(default)]
    pub expect: Expect,
    #[serde(default)]
    pub assertions: Vec<ReturnExpect>,
}

/// Call data of an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputDef {
    /// Selector of `call` followed by the pre-encoded `args`
    Call {
        call: String,
        #[serde(default)]
        args: String,
    },
    /// Raw call data
    Hex { hex: String },
}

/// Expected execution status of a transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expect {
    #[default]
    Success,
    Failure,
}

/// Parse and validate a YAML case file
///
/// # Errors
///
/// Returns an error if the YAML is malformed, a case has no actions, two
/// cases share an index or an action has an empty method or sender.
pub fn parse_case_file(yaml: &str) -> Result<CaseFile> {
    let file: CaseFile = serde_yaml::from_str(yaml).context("Failed to parse case file")?;
    file.validate()?;
    Ok(file)
}

pub fn load_case_file(path: impl AsRef<Path>) -> Result<CaseFile> {
    let path = path.as_ref();
    let yaml = fs::read_to_string(path)
        .with_context(|| format!("Failed to read case file {}", path.display()))?;
    parse_case_file(&yaml).with_context(|| format!("Invalid case file {}", path.display()))
}

impl CaseFile {
    fn validate(&self) -> Result<()> {
        if self.cases.is_empty() {
            bail!("Case file contains no cases");
        }

        let mut seen = HashSet::new();
        for case in &self.cases {
            if !seen.insert(case.index) {
                bail!("Duplicate case index {}", case.index);
            }
            if case.actions.is_empty() {
                bail!("Case {} has no actions", case.index);
            }
            for (position, action) in case.actions.iter().enumerate() {
                if action.method.trim().is_empty() {
                    bail!("Case {}, action {}: empty method", case.index, position);
                }
                if action.sender.trim().is_empty() {
                    bail!("Case {}, action {}: empty sender", case.index, position);
                }
            }
        }
        Ok(())
    }

    pub fn case(&self, index: u64) -> Option<&CaseDef> {
        self.cases.iter().find(|case| case.index == index)
    }
}

impl CaseDef {
    /// Build the raw case, resolving actor names to this case's accounts
    pub fn to_raw(&self, keyring: &DevKeyring) -> Result<RawCase> {
        let mut accounts = keyring.for_case(self.index);
        let mut actions = Vec::with_capacity(self.actions.len());

        for (position, def) in self.actions.iter().enumerate() {
            let sender: Arc<dyn SenderIdentity> = accounts.resolve(&def.sender).with_context(|| {
                format!(
                    "Case {}: cannot derive account for '{}'",
                    self.index, def.sender
                )
            })?;

            let input: Arc<dyn Param> = match &def.input {
                Some(InputDef::Call { call, args }) => {
                    Arc::new(SelectorParam::new(call.clone(), args.clone()))
                }
                Some(InputDef::Hex { hex }) => Arc::new(HexParam(hex.clone())),
                None => Arc::new(Vec::<u8>::new()),
            };

            let assertions = def
                .assertions
                .iter()
                .map(|assertion| Arc::new(assertion.clone()) as Arc<dyn Assertion>)
                .collect();

            actions.push(RawAction {
                method: def.method.clone(),
                input,
                should_succeed: def.expect == Expect::Success,
                assertions,
                sender,
                base: ActionBase {
                    index: position,
                    label: def.label.clone().unwrap_or_else(|| def.method.clone()),
                },
            });
        }

        Ok(RawCase {
            index: self.index,
            actions,
        })
    }
}
