//! Case file parser and case runner
//!
//! Case files are YAML:
//!
//! ```yaml
//! name: "Node manager smoke test"
//! cases:
//!   - index: 1
//!     description: "Stake twice, read the stake back"
//!     actions:
//!       - method: "stake"
//!         sender: "alice"
//!         input:
//!           call: "stake(address,uint256)"
//!           args: "0x..."
//!       - method: "getStakeInfo"
//!         sender: "alice"
//!         input:
//!           hex: "0x..."
//!         assertions:
//!           - not_empty: true
//!       - method: "stake"
//!         sender: "alice"
//!         expect: "failure"
//! ```
//!
//! Senders are actor names, resolved to fresh development accounts for
//! every case.

pub mod executor;
pub mod parser;

pub use executor::{ActionReport, CaseReport, CaseRunner, Outcome};
pub use parser::{load_case_file, parse_case_file, ActionDef, CaseDef, CaseFile, Expect, InputDef};
