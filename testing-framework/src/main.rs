// zion-test: run declarative node manager cases against a node
//
// Usage:
//   zion-test --config config.json --cases cases.yaml
//   zion-test --case 3 --dry-run
//   zion-test --run-id 1700000000000   (reuse the accounts of an earlier run)

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info};
use std::{
    path::PathBuf,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use zion_testing_framework::{
    accounts::DevKeyring,
    backend::{Backend, JsonRpcBackend},
    cases::{Action, Case, CasePacker},
    config::{HarnessConfig, DEFAULT_CONFIG_PATH},
    funding::Funder,
    scenarios::{load_case_file, CaseDef, CaseRunner},
};

#[derive(Parser, Debug)]
#[command(name = "zion-test")]
#[command(about = "Zion node manager test framework", version)]
struct Args {
    /// Path to the harness config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Case file, overrides the one named in the config
    #[arg(long)]
    cases: Option<PathBuf>,

    /// Only run the case with this index
    #[arg(long)]
    case: Option<u64>,

    /// Pack the cases and print them without contacting the node
    #[arg(long)]
    dry_run: bool,

    /// Salt for the case accounts, defaults to the current time in milliseconds
    #[arg(long)]
    run_id: Option<String>,
}

fn default_run_id() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
        .to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = HarnessConfig::load(&args.config)?;

    let cases_path = args
        .cases
        .clone()
        .or_else(|| config.cases.clone())
        .context("No case file given (use --cases or set \"cases\" in the config)")?;
    let case_file = load_case_file(&cases_path)?;

    let selected: Vec<&CaseDef> = match args.case {
        Some(index) => vec![case_file
            .case(index)
            .with_context(|| format!("Case {} not found in {}", index, cases_path.display()))?],
        None => case_file.cases.iter().collect(),
    };

    info!(
        "{}: {} case(s) from {}",
        case_file.name.as_deref().unwrap_or("zion-test"),
        selected.len(),
        cases_path.display()
    );

    let run_id = args.run_id.clone().unwrap_or_else(default_run_id);
    info!("Run id {}", run_id);
    let keyring = DevKeyring::new(&config.seed).with_run_id(&run_id);
    let packer = CasePacker::new(config.network.clone(), config.registry());
    let funder = Funder::from_config(&config)?;
    match &funder {
        Some(funder) => info!(
            "Funding case senders with {} wei from {}",
            funder.amount(),
            funder.address()
        ),
        None => info!("No funder configured, case senders must already hold funds"),
    }

    let backend: Arc<dyn Backend> =
        Arc::new(JsonRpcBackend::new(config.node_url.clone(), config.transport.clone())?);
    let mut runner = CaseRunner::new(backend.clone());

    let mut failed = Vec::new();
    // Cases run one after another: only nonces inside one case are coordinated
    for def in selected {
        let packed = def
            .to_raw(&keyring)
            .and_then(|raw| packer.pack(&raw).map_err(anyhow::Error::from));
        let case = match packed {
            Ok(case) => case,
            Err(e) => {
                error!("Case {} could not be packed: {:#}", def.index, e);
                failed.push(def.index);
                continue;
            }
        };

        let senders: Vec<String> = Funder::recipients(&case)
            .iter()
            .map(ToString::to_string)
            .collect();
        info!("Case {}: senders [{}]", def.index, senders.join(", "));

        if args.dry_run {
            print_packed(&case);
            continue;
        }

        if let Some(funder) = &funder {
            if let Err(e) = funder.fund_case(backend.as_ref(), &case).await {
                error!("Case {} could not be funded: {:#}", def.index, e);
                failed.push(def.index);
                continue;
            }
        }

        match runner.run(case).await {
            Ok(report) => {
                report.print();
                if !report.passed() {
                    failed.push(def.index);
                }
            }
            Err(e) => {
                error!("Case {} aborted: {:#}", def.index, e);
                failed.push(def.index);
            }
        }
    }

    if !failed.is_empty() {
        bail!("{} case(s) failed: {:?}", failed.len(), failed);
    }
    info!("All cases passed");
    Ok(())
}

fn print_packed(case: &Case) {
    println!("Case {} ({} actions)", case.index(), case.len());
    for action in case.actions() {
        match action {
            Action::Query(query) => println!(
                "  [{}] query {} from {} data=0x{}",
                query.base.index,
                query.method,
                query.sender,
                hex::encode(&query.request.data)
            ),
            Action::SendTx(send) => println!(
                "  [{}] tx    {} from {} nonce={} hash={}",
                send.base.index,
                send.method,
                send.sender,
                send.tx.nonce(),
                send.tx.hash()
            ),
        }
    }
}
