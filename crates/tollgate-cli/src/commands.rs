use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use tollgate_client::{GateClient, GateClientConfig, HttpGateClient};
use tollgate_protocol::{CheckResponse, ErrorBody, Verdict};
use tollgate_server::{LedgerServer, ServerConfig, StoreConfig};
use tollgate_store::SyncMode;
use tracing::{debug, info};

use crate::cli::{CheckArgs, Cli, Command, ConfigArgs, LedgerArgs, OutputFormat, ServeArgs};

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Check(args) => cmd_check(args, cli.format),
        Command::Config(args) => cmd_config(args),
    }
}

/// Start from the file (or defaults) and apply any flags given.
fn effective_config(args: &LedgerArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(credits) = args.starting_credits {
        config.provisioning.starting_credits = credits;
    }
    if !args.accounts.is_empty() {
        config.provisioning.accounts = args.accounts.clone();
    }
    if let Some(path) = &args.wal {
        config.store = StoreConfig::Wal {
            path: path.clone(),
            sync: SyncMode::default(),
            compact_on_open: false,
        };
    }
    Ok(config)
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("starting async runtime")
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<ExitCode> {
    let config = effective_config(&args.ledger)?;
    info!(
        bind = %config.bind_addr,
        accounts = config.provisioning.accounts.len(),
        starting_credits = config.provisioning.starting_credits,
        store = store_label(&config.store),
        "starting tollgate ledger"
    );
    runtime()?.block_on(LedgerServer::new(config).serve())?;
    info!("tollgate ledger exited cleanly");
    Ok(ExitCode::SUCCESS)
}

fn store_label(store: &StoreConfig) -> String {
    match store {
        StoreConfig::Memory => "memory".into(),
        StoreConfig::Wal { path, .. } => format!("wal:{}", path.display()),
    }
}

fn cmd_check(args: CheckArgs, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let config = GateClientConfig {
        ledger_url: args.ledger_url,
        timeout_ms: args.timeout_ms,
    };
    let client = HttpGateClient::new(&config)?;
    debug!(url = %client.check_url(), account = %args.user, "asking ledger for one credit");
    let verdict = runtime()?.block_on(client.check(&args.user));

    match format {
        OutputFormat::Json => println!("{}", verdict_json(&verdict)),
        OutputFormat::Text => print_verdict(&args.user, &verdict),
    }

    Ok(if verdict.is_approved() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn verdict_json(verdict: &Verdict) -> serde_json::Value {
    let body = match verdict {
        Verdict::Approved { credits_remaining } => {
            serde_json::to_value(CheckResponse::ok(*credits_remaining))
        }
        Verdict::Denied { reason, .. } => serde_json::to_value(ErrorBody::new(reason.clone())),
    }
    .unwrap_or(serde_json::Value::Null);
    serde_json::json!({
        "http_status": verdict.status().as_u16(),
        "body": body,
    })
}

fn print_verdict(user: &str, verdict: &Verdict) {
    match verdict {
        Verdict::Approved { credits_remaining } => println!(
            "{} {} approved, {} credits remaining",
            "✓".green().bold(),
            user.bold(),
            credits_remaining.to_string().yellow()
        ),
        Verdict::Denied { kind, reason } => println!(
            "{} {} denied ({} {}): {}",
            "✗".red().bold(),
            user.bold(),
            verdict.status().as_u16(),
            kind.to_string().red(),
            reason
        ),
    }
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<ExitCode> {
    let config = effective_config(&args.ledger)?;
    print!("{}", config.to_toml()?);
    Ok(ExitCode::SUCCESS)
}
