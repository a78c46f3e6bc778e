use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use linter_core::Config;
use linter_rules::loader::{load_events, load_metrics, load_rules};
use linter_rules::{LintFilter, MemoryStore, RuleTester, Severity};
use linter_server::{build_router, AppState, SupabaseStore};

// ── CLI ─────────────────────────────────────────────────────────────

/// Event linter rule tester.
#[derive(Parser, Debug)]
#[command(name = "linter-server", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default).
    Serve,

    /// Test one rule against the configured backend and print the report.
    TestRule {
        rule_id: String,
    },

    /// Lint events against every active rule on the configured backend.
    Lint {
        #[arg(long)]
        eid: Option<String>,
        #[arg(long)]
        severity: Option<String>,
    },

    /// Test one rule against local YAML/JSON files.
    Check {
        /// Rules file or directory.
        #[arg(long, default_value = "data/rules")]
        rules: PathBuf,

        /// Events JSON/YAML file.
        #[arg(long)]
        events: PathBuf,

        /// Batch metrics JSON/YAML file.
        #[arg(long)]
        metrics: Option<PathBuf>,

        rule_id: String,
    },
}

fn load_config() -> Config {
    linter_core::config::load_dotenv();
    Config::from_env()
}

fn backend_tester(config: &Config) -> anyhow::Result<RuleTester> {
    let store = Arc::new(
        SupabaseStore::from_config(&config.backend)
            .context("SUPABASE_URL and a service-role or anon key are required")?,
    );
    Ok(RuleTester::from_config(
        store.clone(),
        store.clone(),
        store,
        &config.evaluator,
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let tester = backend_tester(config)?;
    let state = Arc::new(AppState::new(tester).with_cors_origin(config.server.cors_origin.clone()));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);
    info!("API docs at http://{}/docs", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn check(
    config: &Config,
    rules: PathBuf,
    events: PathBuf,
    metrics: Option<PathBuf>,
    rule_id: &str,
) -> anyhow::Result<()> {
    let mut store = MemoryStore::new()
        .with_rules(load_rules(&rules)?)
        .with_events(load_events(&events)?);
    if let Some(path) = metrics {
        store = store.with_metrics(load_metrics(&path)?);
    }
    let store = Arc::new(store);
    let tester = RuleTester::from_config(store.clone(), store.clone(), store, &config.evaluator);

    let report = tester.test_rule(rule_id).await?;
    print_json(&report)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = load_config();
    config.log_summary();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await?,
        Command::TestRule { rule_id } => {
            let report = backend_tester(&config)?.test_rule(&rule_id).await?;
            print_json(&report)?;
        }
        Command::Lint { eid, severity } => {
            let filter = LintFilter {
                eid,
                severity: severity.map(Severity::from),
            };
            let report = backend_tester(&config)?.lint(&filter).await?;
            print_json(&report)?;
        }
        Command::Check {
            rules,
            events,
            metrics,
            rule_id,
        } => check(&config, rules, events, metrics, &rule_id).await?,
    }

    Ok(())
}
