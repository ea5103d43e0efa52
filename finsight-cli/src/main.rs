use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use finsight_core::{BudgetAllocation, ClassificationResult, MonthKey};
use finsight_finance::{Allocator, Classification, Classifier};
use finsight_ingest::{MemoryStore, load_statement_csv, load_transactions_csv};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "finsight",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("FINSIGHT_BUILD_SHA"), ")"),
    about = "Expense classification and budget allocation"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct ClassifierArgs {
    /// Prediction service base URL (overrides config and ML_SERVICE_URL)
    #[arg(long)]
    ml_url: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify one transaction description
    Classify {
        text: String,

        /// Amount to send instead of the one parsed from the text
        #[arg(long)]
        amount: Option<f64>,

        #[command(flatten)]
        classifier: ClassifierArgs,
    },

    /// Classify every `description` row of a statement CSV
    Categorize {
        #[arg(long)]
        csv: PathBuf,

        #[command(flatten)]
        classifier: ClassifierArgs,
    },

    /// Compute monthly category caps from income and expense history
    Budget {
        /// Monthly income
        #[arg(long)]
        income: f64,

        /// Target month, YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<MonthKey>,

        /// History CSV: user_id,type,category,amount,date
        #[arg(long)]
        history: PathBuf,

        #[arg(long)]
        user: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Manage ~/.finsight/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Serialize)]
struct ClassifyOutput<'a> {
    #[serde(flatten)]
    result: &'a ClassificationResult,
    source: &'static str,
}

impl<'a> From<&'a Classification> for ClassifyOutput<'a> {
    fn from(c: &'a Classification) -> Self {
        Self {
            result: c.result(),
            source: c.source(),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Classify {
            text,
            amount,
            classifier,
        } => {
            let classifier = build_classifier(&classifier)?;
            let out = classifier.classify(&text, amount).await;
            println!("{}", serde_json::to_string_pretty(&ClassifyOutput::from(&out))?);
        }

        Command::Categorize { csv, classifier } => {
            categorize(csv, &classifier).await?;
        }

        Command::Budget {
            income,
            month,
            history,
            user,
            json,
        } => {
            let cfg = config::load_config()?;
            let caps = budget(&cfg, income, month, &history, &user)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&caps)?);
            } else {
                print_caps(&caps, income);
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

fn build_classifier(args: &ClassifierArgs) -> Result<Classifier> {
    let mut cfg = config::load_config()?.classifier;
    if let Some(url) = &args.ml_url {
        cfg.ml_service_url = url.clone();
    }
    if let Some(ms) = args.timeout_ms {
        cfg.timeout_ms = ms;
    }
    Classifier::new(cfg)
}

async fn categorize(csv: PathBuf, args: &ClassifierArgs) -> Result<()> {
    if !csv.exists() {
        bail!("CSV not found: {} (pass --csv <path>)", csv.display());
    }
    let lines = load_statement_csv(&csv).with_context(|| format!("parsing {}", csv.display()))?;
    let classifier = build_classifier(args)?;

    let results = classifier
        .classify_all(lines.iter().map(|l| (l.description.as_str(), l.amount)))
        .await;

    let fallbacks = results.iter().filter(|c| c.is_fallback()).count();
    println!("Classified {} rows from {}", lines.len(), csv.display());
    println!("Model: {} | Rules: {}\n", results.len() - fallbacks, fallbacks);

    for (line, c) in lines.iter().zip(&results) {
        let r = c.result();
        println!(
            "[{}] {:<13} conf={:.2} | {} | {}",
            c.source(),
            r.category,
            r.confidence,
            if r.merchant.is_empty() { "-" } else { r.merchant.as_str() },
            line.description
        );
    }
    Ok(())
}

fn budget(
    cfg: &Config,
    income: f64,
    month: Option<MonthKey>,
    history: &Path,
    user: &str,
) -> Result<BudgetAllocation> {
    if !history.exists() {
        bail!("history CSV not found: {}", history.display());
    }
    let store: MemoryStore = load_transactions_csv(history)
        .with_context(|| format!("parsing {}", history.display()))?
        .into_iter()
        .collect();

    Allocator::new(store, cfg.budget.clone())
        .with_timezone(cfg.profile.timezone.clone())
        .compute(user, income, month)
}

fn print_caps(caps: &BudgetAllocation, income: f64) {
    for (category, cap) in caps.iter() {
        println!("{:<14} {:>10}", category.label(), cap);
    }
    println!("{:<14} {:>10}", "Total", caps.total());
    if caps.exceeds(income) {
        println!(
            "\nNote: spending caps ({}) exceed income ({income:.0}); savings floored at 0",
            caps.spending_total()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsight_core::Category;
    use std::io::Write;

    #[test]
    fn test_cli_parses_budget() {
        let cli = Cli::try_parse_from([
            "finsight", "budget", "--income", "50000", "--month", "2025-03", "--history", "h.csv",
            "--user", "u1",
        ])
        .unwrap();
        match cli.command {
            Command::Budget { income, month, user, json, .. } => {
                assert_eq!(income, 50000.0);
                assert_eq!(month, Some(MonthKey::new(2025, 3).unwrap()));
                assert_eq!(user, "u1");
                assert!(!json);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_month() {
        assert!(Cli::try_parse_from([
            "finsight", "budget", "--income", "1", "--month", "March", "--history", "h.csv",
            "--user", "u1",
        ])
        .is_err());
    }

    #[test]
    fn test_budget_from_history_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            "user_id,type,category,amount,date\n\
             u1,expense,Food,9000,2025-01-10\n\
             u1,expense,Food,9000,2025-03-10\n"
        )
        .unwrap();

        let month = Some(MonthKey::new(2025, 3).unwrap());
        let caps = budget(&Config::default(), 50_000.0, month, f.path(), "u1").unwrap();
        // 3600 + 0.4 * (9000 / 3)
        assert_eq!(caps.get(Category::Food), 4800);
        assert_eq!(caps.savings(), 50_000 - caps.spending_total());
    }

    #[test]
    fn test_budget_missing_history() {
        let path = Path::new("/no/such/history.csv");
        assert!(budget(&Config::default(), 1.0, None, path, "u1").is_err());
    }
}
