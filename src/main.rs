use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Args, Parser, Subcommand};
use incident_synth::config::{LoggingConfig, SynthConfig, CONFIG_ENV_VAR};
use incident_synth::generator::engine::{plan_days, LaneRng};
use incident_synth::generator::{Generator, RunReport};
use incident_synth::storage::{self, MemorySink};

#[derive(Parser)]
#[command(
    name = "incident-synth",
    about = "Calendar-aware synthetic incident generator with labeled anomaly regimes",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file (./incident-synth.toml is used when present)
    #[arg(long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate incidents for every entity into the SQLite store
    Generate {
        #[command(flatten)]
        run: RunOverrides,

        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,

        /// Create the incidents schema first if it is missing
        #[arg(long)]
        init_schema: bool,

        /// Generate in memory only and report tallies
        #[arg(long)]
        dry_run: bool,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Show the planned regime and volume of each day per entity
    Preview {
        #[command(flatten)]
        run: RunOverrides,

        /// Only list days that resolve to an anomaly
        #[arg(long)]
        anomalies_only: bool,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Create the incidents schema
    Migrate {
        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Summarize stored incidents per entity and anomaly type
    Summary {
        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

/// Command-line overrides for the `[run]` config section.
#[derive(Args)]
struct RunOverrides {
    /// Entity to generate (repeatable; replaces the configured list)
    #[arg(long = "entity")]
    entities: Vec<String>,

    /// First day of the run, inclusive (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day of the run, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

impl RunOverrides {
    fn apply(self, config: &mut SynthConfig) {
        if !self.entities.is_empty() {
            config.run.entities = self.entities;
        }
        if let Some(start) = self.start {
            config.run.start_date = start;
        }
        if let Some(end) = self.end {
            config.run.end_date = end;
        }
        if self.seed.is_some() {
            config.run.seed = self.seed;
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SynthConfig> {
    match path {
        Some(p) => Ok(SynthConfig::load(p)?),
        None => Ok(SynthConfig::load_or_default()?),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Generate {
            run,
            db,
            init_schema,
            dry_run,
            json,
        } => {
            run.apply(&mut config);
            if let Some(db) = db {
                config.storage.db_path = db;
            }

            let report = if dry_run {
                tracing::info!("Dry run: records are kept in memory only");
                Generator::new(config.run.clone(), MemorySink::new()).run().await?
            } else {
                incident_synth::generate(&config, init_schema).await?
            };

            print_run_report(&report, json)?;

            let failed = report.failures().count();
            if failed > 0 {
                anyhow::bail!("{} of {} entities failed", failed, report.outcomes.len());
            }
        }
        Commands::Preview {
            run,
            anomalies_only,
            json,
        } => {
            run.apply(&mut config);
            config.run.validate()?;

            let mut plans = Vec::new();
            for entity in &config.run.entities {
                let mut rng = LaneRng::new(config.run.seed, entity);
                plans.extend(
                    plan_days(&mut rng.plan, entity, config.run.start_date, config.run.end_date)
                        .filter(|p| !anomalies_only || p.regime.is_anomaly()),
                );
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&plans)?);
            } else {
                println!(
                    "{:<12} | {:<10} | {:>5} | {:<3} | {:<18} | {:<18} | {:>6} | Flags",
                    "Entity", "Date", "Index", "Day", "Regime", "Label", "Volume"
                );
                println!(
                    "{:-<12}-|-{:-<10}-|-{:->5}-|-{:-<3}-|-{:-<18}-|-{:-<18}-|-{:->6}-|-{:-<12}",
                    "", "", "", "", "", "", "", ""
                );
                for p in &plans {
                    let mut flags = Vec::new();
                    if p.is_atypical {
                        flags.push("atypical");
                    }
                    if p.is_fifth_business_day {
                        flags.push("bday5");
                    }
                    if p.is_anomaly_day {
                        flags.push("gated");
                    }
                    println!(
                        "{:<12} | {:<10} | {:>5} | {:<3} | {:<18} | {:<18} | {:>6} | {}",
                        p.entity_id,
                        p.date,
                        p.day_index,
                        p.date.weekday().to_string(),
                        p.regime,
                        p.anomaly_type().map(|t| t.as_str()).unwrap_or("-"),
                        p.volume,
                        flags.join(",")
                    );
                }
                for entity in &config.run.entities {
                    let listed = plans.iter().filter(|p| p.entity_id == *entity).count();
                    let volume: u64 = plans
                        .iter()
                        .filter(|p| p.entity_id == *entity)
                        .map(|p| u64::from(p.volume))
                        .sum();
                    println!("\n{} day(s) listed for {}, {} record(s)", listed, entity, volume);
                }
            }
        }
        Commands::Migrate { db } => {
            let db_path = db.unwrap_or(config.storage.db_path);
            if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let pool = storage::open_pool(&db_path.to_string_lossy())?;
            let conn = pool.get()?;
            storage::schema::migrate(&conn)?;
            println!("Schema ready at {}", db_path.display());
        }
        Commands::Summary { db, json } => {
            let db_path = db.unwrap_or(config.storage.db_path);
            if !db_path.exists() {
                anyhow::bail!("No incident store at {}", db_path.display());
            }
            let pool = storage::open_pool(&db_path.to_string_lossy())?;
            let conn = pool.get()?;
            if !storage::schema::schema_exists(&conn)? {
                anyhow::bail!("No incidents schema in {}", db_path.display());
            }
            let summary = storage::summarize(&pool)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else if summary.is_empty() {
                println!("No incidents stored.");
            } else {
                println!("{:<20} | {:<18} | {:>6} | Records", "Entity", "Label", "Days");
                println!("{:-<20}-|-{:-<18}-|-{:->6}-|-{:-<8}", "", "", "", "");
                for row in summary {
                    let label = if row.anomaly_type.is_empty() { "NORMAL" } else { row.anomaly_type.as_str() };
                    println!("{:<20} | {:<18} | {:>6} | {}", row.entity_id, label, row.days, row.records);
                }
            }
        }
    }

    Ok(())
}

fn print_run_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        let entities: Vec<_> = report
            .outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(r) => serde_json::json!({
                    "entity": o.entity_id,
                    "status": "complete",
                    "days": r.days,
                    "anomalous_days": r.anomalous_days,
                    "records": r.records,
                    "tally": r.tally,
                }),
                Err(e) => serde_json::json!({
                    "entity": o.entity_id,
                    "status": "failed",
                    "error": e.to_string(),
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entities)?);
        return Ok(());
    }

    println!("\n=== Generation Report ===");
    println!(
        "{:<20} | {:>6} | {:>8} | {:>5} | {:>5} | {:>8} | {:>8} | {:>6}",
        "Entity", "Days", "Records", "SPIKE", "DROP", "SUS_INC", "SUS_DEC", "CYCLIC"
    );
    println!(
        "{:-<20}-|-{:->6}-|-{:->8}-|-{:->5}-|-{:->5}-|-{:->8}-|-{:->8}-|-{:->6}",
        "", "", "", "", "", "", "", ""
    );
    for o in &report.outcomes {
        match &o.result {
            Ok(r) => println!(
                "{:<20} | {:>6} | {:>8} | {:>5} | {:>5} | {:>8} | {:>8} | {:>6}",
                o.entity_id,
                r.days,
                r.records,
                r.tally.spike,
                r.tally.drop,
                r.tally.sustained_increase,
                r.tally.sustained_decrease,
                r.tally.cyclic
            ),
            Err(e) => println!("{:<20} | FAILED: {}", o.entity_id, e),
        }
    }
    println!("\nTotal records: {}", report.total_records());
    Ok(())
}
