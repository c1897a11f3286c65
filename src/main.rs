use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use orion_rs::authority::ConfigAuthority;
use orion_rs::intent::portfolio::{self, PortfolioOptions};
use orion_rs::intent::{Encoding, OrderIntent};
use orion_rs::session::CuratorSession;
use orion_rs::settings::Settings;
use orion_rs::submit::{read_journal, DryRunTransport, JournalTransport, SubmissionTransport};
use orion_rs::{sim, telemetry};

#[derive(Parser, Debug)]
#[command(name = "orion")]
#[command(about = "Validate, normalize and submit vault order intents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// TOML settings file (defaults to ./orion.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Force debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the normalized intent for a portfolio file
    Normalize(IntentArgs),
    /// Normalize a portfolio file and submit it
    Submit {
        #[command(flatten)]
        intent: IntentArgs,
        /// plaintext (0) or encrypted (1)
        #[arg(long, default_value = "plaintext")]
        encoding: Encoding,
        /// Log the submission without journaling it
        #[arg(long)]
        dry_run: bool,
    },
    /// List journaled submissions
    History,
    /// Run the buffer/fee simulation
    Simulate {
        #[arg(long)]
        epochs: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// Write the per-epoch trajectory to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct IntentArgs {
    /// Portfolio file (.csv or .json)
    #[arg(long, short)]
    input: PathBuf,
    /// Add dust for whitelisted tokens missing from the intent
    #[arg(long)]
    fuzz: bool,
    /// Suffix stripped from CSV column names
    #[arg(long)]
    strip_suffix: Option<String>,
}

fn load_intent(args: &IntentArgs, settings: &Settings) -> anyhow::Result<OrderIntent> {
    let options = PortfolioOptions {
        strip_suffix: args.strip_suffix.clone().or_else(|| settings.strip_suffix.clone()),
    };
    portfolio::load_path(&args.input, &options)
        .with_context(|| format!("reading portfolio {}", args.input.display()))
}

fn session(settings: &Settings, fuzz: bool) -> CuratorSession<ConfigAuthority> {
    CuratorSession::new(
        ConfigAuthority::from_settings(settings),
        settings.dust_seed,
        fuzz || settings.fuzz,
    )
}

fn print_intent(intent: &OrderIntent) {
    println!("Order intent ({} tokens):", intent.len());
    for (token, weight) in intent.iter() {
        println!("  {:<44} {:.6}", token, weight);
    }
}

async fn run_submit(
    settings: &Settings,
    args: &IntentArgs,
    encoding: Encoding,
    dry_run: bool,
) -> anyhow::Result<()> {
    let intent = load_intent(args, settings)?;
    print_intent(&intent);

    let transport: Box<dyn SubmissionTransport> = if dry_run {
        Box::new(DryRunTransport::default())
    } else {
        Box::new(JournalTransport::open(settings.journal_path.clone()).await?)
    };

    let receipt = session(settings, args.fuzz)
        .submit(&intent, encoding, transport.as_ref())
        .await?;

    println!(
        "✅ Submitted intent #{} ({} encoding, {} tokens, total {})",
        receipt.sequence, receipt.encoding, receipt.items, receipt.total
    );
    if !dry_run {
        println!("Journal: {}", settings.journal_path.display());
    }
    Ok(())
}

async fn run_history(journal: &Path) -> anyhow::Result<()> {
    let records = read_journal(journal)
        .await
        .with_context(|| format!("reading journal {}", journal.display()))?;
    if records.is_empty() {
        println!("No submissions in {}", journal.display());
        return Ok(());
    }

    for record in &records {
        println!(
            "#{:<4} {:>13}ms  {:<9} {} tokens",
            record.sequence,
            record.submitted_at_ms,
            record.encoding,
            record.items.len()
        );
        for item in &record.items {
            println!("    {:<44} {}", item.token, item.amount);
        }
    }
    println!("{} submissions", records.len());
    Ok(())
}

fn run_simulate(
    settings: &Settings,
    epochs: Option<usize>,
    seed: Option<u64>,
    csv: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = settings.simulation.clone();
    if let Some(epochs) = epochs {
        config.epochs = epochs;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }

    let report = sim::run(&config)?;
    println!("{}", report.summary());

    if let Some(path) = csv {
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        report.write_csv(BufWriter::new(file))?;
        println!("✅ Trajectory written to {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // load .env

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;

    let filter = if cli.debug { "orion_rs=debug,orion=debug" } else { settings.log_filter.as_str() };
    telemetry::init_tracing(filter);
    telemetry::init_metrics(settings.metrics_port);

    match cli.command {
        Command::Normalize(args) => {
            let intent = load_intent(&args, &settings)?;
            print_intent(&intent);
            let normalized = session(&settings, args.fuzz).prepare(&intent)?;
            println!("{}", serde_json::to_string_pretty(&normalized)?);
        }
        Command::Submit { intent, encoding, dry_run } => {
            run_submit(&settings, &intent, encoding, dry_run).await?;
        }
        Command::History => run_history(&settings.journal_path).await?,
        Command::Simulate { epochs, seed, csv } => run_simulate(&settings, epochs, seed, csv)?,
    }

    Ok(())
}
