use anyhow::{Context, Result};
use churnkit::{
    annotate, high_risk, notify_high_risk, read_csv_path, write_csv, ChurnConfig,
    InferencePipeline, LogNotifier, TrainingPipeline,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "churnkit", version, about = "Train and apply customer churn models.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit a model on a labeled CSV and save the artifact
    Train(TrainArgs),
    /// Score a CSV of customers with a saved artifact
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Labeled training data
    #[arg(long)]
    data: PathBuf,

    /// Where to write the model artifact
    #[arg(long)]
    model: PathBuf,

    /// TOML configuration; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write a JSON rendering of the artifact and training report
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PredictArgs {
    /// Model artifact produced by `train`
    #[arg(long)]
    model: PathBuf,

    /// Customers to score
    #[arg(long)]
    data: PathBuf,

    /// Hand high-risk identifiers to the retention notifier
    #[arg(long)]
    notify: bool,

    /// Identifier column passed through to the output; defaults to the one
    /// recorded in the model
    #[arg(long)]
    identifier: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("churnkit=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Train(args) => train(args),
        Command::Predict(args) => predict(args),
    }
}

fn train(args: TrainArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => ChurnConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ChurnConfig::default(),
    };
    let table = read_csv_path(&args.data)
        .with_context(|| format!("reading training data {}", args.data.display()))?;

    let outcome = TrainingPipeline::new(config)?
        .fit(&table)
        .context("training failed")?;
    outcome
        .artifact
        .save_to_file(&args.model)
        .with_context(|| format!("writing model {}", args.model.display()))?;

    let report = &outcome.report;
    println!("model written to {}", args.model.display());
    println!("selected {}", outcome.artifact.hyperparameters);
    match report.search.best_score {
        Some(auc) => println!("cross-validated ROC AUC {:.4} over {} folds", auc, report.search.n_folds),
        None => println!("grid search skipped; too few samples per class"),
    }
    for score in &report.search.scores {
        match score.mean_auc {
            Some(auc) => println!("  {:<24} mean AUC {:.4}", score.candidate.to_string(), auc),
            None => println!("  {:<24} not converged", score.candidate.to_string()),
        }
    }
    println!("train rows {}, test rows {}", report.n_train, report.n_test);
    match &report.test_metrics {
        Some(m) => println!("test {}", m),
        None => println!("test split is empty"),
    }

    if let Some(path) = &args.json {
        let json = serde_json::json!({
            "artifact": serde_json::to_value(&outcome.artifact)?,
            "report": serde_json::to_value(report)?,
        });
        std::fs::write(path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn predict(args: PredictArgs) -> Result<()> {
    let mut pipeline = InferencePipeline::load(&args.model)
        .with_context(|| format!("loading model {}", args.model.display()))?;
    if let Some(column) = &args.identifier {
        pipeline = pipeline.with_identifier(Some(column.clone()));
    }
    let table = read_csv_path(&args.data)
        .with_context(|| format!("reading {}", args.data.display()))?;
    let results = pipeline.predict(&table).context("scoring failed")?;

    let output = annotate(&table, &results)?;
    write_csv(&output, std::io::stdout().lock())?;

    let flagged: Vec<_> = high_risk(&results).collect();
    eprintln!("{} of {} customers flagged high-risk", flagged.len(), results.len());
    for r in &flagged {
        match &r.identifier {
            Some(id) => eprintln!("  {} ({})", id, r.probability_percent()),
            None => eprintln!("  row {} ({})", r.row, r.probability_percent()),
        }
    }

    if args.notify {
        let id_present = pipeline
            .identifier_column()
            .is_some_and(|c| table.has_column(c));
        if !id_present {
            tracing::warn!(
                column = pipeline.identifier_column().unwrap_or("<none>"),
                "no identifier column; retention notifications disabled"
            );
            return Ok(());
        }
        let summary = notify_high_risk(&LogNotifier, &results);
        eprintln!(
            "notified {}, skipped {} without identifier, {} failed",
            summary.notified.len(),
            summary.skipped_rows.len(),
            summary.failed.len()
        );
    }
    Ok(())
}
