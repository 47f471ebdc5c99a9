//! The `sprout analyze` command: submit an analysis and watch it finish.

use crate::platform::build_platform;
use chrono::NaiveDate;
use clap::Args;
use sprout_core::{AnalysisStatus, AnalysisType, Config, Sprout};

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Baby id to analyze
    #[arg(long)]
    pub baby: i64,

    /// Analysis type: feeding, sleep, growth, or health
    #[arg(long = "type", value_name = "TYPE")]
    pub analysis_type: String,

    /// Window start (YYYY-MM-DD)
    #[arg(long)]
    pub from: NaiveDate,

    /// Window end (YYYY-MM-DD)
    #[arg(long)]
    pub to: NaiveDate,

    /// Return immediately after submission instead of waiting
    #[arg(long)]
    pub no_wait: bool,
}

/// Execute the analyze command.
pub async fn execute(args: AnalyzeArgs) -> anyhow::Result<()> {
    let analysis_type: AnalysisType = args
        .analysis_type
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let config = Config::load()?;
    let platform = build_platform(&config);
    let sprout = Sprout::new(config, platform);

    let job = sprout
        .analysis()
        .submit(args.baby, analysis_type, args.from, args.to)
        .await?;
    println!(
        "Submitted {} analysis {} for baby {} ({} → {})",
        analysis_type, job.id, args.baby, args.from, args.to
    );

    if args.no_wait {
        return Ok(());
    }

    // The background poll sequence drives the job to a terminal state
    // (including a forced failure on exhaustion); watch its snapshots.
    let interval = sprout.config().polling.interval();
    let outcome = loop {
        tokio::time::sleep(interval).await;
        let Some(current) = sprout.analysis().job(job.id) else {
            anyhow::bail!("analysis {} disappeared from the registry", job.id);
        };
        if current.status.is_terminal() {
            break current;
        }
        tracing::debug!(analysis = current.id, status = %current.status, "still running");
    };

    match outcome.status {
        AnalysisStatus::Completed => {
            match outcome.score {
                Some(score) => println!("Completed with score {score:.0}"),
                None => println!("Completed"),
            }
            println!(
                "{} insight(s), {} alert(s)",
                outcome.insights.len(),
                outcome.alerts.len()
            );
            for item in sprout.analysis().attention_items(args.baby) {
                println!("  [{:?}] {}: {}", item.level, item.title, item.description);
            }
            Ok(())
        }
        _ => anyhow::bail!("analysis {} failed", outcome.id),
    }
}
