//! The `sprout overview` command: stats, latest analyses, attention items.

use crate::platform::build_platform;
use clap::Args;
use sprout_core::{AnalysisType, Config, Sprout};

/// Arguments for the `overview` command.
#[derive(Args, Debug)]
pub struct OverviewArgs {
    /// Baby id to summarize
    #[arg(long)]
    pub baby: i64,
}

/// Execute the overview command.
pub async fn execute(args: OverviewArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let platform = build_platform(&config);
    let sprout = Sprout::new(config, platform);

    let stats = sprout.analysis().fetch_stats(args.baby).await?;
    println!(
        "Analyses: {} total ({} completed, {} pending, {} failed)",
        stats.total, stats.completed, stats.pending, stats.failed
    );
    if let Some(average) = stats.average_score {
        println!("Average score: {average:.1}");
    }

    // Hydrate the registry with the latest result of each type, then derive
    // attention items from whatever completed.
    for analysis_type in AnalysisType::ALL {
        match sprout.analysis().fetch_latest(args.baby, analysis_type).await? {
            Some(latest) => match latest.score {
                Some(score) => println!("  {analysis_type}: score {score:.0}"),
                None => println!("  {analysis_type}: {}", latest.status),
            },
            None => println!("  {analysis_type}: no analysis yet"),
        }
    }

    let attention = sprout.analysis().attention_items(args.baby);
    if attention.is_empty() {
        println!("Nothing needs attention.");
    } else {
        println!("Needs attention:");
        for item in attention {
            println!("  [{:?}] {}: {}", item.level, item.title, item.description);
        }
    }
    Ok(())
}
