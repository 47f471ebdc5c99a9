//! The `sprout tips` command: fetch or regenerate daily tips.

use crate::platform::build_platform;
use chrono::NaiveDate;
use clap::Args;
use sprout_core::{Config, Sprout};

/// Arguments for the `tips` command.
#[derive(Args, Debug)]
pub struct TipsArgs {
    /// Baby id the tips are for
    #[arg(long)]
    pub baby: i64,

    /// Calendar date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Force regeneration instead of using cached/stored tips
    #[arg(long)]
    pub regenerate: bool,
}

/// Execute the tips command.
pub async fn execute(args: TipsArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let platform = build_platform(&config);
    let sprout = Sprout::new(config, platform);

    let tips = if args.regenerate {
        sprout.tips().generate(args.baby, args.date).await?
    } else {
        sprout.tips().tips(args.baby, args.date).await
    };

    if tips.is_empty() {
        println!("No tips available.");
        return Ok(());
    }

    for tip in &tips {
        println!("[{}] {}", tip.category, tip.title);
        println!("    {}", tip.content);
    }
    Ok(())
}
