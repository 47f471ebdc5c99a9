//! The `sprout login` command for token persistence.

use crate::platform::FileTokenStore;
use clap::Args;
use sprout_core::Config;

/// Arguments for the `login` command.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Bearer token issued by the Sprout service
    #[arg(long, env = "SPROUT_TOKEN")]
    pub token: String,
}

/// Execute the login command.
pub async fn execute(args: LoginArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let store = FileTokenStore::from_config(&config.auth);
    store.write_token(args.token.trim())?;
    println!("Token saved to {}", store.path().display());
    Ok(())
}
