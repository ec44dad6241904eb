use anyhow::Context;
use clap::Parser;
use permit_cli::{load_profile, resolve_config, Console, EditorReader, Session};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "permit")]
#[command(about = "Negotiate runtime permissions against a simulated device", long_about = None)]
struct Args {
    /// Device profile (JSON)
    profile: PathBuf,

    /// Negotiator config (JSON). Defaults to <config dir>/permit/config.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let profile = load_profile(&args.profile)
        .await
        .with_context(|| format!("loading profile {}", args.profile.display()))?;
    let config = resolve_config(args.config.as_deref()).await?;

    let console = Console::new(EditorReader::new()?);
    let mut session = Session::new(&profile, config, console.clone())?;

    loop {
        let report = session.run().await?;
        if report.satisfied || !console.confirm("\nNegotiate again? [y/n]: ")? {
            break;
        }
    }

    Ok(())
}
