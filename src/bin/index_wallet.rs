use clap::Parser;

use pain_or_gains::analysis::normalize_address;
use pain_or_gains::config::AppConfig;
use pain_or_gains::models::Blockchain;
use pain_or_gains::{db, init_tracing, metrics, AppState};

#[derive(Parser, Debug)]
#[command(name = "index_wallet")]
#[command(about = "Index one wallet's token transfers into the database", long_about = None)]
struct Args {
    /// Wallet address
    wallet: String,

    /// solana or base
    #[arg(default_value = "solana")]
    blockchain: Blockchain,

    /// Ignore the stored cursor and refetch from the newest transaction
    #[arg(long)]
    full: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let wallet = normalize_address(&args.wallet, args.blockchain)?;

    let config = AppConfig::from_env()?;
    let pool = db::init_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let state = AppState::new(pool, config, metrics::init_metrics())?;
    let outcome = state
        .indexer
        .index_wallet(&state.db, &wallet, args.blockchain, args.full)
        .await?;

    if outcome.skipped {
        println!("{wallet} on {} was indexed recently; use --full to refetch", args.blockchain);
    } else {
        println!(
            "Indexed {} new transactions for {wallet} on {}{}",
            outcome.stored,
            args.blockchain,
            if outcome.complete { "" } else { " (incomplete, run again to continue)" }
        );
    }
    Ok(())
}
