use std::time::Duration;

use broadside::prelude::*;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Real-time multiplayer battleship server.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, env = "BROADSIDE_HOST", default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, env = "BROADSIDE_PORT", default_value = "3000")]
    port: u16,
    /// Delay before a bot attacks, in milliseconds
    #[clap(long, env = "BROADSIDE_BOT_DELAY_MS", default_value = "1000")]
    bot_delay_ms: u64,
    /// Ship cells every fleet must cover (0 accepts any fleet)
    #[clap(long, env = "BROADSIDE_FLEET_CELLS", default_value = "10")]
    fleet_cells: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);
    let battle = BattleConfig {
        fleet_cells: (args.fleet_cells > 0).then_some(args.fleet_cells),
        ..BattleConfig::default()
    };

    let server = BroadsideServer::builder()
        .bind(&address)
        .bot_delay(Duration::from_millis(args.bot_delay_ms))
        .battle_config(battle)
        .build()
        .await?;
    tracing::info!(addr = %server.local_addr()?, ?battle, "listening");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}
