use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use kitten_leaderboard::leaderboard::DEFAULT_LEADERBOARD_KEY;
use kitten_leaderboard::realtime::hub::DEFAULT_HUB_CAPACITY;
use kitten_leaderboard::server::{run_server, ServerConfig};

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";

#[derive(Debug, Parser)]
#[command(name = "kitten_server")]
#[command(about = "Serve player game state and the live leaderboard", long_about = None)]
struct Args {
    /// Address to bind the HTTP server to (host:port)
    #[arg(long, env = "SERVER_BIND", default_value = DEFAULT_BIND)]
    bind: SocketAddr,

    /// Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = DEFAULT_REDIS_URL)]
    redis_url: String,

    /// Sorted-set key holding the leaderboard
    #[arg(long, env = "LEADERBOARD_KEY", default_value = DEFAULT_LEADERBOARD_KEY)]
    leaderboard_key: String,

    /// Pending leaderboard pushes buffered per realtime connection
    #[arg(long, env = "SERVER_BROADCAST_CAPACITY", default_value_t = DEFAULT_HUB_CAPACITY)]
    broadcast_capacity: usize,

    /// Toggle structured (JSON) logs
    #[arg(long, env = "SERVER_LOG_JSON", default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();
    init_tracing(args.json);
    let config = build_config(args)?;
    run_server(config).await
}

fn load_dotenv() {
    let manifest_env = env!("CARGO_MANIFEST_DIR");
    let manifest_env_path = PathBuf::from(manifest_env).join(".env");
    dotenv::from_filename(manifest_env_path).ok();
    dotenv::dotenv().ok();
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_target(false);

    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }
}

fn build_config(args: Args) -> Result<ServerConfig> {
    if args.leaderboard_key.trim().is_empty() {
        return Err(anyhow!("leaderboard key cannot be empty"));
    }
    if args.broadcast_capacity == 0 {
        return Err(anyhow!("broadcast capacity must be at least 1"));
    }

    Ok(ServerConfig {
        bind: args.bind,
        redis_url: args.redis_url,
        leaderboard_key: args.leaderboard_key,
        broadcast_capacity: args.broadcast_capacity,
    })
}
