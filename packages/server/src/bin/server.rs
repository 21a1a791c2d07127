//! PeerSend signaling broker.
//!
//! Pairs a file sender with receivers through a 6-digit code and relays their
//! WebRTC signaling messages.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin peersend-server
//! cargo run --bin peersend-server -- --host 0.0.0.0 --port 3000 --static-dir public
//! ```

use std::{num::NonZeroUsize, path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use peersend_server::{
    app::build_server,
    config::BrokerConfig,
    domain::{CollisionPolicy, ReceiverCapacity},
};
use peersend_shared::logger::setup_logger;

/// Behaviour when a freshly generated code is already in use
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CollisionPolicyArg {
    /// The new session takes the code over
    Replace,
    /// Generate codes until a free one is found
    Reroll,
}

impl From<CollisionPolicyArg> for CollisionPolicy {
    fn from(arg: CollisionPolicyArg) -> Self {
        match arg {
            CollisionPolicyArg::Replace => CollisionPolicy::Replace,
            CollisionPolicyArg::Reroll => CollisionPolicy::Reroll,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "peersend-server")]
#[command(about = "WebRTC signaling broker for PeerSend", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "PEERSEND_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Receivers allowed per session (unlimited when omitted, 1 = single receiver)
    #[arg(long, env = "PEERSEND_MAX_RECEIVERS")]
    max_receivers: Option<NonZeroUsize>,

    /// What to do when a generated code collides with a live session
    #[arg(
        long,
        env = "PEERSEND_COLLISION_POLICY",
        value_enum,
        default_value_t = CollisionPolicyArg::Replace
    )]
    collision_policy: CollisionPolicyArg,

    /// Close sessions nobody joined after this many seconds
    #[arg(
        long,
        env = "PEERSEND_IDLE_SESSION_TTL_SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    idle_session_ttl_secs: Option<u64>,

    /// Directory of static files served for paths outside /ws and /api
    #[arg(long, env = "PEERSEND_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn broker_config(&self) -> BrokerConfig {
        BrokerConfig {
            receiver_capacity: ReceiverCapacity::from_limit(self.max_receivers),
            collision_policy: self.collision_policy.into(),
            idle_session_ttl: self.idle_session_ttl_secs.map(Duration::from_secs),
            static_dir: self.static_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = args.broker_config();
    tracing::info!(
        "Receiver capacity: {}, collision policy: {:?}",
        config
            .receiver_capacity
            .limit()
            .map_or("unlimited".to_string(), |limit| limit.to_string()),
        config.collision_policy
    );

    let server = build_server(config);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
