//! ClassMood live classroom server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin classmood-server
//! cargo run --bin classmood-server -- --host 0.0.0.0 --port 5001 --emotion-log emotions.jsonl
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use tokio::sync::Mutex;

use classmood_server::{
    domain::{AggregationStore, EmotionLog, SessionRegistry},
    infrastructure::{
        classifier::HttpEmotionClassifier,
        emotion_log::{DisabledEmotionLog, JsonLinesEmotionLog},
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryAggregateRepository, InMemorySessionRepository},
    },
    ui::{AppState, Server},
    usecase::PipelineConfig,
};
use classmood_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "classmood-server")]
#[command(about = "Live classroom engagement server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "CLASSMOOD_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "5001")]
    port: u16,

    /// Endpoint of the emotion classification service
    #[arg(
        long,
        env = "CLASSIFIER_URL",
        default_value = "http://localhost:8000/analyze"
    )]
    classifier_url: String,

    /// Upper bound for a single classification call (seconds)
    #[arg(
        long,
        env = "CLASSIFIER_TIMEOUT_SECS",
        default_value = "15",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    classifier_timeout_secs: u64,

    /// Append classified emotions to this JSON-lines file (disabled when unset)
    #[arg(long, env = "EMOTION_LOG_PATH")]
    emotion_log: Option<PathBuf>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "debug")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = PipelineConfig {
        classifier_timeout: Duration::from_secs(args.classifier_timeout_secs),
        ..Default::default()
    };

    // Initialize dependencies in order:
    // 1. Repositories
    // 2. MessagePusher and external collaborators
    // 3. UseCases (AppState)
    // 4. Server

    // 1. Create Repositories (in-memory)
    let sessions = Arc::new(InMemorySessionRepository::new(Arc::new(Mutex::new(
        SessionRegistry::new(config.pending_capacity),
    ))));
    let aggregates = Arc::new(InMemoryAggregateRepository::new(Arc::new(Mutex::new(
        AggregationStore::new(config.history_capacity, config.summary_sample),
    ))));

    // 2. Create MessagePusher (WebSocket implementation), classifier and emotion log
    let message_pusher = Arc::new(WebSocketMessagePusher::default());
    let classifier = Arc::new(HttpEmotionClassifier::new(args.classifier_url));
    tracing::info!(
        "Classifier endpoint: {} (timeout {}s)",
        classifier.url(),
        args.classifier_timeout_secs
    );
    let emotion_log: Arc<dyn EmotionLog> = match args.emotion_log {
        Some(path) => {
            let log = JsonLinesEmotionLog::new(path);
            tracing::info!("Persisting emotions to {}", log.path().display());
            Arc::new(log)
        }
        None => {
            tracing::info!("Emotion persistence disabled");
            Arc::new(DisabledEmotionLog)
        }
    };

    // 3. Create UseCases
    let app_state = AppState::new(
        sessions,
        aggregates,
        message_pusher,
        classifier,
        emotion_log,
        Arc::new(SystemClock),
        config,
    );

    // 4. Create and run the server
    let server = Server::new(app_state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
