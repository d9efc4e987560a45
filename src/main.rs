//! voice-reminder: spoken reminder service for Linux.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use voice_reminder::api::{self, ApiState};
use voice_reminder::config::Config;
use voice_reminder::notifier::Notifier;
use voice_reminder::reminder::{ReminderEngine, TaskStore};
use voice_reminder::service::ReminderService;
use voice_reminder::speech::{DisabledSpeaker, GeminiSpeaker, Speaker};

#[derive(Parser, Debug)]
#[command(name = "voice-reminder", about = "Spoken reminder service")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the reminder files (overrides storage.data_dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Never call the speech API; every reminder becomes a notification
    #[arg(long)]
    no_speech: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging (suppress noisy HTTP internals)
    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info")
    } else {
        EnvFilter::new("info,hyper=warn,reqwest=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("voice-reminder starting");

    let config = Config::load(args.config.as_deref());

    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| config.storage.resolve_dir());
    let store = TaskStore::new(data_dir);

    let speaker: Arc<dyn Speaker> = if args.no_speech || !config.speech.enabled {
        info!("Speech disabled, reminders will be shown as notifications");
        Arc::new(DisabledSpeaker)
    } else {
        match GeminiSpeaker::new(&config.speech) {
            Ok(speaker) => {
                if !speaker.has_api_key() {
                    warn!(
                        "No Gemini API key (speech.api_key or ${}), reminders will fall back to notifications",
                        config.speech.api_key_env
                    );
                }
                info!(
                    "Speech: model {} voice {}",
                    config.speech.model, config.speech.voice
                );
                Arc::new(speaker)
            }
            Err(e) => {
                warn!("Failed to set up speech client: {e}");
                Arc::new(DisabledSpeaker)
            }
        }
    };

    let notifier = Arc::new(Notifier::new(config.feedback.notifications));
    let engine = Arc::new(ReminderEngine::open(store, speaker, notifier));

    if config.api.enabled {
        let state = ApiState {
            engine: engine.clone(),
        };
        api::start_api(state, config.api.port).await;
    }

    let service = ReminderService::new(engine, &config.scheduler);
    service.run().await?;

    Ok(())
}
