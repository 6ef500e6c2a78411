use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use ractor::Actor;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use visualizer::actors::playback::{PlaybackActor, PlaybackArguments};
use visualizer::api;
use visualizer::config::load_config;
use visualizer::evaluator::{Evaluator, EvaluatorClient};

fn load_env_file() {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(error = %e, "Could not determine current directory for .env lookup");
            return;
        }
    };

    let mut current = cwd.clone();
    loop {
        let candidate = current.join(".env");
        if candidate.exists() {
            match dotenvy::from_path(&candidate) {
                Ok(_) => {
                    tracing::info!(path = %candidate.display(), "Loaded environment from .env");
                }
                Err(e) => {
                    tracing::warn!(
                        path = %candidate.display(),
                        error = %e,
                        "Failed to load .env file"
                    );
                }
            }
            return;
        }

        if !current.pop() {
            break;
        }
    }

    tracing::debug!(cwd = %cwd.display(), "No .env file found; using process environment only");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("VISUALIZER_LOG_JSON").is_ok_and(|value| value == "1");
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Search the current directory and ancestors so running from `visualizer/`
    // still picks up a repo-root `.env`.
    load_env_file();

    let config = load_config();
    tracing::info!(
        evaluator = %config.evaluator.base_url,
        autoplay_ms = config.playback.autoplay_interval_ms,
        reset_position = ?config.playback.reset_position,
        "Starting playback visualizer"
    );

    let evaluator: Arc<dyn Evaluator> = Arc::new(EvaluatorClient::new(
        config.evaluator.base_url.clone(),
        config.evaluator.timeout(),
    ));

    let (playback, _playback_handle) = Actor::spawn(
        Some("playback".to_string()),
        PlaybackActor,
        PlaybackArguments {
            evaluator: evaluator.clone(),
            settings: config.playback.clone(),
        },
    )
    .await?;

    let allowed_origins = config
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Skipping invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    let api_state = api::ApiState {
        playback: playback.clone(),
        evaluator,
    };
    let app = api::router()
        .with_state(api_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!(addr = %config.server.bind_addr, "HTTP server listening");
    axum::serve(listener, app).await?;

    playback.stop(None);
    Ok(())
}
