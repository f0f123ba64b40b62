use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use speakeasy::audio::{AudioCache, GoogleTts, SpeechSynthesizer};
use speakeasy::config::Config;
use speakeasy::lessons::Catalog;
use speakeasy::state::AppState;
use speakeasy::{app, db, paths};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "speakeasy=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::load();

  let pool = db::init_db(&paths::db_path(&config.data_dir)).expect("Failed to initialize database");
  let catalog = Catalog::load(&config.lessons_dir).expect("Failed to load lessons");

  let synthesizer: Option<Arc<dyn SpeechSynthesizer>> = match &config.tts_api_key {
    Some(key) => Some(Arc::new(
      GoogleTts::new(key.as_str()).expect("Failed to build TTS client"),
    )),
    None => {
      tracing::info!("GOOGLE_TTS_API_KEY not set; serving recorded and cached audio only");
      None
    }
  };
  let audio = AudioCache::new(
    paths::audio_override_dir(&config.static_dir),
    paths::tts_cache_dir(&config.data_dir),
    synthesizer,
  );

  let bind_addr = config.bind_addr();
  let port = config.port;
  let state = AppState::new(config, pool, catalog, audio);

  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://localhost:{}", port);

  axum::serve(listener, app(state))
    .await
    .expect("Server failed to start");
}
