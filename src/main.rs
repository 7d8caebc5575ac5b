use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wallet_auth::config::{environment::Config, init_db};
use wallet_auth::modules::auth::crud::UserCrud;
use wallet_auth::modules::auth::interface::UserStore;
use wallet_auth::modules::messages::crud::MessageCrud;
use wallet_auth::modules::messages::interface::MessageStore;
use wallet_auth::services::session::{MemorySessionStore, RedisSessionStore, SessionStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wallet_auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load environment configuration");

    let db = init_db(&config.database_url).await;
    tracing::info!("Connected to MySQL");

    let session_store: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => {
            let store = RedisSessionStore::connect(url)
                .await
                .expect("Failed to connect to Redis");
            tracing::info!("Connected to Redis");
            Arc::new(store)
        }
        None => {
            tracing::warn!("REDIS_URL not set, sessions are in-memory and lost on restart");
            Arc::new(MemorySessionStore::new())
        }
    };

    let users: Arc<dyn UserStore> = Arc::new(UserCrud::new(db.clone()));
    let messages: Arc<dyn MessageStore> = Arc::new(MessageCrud::new(db));

    let app = wallet_auth::create_app(users, messages, session_store, config.app).await;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap();
    tracing::info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await.unwrap();
}
