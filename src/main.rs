mod config;
mod db;
mod entities;
mod error;
mod llm;
mod models;
mod query;
mod recommend;
mod routes;
mod search;
mod store;
mod templates;
mod tmdb;

use std::{sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config, llm::LlmClient, search::SearchClient, store::MovieStore, tmdb::TmdbClient,
};

pub struct AppState {
    pub config: Arc<Config>,
    pub store: MovieStore,
    pub search: SearchClient,
    pub llm: LlmClient,
    pub tmdb: TmdbClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,cinematch=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let http = reqwest::Client::builder()
        .user_agent("cinematch/0.1")
        .timeout(Duration::from_secs(30))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let store = MovieStore::new(db);

    let search =
        SearchClient::new(http.clone(), config.marqo_url.clone(), config.marqo_index.clone());

    // `<binary> init` loads the CSVs and rebuilds the index, then exits.
    if std::env::args().nth(1).as_deref() == Some("init") {
        store.ingest(&config.dataset_dir).await?;
        search.recreate_index().await?;
        let documents = store.documents().await?;
        search.add_documents(&documents).await?;
        tracing::info!(documents = documents.len(), "initialization complete");
        return Ok(());
    }

    let llm = LlmClient::new(
        http.clone(),
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.openai_model.clone(),
    );

    let tmdb = TmdbClient::new(
        http.clone(),
        config.tmdb_api_key.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_rps,
    );

    let state = Arc::new(AppState { config: config.clone(), store, search, llm, tmdb });

    let app = Router::new()
        .route("/", get(routes::index).post(routes::recommend))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
