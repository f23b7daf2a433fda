use std::net::SocketAddr;

use anyhow::Context;

/// Closed genre vocabulary handed to the extraction prompt. Matches the
/// genre names present in the MovieLens CSV exports, lowercased.
pub const GENRES: &[&str] = &[
    "action",
    "adventure",
    "animation",
    "children",
    "comedy",
    "crime",
    "documentary",
    "drama",
    "fantasy",
    "film-noir",
    "horror",
    "imax",
    "musical",
    "mystery",
    "romance",
    "sci-fi",
    "thriller",
    "war",
    "western",
];

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub dataset_dir: String,
    pub marqo_url: String,
    pub marqo_index: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub tmdb_rps: u32,
    pub result_limit: usize,
    pub max_concurrent: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://cinematch.db?mode=rwc".to_string());

        let dataset_dir =
            std::env::var("DATASET_DIR").unwrap_or_else(|_| "datasets/ml-latest".to_string());

        let marqo_url =
            std::env::var("MARQO_URL").unwrap_or_else(|_| "http://localhost:8882".to_string());
        let marqo_index = std::env::var("MARQO_INDEX").unwrap_or_else(|_| "movies".to_string());

        let openai_api_key = std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| "".to_string());
        let openai_base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let openai_model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let tmdb_api_key = std::env::var("TMDB_API_KEY").unwrap_or_else(|_| "".to_string());
        let tmdb_base_url = std::env::var("TMDB_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string());
        let tmdb_rps: u32 =
            std::env::var("TMDB_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(4);

        let result_limit: usize =
            std::env::var("RESULT_LIMIT").ok().and_then(|s| s.parse().ok()).unwrap_or(10);

        let max_concurrent: usize =
            std::env::var("MAX_CONCURRENT_REQUESTS").ok().and_then(|s| s.parse().ok()).unwrap_or(5);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            dataset_dir,
            marqo_url,
            marqo_index,
            openai_api_key,
            openai_base_url,
            openai_model,
            tmdb_api_key,
            tmdb_base_url,
            tmdb_rps,
            result_limit,
            max_concurrent,
        })
    }
}
