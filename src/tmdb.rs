use std::{num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::Deserialize;

use crate::error::AppResult;

pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w200";

#[derive(Clone, Debug, Deserialize)]
pub struct MovieDetails {
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub overview: Option<String>,
}

pub struct TmdbClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(client: reqwest::Client, access_token: String, base_url: String, rps: u32) -> Self {
        // Warn once on app load if using mock data
        if access_token.trim().is_empty() {
            tracing::warn!("Using mock TMDB data - no TMDB_API_KEY provided");
        }

        let limiter =
            Arc::new(RateLimiter::direct(Quota::per_second(NonZeroU32::new(rps.max(1)).unwrap())));
        Self { client, access_token, base_url, limiter }
    }

    /// Fetches poster path, vote average and overview for a TMDB id.
    pub async fn movie_details(&self, tmdb_id: i64) -> AppResult<Option<MovieDetails>> {
        // Use mock data if access token is not provided
        if self.access_token.trim().is_empty() {
            return Ok(Some(MovieDetails {
                poster_path: None,
                vote_average: Some(7.0),
                overview: Some("Mock overview".to_string()),
            }));
        }

        self.limiter.until_ready().await;

        let url = format!("{}/movie/{}", self.base_url.trim_end_matches('/'), tmdb_id);
        let resp = self.client.get(url).bearer_auth(&self.access_token).send().await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let details: MovieDetails = resp.error_for_status()?.json().await?;
        Ok(Some(details))
    }
}

pub fn poster_url(poster_path: &str) -> String {
    format!("{POSTER_BASE_URL}{poster_path}")
}

/// Parses an IMDB identifier such as `tt0114709` (the `tt` prefix is
/// optional) into its numeric form.
pub fn parse_imdb_id(imdb_id: &str) -> Option<i64> {
    imdb_id.trim().strip_prefix("tt").unwrap_or(imdb_id.trim()).parse().ok()
}

/// Formats a numeric IMDB identifier back to its zero-padded form as
/// used in IMDB URLs.
pub fn format_imdb_id(imdb_id: i64) -> String {
    format!("{imdb_id:07}")
}

pub fn imdb_url(imdb_id: i64) -> String {
    format!("https://www.imdb.com/title/tt{}", format_imdb_id(imdb_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imdb_id_round_trips_through_padded_form() {
        let numeric = parse_imdb_id("tt0114709").unwrap();
        assert_eq!(numeric, 114709);
        assert_eq!(format_imdb_id(numeric), "0114709");
        assert_eq!(parse_imdb_id(&format_imdb_id(numeric)), Some(numeric));
    }

    #[test]
    fn bare_numeric_ids_parse() {
        assert_eq!(parse_imdb_id("0114709"), Some(114709));
        assert_eq!(parse_imdb_id("114709"), Some(114709));
    }

    #[test]
    fn long_ids_keep_their_width() {
        assert_eq!(format_imdb_id(10872600), "10872600");
    }

    #[test]
    fn garbage_is_no_id() {
        assert_eq!(parse_imdb_id("not-an-id"), None);
        assert_eq!(parse_imdb_id(""), None);
    }

    #[test]
    fn imdb_url_uses_padded_id() {
        assert_eq!(imdb_url(114709), "https://www.imdb.com/title/tt0114709");
    }
}
