use std::cmp::Ordering;

use futures::{StreamExt, stream};
use tracing::{debug, warn};

use crate::{
    error::AppResult,
    llm::LlmClient,
    models::{Recommendation, SearchHit},
    query::construct_user_query,
    search::SearchClient,
    store::MovieStore,
    tmdb::{self, TmdbClient},
};

/// Runs the whole pipeline for one request: extract tags, build the
/// query, search the index, rank, then enrich the top hits.
///
/// A tag-extraction parse failure degrades to an empty result list; a
/// failed enrichment leaves the affected fields unset on that hit.
pub async fn find_recommendations(
    llm: &LlmClient,
    search: &SearchClient,
    store: &MovieStore,
    tmdb: &TmdbClient,
    input: &str,
    limit: usize,
    max_concurrent: usize,
) -> AppResult<Vec<Recommendation>> {
    let preferences = match llm.extract_tags(input).await? {
        Ok(preferences) => preferences,
        Err(err) => {
            warn!(error = %err, "tag extraction produced unusable output");
            return Ok(Vec::new());
        },
    };

    debug!(?preferences, "extracted preferences");

    if preferences.is_empty() {
        debug!("no usable preferences extracted");
        return Ok(Vec::new());
    }

    let (query, filter) = construct_user_query(&preferences);
    if query.is_empty() && filter.is_empty() {
        debug!("nothing to search for");
        return Ok(Vec::new());
    }

    let hits = search.search(&query, &filter).await?;
    let top = rank_hits(hits, limit);
    debug!(top = top.len(), "ranked hits");

    enrich(store, tmdb, &top, max_concurrent).await
}

/// Re-sorts index hits by popularity descending and truncates. Missing
/// popularity sorts as zero.
fn rank_hits(mut hits: Vec<SearchHit>, limit: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| b.popularity.partial_cmp(&a.popularity).unwrap_or(Ordering::Equal));
    hits.truncate(limit);
    hits
}

/// Attaches IMDB link, poster, rating and plot to each hit. Local data
/// wins; TMDB fills whatever the store could not.
async fn enrich(
    store: &MovieStore,
    tmdb: &TmdbClient,
    hits: &[SearchHit],
    max_concurrent: usize,
) -> AppResult<Vec<Recommendation>> {
    let mut pending = Vec::new();
    for hit in hits {
        let Some(rec) = Recommendation::from_hit(hit) else {
            warn!(id = %hit.id, "hit has a non-numeric id, skipping");
            continue;
        };
        pending.push(rec);
    }

    let ids: Vec<i64> = pending.iter().map(|r| r.id).collect();
    let links = store.links_map(&ids).await?;
    let movies = store.movies_map(&ids).await?;

    let mut work = Vec::new();
    for mut rec in pending {
        let mut tmdb_id = None;

        if let Some(link) = links.get(&rec.id) {
            if let Some(imdb) = link.imdb_id {
                rec.imdb_id = Some(tmdb::format_imdb_id(imdb));
                rec.imdb_url = Some(tmdb::imdb_url(imdb));
            }
            if let Some(path) = &link.poster_path {
                rec.poster_url = Some(tmdb::poster_url(path));
            }
            tmdb_id = link.tmdb_id;
        }

        if let Some(movie) = movies.get(&rec.id) {
            rec.rating = Some(movie.popularity);
            rec.plot = movie.overview.clone();
        }

        work.push((rec, tmdb_id));
    }

    let results = stream::iter(work)
        .map(|(mut rec, tmdb_id)| async move {
            let missing_fields =
                rec.poster_url.is_none() || rec.rating.is_none() || rec.plot.is_none();
            let Some(tmdb_id) = tmdb_id.filter(|_| missing_fields) else {
                return rec;
            };

            match tmdb.movie_details(tmdb_id).await {
                Ok(Some(details)) => {
                    if rec.poster_url.is_none() {
                        rec.poster_url = details.poster_path.as_deref().map(tmdb::poster_url);
                    }
                    if rec.rating.is_none() {
                        rec.rating = details.vote_average;
                    }
                    if rec.plot.is_none() {
                        rec.plot = details.overview;
                    }
                },
                Ok(None) => debug!(tmdb_id, "no TMDB details found"),
                Err(err) => {
                    warn!(tmdb_id, error = %err, "failed to fetch TMDB details");
                },
            }
            rec
        })
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, popularity: f64, score: f64) -> SearchHit {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "title": format!("Movie {id}"),
            "popularity": popularity,
            "_score": score,
        }))
        .unwrap()
    }

    #[test]
    fn ranking_sorts_by_popularity_descending() {
        let hits = vec![hit("1", 2.0, 0.9), hit("2", 30.0, 0.1), hit("3", 7.5, 0.5)];
        let ranked = rank_hits(hits, 10);
        let ids: Vec<&str> = ranked.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
    }

    #[test]
    fn ranking_truncates_to_limit() {
        let hits = vec![hit("1", 1.0, 0.1), hit("2", 2.0, 0.2), hit("3", 3.0, 0.3)];
        assert_eq!(rank_hits(hits, 2).len(), 2);
    }

    #[test]
    fn missing_popularity_sorts_last() {
        let json = serde_json::json!({ "_id": "4", "title": "Movie 4", "_score": 1.0 });
        let no_pop: SearchHit = serde_json::from_value(json).unwrap();
        let ranked = rank_hits(vec![no_pop, hit("5", 0.1, 0.0)], 10);
        assert_eq!(ranked[0].id, "5");
        assert_eq!(ranked[1].id, "4");
    }
}
