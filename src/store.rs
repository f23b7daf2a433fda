use std::{collections::HashMap, path::Path};

use sea_orm::{ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter};
use serde::Deserialize;
use tracing::info;

use crate::{
    entities::{actor, genre, keyword, link, movie, movie_genre},
    error::AppResult,
    models::SearchDocument,
};

const GENRE_SEPARATOR: char = '|';
const NO_GENRES_SENTINEL: &str = "(no genres listed)";
const INSERT_BATCH_SIZE: usize = 500;

#[derive(Debug, Deserialize)]
struct MovieRow {
    #[serde(rename = "movieId")]
    movie_id: i64,
    title: String,
    year: Option<i32>,
    director: Option<String>,
    overview: Option<String>,
    popularity: Option<f64>,
    genres: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeywordRow {
    movie_id: i64,
    keywords: String,
}

#[derive(Debug, Deserialize)]
struct ActorRow {
    movie_id: i64,
    actor_name: String,
}

#[derive(Debug, Deserialize)]
struct LinkRow {
    #[serde(rename = "movieId")]
    movie_id: i64,
    #[serde(rename = "imdbId")]
    imdb_id: Option<String>,
    #[serde(rename = "tmdbId")]
    tmdb_id: Option<i64>,
    poster_path: Option<String>,
}

impl LinkRow {
    /// The CSV stores IMDB ids zero-padded, occasionally with the `tt`
    /// prefix; both forms reduce to the numeric id.
    fn numeric_imdb_id(&self) -> Option<i64> {
        self.imdb_id.as_deref().and_then(crate::tmdb::parse_imdb_id)
    }
}

/// Read side and CSV-ingest side of the relational movie store.
#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads the MovieLens-style CSV exports into the database. Run once
    /// in init mode; tables are assumed empty.
    pub async fn ingest(&self, dataset_dir: &str) -> AppResult<()> {
        let dir = Path::new(dataset_dir);

        info!("loading movies");
        self.load_movies(&dir.join("movies.csv")).await?;
        info!("loading keywords");
        self.load_keywords(&dir.join("keywords.csv")).await?;
        info!("loading actors");
        self.load_actors(&dir.join("actors.csv")).await?;
        info!("loading links");
        self.load_links(&dir.join("links.csv")).await?;
        info!("csv ingest complete");

        Ok(())
    }

    async fn load_movies(&self, path: &Path) -> AppResult<()> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows: Vec<MovieRow> = reader.deserialize().collect::<Result<_, _>>()?;

        let genre_ids = self.create_genres(&rows).await?;

        let mut movies = Vec::new();
        let mut pairs = Vec::new();

        for row in rows {
            movies.push(movie::ActiveModel {
                id: Set(row.movie_id),
                title: Set(row.title),
                year: Set(row.year),
                director: Set(row.director),
                overview: Set(row.overview),
                popularity: Set(row.popularity.unwrap_or(0.0)),
            });

            for name in split_genres(row.genres.as_deref()) {
                if let Some(genre_id) = genre_ids.get(name) {
                    pairs.push(movie_genre::ActiveModel {
                        movie_id: Set(row.movie_id),
                        genre_id: Set(*genre_id),
                    });
                }
            }
        }

        let movie_count = movies.len();
        for chunk in movies.chunks(INSERT_BATCH_SIZE) {
            movie::Entity::insert_many(chunk.to_vec()).exec(&self.db).await?;
        }
        for chunk in pairs.chunks(INSERT_BATCH_SIZE) {
            movie_genre::Entity::insert_many(chunk.to_vec()).exec(&self.db).await?;
        }

        info!(movies = movie_count, "movies loaded");
        Ok(())
    }

    /// Inserts the deduplicated genre names and returns name -> id.
    async fn create_genres(&self, rows: &[MovieRow]) -> AppResult<HashMap<String, i32>> {
        let mut names: Vec<&str> = rows
            .iter()
            .flat_map(|row| split_genres(row.genres.as_deref()))
            .collect();
        names.sort_unstable();
        names.dedup();

        if !names.is_empty() {
            let models = names
                .iter()
                .map(|name| genre::ActiveModel { id: NotSet, name: Set(name.to_string()) })
                .collect::<Vec<_>>();
            genre::Entity::insert_many(models).exec(&self.db).await?;
        }

        let stored = genre::Entity::find().all(&self.db).await?;
        Ok(stored.into_iter().map(|g| (g.name, g.id)).collect())
    }

    async fn load_keywords(&self, path: &Path) -> AppResult<()> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows: Vec<KeywordRow> = reader.deserialize().collect::<Result<_, _>>()?;

        let models = rows
            .into_iter()
            .map(|row| keyword::ActiveModel {
                id: NotSet,
                movie_id: Set(row.movie_id),
                keywords: Set(row.keywords),
            })
            .collect::<Vec<_>>();

        for chunk in models.chunks(INSERT_BATCH_SIZE) {
            keyword::Entity::insert_many(chunk.to_vec()).exec(&self.db).await?;
        }
        Ok(())
    }

    async fn load_actors(&self, path: &Path) -> AppResult<()> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows: Vec<ActorRow> = reader.deserialize().collect::<Result<_, _>>()?;

        let models = rows
            .into_iter()
            .map(|row| actor::ActiveModel {
                id: NotSet,
                movie_id: Set(row.movie_id),
                actor_name: Set(row.actor_name),
            })
            .collect::<Vec<_>>();

        for chunk in models.chunks(INSERT_BATCH_SIZE) {
            actor::Entity::insert_many(chunk.to_vec()).exec(&self.db).await?;
        }
        Ok(())
    }

    async fn load_links(&self, path: &Path) -> AppResult<()> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows: Vec<LinkRow> = reader.deserialize().collect::<Result<_, _>>()?;

        let models = rows
            .into_iter()
            .map(|row| link::ActiveModel {
                movie_id: Set(row.movie_id),
                imdb_id: Set(row.numeric_imdb_id()),
                tmdb_id: Set(row.tmdb_id),
                poster_path: Set(row.poster_path),
            })
            .collect::<Vec<_>>();

        for chunk in models.chunks(INSERT_BATCH_SIZE) {
            link::Entity::insert_many(chunk.to_vec()).exec(&self.db).await?;
        }
        Ok(())
    }

    /// Flattens every movie with its grouped genres, actors and keyword
    /// text into the documents uploaded to the vector index.
    pub async fn documents(&self) -> AppResult<Vec<SearchDocument>> {
        let movies = movie::Entity::find().all(&self.db).await?;

        let genre_names: HashMap<i32, String> = genre::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|g| (g.id, g.name))
            .collect();

        let mut genres_by_movie: HashMap<i64, Vec<String>> = HashMap::new();
        for pair in movie_genre::Entity::find().all(&self.db).await? {
            if let Some(name) = genre_names.get(&pair.genre_id) {
                genres_by_movie.entry(pair.movie_id).or_default().push(name.clone());
            }
        }

        let mut actors_by_movie: HashMap<i64, Vec<String>> = HashMap::new();
        for row in actor::Entity::find().all(&self.db).await? {
            actors_by_movie.entry(row.movie_id).or_default().push(row.actor_name);
        }

        let mut keywords_by_movie: HashMap<i64, String> = HashMap::new();
        for row in keyword::Entity::find().all(&self.db).await? {
            let entry = keywords_by_movie.entry(row.movie_id).or_default();
            if !entry.is_empty() {
                entry.push(' ');
            }
            entry.push_str(&row.keywords);
        }

        let documents = movies
            .into_iter()
            .map(|m| {
                let genres = genres_by_movie.remove(&m.id).unwrap_or_default();
                let actors = actors_by_movie.remove(&m.id).unwrap_or_default();
                let keywords = keywords_by_movie.remove(&m.id);
                format_document(&m, genres, actors, keywords.as_deref())
            })
            .collect();

        Ok(documents)
    }

    /// Link rows for the given movie ids, keyed by movie id.
    pub async fn links_map(&self, ids: &[i64]) -> AppResult<HashMap<i64, link::Model>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let links = link::Entity::find()
            .filter(link::Column::MovieId.is_in(ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(links.into_iter().map(|l| (l.movie_id, l)).collect())
    }

    /// Movie rows for the given ids, keyed by id.
    pub async fn movies_map(&self, ids: &[i64]) -> AppResult<HashMap<i64, movie::Model>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let movies = movie::Entity::find()
            .filter(movie::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(movies.into_iter().map(|m| (m.id, m)).collect())
    }
}

fn split_genres(genres: Option<&str>) -> impl Iterator<Item = &str> {
    genres
        .into_iter()
        .flat_map(|g| g.split(GENRE_SEPARATOR))
        .map(str::trim)
        .filter(|g| !g.is_empty() && *g != NO_GENRES_SENTINEL)
}

/// Pure document formatting: title, keyword text (commas become spaces),
/// genres, actors and director concatenate into the tensor field; the
/// individual fields are kept for filtering and display.
fn format_document(
    movie: &movie::Model,
    genres: Vec<String>,
    actors: Vec<String>,
    keywords: Option<&str>,
) -> SearchDocument {
    let mut text = movie.title.trim().to_string();

    if let Some(keywords) = keywords {
        text.push(' ');
        text.push_str(&keywords.replace(',', " "));
    }
    if !genres.is_empty() {
        text.push(' ');
        text.push_str(&genres.join(" "));
    }
    if !actors.is_empty() {
        text.push(' ');
        text.push_str(&actors.join(" "));
    }
    if let Some(director) = &movie.director {
        text.push(' ');
        text.push_str(director);
    }

    SearchDocument {
        id: movie.id.to_string(),
        text,
        title: movie.title.clone(),
        genres,
        actors,
        director: movie.director.clone(),
        year: movie.year.map(|y| y.to_string()),
        popularity: movie.popularity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_movie() -> movie::Model {
        movie::Model {
            id: 862,
            title: "Toy Story".to_string(),
            year: Some(1995),
            director: Some("John Lasseter".to_string()),
            overview: Some("A cowboy doll is profoundly threatened".to_string()),
            popularity: 21.9,
        }
    }

    #[test]
    fn document_concatenates_fields_in_order() {
        let doc = format_document(
            &sample_movie(),
            vec!["animation".into(), "children".into()],
            vec!["Tom Hanks".into(), "Tim Allen".into()],
            Some("friendship,jealousy,toy"),
        );
        assert_eq!(
            doc.text,
            "Toy Story friendship jealousy toy animation children Tom Hanks Tim Allen John Lasseter"
        );
        assert_eq!(doc.id, "862");
        assert_eq!(doc.year.as_deref(), Some("1995"));
        assert_eq!(doc.popularity, 21.9);
    }

    #[test]
    fn missing_fields_contribute_nothing() {
        let movie = movie::Model { director: None, ..sample_movie() };
        let doc = format_document(&movie, vec![], vec![], None);
        assert_eq!(doc.text, "Toy Story");
        assert!(doc.genres.is_empty());
    }

    #[test]
    fn link_rows_reduce_imdb_ids_to_numeric_form() {
        let row = LinkRow {
            movie_id: 1,
            imdb_id: Some("0114709".to_string()),
            tmdb_id: Some(862),
            poster_path: None,
        };
        assert_eq!(row.numeric_imdb_id(), Some(114709));

        let prefixed = LinkRow { imdb_id: Some("tt0114709".to_string()), ..row };
        assert_eq!(prefixed.numeric_imdb_id(), Some(114709));

        let missing = LinkRow { imdb_id: None, ..prefixed };
        assert_eq!(missing.numeric_imdb_id(), None);
    }

    async fn store_with_links() -> MovieStore {
        let db = crate::db::connect_and_migrate("sqlite::memory:").await.unwrap();
        let store = MovieStore::new(db);

        let movies = [(1, "First"), (2, "Second")].map(|(id, title)| movie::ActiveModel {
            id: Set(id),
            title: Set(title.to_string()),
            year: Set(None),
            director: Set(None),
            overview: Set(None),
            popularity: Set(0.0),
        });
        movie::Entity::insert_many(movies).exec(&store.db).await.unwrap();

        let links = [1_i64, 2].map(|id| link::ActiveModel {
            movie_id: Set(id),
            imdb_id: Set(Some(100_000 + id)),
            tmdb_id: Set(None),
            poster_path: Set(None),
        });
        link::Entity::insert_many(links).exec(&store.db).await.unwrap();

        store
    }

    #[tokio::test]
    async fn links_map_only_returns_requested_ids() {
        let store = store_with_links().await;

        let links = store.links_map(&[1]).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links.get(&1).unwrap().imdb_id, Some(100_001));

        let none = store.links_map(&[]).await.unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn genre_splitting_skips_sentinel() {
        let genres: Vec<&str> = split_genres(Some("Action|Comedy")).collect();
        assert_eq!(genres, vec!["Action", "Comedy"]);

        let none: Vec<&str> = split_genres(Some(NO_GENRES_SENTINEL)).collect();
        assert!(none.is_empty());

        let empty: Vec<&str> = split_genres(None).collect();
        assert!(empty.is_empty());
    }
}
