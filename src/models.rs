use serde::{Deserialize, Deserializer, Serialize};

/// Structured preference tags extracted from the user's free-text request.
///
/// Genres and actors carry a polarity flag: 1 means the user wants it,
/// 0 means they want it excluded. The model sometimes emits `null` for a
/// list it has nothing for, so every list field tolerates both absence
/// and an explicit null.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub genres: Vec<(String, i64)>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub actors: Vec<(String, i64)>,
    #[serde(default)]
    pub era: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub keywords: Vec<String>,
}

impl UserPreferences {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.genres.is_empty()
            && self.actors.is_empty()
            && self.keywords.is_empty()
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let opt = Option::<Vec<T>>::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// Flattened movie row as uploaded to the vector index. The `text` field
/// is the tensor field; the rest are kept for filtering and display.
/// Absent optional fields are omitted entirely: the structured index
/// rejects explicit nulls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub text: String,
    pub title: String,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub popularity: f64,
}

/// One ranked document as returned by the index.
#[derive(Clone, Debug, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(rename = "_score", default)]
    pub score: f64,
}

/// A search hit after metadata enrichment, ready to render.
#[derive(Clone, Debug)]
pub struct Recommendation {
    pub id: i64,
    pub title: String,
    pub genres: Vec<String>,
    pub score: f64,
    pub popularity: f64,
    pub imdb_id: Option<String>,
    pub imdb_url: Option<String>,
    pub poster_url: Option<String>,
    pub rating: Option<f64>,
    pub plot: Option<String>,
}

impl Recommendation {
    pub fn from_hit(hit: &SearchHit) -> Option<Self> {
        let id = hit.id.parse().ok()?;
        Some(Self {
            id,
            title: hit.title.clone(),
            genres: hit.genres.clone(),
            score: hit.score,
            popularity: hit.popularity,
            imdb_id: None,
            imdb_url: None,
            poster_url: None,
            rating: None,
            plot: None,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RecommendForm {
    pub user_input: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_tolerate_null_lists() {
        let json = r#"{
            "title": null,
            "genres": [["musical", 1], ["drama", 1]],
            "actors": null,
            "era": "old",
            "keywords": ["great music", "inspiring"]
        }"#;
        let prefs: UserPreferences = serde_json::from_str(json).unwrap();
        assert_eq!(prefs.title, None);
        assert_eq!(prefs.genres, vec![("musical".into(), 1), ("drama".into(), 1)]);
        assert!(prefs.actors.is_empty());
        assert_eq!(prefs.era.as_deref(), Some("old"));
        assert_eq!(prefs.keywords.len(), 2);
    }

    #[test]
    fn preferences_tolerate_missing_fields() {
        let prefs: UserPreferences = serde_json::from_str("{}").unwrap();
        assert!(prefs.is_empty());
        assert_eq!(prefs, UserPreferences::default());
    }

    #[test]
    fn document_without_director_or_year_serializes_without_nulls() {
        let doc = SearchDocument {
            id: "1".to_string(),
            text: "Movie".to_string(),
            title: "Movie".to_string(),
            genres: vec![],
            actors: vec![],
            director: None,
            year: None,
            popularity: 1.0,
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("null"), "payload carries nulls: {json}");
        assert!(!json.contains("director"));
        assert!(!json.contains("year"));
    }

    #[test]
    fn document_keeps_present_optional_fields() {
        let doc = SearchDocument {
            id: "862".to_string(),
            text: "Toy Story".to_string(),
            title: "Toy Story".to_string(),
            genres: vec!["animation".to_string()],
            actors: vec![],
            director: Some("John Lasseter".to_string()),
            year: Some("1995".to_string()),
            popularity: 21.9,
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains(r#""director":"John Lasseter""#));
        assert!(json.contains(r#""year":"1995""#));
    }

    #[test]
    fn hit_parses_without_optional_fields() {
        let json = r#"{"_id": "862", "title": "Toy Story", "_score": 0.91}"#;
        let hit: SearchHit = serde_json::from_str(json).unwrap();
        assert_eq!(hit.id, "862");
        assert_eq!(hit.popularity, 0.0);
        assert!(hit.genres.is_empty());
    }
}
