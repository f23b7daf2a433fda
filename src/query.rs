use crate::models::UserPreferences;

/// Turns extracted preferences into a search query plus filter expression.
///
/// The query is the space-joined positive terms: title, keywords, then
/// genres and actors with polarity 1. The filter conjoins a `NOT genres
/// IN (..)` clause per negative genre. Anything with a polarity other
/// than 1 counts as not-positive; only polarity 0 genres become filters.
/// The era tag never contributes to either output.
pub fn construct_user_query(preferences: &UserPreferences) -> (String, String) {
    let mut positive_terms: Vec<&str> = Vec::new();
    let mut filters: Vec<String> = Vec::new();

    if let Some(title) = &preferences.title {
        positive_terms.push(title);
    }

    positive_terms.extend(preferences.keywords.iter().map(String::as_str));

    positive_terms
        .extend(preferences.genres.iter().filter(|(_, pol)| *pol == 1).map(|(g, _)| g.as_str()));

    positive_terms
        .extend(preferences.actors.iter().filter(|(_, pol)| *pol == 1).map(|(a, _)| a.as_str()));

    filters.extend(
        preferences
            .genres
            .iter()
            .filter(|(_, pol)| *pol == 0)
            .map(|(g, _)| format!("NOT genres IN ({g})")),
    );

    (positive_terms.join(" "), filters.join(" AND "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserPreferences;

    #[test]
    fn empty_preferences_yield_empty_query_and_filter() {
        let (query, filter) = construct_user_query(&UserPreferences::default());
        assert_eq!(query, "");
        assert_eq!(filter, "");
    }

    #[test]
    fn positive_terms_join_in_order() {
        let prefs = UserPreferences {
            title: Some("Heat".to_string()),
            genres: vec![("action".into(), 1), ("comedy".into(), 0)],
            actors: vec![("Al Pacino".into(), 1)],
            era: None,
            keywords: vec!["heist".into(), "tense".into()],
        };
        let (query, _) = construct_user_query(&prefs);
        assert_eq!(query, "Heat heist tense action Al Pacino");
    }

    #[test]
    fn negative_genres_conjoin_with_and() {
        let prefs = UserPreferences {
            genres: vec![("comedy".into(), 0), ("horror".into(), 0), ("drama".into(), 1)],
            ..Default::default()
        };
        let (query, filter) = construct_user_query(&prefs);
        assert_eq!(query, "drama");
        assert_eq!(filter, "NOT genres IN (comedy) AND NOT genres IN (horror)");
    }

    #[test]
    fn era_contributes_nothing() {
        let prefs = UserPreferences { era: Some("recent".into()), ..Default::default() };
        assert_eq!(construct_user_query(&prefs), (String::new(), String::new()));
    }

    #[test]
    fn out_of_range_polarity_is_not_positive() {
        let prefs = UserPreferences {
            genres: vec![("action".into(), 2), ("drama".into(), -1)],
            ..Default::default()
        };
        let (query, filter) = construct_user_query(&prefs);
        assert_eq!(query, "");
        assert_eq!(filter, "");
    }

    #[test]
    fn deterministic_for_same_input() {
        let prefs = UserPreferences {
            title: Some("Alien".into()),
            genres: vec![("sci-fi".into(), 1)],
            ..Default::default()
        };
        assert_eq!(construct_user_query(&prefs), construct_user_query(&prefs));
    }

    #[test]
    fn negative_actors_do_not_filter() {
        let prefs = UserPreferences {
            actors: vec![("Tom Cruise".into(), 1), ("Penelope Cruz".into(), 0)],
            ..Default::default()
        };
        let (query, filter) = construct_user_query(&prefs);
        assert_eq!(query, "Tom Cruise");
        assert_eq!(filter, "");
    }
}
