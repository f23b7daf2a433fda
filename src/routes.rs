use std::sync::Arc;

use axum::{
    extract::{Form, State},
    response::Html,
};
use tracing::info;

use crate::{AppState, error::AppResult, models::RecommendForm, templates};

pub async fn index() -> Html<String> {
    Html(templates::home_page("", &[]))
}

pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RecommendForm>,
) -> AppResult<Html<String>> {
    let user_input = form.user_input.trim().to_string();

    if user_input.is_empty() {
        return Ok(Html(templates::home_page("", &[])));
    }

    info!(input = %user_input, "recommendation request");

    let result = crate::recommend::find_recommendations(
        &state.llm,
        &state.search,
        &state.store,
        &state.tmdb,
        &user_input,
        state.config.result_limit,
        state.config.max_concurrent,
    )
    .await;

    let body = match result {
        Ok(recommendations) => {
            info!(count = recommendations.len(), "returning recommendations");
            templates::home_page(&user_input, &recommendations)
        },
        Err(err) => {
            tracing::warn!(error = %err, "recommendation pipeline failed");
            templates::home_page_with_error(&user_input, &err.to_string())
        },
    };

    Ok(Html(body))
}
