use maud::{DOCTYPE, Markup, html};

use crate::models::Recommendation;

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

pub fn home_page(user_input: &str, recommendations: &[Recommendation]) -> String {
    render_home(user_input, recommendations, None)
}

pub fn home_page_with_error(user_input: &str, message: &str) -> String {
    render_home(user_input, &[], Some(message))
}

fn render_home(user_input: &str, recommendations: &[Recommendation], error: Option<&str>) -> String {
    page(
        "Cinematch",
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-3xl mx-auto px-6 py-12" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-3xl font-bold text-gray-900" { "Cinematch" }
                        p class="mt-2 text-gray-600" { "Describe the movie you feel like watching and get recommendations." }

                        form class="mt-8 space-y-4" method="post" action="/" {
                            div {
                                label class="block text-sm font-medium text-gray-700" for="user_input" { "What do you want to watch?" }
                                textarea class="mt-2 w-full rounded-md border border-gray-300 px-3 py-2 focus:border-blue-500 focus:outline-none focus:ring-1 focus:ring-blue-500" name="user_input" id="user_input" rows="3" required {
                                    (user_input)
                                }
                                p class="mt-2 text-xs text-gray-500" { "e.g. \"an action movie starring Tom Cruise, but not a comedy\"" }
                            }

                            button class="w-full rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700" type="submit" { "Recommend" }
                        }
                    }

                    @if let Some(message) = error {
                        div class="mt-8 bg-white shadow rounded-lg p-8 border-l-4 border-red-500" {
                            h2 class="text-lg font-semibold text-gray-900" { "Something went wrong" }
                            p class="mt-2 text-gray-700" { (message) }
                        }
                    } @else if !user_input.is_empty() {
                        (results_section(recommendations))
                    }
                }
            }
        },
    )
}

fn results_section(recommendations: &[Recommendation]) -> Markup {
    html! {
        @if recommendations.is_empty() {
            div class="mt-8 bg-white shadow rounded-lg p-8" {
                p class="text-gray-600" { "No recommendations found. Try describing the movie differently." }
            }
        } @else {
            div class="mt-8 space-y-4" {
                h2 class="text-xl font-semibold text-gray-900" { "Top " (recommendations.len()) " recommendations" }
                @for rec in recommendations {
                    (recommendation_card(rec))
                }
            }
        }
    }
}

fn recommendation_card(rec: &Recommendation) -> Markup {
    html! {
        div class="bg-white shadow rounded-lg p-6" {
            div class="flex items-start gap-5" {
                @if let Some(poster) = &rec.poster_url {
                    img class="w-24 rounded shadow-sm" src=(poster) alt=(rec.title);
                } @else {
                    div class="w-24 h-36 rounded bg-gray-100 flex items-center justify-center text-xs text-gray-400" { "No poster" }
                }

                div class="flex-1" {
                    h3 class="text-lg font-semibold text-gray-900" { (rec.title) }

                    p class="mt-1 text-sm text-gray-500" {
                        @if let Some(rating) = rec.rating {
                            span { "Rating: " (format!("{rating:.1}")) }
                            span { " · " }
                        }
                        span { "Score: " (format!("{:.3}", rec.score)) }
                    }

                    @if !rec.genres.is_empty() {
                        p class="mt-1 text-sm text-gray-500" { (rec.genres.join(", ")) }
                    }

                    @if let Some(plot) = &rec.plot {
                        p class="mt-3 text-sm text-gray-700" { (plot) }
                    }

                    @if let Some(url) = &rec.imdb_url {
                        a class="mt-3 inline-block text-sm text-blue-600 hover:text-blue-800" href=(url) target="_blank" rel="noopener noreferrer" {
                            "View on IMDB"
                        }
                    }
                }
            }
        }
    }
}

pub fn error_page(message: String) -> String {
    page(
        "Error",
        html! {
            div class="min-h-screen bg-gray-50 flex items-center justify-center" {
                div class="max-w-xl w-full px-6" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-2xl font-bold text-gray-900" { "Error" }
                        p class="mt-4 text-gray-700" { (message) }
                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Back" }
                    }
                }
            }
        },
    )
}

fn page(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
            }
            body { (body) }
        }
    }
    .into_string()
}
