pub mod actor;
pub mod genre;
pub mod keyword;
pub mod link;
pub mod movie;
pub mod movie_genre;
