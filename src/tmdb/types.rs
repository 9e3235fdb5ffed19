use serde::{Deserialize, Serialize};

pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl MovieSummary {
    pub fn poster_url(&self) -> Option<String> {
        self.poster_path.as_deref().map(poster_url)
    }

    /// Year part of `release_date`, e.g. "2008" for "2008-07-16".
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|d| d.split('-').next())
            .filter(|y| !y.is_empty())
    }
}

/// Body of both `/search/movie` and `/discover/movie`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieListResponse {
    #[serde(default)]
    pub results: Option<Vec<MovieSummary>>,
}

impl MovieListResponse {
    pub fn into_movies(self) -> Vec<MovieSummary> {
        self.results.unwrap_or_default()
    }
}

pub fn poster_url(poster_path: &str) -> String {
    if poster_path.starts_with('/') {
        format!("{}{}", POSTER_BASE_URL, poster_path)
    } else {
        format!("{}/{}", POSTER_BASE_URL, poster_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_missing() {
        let resp: MovieListResponse = serde_json::from_str(r#"{"page": 1}"#).unwrap();
        assert!(resp.into_movies().is_empty());
    }

    #[test]
    fn test_parse_search_response() {
        let body = r#"{
            "page": 1,
            "results": [
                {"id": 155, "title": "The Dark Knight", "poster_path": "/qJ2tW6WMUDux911r6m7haRef0WH.jpg",
                 "vote_average": 8.5, "original_language": "en", "release_date": "2008-07-16",
                 "adult": false, "overview": "Batman raises the stakes."},
                {"id": 268, "title": "Batman", "poster_path": null}
            ],
            "total_results": 2
        }"#;
        let movies = serde_json::from_str::<MovieListResponse>(body)
            .unwrap()
            .into_movies();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].id, 155);
        assert_eq!(movies[0].release_year(), Some("2008"));
        assert_eq!(
            movies[0].poster_url().as_deref(),
            Some("https://image.tmdb.org/t/p/w500/qJ2tW6WMUDux911r6m7haRef0WH.jpg")
        );
        assert_eq!(movies[1].poster_url(), None);
        assert_eq!(movies[1].release_year(), None);
    }
}
