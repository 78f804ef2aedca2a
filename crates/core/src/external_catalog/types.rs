//! Types for external catalog API responses.

use serde::{Deserialize, Serialize};

// ============================================================================
// TMDB Types
// ============================================================================

/// A TMDB movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbMovie {
    /// TMDB movie ID.
    pub id: u32,
    /// Movie title.
    pub title: String,
    /// Original title (in original language).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    /// Release date (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// IMDB ID (only present on detail responses).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    /// Short tagline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    /// Movie overview/synopsis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// Absolute poster URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    /// Genre names.
    #[serde(default)]
    pub genres: Vec<String>,
}

impl TmdbMovie {
    /// Get the release year from the release date.
    pub fn year(&self) -> Option<u32> {
        self.release_date
            .as_ref()
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok())
    }

    /// The first four characters of the release date, alphanumerics only.
    ///
    /// Empty when the catalog has no release date.
    pub fn year_prefix(&self) -> String {
        self.release_date
            .as_deref()
            .unwrap_or_default()
            .chars()
            .take(4)
            .filter(|c| c.is_alphanumeric())
            .collect()
    }
}

// ============================================================================
// TVDB Types
// ============================================================================

/// A TVDB series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TvdbSeries {
    /// TVDB series ID.
    pub id: u32,
    /// Series name.
    pub name: String,
    /// First aired year, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    /// Series overview.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// Absolute poster URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    /// Original network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Genre names.
    #[serde(default)]
    pub genres: Vec<String>,
}

/// A TVDB episode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TvdbEpisode {
    /// TVDB episode ID.
    pub id: u32,
    /// Season number.
    pub season_number: u32,
    /// Episode number within the season.
    pub episode_number: u32,
    /// Episode name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Episode overview.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// Air date (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aired: Option<String>,
    /// Absolute still image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub still_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(release_date: Option<&str>) -> TmdbMovie {
        TmdbMovie {
            id: 27205,
            title: "Inception".to_string(),
            original_title: None,
            release_date: release_date.map(String::from),
            imdb_id: None,
            tagline: None,
            overview: None,
            poster_url: None,
            genres: vec![],
        }
    }

    #[test]
    fn test_tmdb_movie_year() {
        assert_eq!(movie(Some("2010-07-15")).year(), Some(2010));
        assert_eq!(movie(None).year(), None);
    }

    #[test]
    fn test_tmdb_movie_year_prefix() {
        assert_eq!(movie(Some("2010-07-15")).year_prefix(), "2010");
        assert_eq!(movie(Some("")).year_prefix(), "");
        assert_eq!(movie(None).year_prefix(), "");
    }
}
