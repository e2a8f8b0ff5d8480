use std::collections::BTreeSet;

use serde::Deserialize;

use super::model::{Movie, MovieTable, MovieView};

// ---------------------------------------------------------------------------
// Filter predicate: which movies a request selects
// ---------------------------------------------------------------------------

/// The predicate set shared by every query. Absent fields impose no
/// constraint; an empty genre or certificate set is also "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterParams {
    /// Inclusive lower bound on release year.
    pub year_min: Option<i64>,
    /// Inclusive upper bound on release year.
    pub year_max: Option<i64>,
    /// Match any of these genre labels.
    #[serde(default, alias = "genre")]
    pub genres: BTreeSet<String>,
    /// Match any of these certificates exactly.
    #[serde(default, alias = "certificate")]
    pub certificates: BTreeSet<String>,
    #[serde(default)]
    pub outliers_only: bool,
}

impl FilterParams {
    /// Whether a single movie passes every active predicate.
    ///
    /// A movie passes when:
    /// * its year lies inside `[year_min, year_max]`
    /// * one of its genre tokens is requested (logical OR over genres)
    /// * its certificate is requested (a missing certificate never matches)
    /// * with `outliers_only`, it carries a non-Normal classification
    pub fn matches(&self, movie: &Movie) -> bool {
        if self.year_min.is_some_and(|min| movie.released_year < min) {
            return false;
        }
        if self.year_max.is_some_and(|max| movie.released_year > max) {
            return false;
        }
        if !self.genres.is_empty() && !movie.genres().any(|g| self.genres.contains(g)) {
            return false;
        }
        if !self.certificates.is_empty() {
            match &movie.certificate {
                Some(cert) if self.certificates.contains(cert) => {}
                _ => return false,
            }
        }
        if self.outliers_only {
            // Unclassified rows are never included.
            match movie.outlier_reason {
                Some(reason) if !reason.is_normal() => {}
                _ => return false,
            }
        }
        true
    }

    /// Whether no predicate is active.
    pub fn is_empty(&self) -> bool {
        self == &FilterParams::default()
    }
}

/// Return the view of movies that pass all active filters, in table order.
///
/// The table is only borrowed; the view is a fresh list of row indices.
pub fn filter<'a>(table: &'a MovieTable, params: &FilterParams) -> MovieView<'a> {
    let rows = table
        .movies()
        .iter()
        .enumerate()
        .filter(|(_, movie)| params.matches(movie))
        .map(|(i, _)| i)
        .collect();
    MovieView::from_rows(table, rows)
}

/// Narrow an existing view further. Row order is preserved.
pub fn refilter<'a>(view: &MovieView<'a>, params: &FilterParams) -> MovieView<'a> {
    let table = view.table();
    let rows = view
        .rows()
        .iter()
        .copied()
        .filter(|&i| params.matches(&table.movies()[i]))
        .collect();
    MovieView::from_rows(table, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Column, OutlierReason};

    fn movie(id: usize, year: i64, genre: &str, cert: Option<&str>, reason: Option<OutlierReason>) -> Movie {
        Movie {
            id: id.to_string(),
            title: format!("Movie {id}"),
            released_year: year,
            genre: genre.to_string(),
            certificate: cert.map(str::to_string),
            imdb_rating: 8.0,
            num_votes: 100,
            gross: None,
            log_votes: 2.0,
            rating_z: None,
            log_votes_z: None,
            outlier_score: None,
            outlier_reason: reason,
            extras: Vec::new(),
        }
    }

    fn table(movies: Vec<Movie>) -> MovieTable {
        MovieTable::new(movies, vec![Column::Title, Column::ReleasedYear, Column::Id], Vec::new())
    }

    fn ids(view: &MovieView<'_>) -> Vec<String> {
        view.iter().map(|m| m.id.clone()).collect()
    }

    #[test]
    fn test_no_predicates_returns_everything() {
        let t = table(vec![
            movie(0, 1999, "Drama", None, None),
            movie(1, 2001, "Comedy", None, None),
        ]);
        let view = filter(&t, &FilterParams::default());
        assert_eq!(view.len(), 2);
        assert_eq!(ids(&view), vec!["0", "1"]);
    }

    #[test]
    fn test_year_max_is_inclusive() {
        let t = table(vec![
            movie(0, 1999, "Drama", None, None),
            movie(1, 1999, "Drama", None, None),
            movie(2, 2001, "Drama", None, None),
        ]);
        let params = FilterParams {
            year_max: Some(1999),
            ..Default::default()
        };
        assert_eq!(filter(&t, &params).len(), 2);
    }

    #[test]
    fn test_year_range() {
        let t = table(vec![
            movie(0, 1990, "Drama", None, None),
            movie(1, 1995, "Drama", None, None),
            movie(2, 2000, "Drama", None, None),
        ]);
        let params = FilterParams {
            year_min: Some(1995),
            year_max: Some(2000),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&t, &params)), vec!["1", "2"]);
    }

    #[test]
    fn test_genres_match_any_token() {
        let t = table(vec![
            movie(0, 2000, "Drama, Comedy", None, None),
            movie(1, 2000, "Action", None, None),
            movie(2, 2000, "Dramatic Comedy", None, None),
        ]);
        let params = FilterParams {
            genres: ["Comedy".to_string(), "Horror".to_string()].into(),
            ..Default::default()
        };
        // Token match, not substring: "Dramatic Comedy" is its own label.
        assert_eq!(ids(&filter(&t, &params)), vec!["0"]);
    }

    #[test]
    fn test_certificates_exact_match() {
        let t = table(vec![
            movie(0, 2000, "Drama", Some("PG"), None),
            movie(1, 2000, "Drama", Some("PG-13"), None),
            movie(2, 2000, "Drama", None, None),
        ]);
        let params = FilterParams {
            certificates: ["PG".to_string()].into(),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&t, &params)), vec!["0"]);
    }

    #[test]
    fn test_outliers_only_excludes_normal_and_unclassified() {
        let t = table(vec![
            movie(0, 2000, "Drama", None, Some(OutlierReason::Normal)),
            movie(1, 2000, "Drama", None, Some(OutlierReason::HighRatingLowVotes)),
            movie(2, 2000, "Drama", None, None),
        ]);
        let params = FilterParams {
            outliers_only: true,
            ..Default::default()
        };
        assert_eq!(ids(&filter(&t, &params)), vec!["1"]);
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let t = table(vec![
            movie(0, 2000, "Drama", Some("R"), None),
            movie(1, 1980, "Drama", Some("R"), None),
            movie(2, 2000, "Comedy", Some("R"), None),
            movie(3, 2000, "Drama", Some("PG"), None),
        ]);
        let params = FilterParams {
            year_min: Some(1990),
            genres: ["Drama".to_string()].into(),
            certificates: ["R".to_string()].into(),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&t, &params)), vec!["0"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let t = table(vec![
            movie(0, 1999, "Drama", None, None),
            movie(1, 2005, "Comedy", None, None),
            movie(2, 2010, "Drama", None, None),
        ]);
        let params = FilterParams {
            year_min: Some(2000),
            ..Default::default()
        };
        let once = filter(&t, &params);
        let twice = refilter(&once, &params);
        assert_eq!(once.rows(), twice.rows());
    }

    #[test]
    fn test_params_deserialize_from_query_names() {
        let params: FilterParams = serde_json::from_str(
            r#"{"year_min": 1990, "genre": ["Drama"], "certificate": ["R"], "outliers_only": true}"#,
        )
        .unwrap();
        assert_eq!(params.year_min, Some(1990));
        assert!(params.genres.contains("Drama"));
        assert!(params.certificates.contains("R"));
        assert!(params.outliers_only);
        assert!(!params.is_empty());
    }
}
