use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::data::model::{Column, Movie, MovieRecord, MovieTable, MovieView};
use crate::error::QueryError;

/// How many genres the distribution chart shows.
pub const TOP_GENRES: usize = 15;

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

/// The four summary scalars.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total_movies: u64,
    pub avg_rating: f64,
    pub total_votes: u64,
    pub total_gross: i64,
}

/// Summary statistics over a view. An empty view gives all zeros.
pub fn compute_kpis(view: &MovieView<'_>) -> Kpis {
    if view.is_empty() {
        return Kpis::default();
    }

    let n = view.len();
    let rating_sum: f64 = view.iter().map(|m| m.imdb_rating).sum();
    // Absent gross counts as zero.
    let gross_sum: f64 = view.iter().filter_map(|m| m.gross).sum();

    Kpis {
        total_movies: n as u64,
        avg_rating: round2(rating_sum / n as f64),
        total_votes: view
            .iter()
            .fold(0u64, |acc, m| acc.saturating_add(m.num_votes)),
        total_gross: gross_sum as i64,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Chart aggregates
// ---------------------------------------------------------------------------

/// Label → count pairs that keep their order when serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution(pub Vec<(String, u64)>);

impl Distribution {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, c)| *c)
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|(_, c)| c).sum()
    }
}

impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, count) in &self.0 {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    /// Top genres by count, ties in order of first appearance.
    pub genres_distribution: Distribution,
    /// Movies per release year, ascending. Years serialize as string keys.
    pub yearly_distribution: BTreeMap<i64, u64>,
}

pub fn compute_chart_data(view: &MovieView<'_>) -> ChartData {
    ChartData {
        genres_distribution: genre_distribution(view, TOP_GENRES),
        yearly_distribution: yearly_distribution(view),
    }
}

/// Count genre tokens across the view and keep the `top` most frequent.
pub fn genre_distribution(view: &MovieView<'_>, top: usize) -> Distribution {
    let mut counts: Vec<(String, u64)> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();

    for movie in view.iter() {
        for genre in movie.genres() {
            match slot.get(genre) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    slot.insert(genre, counts.len());
                    counts.push((genre.to_string(), 1));
                }
            }
        }
    }

    // Stable: equal counts stay in encounter order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(top);
    Distribution(counts)
}

pub fn yearly_distribution(view: &MovieView<'_>) -> BTreeMap<i64, u64> {
    let mut years = BTreeMap::new();
    for movie in view.iter() {
        *years.entry(movie.released_year).or_insert(0) += 1;
    }
    years
}

/// KPIs plus both chart aggregates, as one response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub kpis: Kpis,
    #[serde(flatten)]
    pub charts: ChartData,
}

pub fn analytics_summary(view: &MovieView<'_>) -> AnalyticsSummary {
    AnalyticsSummary {
        kpis: compute_kpis(view),
        charts: compute_chart_data(view),
    }
}

// ---------------------------------------------------------------------------
// Record listing
// ---------------------------------------------------------------------------

/// The fixed set of list orderings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    #[default]
    OutlierScoreDesc,
    VotesDesc,
    RatingDesc,
    YearDesc,
    TitleAsc,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::OutlierScoreDesc,
        SortKey::VotesDesc,
        SortKey::RatingDesc,
        SortKey::YearDesc,
        SortKey::TitleAsc,
    ];

    /// Parse a sort name. Unknown names fall back to the default ordering.
    pub fn from_name(name: &str) -> SortKey {
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str() == name)
            .unwrap_or_else(|| {
                log::debug!("Unknown sort key '{name}', using outlier_score_desc");
                SortKey::default()
            })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::OutlierScoreDesc => "outlier_score_desc",
            SortKey::VotesDesc => "votes_desc",
            SortKey::RatingDesc => "rating_desc",
            SortKey::YearDesc => "year_desc",
            SortKey::TitleAsc => "title_asc",
        }
    }

    /// `(column, ascending)` this key sorts by.
    pub fn order(&self) -> (Column, bool) {
        match self {
            SortKey::OutlierScoreDesc => (Column::OutlierScore, false),
            SortKey::VotesDesc => (Column::NumVotes, false),
            SortKey::RatingDesc => (Column::ImdbRating, false),
            SortKey::YearDesc => (Column::ReleasedYear, false),
            SortKey::TitleAsc => (Column::Title, true),
        }
    }
}

/// Used when the requested sort column is not in the table.
const FALLBACK_ORDER: (Column, bool) = (Column::NumVotes, false);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MovieList {
    pub data: Vec<MovieRecord>,
}

/// Sort the view (stable) and return the first `limit` records.
///
/// The caller validates and caps `limit`.
pub fn list_records(view: &MovieView<'_>, sort: SortKey, limit: usize) -> MovieList {
    let table = view.table();
    let (column, ascending) = match sort.order() {
        (column, _) if !table.has_column(column) => {
            log::debug!(
                "Sort column {} absent, falling back to No_of_Votes desc",
                table.column_name(column)
            );
            FALLBACK_ORDER
        }
        order => order,
    };

    let movies = table.movies();
    let mut rows = view.rows().to_vec();
    rows.sort_by(|&a, &b| compare(&movies[a], &movies[b], column, ascending));
    rows.truncate(limit);

    MovieList {
        data: rows.into_iter().map(|i| table.record(&movies[i])).collect(),
    }
}

fn directed(ord: Ordering, ascending: bool) -> Ordering {
    if ascending {
        ord
    } else {
        ord.reverse()
    }
}

/// Missing values sort last in either direction.
fn nulls_last(a: Option<f64>, b: Option<f64>, ascending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => directed(x.total_cmp(&y), ascending),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &Movie, b: &Movie, column: Column, ascending: bool) -> Ordering {
    match column {
        Column::Title => directed(a.title.cmp(&b.title), ascending),
        Column::ReleasedYear => directed(a.released_year.cmp(&b.released_year), ascending),
        Column::NumVotes => directed(a.num_votes.cmp(&b.num_votes), ascending),
        Column::ImdbRating => directed(a.imdb_rating.total_cmp(&b.imdb_rating), ascending),
        Column::OutlierScore => nulls_last(a.outlier_score, b.outlier_score, ascending),
        Column::Gross => nulls_last(a.gross, b.gross, ascending),
        Column::LogVotes => directed(a.log_votes.total_cmp(&b.log_votes), ascending),
        _ => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// The record with the given id, or [`QueryError::NotFound`].
pub fn find_record(table: &MovieTable, id: &str) -> Result<MovieRecord, QueryError> {
    table
        .find(id)
        .map(|movie| table.record(movie))
        .ok_or_else(|| QueryError::NotFound { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filter, FilterParams};
    use crate::data::model::{CellValue, OutlierReason};
    use pretty_assertions::assert_eq;

    fn movie(id: usize, title: &str, year: i64, genre: &str, rating: f64, votes: u64) -> Movie {
        Movie {
            id: id.to_string(),
            title: title.to_string(),
            released_year: year,
            genre: genre.to_string(),
            certificate: None,
            imdb_rating: rating,
            num_votes: votes,
            gross: None,
            log_votes: (votes as f64 + 1.0).log10(),
            rating_z: None,
            log_votes_z: None,
            outlier_score: None,
            outlier_reason: Some(OutlierReason::Normal),
            extras: Vec::new(),
        }
    }

    fn full_columns() -> Vec<Column> {
        vec![
            Column::Title,
            Column::ReleasedYear,
            Column::Genre,
            Column::ImdbRating,
            Column::NumVotes,
            Column::Gross,
            Column::Id,
            Column::LogVotes,
            Column::RatingZ,
            Column::LogVotesZ,
            Column::OutlierScore,
            Column::OutlierReason,
        ]
    }

    fn sample() -> MovieTable {
        let mut movies = vec![
            movie(0, "Casablanca", 1942, "Drama, Romance", 8.5, 500_000),
            movie(1, "Alien", 1979, "Horror, Sci-Fi", 8.4, 800_000),
            movie(2, "Brazil", 1985, "Drama, Sci-Fi", 7.9, 200_000),
            movie(3, "Amelie", 2001, "Comedy, Romance", 8.0, 700_000),
        ];
        movies[0].gross = Some(1_024_560.0);
        movies[1].gross = Some(78_900_000.5);
        movies[2].outlier_score = Some(2.5);
        movies[2].outlier_reason = Some(OutlierReason::HighRatingLowVotes);
        movies[0].outlier_score = Some(0.3);
        movies[3].outlier_score = Some(-1.0);
        MovieTable::new(movies, full_columns(), Vec::new())
    }

    fn titles(list: &MovieList) -> Vec<String> {
        list.data
            .iter()
            .map(|r| r.get("Series_Title").unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_kpis_on_empty_view_are_zero() {
        let table = MovieTable::default();
        let kpis = compute_kpis(&MovieView::full(&table));
        assert_eq!(
            kpis,
            Kpis {
                total_movies: 0,
                avg_rating: 0.0,
                total_votes: 0,
                total_gross: 0
            }
        );
    }

    #[test]
    fn test_kpis() {
        let table = sample();
        let kpis = compute_kpis(&MovieView::full(&table));
        assert_eq!(kpis.total_movies, 4);
        // (8.5 + 8.4 + 7.9 + 8.0) / 4
        assert!((kpis.avg_rating - 8.2).abs() < 1e-9);
        assert_eq!(kpis.total_votes, 2_200_000);
        assert_eq!(kpis.total_gross, 79_924_560);
    }

    #[test]
    fn test_total_votes_saturates_instead_of_overflowing() {
        let big = i64::MAX as u64;
        let movies = (0..3)
            .map(|i| movie(i, &format!("Big {i}"), 2000, "Drama", 8.0, big))
            .collect();
        let table = MovieTable::new(movies, full_columns(), Vec::new());
        assert_eq!(compute_kpis(&MovieView::full(&table)).total_votes, u64::MAX);
    }

    #[test]
    fn test_kpis_wire_names() {
        let json = serde_json::to_value(Kpis::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"total_movies": 0, "avg_rating": 0.0, "total_votes": 0, "total_gross": 0})
        );
    }

    #[test]
    fn test_chart_data_on_empty_view() {
        let table = MovieTable::default();
        let charts = compute_chart_data(&MovieView::full(&table));
        assert!(charts.genres_distribution.is_empty());
        assert!(charts.yearly_distribution.is_empty());
    }

    #[test]
    fn test_genre_distribution_counts_and_ties() {
        let table = sample();
        let dist = genre_distribution(&MovieView::full(&table), TOP_GENRES);
        assert_eq!(
            dist.0,
            vec![
                ("Drama".to_string(), 2),
                ("Romance".to_string(), 2),
                ("Sci-Fi".to_string(), 2),
                ("Horror".to_string(), 1),
                ("Comedy".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_genre_distribution_keeps_top_fifteen() {
        let movies = (0..20)
            .map(|i| movie(i, &format!("T{i}"), 2000, &format!("G{i}"), 7.0, 1))
            .collect();
        let table = MovieTable::new(movies, full_columns(), Vec::new());
        let dist = genre_distribution(&MovieView::full(&table), TOP_GENRES);
        assert_eq!(dist.len(), 15);
        assert_eq!(dist.0[0].0, "G0");
        assert_eq!(dist.0[14].0, "G14");
    }

    #[test]
    fn test_yearly_distribution_serializes_sorted_string_keys() {
        let mut movies = vec![
            movie(0, "A", 2001, "Drama", 7.0, 1),
            movie(1, "B", 1999, "Drama", 7.0, 1),
            movie(2, "C", 1999, "Drama", 7.0, 1),
        ];
        movies.rotate_left(1);
        let table = MovieTable::new(movies, full_columns(), Vec::new());
        let charts = compute_chart_data(&MovieView::full(&table));
        let json = serde_json::to_string(&charts.yearly_distribution).unwrap();
        assert_eq!(json, r#"{"1999":2,"2001":1}"#);
    }

    #[test]
    fn test_sort_keys_parse_with_fallback() {
        for key in SortKey::ALL {
            assert_eq!(SortKey::from_name(key.as_str()), key);
        }
        assert_eq!(SortKey::from_name("popularity"), SortKey::OutlierScoreDesc);
    }

    #[test]
    fn test_title_asc_and_limit() {
        let table = sample();
        let view = MovieView::full(&table);
        let list = list_records(&view, SortKey::TitleAsc, 10);
        assert_eq!(titles(&list), vec!["Alien", "Amelie", "Brazil", "Casablanca"]);

        let first = list_records(&view, SortKey::TitleAsc, 1);
        assert_eq!(titles(&first), vec!["Alien"]);
    }

    #[test]
    fn test_outlier_score_desc_puts_missing_scores_last() {
        let table = sample();
        let list = list_records(&MovieView::full(&table), SortKey::OutlierScoreDesc, 10);
        assert_eq!(titles(&list), vec!["Brazil", "Casablanca", "Amelie", "Alien"]);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let movies = vec![
            movie(0, "First", 2000, "Drama", 7.0, 10),
            movie(1, "Second", 2000, "Drama", 7.0, 20),
            movie(2, "Third", 2000, "Drama", 7.0, 10),
        ];
        let table = MovieTable::new(movies, full_columns(), Vec::new());
        let list = list_records(&MovieView::full(&table), SortKey::YearDesc, 10);
        assert_eq!(titles(&list), vec!["First", "Second", "Third"]);
        let list = list_records(&MovieView::full(&table), SortKey::VotesDesc, 10);
        assert_eq!(titles(&list), vec!["Second", "First", "Third"]);
    }

    #[test]
    fn test_missing_sort_column_falls_back_to_votes() {
        let movies = vec![
            movie(0, "Few", 2000, "Drama", 9.0, 10),
            movie(1, "Many", 2000, "Drama", 7.0, 1_000),
        ];
        let columns = vec![Column::Title, Column::NumVotes, Column::Id, Column::LogVotes];
        let table = MovieTable::new(movies, columns, Vec::new());
        let list = list_records(&MovieView::full(&table), SortKey::OutlierScoreDesc, 10);
        assert_eq!(titles(&list), vec!["Many", "Few"]);
    }

    #[test]
    fn test_list_count_matches_kpis() {
        let table = sample();
        let view = filter(&table, &FilterParams::default());
        let kpis = compute_kpis(&view);
        let list = list_records(&view, SortKey::RatingDesc, kpis.total_movies as usize);
        assert_eq!(list.data.len() as u64, kpis.total_movies);
    }

    #[test]
    fn test_records_are_json_safe() {
        let table = sample();
        let list = list_records(&MovieView::full(&table), SortKey::VotesDesc, 10);
        let record = &list.data[0];
        assert_eq!(record.get("Gross"), Some(&CellValue::Float(78_900_000.5)));
        assert_eq!(record.get("rating_z"), Some(&CellValue::Null));

        let json = serde_json::to_value(&list).unwrap();
        let first = &json["data"][0];
        assert!(first["rating_z"].is_null());
        assert_eq!(first["outlier_reason"], "Normal");
        let keys: Vec<&String> = first.as_object().unwrap().keys().collect();
        assert_eq!(keys[0], "Series_Title");
        assert_eq!(keys[keys.len() - 1], "outlier_reason");
    }

    #[test]
    fn test_find_record() {
        let table = sample();
        let record = find_record(&table, "2").unwrap();
        assert_eq!(record.id(), Some("2"));
        let err = find_record(&table, "99").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "movie not found: 99");
    }
}
