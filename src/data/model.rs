use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a record as it leaves the engine
// ---------------------------------------------------------------------------

/// A dynamically-typed output value. Absent numbers and categories are
/// `Null`; a float that is not finite also serializes as `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_finite() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Guess the type of a passthrough text cell, the way a dataframe reader
    /// would. Schema text columns never go through this.
    pub fn infer(s: &str) -> Self {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return if f.is_finite() {
                CellValue::Float(f)
            } else {
                CellValue::Null
            };
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }
}

impl From<Option<f64>> for CellValue {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(f) if f.is_finite() => CellValue::Float(f),
            _ => CellValue::Null,
        }
    }
}

impl From<Option<String>> for CellValue {
    fn from(v: Option<String>) -> Self {
        v.map_or(CellValue::Null, CellValue::String)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::String(s) => serializer.serialize_str(s),
            CellValue::Integer(i) => serializer.serialize_i64(*i),
            CellValue::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            CellValue::Float(_) | CellValue::Null => serializer.serialize_none(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

/// Text form used for CSV cells; null renders as an empty string.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) if v.is_finite() => write!(f, "{v}"),
            CellValue::Float(_) | CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Outlier classification
// ---------------------------------------------------------------------------

/// Score at or above which a movie is flagged.
pub const OUTLIER_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlierReason {
    HighRatingLowVotes,
    Normal,
}

impl OutlierReason {
    /// Classify a score. An undefined score never crosses the threshold.
    pub fn classify(score: Option<f64>) -> Self {
        match score {
            Some(s) if s >= OUTLIER_THRESHOLD => OutlierReason::HighRatingLowVotes,
            _ => OutlierReason::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutlierReason::HighRatingLowVotes => "High rating, low votes",
            OutlierReason::Normal => "Normal",
        }
    }

    pub fn is_normal(&self) -> bool {
        *self == OutlierReason::Normal
    }
}

// ---------------------------------------------------------------------------
// Movie – one prepared row
// ---------------------------------------------------------------------------

/// Delimiter between genre labels in the `Genre` field.
pub const GENRE_DELIMITER: &str = ", ";

/// A single cleaned movie with its derived columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    /// Positional index in the raw file, as a string.
    pub id: String,
    pub title: String,
    pub released_year: i64,
    /// Delimited genre labels, e.g. `"Crime, Drama"`.
    pub genre: String,
    pub certificate: Option<String>,
    pub imdb_rating: f64,
    pub num_votes: u64,
    pub gross: Option<f64>,

    pub log_votes: f64,
    pub rating_z: Option<f64>,
    pub log_votes_z: Option<f64>,
    pub outlier_score: Option<f64>,
    /// `None` when the table carries no outlier classification.
    pub outlier_reason: Option<OutlierReason>,

    /// Passthrough cells, in the order of the table's extra column names.
    pub extras: Vec<CellValue>,
}

impl Movie {
    /// Individual genre labels, skipping empty tokens.
    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.genre
            .split(GENRE_DELIMITER)
            .filter(|g| !g.is_empty())
    }

    fn cell(&self, column: Column) -> CellValue {
        match column {
            Column::Title => CellValue::String(self.title.clone()),
            Column::ReleasedYear => CellValue::Integer(self.released_year),
            Column::Genre => CellValue::String(self.genre.clone()),
            Column::Certificate => self.certificate.clone().into(),
            Column::ImdbRating => Some(self.imdb_rating).into(),
            Column::NumVotes => i64::try_from(self.num_votes)
                .map(CellValue::Integer)
                .unwrap_or(CellValue::Float(self.num_votes as f64)),
            Column::Gross => self.gross.into(),
            Column::Id => CellValue::String(self.id.clone()),
            Column::LogVotes => Some(self.log_votes).into(),
            Column::RatingZ => self.rating_z.into(),
            Column::LogVotesZ => self.log_votes_z.into(),
            Column::OutlierScore => self.outlier_score.into(),
            Column::OutlierReason => self
                .outlier_reason
                .map_or(CellValue::Null, |r| CellValue::String(r.as_str().to_string())),
            Column::Extra(i) => self.extras.get(i).cloned().unwrap_or(CellValue::Null),
        }
    }
}

// ---------------------------------------------------------------------------
// Column – typed handle on one output column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Title,
    ReleasedYear,
    Genre,
    Certificate,
    ImdbRating,
    NumVotes,
    Gross,
    Id,
    LogVotes,
    RatingZ,
    LogVotesZ,
    OutlierScore,
    OutlierReason,
    /// Passthrough column, by position among the extra columns.
    Extra(usize),
}

impl Column {
    /// Wire name of a schema column. `None` for passthrough columns, whose
    /// names live on the table.
    pub fn schema_name(&self) -> Option<&'static str> {
        Some(match self {
            Column::Title => "Series_Title",
            Column::ReleasedYear => "Released_Year",
            Column::Genre => "Genre",
            Column::Certificate => "Certificate",
            Column::ImdbRating => "IMDB_Rating",
            Column::NumVotes => "No_of_Votes",
            Column::Gross => "Gross",
            Column::Id => "id",
            Column::LogVotes => "logVotes",
            Column::RatingZ => "rating_z",
            Column::LogVotesZ => "logVotes_z",
            Column::OutlierScore => "outlier_score",
            Column::OutlierReason => "outlier_reason",
            Column::Extra(_) => return None,
        })
    }

    /// Map a raw header to a schema column, if it is one.
    pub fn from_header(name: &str) -> Option<Column> {
        Some(match name {
            "Series_Title" => Column::Title,
            "Released_Year" => Column::ReleasedYear,
            "Genre" => Column::Genre,
            "Certificate" => Column::Certificate,
            "IMDB_Rating" => Column::ImdbRating,
            "No_of_Votes" => Column::NumVotes,
            "Gross" => Column::Gross,
            _ => return None,
        })
    }

    /// The columns appended by preparation, in output order.
    pub const DERIVED: [Column; 6] = [
        Column::Id,
        Column::LogVotes,
        Column::RatingZ,
        Column::LogVotesZ,
        Column::OutlierScore,
        Column::OutlierReason,
    ];
}

// ---------------------------------------------------------------------------
// MovieTable – the complete prepared dataset
// ---------------------------------------------------------------------------

/// The immutable prepared dataset.
#[derive(Debug, Clone, Default)]
pub struct MovieTable {
    movies: Vec<Movie>,
    /// Output column order.
    columns: Vec<Column>,
    /// Names of passthrough columns.
    extra_columns: Vec<String>,
}

impl MovieTable {
    pub fn new(movies: Vec<Movie>, columns: Vec<Column>, extra_columns: Vec<String>) -> Self {
        MovieTable {
            movies,
            columns,
            extra_columns,
        }
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn column_name(&self, column: Column) -> &str {
        match column {
            Column::Extra(i) => self.extra_columns.get(i).map_or("", String::as_str),
            other => other.schema_name().unwrap_or(""),
        }
    }

    /// Number of movies.
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Flatten one movie into an output record in column order.
    pub fn record(&self, movie: &Movie) -> MovieRecord {
        let fields = self
            .columns
            .iter()
            .map(|&col| (self.column_name(col).to_string(), movie.cell(col)))
            .collect();
        MovieRecord { fields }
    }

    pub fn find(&self, id: &str) -> Option<&Movie> {
        self.movies.iter().find(|m| m.id == id)
    }
}

// ---------------------------------------------------------------------------
// MovieView – a filtered logical copy that borrows the table
// ---------------------------------------------------------------------------

/// A subset of table rows, kept as indices in table order.
#[derive(Debug, Clone)]
pub struct MovieView<'a> {
    table: &'a MovieTable,
    rows: Vec<usize>,
}

impl<'a> MovieView<'a> {
    /// A view over every row.
    pub fn full(table: &'a MovieTable) -> Self {
        MovieView {
            table,
            rows: (0..table.len()).collect(),
        }
    }

    pub(crate) fn from_rows(table: &'a MovieTable, rows: Vec<usize>) -> Self {
        MovieView { table, rows }
    }

    pub fn table(&self) -> &'a MovieTable {
        self.table
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Movie> + '_ {
        let movies = self.table.movies();
        self.rows.iter().map(move |&i| &movies[i])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// MovieRecord – flat, JSON-safe output row
// ---------------------------------------------------------------------------

/// One output row: column name → value, in table column order.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord {
    pub fields: Vec<(String, CellValue)>,
}

impl MovieRecord {
    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn id(&self) -> Option<&str> {
        match self.get("id") {
            Some(CellValue::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for MovieRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_float_serializes_as_null() {
        let json = serde_json::to_string(&CellValue::Float(f64::NAN)).unwrap();
        assert_eq!(json, "null");
        let json = serde_json::to_string(&CellValue::Float(f64::INFINITY)).unwrap();
        assert_eq!(json, "null");
        assert_eq!(CellValue::from(Some(f64::NAN)), CellValue::Null);
    }

    #[test]
    fn test_infer_cell_types() {
        assert_eq!(CellValue::infer(""), CellValue::Null);
        assert_eq!(CellValue::infer("142 min"), CellValue::String("142 min".into()));
        assert_eq!(CellValue::infer("80"), CellValue::Integer(80));
        assert_eq!(CellValue::infer("8.5"), CellValue::Float(8.5));
        assert_eq!(CellValue::infer("nan"), CellValue::Null);
    }

    #[test]
    fn test_classify_threshold_is_inclusive() {
        assert_eq!(OutlierReason::classify(Some(2.0)), OutlierReason::HighRatingLowVotes);
        assert_eq!(OutlierReason::classify(Some(1.99)), OutlierReason::Normal);
        assert_eq!(OutlierReason::classify(None), OutlierReason::Normal);
    }

    #[test]
    fn test_genres_split_on_comma_space() {
        let movie = Movie {
            id: "0".into(),
            title: "T".into(),
            released_year: 2000,
            genre: "Crime, Drama".into(),
            certificate: None,
            imdb_rating: 8.0,
            num_votes: 10,
            gross: None,
            log_votes: 1.0,
            rating_z: None,
            log_votes_z: None,
            outlier_score: None,
            outlier_reason: None,
            extras: Vec::new(),
        };
        assert_eq!(movie.genres().collect::<Vec<_>>(), vec!["Crime", "Drama"]);
    }
}
