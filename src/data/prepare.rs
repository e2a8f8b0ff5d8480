use std::collections::HashSet;

use super::loader::RawTable;
use super::model::{CellValue, Column, Movie, MovieTable, OutlierReason};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Cleaning: raw rows → typed movies
// ---------------------------------------------------------------------------

/// Clean a raw table, drop unusable rows and duplicates, then derive the
/// popularity and outlier columns over the whole cleaned set.
///
/// Statistics are computed here exactly once. Nothing downstream ever
/// recomputes them on a filtered subset.
pub fn prepare(raw: RawTable) -> Result<MovieTable, LoadError> {
    let layout = Layout::resolve(&raw)?;
    let n_raw = raw.rows.len();

    let mut seen: HashSet<(String, i64)> = HashSet::new();
    let mut movies = Vec::with_capacity(n_raw);
    let mut dropped = 0usize;
    let mut duplicates = 0usize;

    for (index, row) in raw.rows.into_iter().enumerate() {
        let Some(movie) = layout.clean_row(index, &row) else {
            dropped += 1;
            continue;
        };
        if !seen.insert((movie.title.clone(), movie.released_year)) {
            duplicates += 1;
            continue;
        }
        movies.push(movie);
    }

    if dropped > 0 {
        log::debug!("Dropped {dropped} of {n_raw} rows with non-numeric year, rating or votes");
    }
    if duplicates > 0 {
        log::debug!("Dropped {duplicates} duplicate (title, year) rows");
    }

    let mut columns = layout.columns;
    columns.push(Column::Id);
    columns.push(Column::LogVotes);
    if movies.is_empty() {
        log::warn!("No usable rows after cleaning; outlier columns omitted");
    } else {
        derive_outliers(&mut movies);
        columns.extend(&Column::DERIVED[2..]);
    }

    log::info!("Prepared {} movies", movies.len());
    Ok(MovieTable::new(movies, columns, layout.extra_names))
}

/// Where each schema field lives in the raw row.
struct Layout {
    title: usize,
    year: usize,
    genre: usize,
    rating: usize,
    votes: usize,
    certificate: Option<usize>,
    gross: Option<usize>,
    /// Raw column index of each passthrough column.
    extras: Vec<usize>,
    extra_names: Vec<String>,
    /// Output order of the raw columns.
    columns: Vec<Column>,
}

impl Layout {
    fn resolve(raw: &RawTable) -> Result<Self, LoadError> {
        let required = |name: &'static str| raw.column_index(name).ok_or(LoadError::MissingColumn(name));

        let mut columns = Vec::with_capacity(raw.headers.len());
        let mut extras = Vec::new();
        let mut extra_names = Vec::new();
        for (i, header) in raw.headers.iter().enumerate() {
            match Column::from_header(header) {
                // Only the first occurrence of a schema header counts.
                Some(col) if !columns.contains(&col) => columns.push(col),
                _ => {
                    columns.push(Column::Extra(extras.len()));
                    extras.push(i);
                    extra_names.push(header.clone());
                }
            }
        }

        Ok(Layout {
            title: required("Series_Title")?,
            year: required("Released_Year")?,
            genre: required("Genre")?,
            rating: required("IMDB_Rating")?,
            votes: required("No_of_Votes")?,
            certificate: raw.column_index("Certificate"),
            gross: raw.column_index("Gross"),
            extras,
            extra_names,
            columns,
        })
    }

    /// Build a movie from one raw row, or `None` when a required number is
    /// unusable.
    fn clean_row(&self, index: usize, row: &[CellValue]) -> Option<Movie> {
        let cell = |i: usize| row.get(i).unwrap_or(&NULL_CELL);

        let released_year = to_year(cell(self.year))?;
        let imdb_rating = to_f64(cell(self.rating))?;
        let num_votes = to_count(cell(self.votes))?;
        let gross = self.gross.and_then(|i| to_f64(cell(i)));
        let certificate = self.certificate.and_then(|i| to_text(cell(i)));

        Some(Movie {
            id: index.to_string(),
            title: to_text(cell(self.title)).unwrap_or_default(),
            released_year,
            genre: to_text(cell(self.genre)).unwrap_or_default(),
            certificate,
            imdb_rating,
            num_votes,
            gross,
            log_votes: (num_votes as f64 + 1.0).log10(),
            rating_z: None,
            log_votes_z: None,
            outlier_score: None,
            outlier_reason: None,
            extras: self.extras.iter().map(|&i| passthrough(cell(i))).collect(),
        })
    }
}

// -- Coercion helpers --

static NULL_CELL: CellValue = CellValue::Null;

fn strip_thousands(s: &str) -> String {
    s.replace(',', "")
}

fn parse_number(s: &str) -> Option<f64> {
    strip_thousands(s).trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Coerce to a finite float. Thousands separators are tolerated.
fn to_f64(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::String(s) => parse_number(s),
        other => other.as_f64(),
    }
}

fn to_year(cell: &CellValue) -> Option<i64> {
    match cell {
        CellValue::Integer(i) => Some(*i),
        other => to_f64(other).map(|f| f.trunc() as i64),
    }
}

/// Largest accepted count; the range of a signed 64-bit column.
const MAX_COUNT: f64 = i64::MAX as f64;

/// Coerce to a non-negative integer count no larger than `i64::MAX`.
fn to_count(cell: &CellValue) -> Option<u64> {
    let exact = match cell {
        CellValue::Integer(i) => Some(*i),
        CellValue::String(s) => strip_thousands(s).trim().parse::<i64>().ok(),
        _ => None,
    };
    match exact {
        Some(i) => u64::try_from(i).ok(),
        None => to_f64(cell)
            .filter(|f| (0.0..MAX_COUNT).contains(f))
            .map(|f| f.trunc() as u64),
    }
}

/// Schema text columns are taken as read, never reparsed.
fn to_text(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Null => None,
        CellValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Passthrough cells get the dataframe-style type guess.
fn passthrough(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::String(s) => CellValue::infer(s),
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Feature engineering
// ---------------------------------------------------------------------------

/// Mean and sample standard deviation (n − 1). `None` when undefined or
/// when the deviation is zero.
pub fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = var.sqrt();
    (std.is_finite() && std > 0.0).then_some((mean, std))
}

fn derive_outliers(movies: &mut [Movie]) {
    let ratings: Vec<f64> = movies.iter().map(|m| m.imdb_rating).collect();
    let log_votes: Vec<f64> = movies.iter().map(|m| m.log_votes).collect();

    let rating_stats = mean_and_std(&ratings);
    let votes_stats = mean_and_std(&log_votes);
    if rating_stats.is_none() || votes_stats.is_none() {
        log::warn!(
            "Outlier statistics undefined over {} movies; every movie classified Normal",
            movies.len()
        );
    }

    let z = |v: f64, stats: Option<(f64, f64)>| stats.map(|(mean, std)| (v - mean) / std);

    for movie in movies.iter_mut() {
        movie.rating_z = z(movie.imdb_rating, rating_stats);
        movie.log_votes_z = z(movie.log_votes, votes_stats);
        movie.outlier_score = match (movie.rating_z, movie.log_votes_z) {
            (Some(r), Some(v)) => Some(r - v),
            _ => None,
        };
        movie.outlier_reason = Some(OutlierReason::classify(movie.outlier_score));
    }

    let flagged = movies
        .iter()
        .filter(|m| m.outlier_reason.is_some_and(|r| !r.is_normal()))
        .count();
    log::info!("Flagged {flagged} of {} movies as outliers", movies.len());
}
