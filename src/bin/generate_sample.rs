use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

/// Write a synthetic movie dataset in the raw IMDb layout, dirty cells included.
#[derive(Parser, Debug)]
struct Args {
    /// Output file; `.csv` or `.parquet`.
    #[arg(long, short, default_value = "sample_movies.csv")]
    output: PathBuf,

    #[arg(long, default_value_t = 1000)]
    rows: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

const GENRES: [&str; 12] = [
    "Drama", "Crime", "Action", "Adventure", "Comedy", "Biography", "Animation", "Mystery",
    "Thriller", "Romance", "Sci-Fi", "Horror",
];
const CERTIFICATES: [&str; 6] = ["U", "UA", "A", "R", "PG-13", "PG"];
const WORDS: [&str; 12] = [
    "Silent", "River", "Night", "Empire", "Last", "Golden", "Shadow", "City", "Winter", "Road",
    "Garden", "Storm",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Format an integer with thousands separators, the way the raw dump does.
fn with_commas(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// One raw row, all cells as text.
struct RawMovie {
    title: String,
    year: String,
    certificate: String,
    runtime: String,
    genre: String,
    rating: f64,
    votes: String,
    gross: String,
    director: String,
}

fn generate(rng: &mut SimpleRng, rows: usize) -> Vec<RawMovie> {
    let mut movies: Vec<RawMovie> = Vec::with_capacity(rows);
    for i in 0..rows {
        // Every fiftieth row repeats an earlier title and year.
        if i > 0 && i % 50 == 0 {
            let src = &movies[rng.below(movies.len())];
            let dup = RawMovie {
                title: src.title.clone(),
                year: src.year.clone(),
                certificate: src.certificate.clone(),
                runtime: src.runtime.clone(),
                genre: src.genre.clone(),
                rating: src.rating,
                votes: src.votes.clone(),
                gross: src.gross.clone(),
                director: src.director.clone(),
            };
            movies.push(dup);
            continue;
        }

        let n_genres = 1 + rng.below(3);
        let mut genres: Vec<&str> = Vec::with_capacity(n_genres);
        while genres.len() < n_genres {
            let g = rng.pick(&GENRES);
            if !genres.contains(&g) {
                genres.push(g);
            }
        }

        // Log-normal popularity; a few obscure, highly rated films.
        let votes = 10f64.powf(rng.gauss(5.0, 0.6)).max(25_000.0) as u64;
        let obscure = rng.below(40) == 0;
        let (rating, votes) = if obscure {
            (rng.gauss(9.0, 0.2).clamp(8.5, 9.8), 25_000 + rng.below(5_000) as u64)
        } else {
            (rng.gauss(7.9, 0.25).clamp(7.6, 9.3), votes)
        };

        let year = match rng.below(200) {
            0 => "PG".to_string(),
            _ => (1920 + rng.below(100)).to_string(),
        };
        let gross = match rng.below(6) {
            0 => String::new(),
            _ => with_commas((rng.next_f64() * 500_000_000.0) as u64),
        };

        movies.push(RawMovie {
            title: format!("{} {} {}", rng.pick(&WORDS), rng.pick(&WORDS), i),
            year,
            certificate: match rng.below(8) {
                0 => String::new(),
                _ => rng.pick(&CERTIFICATES).to_string(),
            },
            runtime: format!("{} min", 80 + rng.below(100)),
            genre: genres.join(", "),
            rating: (rating * 10.0).round() / 10.0,
            votes: with_commas(votes),
            gross,
            director: format!("Director {}", rng.below(200)),
        });
    }
    movies
}

const HEADERS: [&str; 9] = [
    "Series_Title",
    "Released_Year",
    "Certificate",
    "Runtime",
    "Genre",
    "IMDB_Rating",
    "Director",
    "No_of_Votes",
    "Gross",
];

fn write_csv(path: &PathBuf, movies: &[RawMovie]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(HEADERS)?;
    for m in movies {
        writer.write_record([
            m.title.as_str(),
            m.year.as_str(),
            m.certificate.as_str(),
            m.runtime.as_str(),
            m.genre.as_str(),
            m.rating.to_string().as_str(),
            m.director.as_str(),
            m.votes.as_str(),
            m.gross.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &PathBuf, movies: &[RawMovie]) -> Result<()> {
    let text = |f: fn(&RawMovie) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(
            movies
                .iter()
                .map(|m| Some(f(m)).filter(|s| !s.is_empty()))
                .collect::<Vec<_>>(),
        ))
    };

    let fields = HEADERS
        .iter()
        .map(|&name| {
            let ty = if name == "IMDB_Rating" {
                DataType::Float64
            } else {
                DataType::Utf8
            };
            Field::new(name, ty, true)
        })
        .collect::<Vec<_>>();
    let schema = Arc::new(Schema::new(fields));

    let columns: Vec<ArrayRef> = vec![
        text(|m| m.title.as_str()),
        text(|m| m.year.as_str()),
        text(|m| m.certificate.as_str()),
        text(|m| m.runtime.as_str()),
        text(|m| m.genre.as_str()),
        Arc::new(Float64Array::from(
            movies.iter().map(|m| m.rating).collect::<Vec<_>>(),
        )),
        text(|m| m.director.as_str()),
        text(|m| m.votes.as_str()),
        text(|m| m.gross.as_str()),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);
    let movies = generate(&mut rng, args.rows);

    let ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => write_csv(&args.output, &movies)?,
        "parquet" | "pq" => write_parquet(&args.output, &movies)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    println!("Wrote {} movies to {}", movies.len(), args.output.display());
    Ok(())
}
