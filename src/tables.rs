//! CSV table loading.
//!
//! Tables are held as a header plus raw string records. Typed views are built
//! later by the join stage, after canonical column names are in place.

use crate::error::{ForecastError, Result};
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use std::path::Path;

/// Per-game results, one row per team per game
pub const GAMES_FILE: &str = "Games.csv";
/// Per-team offensive summary
pub const SUMMARY_FILE: &str = "Summary.csv";
/// Per-team defensive and scoring averages
pub const TEAMS_FILE: &str = "Teams.csv";

/// An in-memory CSV table.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    records: Vec<StringRecord>,
}

impl Table {
    /// Parse a table from any reader. `name` is used in error messages.
    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<Self> {
        let parse_err = |source| ForecastError::Parse {
            file: name.to_string(),
            source,
        };

        let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = reader
            .headers()
            .map_err(parse_err)?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let records = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(parse_err)?;

        Ok(Self {
            name: name.to_string(),
            headers,
            records,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file = std::fs::File::open(path)?;
        Self::from_reader(&name, file)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &StringRecord> {
        self.records.iter()
    }

    /// Index of a column by exact header name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Look up every named column, failing with the full list of missing ones.
    pub fn require_columns<const N: usize>(&self, names: [&str; N]) -> Result<[usize; N]> {
        let missing: Vec<String> = names
            .iter()
            .filter(|n| !self.has_column(n))
            .map(|n| n.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ForecastError::MissingColumn {
                table: self.name.clone(),
                missing,
                available: self.headers.clone(),
            });
        }
        // Every name was found above
        Ok(names.map(|n| self.column(n).unwrap_or_default()))
    }

    /// Rename headers in place. Pairs whose source column is absent are skipped.
    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) {
        for (from, to) in renames {
            if let Some(idx) = self.column(from) {
                log::debug!("{}: renaming column '{}' -> '{}'", self.name, from, to);
                self.headers[idx] = to.to_string();
            }
        }
    }
}

/// The three source tables, loaded together.
#[derive(Debug, Clone)]
pub struct Sources {
    pub games: Table,
    pub summary: Table,
    pub teams: Table,
}

/// Load `Games.csv`, `Summary.csv` and `Teams.csv` from `dir`.
///
/// All three files are checked for existence before any of them is read, so a
/// missing file is reported without partially loading the others.
pub fn load_sources(dir: &Path) -> Result<Sources> {
    for file in [GAMES_FILE, SUMMARY_FILE, TEAMS_FILE] {
        if !dir.join(file).exists() {
            let dir = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
            return Err(ForecastError::MissingSource {
                file: file.to_string(),
                dir,
            });
        }
    }

    let games = Table::from_path(&dir.join(GAMES_FILE))?;
    let summary = Table::from_path(&dir.join(SUMMARY_FILE))?;
    let teams = Table::from_path(&dir.join(TEAMS_FILE))?;

    log::info!(
        "Loaded {} games, {} team summaries, {} team defense rows",
        games.len(),
        summary.len(),
        teams.len()
    );

    Ok(Sources {
        games,
        summary,
        teams,
    })
}
