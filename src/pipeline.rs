//! End-to-end run for programmatic use by the CLI and tests.
//!
//! Each stage consumes the previous stage's output; the result is returned as
//! structured data instead of being printed, so callers decide how to report it.

use crate::clean::{drop_incomplete, CleanStats};
use crate::error::Result;
use crate::join::join_sources;
use crate::model::{fit, FittedModel, TrainingSet};
use crate::predict::{predict_matchup, Matchup, MatchupPrediction};
use crate::tables::load_sources;
use std::path::PathBuf;

/// Configuration for a forecast run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory holding Games.csv, Summary.csv and Teams.csv
    pub data_dir: PathBuf,
    /// The two teams to predict
    pub matchup: Matchup,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            matchup: Matchup::default(),
        }
    }
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct Forecast {
    /// Rows in Games.csv
    pub games_loaded: usize,
    /// Rows in the joined table before cleaning
    pub joined_rows: usize,
    pub clean: CleanStats,
    pub model: FittedModel,
    pub prediction: MatchupPrediction,
}

/// Progress reported between stages
#[derive(Debug, Clone, Copy)]
pub enum Stage<'a> {
    /// Incomplete rows have been dropped
    Cleaned(&'a CleanStats),
    /// The model has been fitted
    Trained(&'a FittedModel),
}

/// Load, join, clean, fit and predict.
///
/// `on_stage` is called after cleaning and after fitting.
pub fn run(config: &RunConfig, mut on_stage: impl FnMut(Stage)) -> Result<Forecast> {
    let sources = load_sources(&config.data_dir)?;
    let games_loaded = sources.games.len();

    let mut joined = join_sources(sources)?;
    let joined_rows = joined.table.len();
    log::info!(
        "Joined {} games against {} summaries and {} defense rows",
        joined_rows,
        joined.summaries.len(),
        joined.defenses.len()
    );

    let clean = drop_incomplete(&mut joined.table);
    on_stage(Stage::Cleaned(&clean));

    let training = TrainingSet::from_table(&joined.table)?;
    let model = fit(&training)?;
    on_stage(Stage::Trained(&model));

    let prediction = predict_matchup(
        &model,
        &joined.summaries,
        &joined.defenses,
        &config.matchup,
    )?;

    Ok(Forecast {
        games_loaded,
        joined_rows,
        clean,
        model,
        prediction,
    })
}
