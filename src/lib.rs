//! Gridiron Forecast
//!
//! Predicts the score of a football matchup from a linear model fitted on
//! per-game results joined with team offensive and defensive summaries.
//!
//! This library provides:
//! - `tables`: CSV loading for Games.csv, Summary.csv and Teams.csv
//! - `join`: canonical column names and the team/opponent joins
//! - `clean`: numeric coercion and removal of incomplete rows
//! - `model`: ordinary least-squares fit over the four matchup features
//! - `predict`: per-team feature vectors and matchup predictions
//! - `report`: winner determination, console and CSV output
//! - `pipeline`: the full run, returning structured results
//!
//! Binaries:
//! - `matchup-predict`: command-line front end for a single matchup

pub mod clean;
pub mod error;
pub mod join;
pub mod model;
pub mod pipeline;
pub mod predict;
pub mod report;
pub mod tables;

pub use error::{ForecastError, Result};
pub use model::{FeatureVector, FittedModel};
pub use predict::{Matchup, MatchupPrediction};
