//! Matchup predictions from the fitted model.
//!
//! Each side of a matchup is scored independently: its own offensive summary
//! against the other side's defensive averages, passed once through the model.

use crate::error::{ForecastError, Result};
use crate::join::columns::{AVG_POINTS_ALLOWED, DEF_TIER_RANK, MOMENTUM};
use crate::join::{TeamDefense, TeamIndex, TeamSummary};
use crate::model::{FeatureVector, FittedModel};

pub const DEFAULT_TEAM: &str = "New England Patriots";
pub const DEFAULT_OPPONENT: &str = "Seattle Seahawks";

/// The two teams to predict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matchup {
    pub team: String,
    pub opponent: String,
}

impl Matchup {
    pub fn new(team: impl Into<String>, opponent: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            opponent: opponent.into(),
        }
    }

    /// The same matchup seen from the other side
    pub fn swapped(&self) -> Self {
        Self::new(self.opponent.clone(), self.team.clone())
    }
}

impl Default for Matchup {
    fn default() -> Self {
        Self::new(DEFAULT_TEAM, DEFAULT_OPPONENT)
    }
}

/// A team's offensive summary row and its own defense row
#[derive(Debug, Clone, Copy)]
pub struct TeamProfile<'a> {
    pub offense: &'a TeamSummary,
    pub defense: &'a TeamDefense,
}

impl<'a> TeamProfile<'a> {
    pub fn lookup(
        team: &str,
        summaries: &'a TeamIndex<TeamSummary>,
        defenses: &'a TeamIndex<TeamDefense>,
    ) -> Result<Self> {
        Ok(Self {
            offense: summaries.require(team)?,
            defense: defenses.require(team)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.offense.team
    }
}

/// Weighted playoff offense score, falling back to average points scored per game.
pub fn weighted_score(offense: &TeamSummary, defense: &TeamDefense) -> Option<f64> {
    match offense.weighted_score {
        Some(score) => Some(score),
        None => {
            log::info!(
                "{}: no numeric weighted playoff offense score, using average points scored ({:?})",
                offense.team,
                defense.avg_points_scored
            );
            defense.avg_points_scored
        }
    }
}

fn required(team: &str, field: &str, value: Option<f64>) -> Result<f64> {
    value.ok_or_else(|| ForecastError::IncompleteTeam {
        team: team.to_string(),
        field: field.to_string(),
    })
}

/// Model input for `own` scoring against `opponent`.
pub fn feature_vector(own: &TeamProfile, opponent: &TeamProfile) -> Result<FeatureVector> {
    let team = own.name();
    Ok(FeatureVector {
        weighted_score: required(
            team,
            "Weighted Playoff Offense Score",
            weighted_score(own.offense, own.defense),
        )?,
        momentum: required(team, MOMENTUM, own.offense.momentum)?,
        opp_avg_points_allowed: required(
            opponent.name(),
            AVG_POINTS_ALLOWED,
            opponent.defense.avg_points_allowed,
        )?,
        opp_def_tier: required(opponent.name(), DEF_TIER_RANK, opponent.defense.tier_rank)?,
    })
}

/// One side's prediction
#[derive(Debug, Clone, PartialEq)]
pub struct TeamPrediction {
    pub team: String,
    pub opponent: String,
    pub features: FeatureVector,
    pub points: f64,
}

/// Predictions for both sides of a matchup
#[derive(Debug, Clone, PartialEq)]
pub struct MatchupPrediction {
    pub team: TeamPrediction,
    pub opponent: TeamPrediction,
}

/// Look up both teams and run one forward pass per side.
pub fn predict_matchup(
    model: &FittedModel,
    summaries: &TeamIndex<TeamSummary>,
    defenses: &TeamIndex<TeamDefense>,
    matchup: &Matchup,
) -> Result<MatchupPrediction> {
    let team = TeamProfile::lookup(&matchup.team, summaries, defenses)?;
    let opponent = TeamProfile::lookup(&matchup.opponent, summaries, defenses)?;

    let side = |own: &TeamProfile, opp: &TeamProfile| -> Result<TeamPrediction> {
        let features = feature_vector(own, opp)?;
        let points = model.predict(&features);
        log::debug!("{} vs {}: {:?} -> {:.3}", own.name(), opp.name(), features, points);
        Ok(TeamPrediction {
            team: own.name().to_string(),
            opponent: opp.name().to_string(),
            features,
            points,
        })
    };

    Ok(MatchupPrediction {
        team: side(&team, &opponent)?,
        opponent: side(&opponent, &team)?,
    })
}
