//! Human-readable and CSV output for a matchup prediction.

use crate::error::Result;
use crate::model::{FittedModel, FEATURE_LABELS};
use crate::predict::{MatchupPrediction, TeamPrediction};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

/// Winner and margin, or a tie
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Winner {
        team: String,
        loser: String,
        margin: f64,
    },
    Tie,
}

impl Outcome {
    pub fn margin(&self) -> f64 {
        match self {
            Outcome::Winner { margin, .. } => *margin,
            Outcome::Tie => 0.0,
        }
    }
}

/// The side with the higher prediction wins by the absolute difference.
pub fn decide(prediction: &MatchupPrediction) -> Outcome {
    let (a, b) = (&prediction.team, &prediction.opponent);
    let (winner, loser) = match a.points.partial_cmp(&b.points) {
        Some(std::cmp::Ordering::Greater) => (a, b),
        Some(std::cmp::Ordering::Less) => (b, a),
        _ => return Outcome::Tie,
    };
    Outcome::Winner {
        team: winner.team.clone(),
        loser: loser.team.clone(),
        margin: winner.points - loser.points,
    }
}

/// Format the prediction block printed at the end of a run.
pub fn render(prediction: &MatchupPrediction) -> Result<String> {
    let mut out = String::new();
    let (team, opponent) = (&prediction.team, &prediction.opponent);
    let width = team.team.chars().count().max(opponent.team.chars().count()) + 1;

    writeln!(out, "\n{:=<60}", "")?;
    writeln!(out, "PREDICTION: {} vs {}", team.team, opponent.team)?;
    writeln!(out, "{:=<60}", "")?;

    writeln!(out)?;
    for side in [team, opponent] {
        writeln!(
            out,
            "{:<width$} {:.1} points",
            format!("{}:", side.team),
            side.points,
            width = width
        )?;
    }

    writeln!(out, "\n{:=<60}", "")?;
    match decide(prediction) {
        Outcome::Winner { team, margin, .. } => {
            writeln!(out, "PREDICTED WINNER: {}", team)?;
            writeln!(out, "Predicted Margin: {:.1} points", margin)?;
        }
        Outcome::Tie => writeln!(out, "PREDICTED RESULT: Tie")?,
    }
    writeln!(out, "{:=<60}", "")?;
    Ok(out)
}

/// Format the fitted intercept and coefficients.
pub fn render_model(model: &FittedModel) -> String {
    let mut out = format!(
        "Model ({} games, {:?} solver)\n  {:<32} {:>10.4}\n",
        model.training_rows, model.solver, "Intercept", model.intercept
    );
    for (label, coef) in FEATURE_LABELS.iter().zip(model.coefficients) {
        out.push_str(&format!("  {:<32} {:>10.4}\n", label, coef));
    }
    out
}

/// One CSV output row
#[derive(Debug, Serialize)]
struct PredictionRow<'a> {
    team: &'a str,
    opponent: &'a str,
    weighted_playoff_offense_score: f64,
    offensive_momentum: f64,
    opp_avg_points_allowed: f64,
    opp_def_tier: f64,
    predicted_points: f64,
}

impl<'a> From<&'a TeamPrediction> for PredictionRow<'a> {
    fn from(p: &'a TeamPrediction) -> Self {
        Self {
            team: &p.team,
            opponent: &p.opponent,
            weighted_playoff_offense_score: p.features.weighted_score,
            offensive_momentum: p.features.momentum,
            opp_avg_points_allowed: p.features.opp_avg_points_allowed,
            opp_def_tier: p.features.opp_def_tier,
            predicted_points: p.points,
        }
    }
}

/// Write both sides of the prediction as CSV, one row per team.
pub fn write_csv(path: &Path, prediction: &MatchupPrediction) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for side in [&prediction.team, &prediction.opponent] {
        writer.serialize(PredictionRow::from(side))?;
    }
    writer.flush()?;
    log::info!("Prediction written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FeatureVector;

    fn side(team: &str, opponent: &str, points: f64) -> TeamPrediction {
        TeamPrediction {
            team: team.to_string(),
            opponent: opponent.to_string(),
            features: FeatureVector {
                weighted_score: 24.0,
                momentum: 0.5,
                opp_avg_points_allowed: 20.0,
                opp_def_tier: 2.0,
            },
            points,
        }
    }

    fn matchup(a: f64, b: f64) -> MatchupPrediction {
        MatchupPrediction {
            team: side("Bears", "Lions", a),
            opponent: side("Lions", "Bears", b),
        }
    }

    #[test]
    fn test_higher_prediction_wins() {
        let outcome = decide(&matchup(24.36, 20.1));
        match &outcome {
            Outcome::Winner { team, loser, margin } => {
                assert_eq!(team, "Bears");
                assert_eq!(loser, "Lions");
                assert!((margin - 4.26).abs() < 1e-9);
            }
            Outcome::Tie => panic!("expected a winner"),
        }

        let outcome = decide(&matchup(13.0, 27.5));
        assert!(matches!(&outcome, Outcome::Winner { team, .. } if team == "Lions"));
        assert_eq!(outcome.margin(), 14.5);
    }

    #[test]
    fn test_equal_predictions_tie() {
        let outcome = decide(&matchup(21.0, 21.0));
        assert_eq!(outcome, Outcome::Tie);
        assert_eq!(outcome.margin(), 0.0);
    }

    #[test]
    fn test_render_prints_one_decimal() {
        let text = render(&matchup(24.36, 20.1)).unwrap();
        assert!(text.contains("PREDICTION: Bears vs Lions"));
        assert!(text.contains("Bears: 24.4 points"));
        assert!(text.contains("Lions: 20.1 points"));
        assert!(text.contains("PREDICTED WINNER: Bears"));
        assert!(text.contains("Predicted Margin: 4.3 points"));
    }

    #[test]
    fn test_render_aligns_non_ascii_names() {
        let prediction = MatchupPrediction {
            team: side("Montréal Alouettes", "Bears", 24.0),
            opponent: side("Bears", "Montréal Alouettes", 20.0),
        };
        let text = render(&prediction).unwrap();
        let columns: Vec<usize> = text
            .lines()
            .filter(|l| l.ends_with(" points") && !l.starts_with("Predicted"))
            .map(|l| l.chars().take_while(|c| !c.is_ascii_digit()).count())
            .collect();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0], columns[1]);
        assert!(text.contains("Montréal Alouettes: 24.0 points"));
    }

    #[test]
    fn test_render_tie() {
        let text = render(&matchup(17.0, 17.0)).unwrap();
        assert!(text.contains("PREDICTED RESULT: Tie"));
        assert!(!text.contains("PREDICTED WINNER"));
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prediction.csv");
        write_csv(&path, &matchup(24.0, 20.0)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("team,opponent,weighted_playoff_offense_score"));
        assert!(lines[1].starts_with("Bears,Lions,24.0,0.5,20.0,2.0,24.0"));
    }
}
