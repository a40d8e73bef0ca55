//! Numeric coercion and removal of incomplete training rows.

use crate::join::{JoinedGame, JoinedTable};

/// Parse a cell as a number, treating anything non-numeric as missing.
///
/// Placeholders such as `--`, empty cells and `NaN` all become `None`.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Outcome of a cleaning pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanStats {
    pub before: usize,
    pub missing_features: usize,
    pub missing_target: usize,
}

impl CleanStats {
    pub fn kept(&self) -> usize {
        self.before - self.missing_features - self.missing_target
    }
}

fn has_features(game: &JoinedGame) -> bool {
    game.weighted_score.is_some()
        && game.momentum.is_some()
        && game.opp_avg_points_allowed.is_some()
        && game.opp_def_tier.is_some()
}

/// Drop every row that lacks one of the four model features or its points scored.
///
/// Never fails: incomplete rows only shrink the training set.
pub fn drop_incomplete(table: &mut JoinedTable) -> CleanStats {
    let before = table.rows.len();
    let mut missing_features = 0usize;
    let mut missing_target = 0usize;

    table.rows.retain(|game| {
        if !has_features(game) {
            log::debug!(
                "Dropping {} vs {} (game {:?}): incomplete features",
                game.team,
                game.opponent,
                game.game_num
            );
            missing_features += 1;
            false
        } else if game.points_scored.is_none() {
            missing_target += 1;
            false
        } else {
            true
        }
    });

    let stats = CleanStats {
        before,
        missing_features,
        missing_target,
    };
    if stats.kept() < before {
        log::warn!(
            "Dropped {} of {} games ({} missing features, {} missing points scored)",
            before - stats.kept(),
            before,
            missing_features,
            missing_target
        );
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(weighted: Option<f64>, points: Option<f64>) -> JoinedGame {
        JoinedGame {
            team: "Bears".to_string(),
            opponent: "Lions".to_string(),
            game_num: Some(1),
            points_scored: points,
            opp_def_tier: Some(2.0),
            weighted_score: weighted,
            momentum: Some(0.5),
            tier_avgs: [None; 4],
            opp_avg_points_allowed: Some(21.0),
        }
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric("24"), Some(24.0));
        assert_eq!(coerce_numeric(" 3.5 "), Some(3.5));
        assert_eq!(coerce_numeric("-1.25"), Some(-1.25));
        assert_eq!(coerce_numeric("--"), None);
        assert_eq!(coerce_numeric(""), None);
        assert_eq!(coerce_numeric("NaN"), None);
        assert_eq!(coerce_numeric("n/a"), None);
    }

    #[test]
    fn test_drop_incomplete_rows() {
        let mut table = JoinedTable {
            columns: Vec::new(),
            rows: vec![
                game(Some(20.0), Some(24.0)),
                game(None, Some(17.0)),
                game(Some(18.0), None),
                game(Some(25.0), Some(31.0)),
            ],
        };

        let stats = drop_incomplete(&mut table);
        assert_eq!(stats.before, 4);
        assert_eq!(stats.missing_features, 1);
        assert_eq!(stats.missing_target, 1);
        assert_eq!(stats.kept(), 2);
        assert_eq!(table.len(), 2);
        assert!(table.rows.iter().all(has_features));
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let mut table = JoinedTable {
            columns: Vec::new(),
            rows: vec![game(Some(20.0), Some(24.0)), game(None, Some(17.0))],
        };
        let first = drop_incomplete(&mut table).kept();
        let second = drop_incomplete(&mut table);
        assert_eq!(first, second.kept());
        assert_eq!(second.before, second.kept());
    }
}
