//! Ordinary least-squares model over the four matchup features.
//!
//! The regression is fitted with `linfa-linear`. When the centered design is
//! rank deficient (for example, every game is between the same two teams, so
//! the opponent columns are collinear) the minimum-norm least-squares solution
//! is computed instead from the SVD of the centered design.

use crate::error::{ForecastError, Result};
use crate::join::columns::{MOMENTUM, OPP_AVG_POINTS_ALLOWED, OPP_DEF_TIER, WEIGHTED_SCORE};
use crate::join::JoinedTable;
use linfa::prelude::*;
use linfa_linalg::svd::{SvdSort, SVD};
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2, Axis};

pub const NUM_FEATURES: usize = 4;

/// Joined-table columns the model is trained on, in order.
pub const FEATURE_COLUMNS: [&str; NUM_FEATURES] = [
    WEIGHTED_SCORE,
    MOMENTUM,
    OPP_AVG_POINTS_ALLOWED,
    OPP_DEF_TIER,
];

/// Display names for [`FEATURE_COLUMNS`]
pub const FEATURE_LABELS: [&str; NUM_FEATURES] = [
    "Weighted Playoff Offense Score",
    "Offensive Momentum",
    "Opponent Avg Points Allowed",
    "Opponent Defensive Tier",
];

/// Fewest usable games the trainer accepts
pub const MIN_TRAINING_ROWS: usize = 2;

/// One row of model input, in [`FEATURE_COLUMNS`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub weighted_score: f64,
    pub momentum: f64,
    pub opp_avg_points_allowed: f64,
    pub opp_def_tier: f64,
}

impl FeatureVector {
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.weighted_score,
            self.momentum,
            self.opp_avg_points_allowed,
            self.opp_def_tier,
        ]
    }
}

/// Feature rows and targets extracted from the cleaned joined table
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub features: Vec<FeatureVector>,
    pub targets: Vec<f64>,
}

impl TrainingSet {
    /// Check that every feature column exists, then collect the complete rows.
    pub fn from_table(table: &JoinedTable) -> Result<Self> {
        let missing: Vec<String> = FEATURE_COLUMNS
            .iter()
            .filter(|c| !table.has_column(c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ForecastError::MissingColumn {
                table: "joined games".to_string(),
                missing,
                available: table.columns.clone(),
            });
        }

        let (features, targets): (Vec<FeatureVector>, Vec<f64>) = table
            .rows
            .iter()
            .filter_map(|g| {
                let features = FeatureVector {
                    weighted_score: g.weighted_score?,
                    momentum: g.momentum?,
                    opp_avg_points_allowed: g.opp_avg_points_allowed?,
                    opp_def_tier: g.opp_def_tier?,
                };
                Some((features, g.points_scored?))
            })
            .unzip();

        Ok(Self { features, targets })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn to_arrays(&self) -> (Array2<f64>, Array1<f64>) {
        let mut records = Array2::<f64>::zeros((self.len(), NUM_FEATURES));
        for (mut row, fv) in records.rows_mut().into_iter().zip(&self.features) {
            for (dst, src) in row.iter_mut().zip(fv.to_array()) {
                *dst = src;
            }
        }
        (records, Array1::from_vec(self.targets.clone()))
    }
}

/// How the coefficients were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solver {
    /// Full-rank fit through `linfa-linear`
    Linfa,
    /// Minimum-norm least squares for a rank-deficient design
    MinimumNorm,
}

/// Fitted intercept and coefficients
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub intercept: f64,
    pub coefficients: [f64; NUM_FEATURES],
    pub solver: Solver,
    pub training_rows: usize,
}

impl FittedModel {
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.to_array())
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

/// Fit points scored on the four features by ordinary least squares.
pub fn fit(training: &TrainingSet) -> Result<FittedModel> {
    if training.len() < MIN_TRAINING_ROWS {
        return Err(ForecastError::InsufficientData {
            rows: training.len(),
            required: MIN_TRAINING_ROWS,
        });
    }

    let (records, targets) = training.to_arrays();

    let x_mean = records
        .mean_axis(Axis(0))
        .ok_or_else(|| ForecastError::Training("empty design matrix".to_string()))?;
    let centered = &records - &x_mean;
    let decomposition = CenteredSvd::new(&centered)?;
    log::debug!(
        "Singular values {:?}, rank {}",
        decomposition.sigma.to_vec(),
        decomposition.rank
    );

    let linfa_fit = if decomposition.rank == NUM_FEATURES {
        let dataset = Dataset::new(records, targets.clone());
        match LinearRegression::new().fit(&dataset) {
            Ok(fitted) => Some((fitted.intercept(), fitted.params().to_vec())),
            Err(e) => {
                log::warn!("linfa fit failed ({}); using minimum-norm least squares", e);
                None
            }
        }
    } else {
        log::warn!(
            "Design matrix has rank {} of {}; using minimum-norm least squares",
            decomposition.rank,
            NUM_FEATURES
        );
        None
    };

    let (intercept, params, solver) = match linfa_fit {
        Some((intercept, params)) if params.iter().all(|p| p.is_finite()) => {
            (intercept, params, Solver::Linfa)
        }
        _ => {
            let y_mean = targets.mean().unwrap_or(0.0);
            let params = decomposition.solve(&(&targets - y_mean));
            let intercept = y_mean - x_mean.dot(&params);
            (intercept, params.to_vec(), Solver::MinimumNorm)
        }
    };

    let mut coefficients = [0.0; NUM_FEATURES];
    for (dst, src) in coefficients.iter_mut().zip(&params) {
        *dst = *src;
    }

    if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
        return Err(ForecastError::Training(format!(
            "non-finite coefficients (intercept {}, coefficients {:?})",
            intercept, coefficients
        )));
    }

    log::info!(
        "Fitted {} games with {:?} solver: intercept {:.4}, coefficients {:?}",
        training.len(),
        solver,
        intercept,
        coefficients
    );

    Ok(FittedModel {
        intercept,
        coefficients,
        solver,
        training_rows: training.len(),
    })
}

/// Thin SVD of the centered design matrix, singular values largest first.
struct CenteredSvd {
    u: Array2<f64>,
    sigma: Array1<f64>,
    vt: Array2<f64>,
    /// Singular values above `eps * max(n, p) * sigma_max`, capped at `n - 1`
    rank: usize,
}

impl CenteredSvd {
    fn new(centered: &Array2<f64>) -> Result<Self> {
        let (u, sigma, vt) = centered
            .svd(true, true)
            .map_err(|e| ForecastError::Training(format!("SVD failed: {}", e)))?
            .sort_svd_desc();
        let (u, vt) = u.zip(vt).ok_or_else(|| {
            ForecastError::Training("SVD returned no singular vectors".to_string())
        })?;

        let (rows, cols) = centered.dim();
        let sigma_max = sigma.iter().cloned().fold(0.0_f64, f64::max);
        let cutoff = f64::EPSILON * rows.max(cols) as f64 * sigma_max;
        // Centering removes one degree of freedom
        let rank = sigma
            .iter()
            .filter(|&&s| s > cutoff)
            .count()
            .min(rows.saturating_sub(1));

        Ok(Self { u, sigma, vt, rank })
    }

    /// Minimum-norm `beta` minimising `|X beta - y|` over the leading `rank` directions.
    fn solve(&self, y: &Array1<f64>) -> Array1<f64> {
        let mut solution = Array1::<f64>::zeros(self.vt.ncols());
        for i in 0..self.rank {
            let weight = self.u.column(i).dot(y) / self.sigma[i];
            solution.scaled_add(weight, &self.vt.row(i));
        }
        solution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::JoinedGame;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn fv(a: f64, b: f64, c: f64, d: f64) -> FeatureVector {
        FeatureVector {
            weighted_score: a,
            momentum: b,
            opp_avg_points_allowed: c,
            opp_def_tier: d,
        }
    }

    fn linear_target(x: &FeatureVector) -> f64 {
        3.0 + 2.0 * x.weighted_score - 1.0 * x.momentum + 0.5 * x.opp_avg_points_allowed
            + 1.5 * x.opp_def_tier
    }

    #[test]
    fn test_fit_recovers_exact_linear_relationship() {
        let features = vec![
            fv(20.0, 1.0, 18.0, 1.0),
            fv(24.0, -0.5, 22.0, 3.0),
            fv(18.5, 0.25, 25.0, 4.0),
            fv(30.0, 2.0, 19.5, 2.0),
            fv(27.0, -1.0, 21.0, 1.0),
            fv(22.0, 0.0, 24.0, 3.0),
            fv(19.0, 1.5, 20.0, 2.0),
        ];
        let targets = features.iter().map(linear_target).collect();
        let model = fit(&TrainingSet { features, targets }).unwrap();

        assert_eq!(model.solver, Solver::Linfa);
        assert_abs_diff_eq!(model.intercept, 3.0, epsilon = 1e-6);
        let expected = [2.0, -1.0, 0.5, 1.5];
        for (got, want) in model.coefficients.iter().zip(expected) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-6);
        }
        assert_abs_diff_eq!(
            model.predict(&fv(25.0, 0.5, 20.0, 2.0)),
            linear_target(&fv(25.0, 0.5, 20.0, 2.0)),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_badly_scaled_feature_is_still_full_rank() {
        // Momentum on a 1e-5 scale: the design is ill-conditioned but not singular
        let features: Vec<FeatureVector> = [
            (20.0, 1.0, 18.0, 1.0),
            (24.0, -0.5, 22.0, 3.0),
            (18.5, 0.25, 25.0, 4.0),
            (30.0, 2.0, 19.5, 2.0),
            (27.0, -1.0, 21.0, 1.0),
            (22.0, 0.0, 24.0, 3.0),
            (19.0, 1.5, 20.0, 2.0),
        ]
        .iter()
        .map(|&(a, b, c, d)| fv(a, b * 1e-5, c, d))
        .collect();
        let target = |x: &FeatureVector| {
            3.0 + 2.0 * x.weighted_score
                + 1e5 * x.momentum
                + 0.5 * x.opp_avg_points_allowed
                + 1.5 * x.opp_def_tier
        };
        let targets: Vec<f64> = features.iter().map(target).collect();
        let model = fit(&TrainingSet {
            features: features.clone(),
            targets: targets.clone(),
        })
        .unwrap();

        assert_eq!(model.solver, Solver::Linfa);
        let expected = [2.0, 1e5, 0.5, 1.5];
        for (got, want) in model.coefficients.iter().zip(expected) {
            assert_relative_eq!(*got, want, max_relative = 1e-3);
        }
        for (x, y) in features.iter().zip(&targets) {
            assert_abs_diff_eq!(model.predict(x), *y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_rank_deficient_design_uses_minimum_norm() {
        // Only two opponents, so both opponent features move together
        let features = vec![
            fv(20.0, 1.0, 18.0, 1.0),
            fv(24.0, -0.5, 22.0, 3.0),
            fv(21.0, 0.5, 18.0, 1.0),
        ];
        let targets = vec![24.0, 17.0, 27.0];
        let model = fit(&TrainingSet {
            features: features.clone(),
            targets: targets.clone(),
        })
        .unwrap();

        assert_eq!(model.solver, Solver::MinimumNorm);
        // Three points, more free parameters: the in-sample fit is exact
        for (x, y) in features.iter().zip(&targets) {
            assert_abs_diff_eq!(model.predict(x), *y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_constant_features_predict_mean() {
        let features = vec![fv(20.0, 1.0, 18.0, 1.0); 3];
        let model = fit(&TrainingSet {
            features,
            targets: vec![10.0, 20.0, 30.0],
        })
        .unwrap();
        assert_abs_diff_eq!(model.predict(&fv(20.0, 1.0, 18.0, 1.0)), 20.0, epsilon = 1e-9);
        assert!(model.coefficients.iter().all(|c| *c == 0.0));
    }

    #[test]
    fn test_too_few_rows_is_insufficient_data() {
        let err = fit(&TrainingSet {
            features: Vec::new(),
            targets: Vec::new(),
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientData { rows: 0, required: MIN_TRAINING_ROWS }
        ));
    }

    #[test]
    fn test_training_set_requires_feature_columns() {
        let table = JoinedTable {
            columns: vec!["Team".into(), "Opponent".into(), WEIGHTED_SCORE.into()],
            rows: Vec::new(),
        };
        match TrainingSet::from_table(&table).unwrap_err() {
            ForecastError::MissingColumn {
                missing, available, ..
            } => {
                assert_eq!(missing, vec![MOMENTUM, OPP_AVG_POINTS_ALLOWED, OPP_DEF_TIER]);
                assert_eq!(available.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_training_set_keeps_feature_order() {
        let table = JoinedTable {
            columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: vec![JoinedGame {
                team: "Bears".into(),
                opponent: "Lions".into(),
                game_num: Some(1),
                points_scored: Some(21.0),
                opp_def_tier: Some(4.0),
                weighted_score: Some(1.0),
                momentum: Some(2.0),
                tier_avgs: [None; 4],
                opp_avg_points_allowed: Some(3.0),
            }],
        };
        let set = TrainingSet::from_table(&table).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.features[0].to_array(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(set.targets, vec![21.0]);
    }
}
