//! Canonical column names and the game/summary/defense joins.
//!
//! Games are left-joined to team summaries on the team name and to an
//! opponent-defense projection on the opponent name. Each right-hand table
//! is indexed once by team name; a game whose team or opponent has no match
//! keeps missing values rather than failing.

use crate::clean::coerce_numeric;
use crate::error::{ForecastError, Result};
use crate::tables::{Sources, Table};
use csv::StringRecord;
use std::collections::HashMap;

/// Column names as they appear in the source files, and the canonical names
/// they are renamed to.
pub mod columns {
    pub const TEAM: &str = "Team";
    pub const OPPONENT: &str = "Opponent";

    pub const POINTS_SCORED: &str = "points_scored";
    pub const OPP_DEF_TIER: &str = "opp_def_tier";
    pub const GAME_NUM: &str = "game_num";
    pub const TIER_AVG: [&str; 4] = ["tier1_avg", "tier2_avg", "tier3_avg", "tier4_avg"];

    pub const WEIGHTED_SCORE: &str = "Weighted Playoff Offense Score";
    pub const MOMENTUM: &str = "Offensive Momentum";
    pub const OPP_AVG_POINTS_ALLOWED: &str = "opp_avg_points_allowed";

    pub const AVG_POINTS_ALLOWED: &str = "Average Points Allowed Per Game";
    pub const AVG_POINTS_SCORED: &str = "Average Points Scored Per Game";
    pub const DEF_TIER_RANK: &str = "Defensive Tier Rank";

    pub const GAME_RENAMES: [(&str, &str); 3] = [
        ("Points Scored", POINTS_SCORED),
        ("Opponent Defensive Tier", OPP_DEF_TIER),
        ("Game #", GAME_NUM),
    ];

    pub const SUMMARY_RENAMES: [(&str, &str); 4] = [
        ("Tier 1 Avg Points", TIER_AVG[0]),
        ("Tier 2 Avg Points", TIER_AVG[1]),
        ("Tier 3 Avg Points", TIER_AVG[2]),
        ("Tier 4 Avg Points", TIER_AVG[3]),
    ];
}

use columns::*;

// ============================================================================
// Team tables
// ============================================================================

/// One row of `Summary.csv`
#[derive(Debug, Clone, PartialEq)]
pub struct TeamSummary {
    pub team: String,
    /// Average points scored against opponents in defensive tiers 1-4
    pub tier_avgs: [Option<f64>; 4],
    pub momentum: Option<f64>,
    /// Coerced weighted playoff offense score; `None` when the cell is not numeric
    pub weighted_score: Option<f64>,
}

/// One row of `Teams.csv`
#[derive(Debug, Clone, PartialEq)]
pub struct TeamDefense {
    pub team: String,
    pub avg_points_allowed: Option<f64>,
    pub avg_points_scored: Option<f64>,
    pub tier_rank: Option<f64>,
}

/// Rows keyed by unique team name.
#[derive(Debug, Clone)]
pub struct TeamIndex<T> {
    table: String,
    rows: Vec<T>,
    by_name: HashMap<String, usize>,
}

impl<T> TeamIndex<T> {
    /// Build the index. A team name that appears twice is rejected.
    pub fn build(table: &str, rows: Vec<T>, name_of: impl Fn(&T) -> &str) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let name = name_of(row);
            if by_name.insert(name.to_string(), idx).is_some() {
                return Err(ForecastError::DuplicateTeam {
                    team: name.to_string(),
                    table: table.to_string(),
                });
            }
        }
        Ok(Self {
            table: table.to_string(),
            rows,
            by_name,
        })
    }

    pub fn get(&self, team: &str) -> Option<&T> {
        self.by_name.get(team).map(|&idx| &self.rows[idx])
    }

    /// Like [`get`](Self::get), but a missing team is an error listing some valid names.
    pub fn require(&self, team: &str) -> Result<&T> {
        self.get(team).ok_or_else(|| ForecastError::MissingTeam {
            team: team.to_string(),
            table: self.table.clone(),
            sample: self.sample_names(10),
        })
    }

    /// Up to `n` team names in file order
    pub fn sample_names(&self, n: usize) -> Vec<String> {
        let mut names: Vec<(&String, &usize)> = self.by_name.iter().collect();
        names.sort_by_key(|&(_, idx)| *idx);
        names.into_iter().take(n).map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn cell<'a>(record: &'a StringRecord, idx: Option<usize>) -> &'a str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

fn numeric(record: &StringRecord, idx: Option<usize>) -> Option<f64> {
    coerce_numeric(cell(record, idx))
}

/// Records with a team name. Blank-team rows (trailing `,,,` lines in
/// spreadsheet exports) can never match a game, so they are skipped.
fn named_records(table: &Table, team_idx: usize) -> Vec<&StringRecord> {
    let (named, blank): (Vec<&StringRecord>, Vec<&StringRecord>) = table
        .records()
        .partition(|r| !cell(r, Some(team_idx)).is_empty());
    if !blank.is_empty() {
        log::warn!("Skipping {} rows with no team name in {}", blank.len(), table.name());
    }
    named
}

/// Index `Summary.csv` (after renaming) by team.
pub fn index_summaries(summary: &Table) -> Result<TeamIndex<TeamSummary>> {
    let [team_idx] = summary.require_columns([TEAM])?;
    let tier_idx = TIER_AVG.map(|c| summary.column(c));
    let momentum_idx = summary.column(MOMENTUM);
    let score_idx = summary.column(WEIGHTED_SCORE);

    let rows: Vec<TeamSummary> = named_records(summary, team_idx)
        .into_iter()
        .map(|r| TeamSummary {
            team: cell(r, Some(team_idx)).to_string(),
            tier_avgs: tier_idx.map(|i| numeric(r, i)),
            momentum: numeric(r, momentum_idx),
            weighted_score: numeric(r, score_idx),
        })
        .collect();

    TeamIndex::build(summary.name(), rows, |s| s.team.as_str())
}

/// Index `Teams.csv` by team. Points allowed is required: it feeds the opponent projection.
pub fn index_defenses(teams: &Table) -> Result<TeamIndex<TeamDefense>> {
    let [team_idx, allowed_idx] = teams.require_columns([TEAM, AVG_POINTS_ALLOWED])?;
    let allowed_idx = Some(allowed_idx);
    let scored_idx = teams.column(AVG_POINTS_SCORED);
    let rank_idx = teams.column(DEF_TIER_RANK);

    let rows: Vec<TeamDefense> = named_records(teams, team_idx)
        .into_iter()
        .map(|r| TeamDefense {
            team: cell(r, Some(team_idx)).to_string(),
            avg_points_allowed: numeric(r, allowed_idx),
            avg_points_scored: numeric(r, scored_idx),
            tier_rank: numeric(r, rank_idx),
        })
        .collect();

    TeamIndex::build(teams.name(), rows, |d| d.team.as_str())
}

// ============================================================================
// Joined games
// ============================================================================

/// A game row with its team summary and opponent defense attached.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedGame {
    pub team: String,
    pub opponent: String,
    pub game_num: Option<u32>,
    pub points_scored: Option<f64>,
    pub opp_def_tier: Option<f64>,
    pub weighted_score: Option<f64>,
    pub momentum: Option<f64>,
    pub tier_avgs: [Option<f64>; 4],
    pub opp_avg_points_allowed: Option<f64>,
}

/// The joined training table: one row per game plus the column list it carries.
#[derive(Debug, Clone)]
pub struct JoinedTable {
    pub columns: Vec<String>,
    pub rows: Vec<JoinedGame>,
}

impl JoinedTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Renamed source tables and the team indexes built from them.
#[derive(Debug, Clone)]
pub struct JoinedData {
    pub table: JoinedTable,
    pub summaries: TeamIndex<TeamSummary>,
    pub defenses: TeamIndex<TeamDefense>,
}

/// Rename columns to canonical names, index the team tables and join them onto games.
pub fn join_sources(mut sources: Sources) -> Result<JoinedData> {
    sources.games.rename_columns(&GAME_RENAMES);
    sources.summary.rename_columns(&SUMMARY_RENAMES);

    let summaries = index_summaries(&sources.summary)?;
    let defenses = index_defenses(&sources.teams)?;
    let table = join_games(&sources.games, &sources.summary, &summaries, &defenses)?;

    Ok(JoinedData {
        table,
        summaries,
        defenses,
    })
}

/// Left-join games onto summaries (by `Team`) and opponent defense (by `Opponent`).
///
/// Per-game weighted score and momentum columns take precedence over the
/// summary values when the games table carries them.
pub fn join_games(
    games: &Table,
    summary: &Table,
    summaries: &TeamIndex<TeamSummary>,
    defenses: &TeamIndex<TeamDefense>,
) -> Result<JoinedTable> {
    let [team_idx, opp_idx] = games.require_columns([TEAM, OPPONENT])?;
    let points_idx = games.column(POINTS_SCORED);
    let tier_idx = games.column(OPP_DEF_TIER);
    let game_num_idx = games.column(GAME_NUM);
    let game_score_idx = games.column(WEIGHTED_SCORE);
    let game_momentum_idx = games.column(MOMENTUM);

    let mut unmatched_teams = 0usize;
    let mut unmatched_opponents = 0usize;

    let rows: Vec<JoinedGame> = games
        .records()
        .map(|r| {
            let team = cell(r, Some(team_idx)).to_string();
            let opponent = cell(r, Some(opp_idx)).to_string();

            let own = summaries.get(&team);
            if own.is_none() {
                unmatched_teams += 1;
            }
            let opp = defenses.get(&opponent);
            if opp.is_none() {
                unmatched_opponents += 1;
            }

            let weighted_score = match game_score_idx {
                Some(_) => numeric(r, game_score_idx),
                None => own.and_then(|s| s.weighted_score),
            };
            let momentum = match game_momentum_idx {
                Some(_) => numeric(r, game_momentum_idx),
                None => own.and_then(|s| s.momentum),
            };

            JoinedGame {
                game_num: cell(r, game_num_idx).parse().ok(),
                points_scored: numeric(r, points_idx),
                opp_def_tier: numeric(r, tier_idx),
                weighted_score,
                momentum,
                tier_avgs: own.map(|s| s.tier_avgs).unwrap_or([None; 4]),
                opp_avg_points_allowed: opp.and_then(|d| d.avg_points_allowed),
                team,
                opponent,
            }
        })
        .collect();

    if unmatched_teams > 0 {
        log::warn!("{} games have no matching team summary", unmatched_teams);
    }
    if unmatched_opponents > 0 {
        log::warn!("{} games have no matching opponent defense row", unmatched_opponents);
    }

    let mut columns: Vec<String> = games.headers().to_vec();
    for header in summary.headers() {
        if header != TEAM && !columns.contains(header) {
            columns.push(header.clone());
        }
    }
    columns.push(OPP_AVG_POINTS_ALLOWED.to_string());

    Ok(JoinedTable { columns, rows })
}
