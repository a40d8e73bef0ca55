//! Matchup Predict - score a single football matchup
//!
//! Reads Games.csv, Summary.csv and Teams.csv from the data directory, fits a
//! linear model of points scored, and prints the predicted score for each team.

use anyhow::{Context, Result};
use clap::Parser;
use gridiron_forecast::model::FEATURE_LABELS;
use gridiron_forecast::pipeline::{run, RunConfig, Stage};
use gridiron_forecast::predict::{Matchup, DEFAULT_OPPONENT, DEFAULT_TEAM};
use gridiron_forecast::report;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "matchup-predict")]
#[command(about = "Predict a football matchup score from team and game statistics")]
struct Cli {
    /// Directory containing Games.csv, Summary.csv and Teams.csv
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Team whose score is predicted first
    #[arg(long, default_value = DEFAULT_TEAM)]
    team: String,

    /// Opposing team
    #[arg(long, default_value = DEFAULT_OPPONENT)]
    opponent: String,

    /// Also write the predictions as CSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the fitted intercept and coefficients
    #[arg(long)]
    show_model: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = RunConfig {
        data_dir: cli.data_dir,
        matchup: Matchup::new(cli.team, cli.opponent),
    };

    let forecast = run(&config, |stage| match stage {
        Stage::Cleaned(stats) => {
            println!("Loaded {} games for training", stats.kept());
            println!("Features: {}", FEATURE_LABELS.join(", "));
        }
        Stage::Trained(_) => println!("MODEL TRAINED"),
    })?;

    if cli.show_model {
        print!("\n{}", report::render_model(&forecast.model));
    }

    print!("{}", report::render(&forecast.prediction)?);
    println!();

    if let Some(path) = &cli.output {
        report::write_csv(path, &forecast.prediction)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Prediction written to: {}", path.display());
    }

    Ok(())
}
