//! Gridiron CLI
//!
//! Builds the focal team's feature table, selects a win classifier and serves predictions.

use clap::{Parser, Subcommand};
use gridiron::{Config, Result};

#[derive(Parser)]
#[command(name = "gridiron")]
#[command(about = "Single-team NFL win prediction from rolling form and betting lines", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// Build and persist the focal team's feature table from the raw schedule
    Features,
    /// Search the candidate models and persist the best one
    Train,
    /// Report validation and cross-validation metrics for the persisted model
    Evaluate,
    /// Predict a single game for the focal team
    Predict {
        /// Opponent nickname or team code (e.g. "Bills" or BUF)
        #[arg(long)]
        opponent: String,
        /// Focal team plays on the road
        #[arg(long)]
        away: bool,
        /// Season to predict (defaults to the latest in the schedule)
        #[arg(long)]
        season: Option<i32>,
        /// Week, when the teams meet more than once
        #[arg(long)]
        week: Option<u32>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Predict every focal-team game of a season
    PredictSchedule {
        /// Season to predict (defaults to the latest in the schedule)
        #[arg(long)]
        season: Option<i32>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Features => commands::features(&config),
        Commands::Train => commands::train(&config),
        Commands::Evaluate => commands::evaluate(&config),
        Commands::Predict {
            opponent,
            away,
            season,
            week,
            format,
        } => commands::predict(config, &opponent, !away, season, week, format),
        Commands::PredictSchedule { season, format } => {
            commands::predict_schedule(config, season, format)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use gridiron::features::build_feature_table;
    use gridiron::predict::{format_prediction, Predictor};
    use gridiron::training::{evaluate as evaluate_model, train_model, ModelSelector};
    use gridiron::GridironError;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        for dir in [
            config.data.raw_schedule_path.parent(),
            config.data.feature_table_path.parent(),
            Some(config.data.model_dir.as_path()),
        ]
        .into_iter()
        .flatten()
        {
            std::fs::create_dir_all(dir)?;
        }
        println!("Created data and model directories");

        println!("\nNext steps:");
        println!(
            "  1. Place an nflverse schedule CSV at {}",
            config.data.raw_schedule_path.display()
        );
        println!("  2. Run 'gridiron features' to build the feature table");
        println!("  3. Run 'gridiron train' to select and save a model");
        println!("  4. Run 'gridiron predict --opponent Bills' to make predictions");

        Ok(())
    }

    pub fn features(config: &Config) -> Result<()> {
        let rows = build_feature_table(config)?;
        let labelled = rows.iter().filter(|r| r.won.is_some()).count();
        println!(
            "Feature table: {} rows for {} ({} with results) -> {}",
            rows.len(),
            config.features.focal_team,
            labelled,
            config.data.feature_table_path.display()
        );
        Ok(())
    }

    pub fn train(config: &Config) -> Result<()> {
        let selector = ModelSelector::new(&config.training);
        let report = train_model(config, &selector)?;
        println!("\n{}", report);
        println!("Saved model -> {}", config.data.model_dir.display());
        Ok(())
    }

    pub fn evaluate(config: &Config) -> Result<()> {
        let report = evaluate_model(config)?;
        println!("{}", report);
        Ok(())
    }

    fn season_or_latest(predictor: &Predictor, season: Option<i32>) -> Result<i32> {
        season.or_else(|| predictor.latest_season()).ok_or_else(|| {
            GridironError::InsufficientData("schedule has no games to pick a season from".into())
        })
    }

    pub fn predict(
        config: Config,
        opponent: &str,
        is_home: bool,
        season: Option<i32>,
        week: Option<u32>,
        format: OutputFormat,
    ) -> Result<()> {
        let predictor = Predictor::load(config)?;
        let season = season_or_latest(&predictor, season)?;
        let prediction = predictor.predict_opponent(opponent, is_home, season, week)?;

        match format {
            OutputFormat::Table => print!("{}", format_prediction(&prediction)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&prediction)?),
        }
        Ok(())
    }

    pub fn predict_schedule(
        config: Config,
        season: Option<i32>,
        format: OutputFormat,
    ) -> Result<()> {
        let predictor = Predictor::load(config)?;
        let season = season_or_latest(&predictor, season)?;
        let games = predictor.predict_schedule(season)?;

        match format {
            OutputFormat::Table => {
                println!("{} {} schedule", season, predictor.focal_team());
                println!("───────────────────────────────────────────────");
                for g in &games {
                    let p = &g.prediction;
                    println!(
                        "  wk {:>2}  {:<10}  {} {:<4}  {:<4}  {:>5.1}%",
                        g.week,
                        g.date.map(|d| d.to_string()).unwrap_or_default(),
                        if p.is_home { "vs" } else { "at" },
                        p.opponent,
                        p.outcome,
                        p.win_probability * 100.0
                    );
                }
                let wins = games
                    .iter()
                    .filter(|g| g.prediction.outcome == gridiron::Outcome::Win)
                    .count();
                println!("\nProjected record: {}-{}", wins, games.len() - wins);
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&games)?),
        }
        Ok(())
    }
}
