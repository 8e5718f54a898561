//! Tennis match prediction CLI
//!
//! Predicts head-to-head win probabilities from historical Elo ratings.

use clap::{Parser, Subcommand};
use tennis::{Config, Result};

#[derive(Parser)]
#[command(name = "tennis")]
#[command(about = "Tennis match prediction from Elo rating history", long_about = None)]
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
    /// Predict a single match
    Predict {
        /// First player
        player_a: String,
        /// Second player
        player_b: String,
        /// Match date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Court surface: Clay, Hard, Grass or Carpet
        #[arg(long, default_value = "Hard")]
        surface: String,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Predict every fixture in a CSV file (PlayerA, PlayerB, Date, Surface)
    Batch {
        /// Fixture file
        fixtures: String,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// List known players
    Players {
        /// Case-insensitive name filter
        #[arg(long)]
        search: Option<String>,
    },
    /// Compute normalization parameters from the reference dataset
    Normalize {
        /// Output path (defaults to data.normalization_path)
        #[arg(long)]
        output: Option<String>,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
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
        Commands::Predict {
            player_a,
            player_b,
            date,
            surface,
            format,
        } => commands::predict(&config, &player_a, &player_b, date, &surface, format),
        Commands::Batch { fixtures, format } => commands::batch(&config, &fixtures, format),
        Commands::Players { search } => commands::players(&config, search),
        Commands::Normalize { output } => commands::normalize(&config, output),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use burn::backend::NdArray;
    use tennis::data::{load_fixtures, load_normalization_params, load_rating_store};
    use tennis::features::{NormalizationParams, Normalizer, FEATURE_DIM};
    use tennis::model::{EloNetConfig, EloScorer};
    use tennis::predict::{format_prediction, parse_match_date, MatchPredictor};
    use tennis::{Prediction, TennisError};

    type MyBackend = NdArray<f32>;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("model")?;
        println!("Created data/ and model/ directories");

        println!("\nNext steps:");
        println!("  1. Place rating histories and the reference feature CSV in data/");
        println!("  2. Place the trained weights at {}.mpk", config.data.model_path);
        println!("  3. Run 'tennis normalize' to cache normalization parameters");
        println!("  4. Run 'tennis predict <PLAYER_A> <PLAYER_B> --surface Clay'");

        Ok(())
    }

    fn build_predictor(config: &Config) -> Result<MatchPredictor<EloScorer>> {
        // Burn adds the .mpk extension
        let model_file = format!("{}.mpk", config.data.model_path);
        if !std::path::Path::new(&model_file).exists() {
            return Err(TennisError::NoModel(model_file));
        }

        let store = load_rating_store(&config.data)?;
        let normalizer = Normalizer::new(load_normalization_params(&config.data)?);
        let scorer = EloScorer::load::<MyBackend>(&Default::default(), &config.data.model_path)?;

        Ok(MatchPredictor::new(store, normalizer, scorer))
    }

    fn to_json(value: &serde_json::Value) -> Result<String> {
        serde_json::to_string_pretty(value)
            .map_err(|e| TennisError::Parse(format!("Failed to serialize output: {}", e)))
    }

    pub fn predict(
        config: &Config,
        player_a: &str,
        player_b: &str,
        date: Option<String>,
        surface: &str,
        format: OutputFormat,
    ) -> Result<()> {
        let date = match date {
            Some(d) => parse_match_date(&d)?,
            None => chrono::Local::now().date_naive(),
        };

        let predictor = build_predictor(config)?;
        for player in [player_a, player_b] {
            if !predictor.store().contains_player(player.trim()) {
                log::warn!("No rating history for {}; assuming {}", player, tennis::DEFAULT_RATING);
            }
        }

        let prediction = predictor.predict(player_a, player_b, date, surface)?;

        match format {
            OutputFormat::Table => {
                print!(
                    "{}",
                    format_prediction(&prediction, player_a, player_b, date, surface)
                );
            }
            OutputFormat::Json => {
                let json = prediction_json(player_a, player_b, &date.to_string(), surface, &prediction);
                println!("{}", to_json(&json)?);
            }
            OutputFormat::Csv => {
                println!("player_a,player_b,date,surface,prob_a,prob_b");
                println!(
                    "{},{},{},{},{:.4},{:.4}",
                    player_a, player_b, date, surface, prediction.prob_a, prediction.prob_b
                );
            }
        }

        Ok(())
    }

    fn prediction_json(
        player_a: &str,
        player_b: &str,
        date: &str,
        surface: &str,
        prediction: &Prediction,
    ) -> serde_json::Value {
        serde_json::json!({
            "player_a": player_a,
            "player_b": player_b,
            "date": date,
            "surface": surface,
            "prob_a": prediction.prob_a,
            "prob_b": prediction.prob_b,
        })
    }

    pub fn batch(config: &Config, fixtures_path: &str, format: OutputFormat) -> Result<()> {
        let fixtures = load_fixtures(fixtures_path)?;
        let predictor = build_predictor(config)?;
        let results = predictor.predict_batch(&fixtures);

        let failures = results.iter().filter(|r| r.is_err()).count();
        log::info!(
            "Predicted {} fixtures ({} failed)",
            results.len() - failures,
            failures
        );

        match format {
            OutputFormat::Table => {
                for (fixture, result) in fixtures.iter().zip(&results) {
                    match result {
                        Ok(pred) => print!(
                            "{}",
                            format_prediction(
                                pred,
                                &fixture.player_a,
                                &fixture.player_b,
                                fixture.date,
                                &fixture.surface
                            )
                        ),
                        Err(e) => println!(
                            "{} vs {}: failed ({})",
                            fixture.player_a, fixture.player_b, e
                        ),
                    }
                }
            }
            OutputFormat::Json => {
                let rows: Vec<serde_json::Value> = fixtures
                    .iter()
                    .zip(&results)
                    .map(|(f, result)| match result {
                        Ok(pred) => prediction_json(
                            &f.player_a,
                            &f.player_b,
                            &f.date.to_string(),
                            &f.surface,
                            pred,
                        ),
                        Err(e) => serde_json::json!({
                            "player_a": f.player_a,
                            "player_b": f.player_b,
                            "date": f.date.to_string(),
                            "surface": f.surface,
                            "error": e.to_string(),
                        }),
                    })
                    .collect();
                println!("{}", to_json(&serde_json::Value::Array(rows))?);
            }
            OutputFormat::Csv => {
                println!("player_a,player_b,date,surface,prob_a,prob_b");
                for (f, result) in fixtures.iter().zip(&results) {
                    match result {
                        Ok(pred) => println!(
                            "{},{},{},{},{:.4},{:.4}",
                            f.player_a, f.player_b, f.date, f.surface, pred.prob_a, pred.prob_b
                        ),
                        Err(_) => println!(
                            "{},{},{},{},,",
                            f.player_a, f.player_b, f.date, f.surface
                        ),
                    }
                }
            }
        }

        Ok(())
    }

    pub fn players(config: &Config, search: Option<String>) -> Result<()> {
        let store = load_rating_store(&config.data)?;
        let names = match search.as_deref() {
            Some(text) => store.search_players(text),
            None => store.players(),
        };

        for name in &names {
            let timeline = store.overall(name);
            match (timeline.first_date(), timeline.last_date()) {
                (Some(first), Some(last)) => println!(
                    "{:<30} {} → {}  ({} ratings)",
                    name,
                    first,
                    last,
                    timeline.len()
                ),
                _ => println!("{}", name),
            }
        }
        log::info!("{} of {} players listed", names.len(), store.player_count());

        Ok(())
    }

    pub fn normalize(config: &Config, output: Option<String>) -> Result<()> {
        let output = output
            .or_else(|| config.data.normalization_path.clone())
            .ok_or_else(|| {
                TennisError::Config("No output path and data.normalization_path is unset".to_string())
            })?;

        let rows = tennis::data::load_reference_features(&config.data.features_path)?;
        let params = NormalizationParams::from_rows(&rows)?;
        params.save(&output)?;

        println!("Normalization parameters ({} rows)", rows.len());
        println!("───────────────────────────────");
        for i in 0..FEATURE_DIM {
            println!(
                "  [{}] mean={:>10.3}  scale={:>10.3}",
                i, params.mean[i], params.scale[i]
            );
        }
        println!("Saved to {}", output);

        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let model_file = format!("{}.mpk", config.data.model_path);
        let net = EloNetConfig::default();

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:           {}", model_file);
        println!(
            "  Present:        {}",
            if std::path::Path::new(&model_file).exists() { "yes" } else { "no" }
        );
        println!(
            "  Topology:       {} → {} → {} → 1",
            net.input_dim, net.hidden_dims[0], net.hidden_dims[1]
        );
        println!("  Activations:    ReLU, ReLU, Sigmoid");
        if let Some(path) = &config.data.normalization_path {
            println!("  Normalization:  {}", path);
        }

        Ok(())
    }
}
