use anyhow::{Context, Result};
use candle_core::Device;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::{DataIndex, DEFAULT_RATING_SCALE};
use models::MaskActivation;
use sequences::SamplingMode;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use trainer::{Experiment, Phase, PhaseObserver, PhaseRecord, TrainingConfig};

const DEFAULT_DATA: &str = "/data/ml-20m/ratings.csv";
const DEFAULT_OUTPUT: &str = "/data/rnn_cf_0.0.5.transfer_learning.safetensors";

/// rnn-cf - sequence model + cross filter with item-embedding transfer
#[derive(Parser)]
#[command(name = "rnn-cf")]
#[command(about = "Train a sequence recommender with cross-filter pretraining", long_about = None)]
struct Cli {
    /// Path to the ratings CSV (userId,movieId,rating,timestamp)
    #[arg(short, long, default_value = DEFAULT_DATA)]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the k-fold transfer-learning experiment and save the weights
    Train(TrainArgs),

    /// Show dataset statistics
    Inspect {
        /// Input ratings per window; users with fewer than this + 1 ratings are reported
        #[arg(long, default_value = "19")]
        seq_len: usize,

        /// Maximum raw rating
        #[arg(long, default_value_t = DEFAULT_RATING_SCALE)]
        rating_scale: f32,
    },
}

#[derive(Args)]
struct TrainArgs {
    /// Where to write the sequence-model weights (safetensors)
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Also write the per-epoch metrics as a JSON array
    #[arg(long)]
    metrics_out: Option<PathBuf>,

    /// JSON file with training settings; the flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the resolved configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Train on the CPU even when CUDA is available
    #[arg(long)]
    cpu: bool,

    #[arg(long)]
    seq_len: Option<usize>,

    /// Embedding width of both models
    #[arg(long)]
    dim: Option<usize>,

    #[arg(long)]
    folds: Option<usize>,

    #[arg(long)]
    epochs: Option<usize>,

    #[arg(long)]
    pretrain_batch: Option<usize>,

    #[arg(long)]
    finetune_batch: Option<usize>,

    #[arg(long)]
    learning_rate: Option<f64>,

    #[arg(long)]
    dropout: Option<f32>,

    #[arg(long)]
    head_width: Option<usize>,

    #[arg(long)]
    lstm_layers: Option<usize>,

    /// Attention mask over time steps: sigmoid or softmax
    #[arg(long)]
    mask_activation: Option<MaskActivation>,

    /// Window sampling: consecutive or scattered
    #[arg(long)]
    sampling: Option<SamplingMode>,

    #[arg(long)]
    rating_scale: Option<f32>,

    #[arg(long)]
    seed: Option<u64>,
}

impl TrainArgs {
    /// Defaults, then the config file, then flags
    fn resolve_config(&self) -> Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open config {}", path.display()))?;
                serde_json::from_reader(file)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => TrainingConfig::default(),
        };

        if let Some(value) = self.seq_len {
            config.seq_len = value;
        }
        if let Some(value) = self.dim {
            config.dim = value;
        }
        if let Some(value) = self.folds {
            config.folds = value;
        }
        if let Some(value) = self.epochs {
            config.epochs = value;
        }
        if let Some(value) = self.pretrain_batch {
            config.pretrain_batch = value;
        }
        if let Some(value) = self.finetune_batch {
            config.finetune_batch = value;
        }
        if let Some(value) = self.learning_rate {
            config.learning_rate = value;
        }
        if let Some(value) = self.dropout {
            config.dropout = value;
        }
        if let Some(value) = self.head_width {
            config.head_width = value;
        }
        if let Some(value) = self.lstm_layers {
            config.lstm_layers = value;
        }
        if let Some(value) = self.mask_activation {
            config.mask_activation = value;
        }
        if let Some(value) = self.sampling {
            config.sampling = value;
        }
        if let Some(value) = self.rating_scale {
            config.rating_scale = value;
        }
        if let Some(value) = self.seed {
            config.seed = value;
        }

        config.validate()?;
        Ok(config)
    }
}

/// One colored line per finished phase
struct ConsoleProgress;

impl PhaseObserver for ConsoleProgress {
    fn after_phase(&mut self, record: &PhaseRecord) {
        let label = format!("fold {} epoch {} {}", record.fold, record.epoch, record.phase);
        let label = match record.phase {
            Phase::Pretrain => label.cyan(),
            Phase::Finetune => label.blue(),
        };
        let train = match record.report.train {
            Some(metrics) => format!("train {metrics}"),
            None => "no training step".yellow().to_string(),
        };
        match record.report.valid {
            Some(valid) => println!("{} {} | valid {}", label.bold(), train, valid),
            None => println!("{} {}", label.bold(), train),
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => handle_train(&cli.data, &args)?,
        Commands::Inspect {
            seq_len,
            rating_scale,
        } => handle_inspect(&cli.data, seq_len, rating_scale)?,
    }

    Ok(())
}

fn load_index(path: &Path, rating_scale: f32) -> Result<DataIndex> {
    println!("Loading ratings from {}...", path.display());
    let start = Instant::now();
    let index = DataIndex::load_from_csv(path, rating_scale)
        .with_context(|| format!("Failed to load ratings from {}", path.display()))?;
    println!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());
    Ok(index)
}

/// Handle the 'train' command
fn handle_train(data: &Path, args: &TrainArgs) -> Result<()> {
    let config = args.resolve_config()?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let index = load_index(data, config.rating_scale)?;

    let mut experiment = Experiment::new(config)?;
    if args.cpu {
        experiment = experiment.with_device(Device::Cpu);
    }

    let start = Instant::now();
    let outcome = experiment.run_with(&index, &mut ConsoleProgress)?;
    println!("{} Training finished in {:?}", "✓".green(), start.elapsed());

    outcome.save_weights(&args.output)?;
    println!(
        "{} Weights saved to {}",
        "✓".green(),
        args.output.display().to_string().bold()
    );

    if let Some(path) = &args.metrics_out {
        outcome.save_history(path)?;
        println!("{} Metrics saved to {}", "✓".green(), path.display());
    }

    match outcome.final_validation() {
        Some(metrics) => println!(
            "{} loss {:.5}  mae {:.5}",
            "Final validation:".bold().blue(),
            metrics.loss,
            metrics.mae
        ),
        None => println!("{}", "No validation metrics recorded".yellow()),
    }

    Ok(())
}

/// Handle the 'inspect' command
fn handle_inspect(data: &Path, seq_len: usize, rating_scale: f32) -> Result<()> {
    let index = load_index(data, rating_scale)?;
    let (users, movies, ratings) = index.counts();
    let window_len = seq_len + 1;

    println!("{}", "Dataset statistics:".bold().blue());
    println!("{}Users: {}", "• ".green(), users);
    println!("{}Movies: {}", "• ".green(), movies);
    println!("{}Ratings: {}", "• ".green(), ratings);
    println!("{}Rating scale: {}", "• ".cyan(), index.scale());
    match index.min_trail_len() {
        Some(min) => println!("{}Shortest trail: {} ratings", "• ".cyan(), min),
        None => println!("{}Shortest trail: n/a", "• ".cyan()),
    }

    let short = index.count_short_trails(window_len);
    let line = format!(
        "Users with fewer than {} ratings (no window): {}",
        window_len, short
    );
    if short > 0 {
        println!("{}{}", "• ".yellow(), line.yellow());
    } else {
        println!("{}{}", "• ".cyan(), line);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train_args(argv: &[&str]) -> TrainArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Train(args) => args,
            _ => panic!("expected the train command"),
        }
    }

    #[test]
    fn test_bare_train_uses_defaults() {
        let args = train_args(&["rnn-cf", "train"]);
        assert_eq!(args.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(args.resolve_config().unwrap(), TrainingConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = train_args(&[
            "rnn-cf",
            "--data",
            "ratings.csv",
            "train",
            "--dim",
            "32",
            "--mask-activation",
            "softmax",
            "--sampling",
            "scattered",
        ]);
        let config = args.resolve_config().unwrap();
        assert_eq!(config.dim, 32);
        assert_eq!(config.mask_activation, MaskActivation::Softmax);
        assert_eq!(config.sampling, SamplingMode::Scattered);
        assert_eq!(config.epochs, 12);
    }

    #[test]
    fn test_invalid_flags_rejected() {
        let args = train_args(&["rnn-cf", "train", "--folds", "1"]);
        assert!(args.resolve_config().is_err());

        assert!(Cli::try_parse_from(["rnn-cf", "train", "--sampling", "random"]).is_err());
    }
}
