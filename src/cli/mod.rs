use crate::data::feature_engineering::FeatureKind;
use crate::model::ModelKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// kmersvm: k-mer features and SVM evaluation for protein sequences
#[derive(Parser, Debug)]
#[command(name = "kmersvm")]
#[command(about = "k-mer feature generation and SVM evaluation for protein sequences")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate features, train once and evaluate on a held-out split
    Evaluate(EvaluateArgs),

    /// Write the assembled feature matrix to CSV
    Features(FeaturesArgs),

    /// Print all k-mers over the amino-acid alphabet
    Kmers(KmersArgs),
}

/// Evaluation arguments
#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Input data file with Sequence and Label columns (CSV or TSV, optionally gzipped)
    #[arg(short, long, required = true)]
    pub input: PathBuf,

    /// Feature kinds in concatenation order (repeatable)
    #[arg(short, long = "feature")]
    pub features: Vec<FeatureKind>,

    /// Model kind (svm-rbf, svm-linear)
    #[arg(short, long)]
    pub model: Option<ModelKind>,

    /// Fraction of each class held out for testing
    #[arg(long)]
    pub test_ratio: Option<f64>,

    /// Random seed for shuffling and calibration
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output file for the prediction report
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the metric bundle as JSON
    #[arg(long)]
    pub metrics_json: Option<PathBuf>,

    /// Run configuration file (JSON); flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Hide the feature progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Feature export arguments
#[derive(Parser, Debug)]
pub struct FeaturesArgs {
    /// Input data file with Sequence and Label columns
    #[arg(short, long, required = true)]
    pub input: PathBuf,

    /// Feature kinds in concatenation order (repeatable)
    #[arg(short, long = "feature", default_value = "BigramOccur")]
    pub features: Vec<FeatureKind>,

    /// Output file for the feature matrix
    #[arg(short, long, default_value = "features.csv")]
    pub output: PathBuf,

    /// Random seed for shuffling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Keep input order
    #[arg(long)]
    pub no_shuffle: bool,
}

/// K-mer listing arguments
#[derive(Parser, Debug)]
pub struct KmersArgs {
    /// K-mer length (1 to 3)
    #[arg(short, long, default_value = "1")]
    pub k: usize,
}

/// Parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Setup logging based on verbosity
pub fn setup_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_args() {
        let cli = Cli::parse_from([
            "kmersvm", "evaluate",
            "-i", "data.csv",
            "-f", "MonogramComp",
            "-f", "BigramOccur",
            "-m", "svm-linear",
            "--test-ratio", "0.3",
            "--seed", "42",
        ]);

        match cli.command {
            Commands::Evaluate(args) => {
                assert_eq!(args.input, PathBuf::from("data.csv"));
                assert_eq!(args.features, vec![FeatureKind::MonogramComp, FeatureKind::BigramOccur]);
                assert_eq!(args.model, Some(ModelKind::SvmLinear));
                assert_eq!(args.test_ratio, Some(0.3));
                assert_eq!(args.seed, Some(42));
                assert!(args.output.is_none());
            }
            _ => panic!("Expected Evaluate command"),
        }
    }

    #[test]
    fn test_invalid_feature_rejected() {
        let result = Cli::try_parse_from(["kmersvm", "evaluate", "-i", "d.csv", "-f", "QuadgramComp"]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(["kmersvm", "evaluate", "-i", "d.csv", "-m", "knn"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_features_args() {
        let cli = Cli::parse_from(["kmersvm", "-v", "features", "-i", "in.tsv", "--no-shuffle"]);
        assert!(cli.verbose);

        match cli.command {
            Commands::Features(args) => {
                assert_eq!(args.features, vec![FeatureKind::BigramOccur]);
                assert_eq!(args.output, PathBuf::from("features.csv"));
                assert!(args.no_shuffle);
            }
            _ => panic!("Expected Features command"),
        }
    }

    #[test]
    fn test_kmers_args() {
        let cli = Cli::parse_from(["kmersvm", "kmers", "-k", "2"]);
        match cli.command {
            Commands::Kmers(args) => assert_eq!(args.k, 2),
            _ => panic!("Expected Kmers command"),
        }
    }
}
