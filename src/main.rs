use anyhow::{Context, Result};
use kmersvm::cli::{parse_args, setup_logging, Commands, EvaluateArgs, FeaturesArgs, KmersArgs};
use kmersvm::config::RunConfig;
use kmersvm::data::feature_engineering::FeatureAssembler;
use kmersvm::data::preprocessing::{shuffle_records, split_train_test};
use kmersvm::data::{label_name, DataLoader};
use kmersvm::evaluate::EvaluationHarness;
use kmersvm::kmer::Alphabet;
use kmersvm::utils::{ensure_parent_dir, format_number};
use tracing::{error, info};

fn main() {
    let cli = parse_args();

    setup_logging(cli.verbose);

    info!("{}", kmersvm::info());

    let result = match cli.command {
        Commands::Evaluate(args) => run_evaluate(args),
        Commands::Features(args) => run_features(args),
        Commands::Kmers(args) => run_kmers(args),
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Merge a config file (if any) with command line overrides
fn resolve_config(args: &EvaluateArgs) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?,
        None => RunConfig::default(),
    };

    if !args.features.is_empty() {
        config.features = args.features.clone();
    }
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(test_ratio) = args.test_ratio {
        config.test_ratio = test_ratio;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(output) = &args.output {
        config.report_path = output.clone();
    }
    if args.metrics_json.is_some() {
        config.metrics_path = args.metrics_json.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    info!("Starting evaluation...");
    info!("Input file: {:?}", args.input);

    let config = resolve_config(&args)?;
    info!("Model: {}", config.model);

    info!("Loading data...");
    let mut records = DataLoader::new()
        .load(&args.input)
        .with_context(|| format!("Failed to load data from {:?}", args.input))?;

    shuffle_records(&mut records, config.seed);

    let assembler = FeatureAssembler::new(Alphabet::amino_acids(), config.features.clone())
        .context("Failed to configure features")?
        .with_progress(!args.no_progress);
    let assembled = assembler
        .assemble(&records)
        .context("Feature generation failed")?;

    info!("Splitting dataset...");
    let split = split_train_test(&assembled, &config.split_config())?;

    let harness = EvaluationHarness::new(config.model, config.svm_config())
        .with_report_path(Some(config.report_path.clone()));
    let evaluation = harness.evaluate_split(&split).context("Evaluation failed")?;

    if let Some(path) = &config.metrics_path {
        ensure_parent_dir(path)?;
        let json = serde_json::to_string_pretty(&evaluation.metrics)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write metrics to {:?}", path))?;
        info!("Metrics saved to: {:?}", path);
    }

    Ok(())
}

fn run_features(args: FeaturesArgs) -> Result<()> {
    info!("Generating features...");
    info!("Input file: {:?}", args.input);
    info!("Output file: {:?}", args.output);

    let mut records = DataLoader::new()
        .load(&args.input)
        .with_context(|| format!("Failed to load data from {:?}", args.input))?;

    if !args.no_shuffle {
        shuffle_records(&mut records, args.seed);
    }

    let assembler = FeatureAssembler::new(Alphabet::amino_acids(), args.features.clone())
        .context("Failed to configure features")?
        .with_progress(true);
    let assembled = assembler
        .assemble(&records)
        .context("Feature generation failed")?;

    ensure_parent_dir(&args.output)?;
    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create {:?}", args.output))?;

    let mut header = assembler.column_names();
    header.push("Label".to_string());
    header.push("Sequence".to_string());
    writer.write_record(&header)?;

    for (i, row) in assembled.features.rows().enumerate() {
        let mut fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        fields.push(assembled.labels[i].to_string());
        fields.push(assembled.sequences[i].clone());
        writer.write_record(&fields)?;
    }
    writer.flush()?;

    let (negatives, positives) = kmersvm::data::class_counts(&assembled.labels);
    info!(
        "Wrote {} x {} features ({}: {}, {}: {}) to {:?}",
        format_number(assembled.len()),
        format_number(assembler.dimension()),
        label_name(1),
        positives,
        label_name(0),
        negatives,
        args.output
    );

    Ok(())
}

fn run_kmers(args: KmersArgs) -> Result<()> {
    let kmers = Alphabet::amino_acids()
        .enumerate(args.k)
        .with_context(|| format!("Cannot enumerate k-mers for k={}", args.k))?;

    for kmer in &kmers {
        println!("{}", kmer);
    }
    info!("Listed {} k-mers", format_number(kmers.len()));

    Ok(())
}
