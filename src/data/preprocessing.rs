use crate::data::feature_engineering::AssembledFeatures;
use crate::data::{class_counts, SequenceRecord, SplitConfig, TrainTestSplit};
use crate::error::Result;
use crate::utils::random::rng_from_seed;
use crate::utils::validation::in_open_range;
use rand::seq::SliceRandom;
use tracing::{info, warn};

/// Randomly permute records in place.
///
/// With `Some(seed)` the permutation is reproducible; with `None` the
/// generator is seeded from system entropy.
pub fn shuffle_records(records: &mut [SequenceRecord], seed: Option<u64>) {
    match seed {
        Some(seed) => info!("Shuffling {} records with seed {}", records.len(), seed),
        None => info!("Shuffling {} records", records.len()),
    }
    let mut rng = rng_from_seed(seed);
    records.shuffle(&mut rng);
}

/// Number of records of one class that go to the test side
fn test_count(class_size: usize, test_ratio: f64) -> usize {
    if class_size < 2 {
        return 0;
    }
    let wanted = (class_size as f64 * test_ratio - 1e-9).ceil() as usize;
    wanted.clamp(1, class_size - 1)
}

/// Split assembled features into stratified train and test partitions.
///
/// For each class, the first `ceil(n * test_ratio)` records (in dataset
/// order) are held out, keeping at least one record of a class on each side
/// whenever the class has two or more records. Both partitions keep dataset
/// order.
pub fn split_train_test(
    assembled: &AssembledFeatures,
    config: &SplitConfig,
) -> Result<TrainTestSplit> {
    in_open_range(config.test_ratio, 0.0, 1.0, "test ratio")?;

    let mut is_test = vec![false; assembled.len()];
    for class in [0u8, 1u8] {
        let members: Vec<usize> = assembled
            .labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == class)
            .map(|(i, _)| i)
            .collect();

        if members.len() == 1 {
            warn!("Class {} has a single record; keeping it for training", class);
        }

        for &i in members.iter().take(test_count(members.len(), config.test_ratio)) {
            is_test[i] = true;
        }
    }

    let (test_idx, train_idx): (Vec<usize>, Vec<usize>) =
        (0..assembled.len()).partition(|&i| is_test[i]);

    let pick_labels = |idx: &[usize]| idx.iter().map(|&i| assembled.labels[i]).collect::<Vec<_>>();
    let pick_sequences =
        |idx: &[usize]| idx.iter().map(|&i| assembled.sequences[i].clone()).collect::<Vec<_>>();

    let split = TrainTestSplit {
        x_train: assembled.features.select_rows(&train_idx),
        y_train: pick_labels(&train_idx),
        train_sequences: pick_sequences(&train_idx),
        x_test: assembled.features.select_rows(&test_idx),
        y_test: pick_labels(&test_idx),
        test_sequences: pick_sequences(&test_idx),
    };

    info!(
        "Dataset split: train={}, test={}",
        split.y_train.len(),
        split.y_test.len()
    );

    let log_distribution = |name: &str, labels: &[u8]| {
        let (neg, pos) = class_counts(labels);
        info!("{} distribution: positive={}, negative={}", name, pos, neg);
    };
    log_distribution("Train", &split.y_train);
    log_distribution("Test", &split.y_test);

    Ok(split)
}
