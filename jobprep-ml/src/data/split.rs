//! Deterministic train/test partitioning.

use crate::data::dataset::Dataset;
use crate::error::MlError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Row counts for a train/test split of `n` rows.
///
/// The test side gets `ceil(n * (1 - train_fraction))` rows and the train side
/// the remainder.
pub fn split_sizes(n: usize, train_fraction: f64) -> (usize, usize) {
    // The epsilon absorbs representation error in `1.0 - train_fraction`.
    let n_test = ((n as f64) * (1.0 - train_fraction) - 1e-9).ceil().max(0.0) as usize;
    let n_test = n_test.min(n);
    (n - n_test, n_test)
}

/// Shuffle row indices with a seeded RNG and split them into train and test.
pub fn train_test_split(
    dataset: &Dataset,
    train_fraction: f64,
    seed: u64,
) -> Result<(Dataset, Dataset), MlError> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(MlError::dataset(format!(
            "train_fraction must be in (0, 1), got {train_fraction}"
        )));
    }

    let mut indices: Vec<usize> = (0..dataset.row_count()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (n_train, _) = split_sizes(indices.len(), train_fraction);
    let train = dataset.take_rows(&indices[..n_train])?;
    let test = dataset.take_rows(&indices[n_train..])?;
    Ok((train, test))
}
