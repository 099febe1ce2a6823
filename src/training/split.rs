//! Stratified train/validation splits and k-fold partitions
//!
//! Both preserve the win/loss ratio on every side. Neither silently degrades: data too small
//! for the requested split or fold count is an [`GridironError::InsufficientData`].

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::{GridironError, Result};

/// Row indices of one train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn class_members(labels: &[bool]) -> [Vec<usize>; 2] {
    let mut losses = Vec::new();
    let mut wins = Vec::new();
    for (i, &y) in labels.iter().enumerate() {
        if y {
            wins.push(i);
        } else {
            losses.push(i);
        }
    }
    [losses, wins]
}

/// Seeded stratified train/validation split.
///
/// The validation side gets `ceil(n * fraction)` rows, allocated to each class in proportion
/// to its size, and every class keeps at least one row on each side.
pub fn stratified_split(labels: &[bool], fraction: f64, seed: u64) -> Result<Split> {
    let n = labels.len();
    let classes = class_members(labels);

    if let Some(small) = classes.iter().find(|c| c.len() < 2) {
        return Err(GridironError::InsufficientData(format!(
            "stratified split needs at least 2 rows of each class, found {} of one class in {} rows",
            small.len(),
            n
        )));
    }

    let n_test = (n as f64 * fraction).ceil() as usize;
    let n_train = n.saturating_sub(n_test);
    if n_test < classes.len() || n_train < classes.len() {
        return Err(GridironError::InsufficientData(format!(
            "validation fraction {} of {} rows leaves {} train / {} validation rows, need at least {} each",
            fraction,
            n,
            n_train,
            n_test,
            classes.len()
        )));
    }

    // Proportional allocation, keeping one row of each class on each side
    let [losses, wins] = &classes;
    let clamp = |v: usize, size: usize| v.clamp(1, size - 1);
    let test_wins = clamp(
        ((n_test * wins.len()) as f64 / n as f64).round() as usize,
        wins.len(),
    );
    let test_losses = clamp(n_test.saturating_sub(test_wins), losses.len());
    let test_wins = clamp(n_test - test_losses, wins.len());

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for (members, take) in [(losses, test_losses), (wins, test_wins)] {
        let mut shuffled = members.clone();
        shuffled.shuffle(&mut rng);
        test.extend_from_slice(&shuffled[..take]);
        train.extend_from_slice(&shuffled[take..]);
    }
    train.sort_unstable();
    test.sort_unstable();

    Ok(Split { train, test })
}

/// Stratified k-fold partition of `labels`.
///
/// Members of each class are dealt round-robin in row order, so fold assignment is
/// deterministic. Every class must have at least `k` members.
pub fn stratified_folds(labels: &[bool], k: usize) -> Result<Vec<Split>> {
    if k < 2 {
        return Err(GridironError::Config(format!(
            "cross-validation needs at least 2 folds, got {}",
            k
        )));
    }

    let classes = class_members(labels);
    if let Some(small) = classes.iter().find(|c| c.len() < k) {
        return Err(GridironError::InsufficientData(format!(
            "{}-fold cross-validation needs at least {} rows of each class, found {}",
            k,
            k,
            small.len()
        )));
    }

    let mut fold_of = vec![0usize; labels.len()];
    for members in &classes {
        for (i, &row) in members.iter().enumerate() {
            fold_of[row] = i % k;
        }
    }

    Ok((0..k)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&row| fold_of[row] == fold);
            Split { train, test }
        })
        .collect())
}

/// Gather the entries of `items` at `indices`
pub fn select<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}
