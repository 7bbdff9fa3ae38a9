// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Mapping of run numbers to indices of the per-run QA histograms.

use hashbrown::HashMap;
use once_cell::sync::Lazy;

/// Runs with a dedicated bin in the per-run QA histograms.
pub const KNOWN_RUNS: [u32; 64] = [
    167813, 167988, 168066, 168068, 168069, 168076, 168104, 168212, 168311, 168322, 168325,
    168341, 168361, 168362, 168458, 168460, 168461, 168992, 169091, 169094, 169138, 169143,
    169167, 169417, 169835, 169837, 169838, 169846, 169855, 169858, 169859, 169923, 169956,
    170027, 170036, 170081, 169975, 169981, 170038, 170040, 170083, 170084, 170085, 170088,
    170089, 170091, 170152, 170155, 170159, 170163, 170193, 170195, 170203, 170204, 170205,
    170228, 170230, 170264, 170268, 170269, 170270, 170306, 170308, 170309,
];

/// Index assigned to runs that are not part of `KNOWN_RUNS`.
pub const UNDETERMINED_RUN: usize = KNOWN_RUNS.len();

static RUN_INDEX: Lazy<HashMap<u32, usize>> = Lazy::new(|| {
    KNOWN_RUNS
        .iter()
        .enumerate()
        .map(|(i, &run)| (run, i))
        .collect()
});

/// Index of the run in the per-run QA histograms.
#[inline]
pub fn run_index(run_number: u32) -> usize {
    RUN_INDEX
        .get(&run_number)
        .copied()
        .unwrap_or(UNDETERMINED_RUN)
}

/// Label of the bin with the given index.
pub fn run_label(index: usize) -> String {
    KNOWN_RUNS
        .get(index)
        .map(|run| run.to_string())
        .unwrap_or_else(|| "undetermined".to_owned())
}
