// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Event plane resolution from correlations of detector pairs.

use super::flow::{EventPlane, TpcPlanes, VzeroPlanes};

/// Labels of the resolution profile bins.
pub const RESOLUTION_LABELS: [&str; 8] = [
    "tpc_a-tpc_b",
    "tpc_b-tpc_a",
    "vzero_a-vzero_c",
    "vzero_c-vzero_a",
    "vzero_a-tpc",
    "tpc-vzero_a",
    "vzero_c-tpc",
    "tpc-vzero_c",
];

/// Correlations `cos(n(ψa - ψb))` of the detector pairs for harmonic `n`.
///
/// Every pair fills two bins: the pair and its swap. Pairs containing an undefined
/// event plane are skipped. Returns (bin, correlation) tuples.
pub fn resolution_terms(tpc: &TpcPlanes, vzero: &VzeroPlanes, harmonic: usize) -> Vec<(usize, f64)> {
    let pairs: [(EventPlane, EventPlane); 4] = [
        (tpc.sub_a().get(harmonic), tpc.sub_b().get(harmonic)),
        (vzero.side_a().get(harmonic), vzero.side_c().get(harmonic)),
        (vzero.side_a().get(harmonic), tpc.full().get(harmonic)),
        (vzero.side_c().get(harmonic), tpc.full().get(harmonic)),
    ];

    let n = harmonic as f64;
    let mut terms = Vec::with_capacity(RESOLUTION_LABELS.len());
    for (i, (a, b)) in pairs.iter().enumerate() {
        let (Some(psi_a), Some(psi_b)) = (a.defined_angle(), b.defined_angle()) else {
            continue;
        };

        terms.push((2 * i, (n * (psi_a - psi_b)).cos()));
        terms.push((2 * i + 1, (n * (psi_b - psi_a)).cos()));
    }

    terms
}
