// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Functions used in various integration tests.

use std::{
    f64::consts::TAU,
    fs::File,
    io::{BufRead, BufReader},
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use rhovn::prelude::*;

/// Test utility. Diff the contents of two files without the first `skip` lines.
#[allow(dead_code)]
pub(super) fn diff_files_ignore_first(file1: &str, file2: &str, skip: usize) -> bool {
    let content1 = read_file_without_first_lines(file1, skip);
    let content2 = read_file_without_first_lines(file2, skip);
    content1 == content2
}

fn read_file_without_first_lines(file: &str, skip: usize) -> Vec<String> {
    let reader = BufReader::new(File::open(file).unwrap());
    reader
        .lines()
        .skip(skip) // skip the header
        .map(|line| line.unwrap())
        .collect()
}

/// Test utility. Sample tracks from `1 + 2 v2 cos(2(φ - ψ2)) + 2 v3 cos(3(φ - ψ3))`
/// uniformly distributed in |η| < 0.8 and 0.2 < pT < 2.2 GeV/c.
#[allow(dead_code)]
pub(super) fn modulated_tracks(
    rng: &mut StdRng,
    n_tracks: usize,
    v2: f64,
    psi2: f64,
    v3: f64,
    psi3: f64,
) -> Vec<Track> {
    let model = ModulationModel::new(1.0, v2, v3, psi2, psi3);
    let max = 1.0 + 2.0 * (v2.abs() + v3.abs());

    let mut tracks = Vec::with_capacity(n_tracks);
    while tracks.len() < n_tracks {
        let phi = rng.random::<f64>() * TAU;
        if rng.random::<f64>() * max < model.shape(phi) {
            let eta = rng.random::<f64>() * 1.6 - 0.8;
            let pt = 0.2 + 2.0 * rng.random::<f64>();
            let charge = if rng.random::<bool>() { 1 } else { -1 };
            tracks.push(Track::new(phi, eta, pt, charge));
        }
    }

    tracks
}

/// Test utility. Generate a selected event with a modulated background and two hard jets.
#[allow(dead_code)]
pub(super) fn modulated_event(seed: u64, n_tracks: usize, v2: f64, psi2: f64, centrality: f64) -> Event {
    let mut rng = StdRng::seed_from_u64(seed);
    let tracks = modulated_tracks(&mut rng, n_tracks, v2, psi2, 0.0, 0.0);

    // VZERO rings sample the same modulation
    let vzero: Vec<f64> = (0..64)
        .map(|i| {
            let phi = std::f64::consts::PI / 4.0 * (0.5 + (i % 8) as f64);
            50.0 * (1.0 + 2.0 * v2 * (2.0 * (phi - psi2)).cos())
        })
        .collect();

    Event::new(168311)
        .with_vertex(Vertex::new(rng.random::<f64>() * 10.0 - 5.0, None))
        .with_centrality(Centrality::new(centrality, centrality + 0.5))
        .with_rho(60.0)
        .with_tracks(tracks)
        .with_jets(vec![
            Jet::new(rng.random::<f64>() * TAU, 0.3, 80.0, 0.5, 15),
            Jet::new(rng.random::<f64>() * TAU, -0.3, 50.0, 0.5, 11),
        ])
        .with_vzero(vzero)
}
