// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Random cones probing the fluctuations of the background.

use std::f64::consts::TAU;

use getset::CopyGetters;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::event::{Jet, Track};
use crate::input::{Analysis, TrackCuts};

/// Maximal number of attempts to place a cone away from the reference jet.
pub const MAX_ATTEMPTS: usize = 1000;

/// Shorter of the direct and the wrap-around azimuthal distance. Always in [0, π].
#[inline]
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let diff = (phi1 - phi2).rem_euclid(TAU);
    diff.min(TAU - diff)
}

#[inline(always)]
fn uniform(rng: &mut StdRng, range: [f64; 2]) -> f64 {
    range[0] + (range[1] - range[0]) * rng.random::<f64>()
}

/// A cone placed in the detector with the summed transverse momentum of its tracks.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Cone {
    eta: f64,
    phi: f64,
    radius: f64,
    /// Summed transverse momentum of the tracks inside the cone.
    pt: f64,
}

impl Cone {
    #[inline(always)]
    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }
}

/// Draws random cones inside the jet acceptance.
#[derive(Debug, Clone)]
pub struct RandomConeSampler {
    rng: StdRng,
    radius: f64,
    min_distance: f64,
    eta_range: [f64; 2],
    phi_range: [f64; 2],
    track_cuts: TrackCuts,
}

impl RandomConeSampler {
    /// Create a new sampler.
    /// The generator is seeded from the configuration or from the operating system.
    pub fn new(analysis: &Analysis) -> Self {
        let cone = analysis.random_cone();
        let jet_cuts = analysis.jet_cuts();
        let margin = (cone.radius() - analysis.jet_radius()).abs();

        let rng = match cone.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        RandomConeSampler {
            rng,
            radius: cone.radius(),
            min_distance: analysis.min_cone_distance(),
            eta_range: [jet_cuts.eta()[0] + margin, jet_cuts.eta()[1] - margin],
            phi_range: [jet_cuts.phi()[0].max(0.0), jet_cuts.phi()[1].min(TAU)],
            track_cuts: analysis.track_cuts(),
        }
    }

    #[inline(always)]
    pub fn eta_range(&self) -> [f64; 2] {
        self.eta_range
    }

    #[inline(always)]
    pub fn phi_range(&self) -> [f64; 2] {
        self.phi_range
    }

    /// Draw a cone axis. With a reference jet, the axis must lie further than
    /// the minimal distance from it. Returns `None` if no such axis is found.
    pub fn draw_axis(&mut self, reference: Option<&Jet>) -> Option<(f64, f64)> {
        let Some(jet) = reference else {
            let eta = uniform(&mut self.rng, self.eta_range);
            let phi = uniform(&mut self.rng, self.phi_range);
            return Some((eta, phi));
        };

        for _ in 0..MAX_ATTEMPTS {
            let eta = uniform(&mut self.rng, self.eta_range);
            let phi = uniform(&mut self.rng, self.phi_range);
            let d_eta = eta - jet.eta();
            let d_phi = delta_phi(phi, jet.phi());
            if (d_eta * d_eta + d_phi * d_phi).sqrt() > self.min_distance {
                return Some((eta, phi));
            }
        }

        log::warn!(
            "Could not place a random cone further than {} from the leading jet in {} attempts.",
            self.min_distance,
            MAX_ATTEMPTS
        );
        None
    }

    /// Place a random cone and sum the momenta of the accepted tracks inside it.
    pub fn sample(&mut self, tracks: &[Track], reference: Option<&Jet>) -> Option<Cone> {
        let (eta, phi) = self.draw_axis(reference)?;
        let pt = tracks
            .iter()
            .filter(|t| self.track_cuts.accepts(t))
            .filter(|t| self.contains(eta, phi, t.eta(), t.phi()))
            .map(|t| t.pt())
            .sum();

        Some(Cone {
            eta,
            phi,
            radius: self.radius,
            pt,
        })
    }

    /// Place a random cone into an event where the position of every accepted track
    /// is randomized (η within the track acceptance, φ within the cone azimuthal range).
    pub fn sample_randomized(&mut self, tracks: &[Track], reference: Option<&Jet>) -> Option<Cone> {
        let (eta, phi) = self.draw_axis(reference)?;
        let track_eta = self.track_cuts.eta();

        let mut pt = 0.0;
        for track in tracks.iter().filter(|t| self.track_cuts.accepts(t)) {
            let random_eta = uniform(&mut self.rng, track_eta);
            let random_phi = uniform(&mut self.rng, self.phi_range);
            if self.contains(eta, phi, random_eta, random_phi) {
                pt += track.pt();
            }
        }

        Some(Cone {
            eta,
            phi,
            radius: self.radius,
            pt,
        })
    }

    #[inline(always)]
    fn contains(&self, cone_eta: f64, cone_phi: f64, eta: f64, phi: f64) -> bool {
        let d_eta = eta - cone_eta;
        let d_phi = delta_phi(phi, cone_phi);
        (d_eta * d_eta + d_phi * d_phi).sqrt() <= self.radius
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;

    use super::*;
    use crate::input::RandomCone;

    fn sampler(min_distance: Option<f64>, seed: u64) -> RandomConeSampler {
        RandomConeSampler::new(
            &Analysis::new()
                .random_cone(RandomCone::new(Some(0.4), min_distance, None, Some(seed)).unwrap())
                .jet_radius(0.2)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn delta_phi_wraps() {
        assert_relative_eq!(delta_phi(0.1, TAU - 0.1), 0.2, epsilon = 1e-12);
        assert_relative_eq!(delta_phi(TAU - 0.1, 0.1), 0.2, epsilon = 1e-12);
        assert_relative_eq!(delta_phi(1.0, 3.0), 2.0, epsilon = 1e-12);
        assert_relative_eq!(delta_phi(0.0, PI), PI, epsilon = 1e-12);
    }

    #[test]
    fn axis_in_acceptance() {
        let mut sampler = sampler(None, 42);
        assert_relative_eq!(sampler.eta_range()[0], -0.3);
        assert_relative_eq!(sampler.eta_range()[1], 0.3);
        assert_eq!(sampler.phi_range(), [0.0, TAU]);

        for _ in 0..1000 {
            let (eta, phi) = sampler.draw_axis(None).unwrap();
            assert!((-0.3..=0.3).contains(&eta));
            assert!((0.0..TAU).contains(&phi));
        }
    }

    #[test]
    fn away_from_reference() {
        let mut sampler = sampler(Some(0.5), 7);
        let jet = Jet::new(1.0, 0.0, 50.0, 0.1, 10);
        for _ in 0..200 {
            let (eta, phi) = sampler.draw_axis(Some(&jet)).unwrap();
            let distance = (eta.powi(2) + delta_phi(phi, 1.0).powi(2)).sqrt();
            assert!(distance > 0.5);
        }
    }

    #[test]
    fn budget_exhausted() {
        let mut sampler = sampler(Some(100.0), 3);
        let jet = Jet::new(1.0, 0.0, 50.0, 0.1, 10);
        assert!(sampler.draw_axis(Some(&jet)).is_none());
        assert!(sampler
            .sample(&[Track::new(1.0, 0.0, 1.0, 1)], Some(&jet))
            .is_none());
        assert!(sampler.sample_randomized(&[], Some(&jet)).is_none());
    }

    #[test]
    fn default_min_distance() {
        let sampler = sampler(None, 1);
        assert_relative_eq!(sampler.min_distance, 0.1);
    }

    #[test]
    fn seeded_reproducible() {
        let mut first = sampler(None, 99);
        let mut second = sampler(None, 99);
        for _ in 0..10 {
            assert_eq!(first.draw_axis(None), second.draw_axis(None));
        }
    }

    #[test]
    fn cone_sums_tracks() {
        // dense ring of tracks at η = 0 covering all azimuths
        let tracks: Vec<Track> = (0..360)
            .map(|i| Track::new(i as f64 * TAU / 360.0, 0.0, 1.0, 1))
            .collect();

        let mut sampler = sampler(None, 5);
        for _ in 0..50 {
            let cone = sampler.sample(&tracks, None).unwrap();
            assert_relative_eq!(cone.radius(), 0.4);
            assert_relative_eq!(cone.area(), 0.16 * PI);

            let expected = tracks
                .iter()
                .filter(|t| {
                    let d_eta = t.eta() - cone.eta();
                    let d_phi = delta_phi(t.phi(), cone.phi());
                    (d_eta * d_eta + d_phi * d_phi).sqrt() <= 0.4
                })
                .count() as f64;
            assert_relative_eq!(cone.pt(), expected);
            // the cone axis lies within |η| < 0.3 so it always catches some tracks
            assert!(cone.pt() > 0.0);
        }
    }

    #[test]
    fn cone_wraps_around() {
        let tracks = vec![Track::new(TAU - 0.05, 0.0, 2.0, 1), Track::new(0.05, 0.0, 3.0, 1)];
        let sampler = sampler(None, 5);
        assert!(sampler.contains(0.0, 0.0, tracks[0].eta(), tracks[0].phi()));
        assert!(sampler.contains(0.0, TAU - 0.01, tracks[1].eta(), tracks[1].phi()));
        assert!(!sampler.contains(0.0, PI, tracks[1].eta(), tracks[1].phi()));
    }

    #[test]
    fn rejected_tracks_ignored() {
        let tracks = vec![Track::new(1.0, 0.0, 2.0, 1).rejected(); 100];
        let mut sampler = sampler(None, 5);
        for _ in 0..10 {
            assert_relative_eq!(sampler.sample(&tracks, None).unwrap().pt(), 0.0);
            assert_relative_eq!(sampler.sample_randomized(&tracks, None).unwrap().pt(), 0.0);
        }
    }

    #[test]
    fn randomized_cone_mean() {
        // all momentum concentrated in one spot; randomization spreads it uniformly
        let tracks = vec![Track::new(1.0, 0.0, 1.0, 1); 2000];
        let mut sampler = sampler(None, 11);

        let n_cones = 200;
        let mean: f64 = (0..n_cones)
            .map(|_| sampler.sample_randomized(&tracks, None).unwrap().pt())
            .sum::<f64>()
            / n_cones as f64;

        // cone area over the track acceptance area (2π × 1.8)
        let expected = 2000.0 * 0.16 * PI / (TAU * 1.8);
        assert!(mean > 0.8 * expected && mean < 1.1 * expected);
    }
}
