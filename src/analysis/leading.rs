// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Exclusion of the pseudorapidity region around the leading jets.

use std::cmp::Ordering;

use crate::event::Jet;
use crate::input::JetCuts;

/// Accepted jets sorted by decreasing transverse momentum, at most `n` of them.
fn hardest_jets<'a>(jets: &'a [Jet], cuts: &JetCuts, n: usize) -> Vec<&'a Jet> {
    let mut accepted: Vec<&Jet> = jets.iter().filter(|jet| cuts.accepts(jet)).collect();
    accepted.sort_by(|a, b| b.pt().partial_cmp(&a.pt()).unwrap_or(Ordering::Equal));
    accepted.truncate(n);
    accepted
}

/// Highest-momentum accepted jet of the event.
pub fn leading_jet<'a>(jets: &'a [Jet], cuts: &JetCuts) -> Option<&'a Jet> {
    hardest_jets(jets, cuts, 1).into_iter().next()
}

/// Region of the detector excluded from the event plane estimation and the modulation fit.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ExclusionRegion {
    /// Pseudorapidities of the two leading jets.
    jet_eta: [f64; 2],
    /// Half-width of the excluded band around each jet.
    half_width: f64,
    jet_radius: f64,
    jet_max_eta: f64,
}

/// Decides whether a track lies too close to one of the two leading jets.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LeadingJetExcluder {
    region: Option<ExclusionRegion>,
}

impl LeadingJetExcluder {
    /// Construct the excluder from the jets of the event.
    ///
    /// Exclusion is active only if `multiplier` is positive and
    /// at least two jets pass the acceptance cuts.
    pub fn new(jets: &[Jet], cuts: &JetCuts, jet_radius: f64, multiplier: f64) -> Self {
        if multiplier <= 0.0 {
            return Self::disabled();
        }

        let leading = hardest_jets(jets, cuts, 2);
        if leading.len() < 2 {
            return Self::disabled();
        }

        LeadingJetExcluder {
            region: Some(ExclusionRegion {
                jet_eta: [leading[0].eta(), leading[1].eta()],
                half_width: jet_radius * multiplier,
                jet_radius,
                jet_max_eta: cuts.max_eta(),
            }),
        }
    }

    /// Excluder that never excludes anything.
    pub fn disabled() -> Self {
        LeadingJetExcluder { region: None }
    }

    #[inline(always)]
    pub fn is_active(&self) -> bool {
        self.region.is_some()
    }

    /// Pseudorapidities of the two leading jets, if the exclusion is active.
    pub fn jet_eta(&self) -> Option<[f64; 2]> {
        self.region.map(|r| r.jet_eta)
    }

    /// Should the track with pseudorapidity `eta` be excluded?
    #[inline]
    pub fn excludes(&self, eta: f64) -> bool {
        let Some(region) = &self.region else {
            return false;
        };

        region
            .jet_eta
            .iter()
            .any(|jet_eta| (eta - jet_eta).abs() < region.half_width)
            || eta.abs() - region.jet_radius - region.jet_max_eta > 0.0
    }
}
