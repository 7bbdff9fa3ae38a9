// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Acceptance cuts for tracks, jets and events.

use std::f64::consts::TAU;

use derive_builder::Builder;
use getset::CopyGetters;
use serde::Deserialize;

use crate::errors::ConfigError;
use crate::event::{Jet, Track};

fn validate_window(name: &'static str, window: [f64; 2]) -> Result<(), ConfigError> {
    if window[0] < window[1] {
        Ok(())
    } else {
        Err(ConfigError::InvalidWindow(name, window[0], window[1]))
    }
}

/// Kinematic acceptance of tracks.
#[derive(Debug, Clone, Copy, PartialEq, Builder, CopyGetters, Deserialize)]
#[serde(deny_unknown_fields)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct TrackCuts {
    /// Minimal transverse momentum (GeV/c).
    #[builder(default = "0.15")]
    #[serde(default = "default_track_min_pt")]
    #[getset(get_copy = "pub")]
    min_pt: f64,
    /// Accepted pseudorapidity range.
    #[builder(default = "[-0.9, 0.9]")]
    #[serde(default = "default_track_eta")]
    #[getset(get_copy = "pub")]
    eta: [f64; 2],
    /// Accepted azimuthal range.
    #[builder(default = "[0.0, TAU]")]
    #[serde(default = "default_phi")]
    #[getset(get_copy = "pub")]
    phi: [f64; 2],
}

impl Default for TrackCuts {
    fn default() -> Self {
        TrackCuts {
            min_pt: default_track_min_pt(),
            eta: default_track_eta(),
            phi: default_phi(),
        }
    }
}

impl TrackCuts {
    pub fn new() -> TrackCutsBuilder {
        TrackCutsBuilder::default()
    }

    /// Does the track pass the acceptance?
    #[inline]
    pub fn accepts(&self, track: &Track) -> bool {
        track.accepted()
            && track.pt() >= self.min_pt
            && track.eta() >= self.eta[0]
            && track.eta() <= self.eta[1]
            && track.phi() >= self.phi[0]
            && track.phi() <= self.phi[1]
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        validate_window("track pseudorapidity", self.eta)?;
        validate_window("track azimuth", self.phi)?;
        if self.min_pt < 0.0 {
            return Err(ConfigError::Negative("minimal track momentum", self.min_pt));
        }
        Ok(())
    }
}

impl TrackCutsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(eta) = self.eta {
            validate_window("track pseudorapidity", eta).map_err(|e| e.to_string())?;
        }
        if let Some(phi) = self.phi {
            validate_window("track azimuth", phi).map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

/// Kinematic acceptance of jets.
#[derive(Debug, Clone, Copy, PartialEq, Builder, CopyGetters, Deserialize)]
#[serde(deny_unknown_fields)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct JetCuts {
    /// Minimal (raw) transverse momentum (GeV/c).
    #[builder(default = "1.0")]
    #[serde(default = "default_jet_min_pt")]
    #[getset(get_copy = "pub")]
    min_pt: f64,
    /// Minimal jet area.
    #[builder(default = "0.0")]
    #[serde(default)]
    #[getset(get_copy = "pub")]
    min_area: f64,
    /// Accepted pseudorapidity range of the jet axis.
    #[builder(default = "[-0.5, 0.5]")]
    #[serde(default = "default_jet_eta")]
    #[getset(get_copy = "pub")]
    eta: [f64; 2],
    /// Accepted azimuthal range of the jet axis.
    #[builder(default = "[0.0, TAU]")]
    #[serde(default = "default_phi")]
    #[getset(get_copy = "pub")]
    phi: [f64; 2],
}

impl Default for JetCuts {
    fn default() -> Self {
        JetCuts {
            min_pt: default_jet_min_pt(),
            min_area: 0.0,
            eta: default_jet_eta(),
            phi: default_phi(),
        }
    }
}

impl JetCuts {
    pub fn new() -> JetCutsBuilder {
        JetCutsBuilder::default()
    }

    /// Does the jet pass the acceptance?
    #[inline]
    pub fn accepts(&self, jet: &Jet) -> bool {
        jet.pt() >= self.min_pt
            && jet.area() >= self.min_area
            && jet.eta() >= self.eta[0]
            && jet.eta() <= self.eta[1]
            && jet.phi() >= self.phi[0]
            && jet.phi() <= self.phi[1]
    }

    /// Maximal pseudorapidity of the jet axis.
    #[inline(always)]
    pub fn max_eta(&self) -> f64 {
        self.eta[1]
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        validate_window("jet pseudorapidity", self.eta)?;
        validate_window("jet azimuth", self.phi)?;
        if self.min_area < 0.0 {
            return Err(ConfigError::Negative("minimal jet area", self.min_area));
        }
        Ok(())
    }
}

impl JetCutsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(eta) = self.eta {
            validate_window("jet pseudorapidity", eta).map_err(|e| e.to_string())?;
        }
        if let Some(phi) = self.phi {
            validate_window("jet azimuth", phi).map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

/// Event selection thresholds.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventCuts {
    /// Maximal absolute z position of the primary vertex (cm).
    #[serde(default = "default_abs_vertex_z")]
    #[getset(get_copy = "pub")]
    abs_vertex_z: f64,
    /// Maximal distance between the SPD and the primary vertex (cm).
    #[serde(default = "default_max_vertex_difference")]
    #[getset(get_copy = "pub")]
    max_vertex_difference: f64,
    /// Maximal difference between the V0M and TRK centrality estimates.
    #[serde(default = "default_max_centrality_difference")]
    #[getset(get_copy = "pub")]
    max_centrality_difference: f64,
}

impl Default for EventCuts {
    fn default() -> Self {
        EventCuts {
            abs_vertex_z: default_abs_vertex_z(),
            max_vertex_difference: default_max_vertex_difference(),
            max_centrality_difference: default_max_centrality_difference(),
        }
    }
}

impl EventCuts {
    pub fn new(
        abs_vertex_z: f64,
        max_vertex_difference: f64,
        max_centrality_difference: f64,
    ) -> Result<Self, ConfigError> {
        let cuts = EventCuts {
            abs_vertex_z,
            max_vertex_difference,
            max_centrality_difference,
        };
        cuts.validate()?;
        Ok(cuts)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.abs_vertex_z <= 0.0 {
            return Err(ConfigError::NotPositive("vertex z range", self.abs_vertex_z));
        }
        if self.max_vertex_difference < 0.0 {
            return Err(ConfigError::Negative(
                "maximal vertex difference",
                self.max_vertex_difference,
            ));
        }
        if self.max_centrality_difference < 0.0 {
            return Err(ConfigError::Negative(
                "maximal centrality difference",
                self.max_centrality_difference,
            ));
        }
        Ok(())
    }
}

fn default_track_min_pt() -> f64 {
    0.15
}

fn default_track_eta() -> [f64; 2] {
    [-0.9, 0.9]
}

fn default_jet_min_pt() -> f64 {
    1.0
}

fn default_jet_eta() -> [f64; 2] {
    [-0.5, 0.5]
}

fn default_phi() -> [f64; 2] {
    [0.0, TAU]
}

fn default_abs_vertex_z() -> f64 {
    10.0
}

fn default_max_vertex_difference() -> f64 {
    0.5
}

fn default_max_centrality_difference() -> f64 {
    5.0
}
