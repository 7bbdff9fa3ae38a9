// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Per-event input data: tracks, jets, vertex, centrality, background density
//! and VZERO multiplicities.

use std::fs::read_to_string;
use std::path::Path;

use getset::{CopyGetters, Getters};
use serde::Deserialize;

use crate::errors::ReadError;

/// Number of VZERO segments.
pub const VZERO_CHANNELS: usize = 64;

/// Reconstructed charged-particle track.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Track {
    /// Azimuthal angle in [0, 2π).
    #[getset(get_copy = "pub")]
    phi: f64,
    /// Pseudorapidity.
    #[getset(get_copy = "pub")]
    eta: f64,
    /// Transverse momentum (GeV/c).
    #[getset(get_copy = "pub")]
    pt: f64,
    /// Sign of the electric charge.
    #[serde(default)]
    #[getset(get_copy = "pub")]
    charge: i8,
    /// Track category (used for QA histograms only).
    #[serde(default, alias = "type")]
    #[getset(get_copy = "pub")]
    category: u8,
    /// Acceptance flag provided by the event source.
    #[serde(default = "default_true")]
    #[getset(get_copy = "pub")]
    accepted: bool,
}

impl Track {
    /// Create a new accepted track of category 0.
    pub fn new(phi: f64, eta: f64, pt: f64, charge: i8) -> Self {
        Track {
            phi,
            eta,
            pt,
            charge,
            category: 0,
            accepted: true,
        }
    }

    /// Set the track category.
    pub fn with_category(mut self, category: u8) -> Self {
        self.category = category;
        self
    }

    /// Mark the track as rejected by the event source.
    pub fn rejected(mut self) -> Self {
        self.accepted = false;
        self
    }
}

/// Reconstructed jet.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Jet {
    #[getset(get_copy = "pub")]
    phi: f64,
    #[getset(get_copy = "pub")]
    eta: f64,
    #[getset(get_copy = "pub")]
    pt: f64,
    #[getset(get_copy = "pub")]
    area: f64,
    /// Number of charged constituents.
    #[serde(default, alias = "nch")]
    #[getset(get_copy = "pub")]
    constituents: usize,
}

impl Jet {
    pub fn new(phi: f64, eta: f64, pt: f64, area: f64, constituents: usize) -> Self {
        Jet {
            phi,
            eta,
            pt,
            area,
            constituents,
        }
    }
}

/// Primary vertex of the event.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Vertex {
    /// Position of the primary vertex along the beam axis (cm).
    #[getset(get_copy = "pub")]
    z: f64,
    /// Position of the vertex reconstructed from the SPD alone (cm).
    #[serde(default)]
    #[getset(get_copy = "pub")]
    z_spd: Option<f64>,
}

impl Vertex {
    pub fn new(z: f64, z_spd: Option<f64>) -> Self {
        Vertex { z, z_spd }
    }
}

/// Centrality percentiles from two independent estimators.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Centrality {
    /// Centrality from the VZERO amplitude (main estimator).
    #[getset(get_copy = "pub")]
    v0m: f64,
    /// Centrality from the track multiplicity (cross-check estimator).
    #[getset(get_copy = "pub")]
    trk: f64,
}

impl Centrality {
    pub fn new(v0m: f64, trk: f64) -> Self {
        Centrality { v0m, trk }
    }
}

/// A single collision event as delivered by the event source.
#[derive(Debug, Clone, Default, Getters, CopyGetters, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Event {
    #[serde(default)]
    #[getset(get_copy = "pub")]
    run_number: u32,
    #[serde(default)]
    #[getset(get_copy = "pub")]
    vertex: Option<Vertex>,
    #[serde(default)]
    #[getset(get_copy = "pub")]
    centrality: Option<Centrality>,
    #[serde(default)]
    #[getset(get = "pub")]
    tracks: Vec<Track>,
    #[serde(default)]
    #[getset(get = "pub")]
    jets: Vec<Jet>,
    /// Background transverse-momentum density (GeV/c per unit area).
    #[serde(default)]
    #[getset(get_copy = "pub")]
    rho: Option<f64>,
    /// Equalized multiplicities of the 64 VZERO segments.
    #[serde(default)]
    vzero: Option<Vec<f64>>,
}

impl Event {
    /// Start constructing a new event.
    pub fn new(run_number: u32) -> Self {
        Event {
            run_number,
            ..Default::default()
        }
    }

    pub fn with_vertex(mut self, vertex: Vertex) -> Self {
        self.vertex = Some(vertex);
        self
    }

    pub fn with_centrality(mut self, centrality: Centrality) -> Self {
        self.centrality = Some(centrality);
        self
    }

    pub fn with_tracks(mut self, tracks: Vec<Track>) -> Self {
        self.tracks = tracks;
        self
    }

    pub fn with_jets(mut self, jets: Vec<Jet>) -> Self {
        self.jets = jets;
        self
    }

    pub fn with_rho(mut self, rho: f64) -> Self {
        self.rho = Some(rho);
        self
    }

    /// Panics if `multiplicities` does not contain exactly 64 values.
    pub fn with_vzero(mut self, multiplicities: Vec<f64>) -> Self {
        assert_eq!(
            multiplicities.len(),
            VZERO_CHANNELS,
            "VZERO multiplicities must contain exactly {} values",
            VZERO_CHANNELS
        );
        self.vzero = Some(multiplicities);
        self
    }

    /// Equalized VZERO multiplicities, if available.
    pub fn vzero(&self) -> Option<&[f64]> {
        self.vzero.as_deref()
    }

    /// Read a sequence of events from a yaml file.
    pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<Event>, ReadError> {
        let name = path.as_ref().to_string_lossy().to_string();
        let string =
            read_to_string(&path).map_err(|_| ReadError::CouldNotOpenEvents(name.clone()))?;
        let events: Vec<Event> = serde_yaml::from_str(&string)
            .map_err(|e| ReadError::CouldNotParseEvents(name, e))?;

        for (i, event) in events.iter().enumerate() {
            if let Some(vzero) = &event.vzero {
                if vzero.len() != VZERO_CHANNELS {
                    return Err(ReadError::InvalidVzero(i, vzero.len()));
                }
            }
        }

        Ok(events)
    }
}

fn default_true() -> bool {
    true
}
