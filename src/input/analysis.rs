// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Contains the implementation of the main `Analysis` structure and its methods.

use std::fs::read_to_string;
use std::path::Path;

use derive_builder::Builder;
use getset::{CopyGetters, Getters, Setters};
use serde::Deserialize;

use crate::errors::ConfigError;

use super::{
    CentralityClasses, DetectorType, EventCuts, FitModulationType, JetCuts, RandomCone, TrackCuts,
};

/// Structure holding all the information necessary to perform the rho modulation analysis.
#[derive(Debug, Clone, Builder, Getters, CopyGetters, Setters, Deserialize)]
#[serde(deny_unknown_fields)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Analysis {
    /// Path to a yaml file containing the events to analyze.
    /// Only required when running the analysis through `Analysis::run`.
    #[builder(setter(into, strip_option), default)]
    #[getset(get = "pub")]
    events: Option<String>,
    /// Path to an output yaml file where the histograms will be written.
    /// If not provided, no output is written by `Analysis::run`.
    #[builder(setter(into, strip_option), default)]
    #[serde(default, alias = "output_yaml")]
    #[getset(get = "pub")]
    output: Option<String>,
    /// Model fitted to the azimuthal track distribution.
    #[builder(default)]
    #[serde(default, alias = "fit")]
    #[getset(get_copy = "pub")]
    fit_modulation: FitModulationType,
    /// Detector providing the event planes for the fit.
    #[builder(default)]
    #[serde(default)]
    #[getset(get_copy = "pub")]
    detector: DetectorType,
    /// Weight tracks by their transverse momentum.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    #[getset(get_copy = "pub")]
    use_pt_weight: bool,
    /// Derive the number of azimuthal bins from the number of accepted tracks.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    #[getset(get_copy = "pub")]
    rebin_on_the_fly: bool,
    /// Number of azimuthal bins used if `rebin_on_the_fly` is not set.
    #[builder(default = "20")]
    #[serde(default = "default_n_bins")]
    #[getset(get_copy = "pub")]
    n_bins: usize,
    /// Momentum window of the tracks used for the event planes and the fit (GeV/c).
    #[builder(default = "[0.15, 5.0]")]
    #[serde(default = "default_pt_window", alias = "pt_window")]
    #[getset(get_copy = "pub")]
    ep_pt_window: [f64; 2],
    /// Resolution parameter of the jets.
    #[builder(default = "0.4")]
    #[serde(default = "default_jet_radius")]
    #[getset(get_copy = "pub")]
    jet_radius: f64,
    /// Multiple of the jet radius excluded around the leading jets.
    /// Values lower than or equal to zero disable the exclusion.
    #[builder(default = "1.0")]
    #[serde(default = "default_exclude_leading_jets")]
    #[getset(get_copy = "pub")]
    exclude_leading_jets: f64,
    #[builder(default)]
    #[serde(default)]
    #[getset(get_copy = "pub")]
    track_cuts: TrackCuts,
    #[builder(default)]
    #[serde(default)]
    #[getset(get_copy = "pub")]
    jet_cuts: JetCuts,
    #[builder(default)]
    #[serde(default)]
    #[getset(get_copy = "pub")]
    event_cuts: EventCuts,
    /// Edges of the centrality classes.
    #[builder(default)]
    #[serde(default, alias = "centrality_classes")]
    #[getset(get = "pub")]
    centrality: CentralityClasses,
    #[builder(default)]
    #[serde(default)]
    #[getset(get_copy = "pub")]
    random_cone: RandomCone,
    /// Accepted range of the fit quality score (exclusive).
    #[builder(default = "[0.0, 1.0]")]
    #[serde(default = "default_quality_window", alias = "p_value_window")]
    #[getset(get_copy = "pub")]
    quality_window: [f64; 2],
    /// Require the fitted modulation to be positive everywhere.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    #[getset(get_copy = "pub")]
    abs_vn_harmonics: bool,
    /// Divisors applied to the summed sub-event amplitudes of the 2nd and 3rd harmonic.
    #[builder(default = "[2.0, 2.0]")]
    #[serde(default = "default_subevent_divisors")]
    #[getset(get_copy = "pub")]
    subevent_divisors: [f64; 2],
    /// Fill quality assurance histograms.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    #[getset(get_copy = "pub")]
    fill_qa: bool,
    /// Be silent. Print nothing to the standard output during the analysis.
    #[builder(setter(custom), default = "false")]
    #[serde(default)]
    #[getset(get_copy = "pub", set = "pub")]
    silent: bool,
    /// Do not make backups. Overwrite the output file.
    #[builder(setter(custom), default = "false")]
    #[serde(default)]
    #[getset(get_copy = "pub", set = "pub")]
    overwrite: bool,
}

fn default_true() -> bool {
    true
}

fn default_n_bins() -> usize {
    20
}

fn default_pt_window() -> [f64; 2] {
    [0.15, 5.0]
}

fn default_jet_radius() -> f64 {
    0.4
}

fn default_exclude_leading_jets() -> f64 {
    1.0
}

fn default_quality_window() -> [f64; 2] {
    [0.0, 1.0]
}

fn default_subevent_divisors() -> [f64; 2] {
    [2.0, 2.0]
}

fn validate_pt_window(window: [f64; 2]) -> Result<(), ConfigError> {
    if window[0] < 0.0 {
        return Err(ConfigError::Negative("minimal event plane momentum", window[0]));
    }
    if window[0] >= window[1] {
        return Err(ConfigError::InvalidWindow(
            "event plane momentum",
            window[0],
            window[1],
        ));
    }
    Ok(())
}

fn validate_quality_window(window: [f64; 2]) -> Result<(), ConfigError> {
    if window[0] < 0.0 || window[1] > 1.0 {
        return Err(ConfigError::InvalidQualityWindow(window[0], window[1]));
    }
    if window[0] >= window[1] {
        return Err(ConfigError::InvalidWindow(
            "quality score",
            window[0],
            window[1],
        ));
    }
    Ok(())
}

fn validate_jet_radius(radius: f64) -> Result<(), ConfigError> {
    if radius <= 0.0 {
        Err(ConfigError::NotPositive("jet radius", radius))
    } else {
        Ok(())
    }
}

fn validate_n_bins(n_bins: usize) -> Result<(), ConfigError> {
    if n_bins == 0 {
        Err(ConfigError::InvalidNumberOfBins)
    } else {
        Ok(())
    }
}

fn validate_divisors(divisors: [f64; 2]) -> Result<(), ConfigError> {
    for (divisor, harmonic) in divisors.iter().zip([2, 3]) {
        if *divisor == 0.0 {
            return Err(ConfigError::ZeroSubeventDivisor(harmonic));
        }
    }
    Ok(())
}

impl Analysis {
    pub fn new() -> AnalysisBuilder {
        AnalysisBuilder::default()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Analysis, ConfigError> {
        let name = path.as_ref().to_string_lossy().to_string();
        let string =
            read_to_string(&path).map_err(|_| ConfigError::CouldNotOpenConfig(name.clone()))?;
        let analysis: Analysis = serde_yaml::from_str(&string)
            .map_err(|e| ConfigError::CouldNotParseConfig(name, e))?;

        analysis.validate()?;
        Ok(analysis)
    }

    /// Check that the Analysis structure is valid. Used after deserialization from config yaml file.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        validate_pt_window(self.ep_pt_window)?;
        validate_quality_window(self.quality_window)?;
        validate_jet_radius(self.jet_radius)?;
        validate_n_bins(self.n_bins)?;
        validate_divisors(self.subevent_divisors)?;

        self.track_cuts.validate()?;
        self.jet_cuts.validate()?;
        self.event_cuts.validate()?;
        self.random_cone.validate()?;

        Ok(())
    }

    /// Number of centrality classes.
    #[inline(always)]
    pub fn n_classes(&self) -> usize {
        self.centrality.n_classes()
    }

    /// Radius of the region excluded around the leading jets.
    #[inline(always)]
    pub fn exclusion_radius(&self) -> f64 {
        self.jet_radius * self.exclude_leading_jets
    }

    /// Minimal distance between a random cone and the leading jet.
    #[inline(always)]
    pub fn min_cone_distance(&self) -> f64 {
        self.random_cone.min_distance_or(self.jet_radius)
    }

    /// Log basic info about the analysis.
    pub(crate) fn info(&self) {
        log::info!(
            "Will fit '{}' modulation using event planes from '{}'.",
            self.fit_modulation,
            self.detector
        );
        log::info!(
            "Event plane tracks: {} < pT < {} GeV/c ({}).",
            self.ep_pt_window[0],
            self.ep_pt_window[1],
            if self.use_pt_weight {
                "pT weighted"
            } else {
                "unweighted"
            }
        );
        if self.rebin_on_the_fly {
            log::info!("Number of azimuthal bins will be derived from the track multiplicity.");
        } else {
            log::info!("Will use {} azimuthal bins.", self.n_bins);
        }
        if self.exclude_leading_jets > 0.0 {
            log::info!(
                "Will exclude |Δη| < {} around the two leading jets.",
                self.exclusion_radius()
            );
        }
        log::info!(
            "Accepted fit quality window: ({}, {}).",
            self.quality_window[0],
            self.quality_window[1]
        );
        log::info!(
            "Centrality classes: {}.",
            (0..self.n_classes())
                .map(|c| self.centrality.label(c))
                .collect::<Vec<_>>()
                .join(", ")
        );
        log::info!(
            "Will draw {} random cones of radius {} per event.",
            self.random_cone.n_cones(),
            self.random_cone.radius()
        );
    }
}

impl AnalysisBuilder {
    /// Be silent. Print nothing to the standard output during the analysis.
    #[inline(always)]
    pub fn silent(&mut self) -> &mut Self {
        self.silent = Some(true);
        self
    }

    /// Do not make backups. Overwrite the output file.
    #[inline(always)]
    pub fn overwrite(&mut self) -> &mut Self {
        self.overwrite = Some(true);
        self
    }

    /// Alias for `output`.
    #[inline(always)]
    pub fn output_yaml(&mut self, value: &str) -> &mut Self {
        self.output(value)
    }

    /// Validate the process of analysis building.
    fn validate(&self) -> Result<(), String> {
        if let Some(window) = self.ep_pt_window {
            validate_pt_window(window).map_err(|e| e.to_string())?;
        }

        if let Some(window) = self.quality_window {
            validate_quality_window(window).map_err(|e| e.to_string())?;
        }

        if let Some(radius) = self.jet_radius {
            validate_jet_radius(radius).map_err(|e| e.to_string())?;
        }

        if let Some(n_bins) = self.n_bins {
            validate_n_bins(n_bins).map_err(|e| e.to_string())?;
        }

        if let Some(divisors) = self.subevent_divisors {
            validate_divisors(divisors).map_err(|e| e.to_string())?;
        }

        if let Some(cone) = self.random_cone {
            cone.validate().map_err(|e| e.to_string())?;
        }

        if let Some(cuts) = self.event_cuts {
            cuts.validate().map_err(|e| e.to_string())?;
        }

        Ok(())
    }
}
