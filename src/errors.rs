// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! This module contains error types that can be returned by the `rhovn` crate.

use std::path::Path;

use colored::{ColoredString, Colorize};
use thiserror::Error;

fn path_to_yellow(path: &Path) -> ColoredString {
    path.to_string_lossy().as_ref().yellow()
}

/// Errors that can occur inside the application itself.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{} could not read the configuration file '{}'", "error:".red().bold(), .0.yellow())]
    CouldNotReadConfig(String),
}

/// Errors that can occur when reading or validating the analysis configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{} could not open the configuration file '{}'", "error:".red().bold(), .0.yellow())]
    CouldNotOpenConfig(String),

    #[error("{} could not understand the contents of the configuration file '{}' ({})", "error:".red().bold(), .0.yellow(), .1)]
    CouldNotParseConfig(String, serde_yaml::Error),

    #[error("{} at least two centrality edges are required (got '{}')", "error:".red().bold(), .0.to_string().yellow())]
    NotEnoughCentralityEdges(usize),

    #[error("{} centrality edges must be strictly increasing ('{}' is followed by '{}')", "error:".red().bold(), .0.to_string().yellow(), .1.to_string().yellow())]
    CentralityEdgesNotIncreasing(f64, f64),

    #[error("{} invalid {} window: minimum '{}' is not lower than maximum '{}'", "error:".red().bold(), .0, .1.to_string().yellow(), .2.to_string().yellow())]
    InvalidWindow(&'static str, f64, f64),

    #[error("{} quality score window must lie within [0, 1] (got ['{}', '{}'])", "error:".red().bold(), .0.to_string().yellow(), .1.to_string().yellow())]
    InvalidQualityWindow(f64, f64),

    #[error("{} {} must be positive (got '{}')", "error:".red().bold(), .0, .1.to_string().yellow())]
    NotPositive(&'static str, f64),

    #[error("{} {} must be non-negative (got '{}')", "error:".red().bold(), .0, .1.to_string().yellow())]
    Negative(&'static str, f64),

    #[error("{} the number of azimuthal bins must be at least 1", "error:".red().bold())]
    InvalidNumberOfBins,

    #[error("{} sub-event divisor for harmonic '{}' must be non-zero", "error:".red().bold(), .0.to_string().yellow())]
    ZeroSubeventDivisor(usize),
}

/// Reasons for skipping an event. None of these are fatal for the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventError {
    #[error("event has no primary vertex")]
    MissingVertex,

    #[error("event has no background density estimate")]
    MissingRho,

    #[error("event has no centrality estimate")]
    MissingCentrality,

    #[error("primary vertex z position '{0}' cm is outside of the accepted range")]
    VertexOutOfRange(f64),

    #[error("SPD and primary vertex differ by '{0}' cm")]
    VertexMismatch(f64),

    #[error("centrality '{0}' is outside of (0, 100)")]
    CentralityOutOfRange(f64),

    #[error("centrality estimators disagree by '{0}'")]
    CentralityMismatch(f64),

    #[error("centrality '{0}' does not belong to any centrality class")]
    NoCentralityClass(f64),
}

/// Errors that can occur while reading the input events.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("{} could not open the events file '{}'", "error:".red().bold(), .0.yellow())]
    CouldNotOpenEvents(String),

    #[error("{} could not understand the contents of the events file '{}' ({})", "error:".red().bold(), .0.yellow(), .1)]
    CouldNotParseEvents(String, serde_yaml::Error),

    #[error("{} event number '{}' contains '{}' VZERO channels (expected '64')", "error:".red().bold(), .0.to_string().yellow(), .1.to_string().yellow())]
    InvalidVzero(usize, usize),

    #[error("{} no events file has been specified", "error:".red().bold())]
    NoEvents,
}

/// Errors that can occur while writing the results.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("{} could not create file '{}'", "error:".red().bold(), path_to_yellow(.0))]
    CouldNotCreateFile(Box<Path>),

    #[error("{} could not create a backup for file '{}'", "error:".red().bold(), path_to_yellow(.0))]
    CouldNotBackupFile(Box<Path>),

    #[error("{} could not write results in yaml format into '{}'", "error:".red().bold(), path_to_yellow(.0))]
    CouldNotWriteYaml(Box<Path>),
}

/// Errors that can occur when calculating transverse energy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EtError {
    #[error("{} particle with PDG code '{}' is not supported", "error:".red().bold(), .0.to_string().yellow())]
    UnsupportedParticle(i32),

    #[error("{} transverse energy of a neutral proton candidate is undefined", "error:".red().bold())]
    NeutralProton,
}
