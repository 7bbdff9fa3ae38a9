// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Fit modes and event-plane detectors.

use serde::Deserialize;
use strum_macros::{Display, EnumString};

/// Model fitted to the azimuthal distribution of tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FitModulationType {
    /// Normalization fixed to rho, nothing is fitted.
    #[default]
    #[serde(alias = "no_fit")]
    Flat,
    /// Normalization and the second-harmonic amplitude.
    V2,
    /// Normalization and the third-harmonic amplitude.
    V3,
    /// Normalization and both amplitudes.
    Combined,
    /// Amplitudes extracted in closed form, only the normalization is fitted.
    #[serde(alias = "fourier")]
    FourierSeries,
    /// Combined model without publishing the amplitudes.
    User,
}

impl FitModulationType {
    /// Harmonics whose amplitudes are part of the model.
    pub fn harmonics(&self) -> &'static [usize] {
        match self {
            Self::Flat => &[],
            Self::V2 => &[2],
            Self::V3 => &[3],
            Self::Combined | Self::FourierSeries | Self::User => &[2, 3],
        }
    }

    /// Are the fitted amplitudes published into the vn profiles?
    pub fn publishes_harmonics(&self) -> bool {
        !matches!(self, Self::Flat | Self::User)
    }
}

/// Detector used to estimate the event planes entering the fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DetectorType {
    #[default]
    Tpc,
    /// TPC split into two pseudorapidity sub-events.
    TpcSub,
    VzeroA,
    VzeroC,
}
