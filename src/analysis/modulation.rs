// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Fourier-harmonic modulation of the background density.

use std::f64::consts::TAU;
use std::fmt;

use getset::CopyGetters;

use crate::event::Track;
use crate::input::{Analysis, DetectorType, FitModulationType, TrackCuts};

use super::azimuth::{number_of_bins, AzimuthalHistogram};
use super::fitting::{chi2_quality, linear_least_squares};
use super::flow::{is_soft_track, track_weight, Planes};
use super::leading::LeadingJetExcluder;

/// Number of points used to search for the minimum of the modulation.
const MINIMUM_GRID: usize = 1000;

#[inline(always)]
fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        x.sin() / x
    }
}

/// ρ(φ) = N·(1 + 2·v2·cos(2(φ−ψ2)) + 2·v3·cos(3(φ−ψ3))).
///
/// Both harmonics carry the Fourier factor 2, so `v3` is the Fourier flow coefficient.
/// A parametrization with 3·v3 in front of the third harmonic yields values smaller
/// by a factor 2/3; the two are not directly comparable.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
pub struct ModulationModel {
    #[getset(get_copy = "pub")]
    normalization: f64,
    #[getset(get_copy = "pub")]
    v2: f64,
    #[getset(get_copy = "pub")]
    v3: f64,
    #[getset(get_copy = "pub")]
    psi2: f64,
    #[getset(get_copy = "pub")]
    psi3: f64,
}

impl ModulationModel {
    pub fn new(normalization: f64, v2: f64, v3: f64, psi2: f64, psi3: f64) -> Self {
        ModulationModel {
            normalization,
            v2,
            v3,
            psi2,
            psi3,
        }
    }

    /// Unmodulated density.
    pub fn flat(normalization: f64) -> Self {
        ModulationModel::new(normalization, 0.0, 0.0, 0.0, 0.0)
    }

    /// Amplitude of the given harmonic (zero for harmonics outside of the model).
    #[inline]
    pub fn amplitude(&self, harmonic: usize) -> f64 {
        match harmonic {
            2 => self.v2,
            3 => self.v3,
            _ => 0.0,
        }
    }

    /// Phase of the given harmonic (zero for harmonics outside of the model).
    #[inline]
    pub fn phase(&self, harmonic: usize) -> f64 {
        match harmonic {
            2 => self.psi2,
            3 => self.psi3,
            _ => 0.0,
        }
    }

    /// Relative modulation `ρ(φ) / N`.
    #[inline]
    pub fn shape(&self, phi: f64) -> f64 {
        1.0 + 2.0 * self.v2 * (2.0 * (phi - self.psi2)).cos()
            + 2.0 * self.v3 * (3.0 * (phi - self.psi3)).cos()
    }

    #[inline]
    pub fn evaluate(&self, phi: f64) -> f64 {
        self.normalization * self.shape(phi)
    }

    /// Background density `rho` modulated by this model and averaged over
    /// the azimuthal window `[phi - radius, phi + radius]`.
    pub fn local_rho(&self, phi: f64, radius: f64, rho: f64) -> f64 {
        rho * (1.0
            + 2.0 * self.v2 * sinc(2.0 * radius) * (2.0 * (phi - self.psi2)).cos()
            + 2.0 * self.v3 * sinc(3.0 * radius) * (3.0 * (phi - self.psi3)).cos())
    }

    /// Smallest value of the model over [0, 2π), sampled on a fine grid.
    pub fn minimum(&self) -> f64 {
        (0..MINIMUM_GRID)
            .map(|i| self.evaluate(TAU * i as f64 / MINIMUM_GRID as f64))
            .fold(f64::INFINITY, f64::min)
    }
}

/// Why the modulation fit has been rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    NoEntries,
    NonPositiveRho,
    UndefinedPlane(usize),
    NoDegreesOfFreedom,
    NonPositiveNormalization,
    SolveFailed,
    QualityOutOfWindow,
    NegativeModulation,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEntries => write!(f, "no tracks in the azimuthal distribution"),
            Self::NonPositiveRho => write!(f, "background density is not positive"),
            Self::UndefinedPlane(n) => write!(f, "event plane of harmonic {} is undefined", n),
            Self::NoDegreesOfFreedom => write!(f, "no degrees of freedom"),
            Self::NonPositiveNormalization => write!(f, "fitted normalization is not positive"),
            Self::SolveFailed => write!(f, "least-squares solution failed"),
            Self::QualityOutOfWindow => write!(f, "fit quality outside of the accepted window"),
            Self::NegativeModulation => write!(f, "modulation is not positive everywhere"),
        }
    }
}

impl RejectReason {
    /// Was the fit rejected without being performed?
    pub fn is_short_circuit(&self) -> bool {
        !matches!(self, Self::QualityOutOfWindow | Self::NegativeModulation)
    }
}

/// Terminal state of the modulation fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitState {
    Accepted,
    Rejected(RejectReason),
}

/// Published outcome of the modulation fit for a single event.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
pub struct FitResult {
    #[getset(get_copy = "pub")]
    model: ModulationModel,
    /// Models of the two sub-events (sub-event detector only).
    sides: Option<[ModulationModel; 2]>,
    #[getset(get_copy = "pub")]
    chi2: f64,
    #[getset(get_copy = "pub")]
    ndf: i64,
    /// `1 - CDF(chi2; ndf)`. Absent if no fit has been performed.
    #[getset(get_copy = "pub")]
    quality: Option<f64>,
    #[getset(get_copy = "pub")]
    state: FitState,
}

impl FitResult {
    /// Rejected result that has never been fitted.
    fn short_circuit(rho: f64, reason: RejectReason) -> Self {
        FitResult {
            model: ModulationModel::flat(rho),
            sides: None,
            chi2: 0.0,
            ndf: 0,
            quality: None,
            state: FitState::Rejected(reason),
        }
    }

    #[inline(always)]
    pub fn is_accepted(&self) -> bool {
        self.state == FitState::Accepted
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self.state {
            FitState::Accepted => None,
            FitState::Rejected(reason) => Some(reason),
        }
    }

    /// Model describing the background at pseudorapidity `eta`.
    ///
    /// For the sub-event detector, the model of the opposite-side event plane is returned,
    /// i.e. the side A model for η ≥ 0 and the side B model for η < 0.
    pub fn model_at(&self, eta: f64) -> ModulationModel {
        match self.sides {
            Some([side_a, _]) if eta >= 0.0 => side_a,
            Some([_, side_b]) => side_b,
            None => self.model,
        }
    }

    /// Models of the sub-events (side A, side B), if fitted separately and accepted.
    pub fn side_models(&self) -> Option<[ModulationModel; 2]> {
        self.sides
    }
}

/// Event planes available to the fitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitPlanes {
    /// Planes of a single detector.
    Single(Planes),
    /// TPC sub-events: full-TPC planes, planes from η < 0 and planes from η ≥ 0.
    SubEvents { full: Planes, sub_a: Planes, sub_b: Planes },
}

/// Tracks entering the fit, with respect to their pseudorapidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EtaSide {
    All,
    Positive,
    Negative,
}

impl EtaSide {
    #[inline(always)]
    fn contains(&self, eta: f64) -> bool {
        match self {
            EtaSide::All => true,
            EtaSide::Positive => eta >= 0.0,
            EtaSide::Negative => eta < 0.0,
        }
    }
}

/// Fit that passed the short-circuit checks but has not been gated yet.
#[derive(Debug, Clone, Copy)]
struct RawFit {
    model: ModulationModel,
    chi2: f64,
    ndf: i64,
}

/// Fits the modulation model to the azimuthal distribution of tracks.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
pub struct ModulationFitter {
    #[getset(get_copy = "pub")]
    mode: FitModulationType,
    #[getset(get_copy = "pub")]
    detector: DetectorType,
    use_pt_weight: bool,
    rebin_on_the_fly: bool,
    n_bins: usize,
    pt_window: [f64; 2],
    track_cuts: TrackCuts,
    quality_window: [f64; 2],
    abs_vn_harmonics: bool,
    subevent_divisors: [f64; 2],
}

impl ModulationFitter {
    pub fn new(analysis: &Analysis) -> Self {
        ModulationFitter {
            mode: analysis.fit_modulation(),
            detector: analysis.detector(),
            use_pt_weight: analysis.use_pt_weight(),
            rebin_on_the_fly: analysis.rebin_on_the_fly(),
            n_bins: analysis.n_bins(),
            pt_window: analysis.ep_pt_window(),
            track_cuts: analysis.track_cuts(),
            quality_window: analysis.quality_window(),
            abs_vn_harmonics: analysis.abs_vn_harmonics(),
            subevent_divisors: analysis.subevent_divisors(),
        }
    }

    /// Fit the modulation of the event.
    ///
    /// `n_accepted` is the number of tracks used for the full TPC event planes and
    /// determines the number of bins if rebinning on the fly.
    pub fn fit(
        &self,
        tracks: &[Track],
        excluder: &LeadingJetExcluder,
        rho: f64,
        planes: &FitPlanes,
        n_accepted: usize,
    ) -> FitResult {
        match planes {
            FitPlanes::Single(planes) => {
                match self.fit_side(tracks, excluder, rho, planes, EtaSide::All, n_accepted) {
                    Ok(raw) => self.gate(raw, None, rho),
                    Err(reason) => FitResult::short_circuit(rho, reason),
                }
            }
            FitPlanes::SubEvents { full, sub_a, sub_b } => {
                // side A: plane from η < 0, tracks with η ≥ 0
                let side_a =
                    self.fit_side(tracks, excluder, rho, sub_a, EtaSide::Positive, n_accepted);
                // side B: plane from η ≥ 0, tracks with η < 0
                let side_b =
                    self.fit_side(tracks, excluder, rho, sub_b, EtaSide::Negative, n_accepted);

                match (side_a, side_b) {
                    (Ok(a), Ok(b)) => {
                        let normalization = match self.mode {
                            FitModulationType::Flat => rho,
                            _ => a.model.normalization + b.model.normalization,
                        };
                        let combined = RawFit {
                            model: ModulationModel::new(
                                normalization,
                                (a.model.v2 + b.model.v2) / self.subevent_divisors[0],
                                (a.model.v3 + b.model.v3) / self.subevent_divisors[1],
                                full.psi2().angle(),
                                full.psi3().angle(),
                            ),
                            chi2: a.chi2 + b.chi2,
                            ndf: a.ndf + b.ndf,
                        };
                        self.gate(combined, Some([a.model, b.model]), rho)
                    }
                    (Err(reason), _) | (_, Err(reason)) => {
                        FitResult::short_circuit(rho, reason)
                    }
                }
            }
        }
    }

    /// Number of free parameters of the fitted model.
    #[inline]
    fn n_parameters(&self) -> usize {
        match self.mode {
            FitModulationType::Flat => 0,
            FitModulationType::FourierSeries => 1,
            FitModulationType::V2 | FitModulationType::V3 => 2,
            FitModulationType::Combined | FitModulationType::User => 3,
        }
    }

    /// Build the azimuthal distribution of one side and fit it.
    fn fit_side(
        &self,
        tracks: &[Track],
        excluder: &LeadingJetExcluder,
        rho: f64,
        planes: &Planes,
        side: EtaSide,
        n_accepted: usize,
    ) -> Result<RawFit, RejectReason> {
        let selected: Vec<(f64, f64)> = tracks
            .iter()
            .filter(|t| {
                is_soft_track(t, &self.track_cuts, self.pt_window, excluder)
                    && side.contains(t.eta())
            })
            .map(|t| (t.phi(), track_weight(t, self.use_pt_weight)))
            .collect();

        let mut histogram =
            AzimuthalHistogram::new(number_of_bins(n_accepted, self.rebin_on_the_fly, self.n_bins));
        for &(phi, weight) in selected.iter() {
            histogram.fill(phi, weight);
        }

        if histogram.n_entries() == 0 {
            return Err(RejectReason::NoEntries);
        }

        if !(rho > 0.0) {
            return Err(RejectReason::NonPositiveRho);
        }

        for &harmonic in self.mode.harmonics() {
            if !planes.get(harmonic).is_defined() {
                return Err(RejectReason::UndefinedPlane(harmonic));
            }
        }

        let points: Vec<(f64, f64, f64)> = histogram.points().collect();
        let ndf = points.len() as i64 - self.n_parameters() as i64;
        if ndf <= 0 {
            return Err(RejectReason::NoDegreesOfFreedom);
        }

        let psi2 = planes.psi2().angle();
        let psi3 = planes.psi3().angle();

        let (model, chi2) = match self.mode {
            FitModulationType::Flat => (ModulationModel::flat(rho), chi2_against(&points, rho)),
            FitModulationType::V2 | FitModulationType::V3 => {
                let harmonic = self.mode.harmonics()[0];
                let psi = planes.get(harmonic).angle();
                let n = harmonic as f64;
                let fit =
                    linear_least_squares(&points, 2, |phi| vec![1.0, 2.0 * (n * (phi - psi)).cos()])
                        .ok_or(RejectReason::SolveFailed)?;

                let normalization = fit.parameters[0];
                let amplitude = fit.parameters[1] / normalization;
                let model = if harmonic == 2 {
                    ModulationModel::new(normalization, amplitude, 0.0, psi2, 0.0)
                } else {
                    ModulationModel::new(normalization, 0.0, amplitude, 0.0, psi3)
                };
                (model, fit.chi2)
            }
            FitModulationType::Combined | FitModulationType::User => {
                let fit = linear_least_squares(&points, 3, |phi| {
                    vec![
                        1.0,
                        2.0 * (2.0 * (phi - psi2)).cos(),
                        2.0 * (3.0 * (phi - psi3)).cos(),
                    ]
                })
                .ok_or(RejectReason::SolveFailed)?;

                let normalization = fit.parameters[0];
                (
                    ModulationModel::new(
                        normalization,
                        fit.parameters[1] / normalization,
                        fit.parameters[2] / normalization,
                        psi2,
                        psi3,
                    ),
                    fit.chi2,
                )
            }
            FitModulationType::FourierSeries => {
                let shape = ModulationModel::new(
                    1.0,
                    fourier_coefficient(&selected, 2, psi2),
                    fourier_coefficient(&selected, 3, psi3),
                    psi2,
                    psi3,
                );
                let fit = linear_least_squares(&points, 1, |phi| vec![shape.shape(phi)])
                    .ok_or(RejectReason::SolveFailed)?;

                (
                    ModulationModel::new(fit.parameters[0], shape.v2, shape.v3, psi2, psi3),
                    fit.chi2,
                )
            }
        };

        if !(model.normalization > 0.0) {
            return Err(RejectReason::NonPositiveNormalization);
        }

        Ok(RawFit { model, chi2, ndf })
    }

    /// Accept or reject a performed fit.
    fn gate(&self, raw: RawFit, sides: Option<[ModulationModel; 2]>, rho: f64) -> FitResult {
        let quality = chi2_quality(raw.chi2, raw.ndf);

        let reason = match quality {
            Some(q) if q > self.quality_window[0] && q < self.quality_window[1] => {
                if self.abs_vn_harmonics && !(raw.model.minimum() > 0.0) {
                    Some(RejectReason::NegativeModulation)
                } else {
                    None
                }
            }
            _ => Some(RejectReason::QualityOutOfWindow),
        };

        match reason {
            None => FitResult {
                model: raw.model,
                sides,
                chi2: raw.chi2,
                ndf: raw.ndf,
                quality,
                state: FitState::Accepted,
            },
            Some(reason) => FitResult {
                model: ModulationModel::new(rho, 0.0, 0.0, raw.model.psi2, raw.model.psi3),
                sides: None,
                chi2: raw.chi2,
                ndf: raw.ndf,
                quality,
                state: FitState::Rejected(reason),
            },
        }
    }
}

/// Chi-square of the (x, y, σ) points against a constant.
fn chi2_against(points: &[(f64, f64, f64)], constant: f64) -> f64 {
    points
        .iter()
        .map(|&(_, y, sigma)| ((y - constant) / sigma).powi(2))
        .sum()
}

/// Magnitude of the weighted Fourier coefficient of harmonic `n` relative to the plane `psi`.
pub fn fourier_coefficient(angles: &[(f64, f64)], harmonic: usize, psi: f64) -> f64 {
    let n = harmonic as f64;
    let (mut sum_cos, mut sum_sin, mut sum_w) = (0.0, 0.0, 0.0);
    for &(phi, weight) in angles {
        sum_cos += weight * (n * (phi - psi)).cos();
        sum_sin += weight * (n * (phi - psi)).sin();
        sum_w += weight;
    }

    if sum_w > 0.0 {
        sum_cos.hypot(sum_sin) / sum_w
    } else {
        0.0
    }
}
