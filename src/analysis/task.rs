// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Event-by-event rho modulation analysis feeding a histogram sink.

use std::f64::consts::{PI, TAU};

use crate::errors::{ConfigError, EventError};
use crate::et::{self, HadronicEt};
use crate::event::{Event, Jet, Track};
use crate::input::{Analysis, DetectorType};
use crate::presentation::{BinAxis, HistogramSink};

use super::flow::{wrap_angle, EventPlane, TpcPlanes, VzeroPlanes};
use super::leading::{leading_jet, LeadingJetExcluder};
use super::modulation::{FitPlanes, FitResult, ModulationFitter, ModulationModel, RejectReason};
use super::random_cone::{Cone, RandomConeSampler};
use super::resolution::{resolution_terms, RESOLUTION_LABELS};
use super::runs::{run_index, run_label, KNOWN_RUNS};
use super::selection::{select_event, SelectedEvent};

/// Bins of the analysis summary histogram.
pub const SUMMARY: &str = "summary";
pub const SUMMARY_LABELS: [&str; 5] = [
    "processed",
    "selected",
    "accepted",
    "rejected_without_fit",
    "rejected_after_fit",
];

pub const EVENT_REJECTIONS: &str = "event_rejections";
pub const EVENT_REJECTION_LABELS: [&str; 8] = [
    "missing_vertex",
    "missing_rho",
    "missing_centrality",
    "vertex_out_of_range",
    "vertex_mismatch",
    "centrality_out_of_range",
    "centrality_mismatch",
    "no_centrality_class",
];

pub const FIT_REJECTIONS: &str = "fit_rejections";
pub const FIT_REJECTION_LABELS: [&str; 8] = [
    "no_entries",
    "non_positive_rho",
    "undefined_plane",
    "no_degrees_of_freedom",
    "non_positive_normalization",
    "solve_failed",
    "quality_out_of_window",
    "negative_modulation",
];

pub const EP_CONTROL: &str = "event_plane_control";
pub const EP_CONTROL_LABELS: [&str; 10] = [
    "tpc_psi2",
    "tpc_psi3",
    "tpc_a_psi2",
    "tpc_a_psi3",
    "tpc_b_psi2",
    "tpc_b_psi3",
    "vzero_a_psi2",
    "vzero_a_psi3",
    "vzero_c_psi2",
    "vzero_c_psi3",
];

pub const EP_SPREAD: &str = "event_plane_spread";
pub const EP_SPREAD_LABELS: [&str; 4] = ["tpc_a-tpc_b", "vzero_a-vzero_c", "vzero_a-tpc", "vzero_c-tpc"];

pub const V2_PROFILE: &str = "v2_vs_centrality";
pub const V3_PROFILE: &str = "v3_vs_centrality";
pub const RHO_VS_CENTRALITY: &str = "rho_vs_centrality";
pub const RHO_AREA_VS_CENTRALITY: &str = "rho_area_vs_centrality";
pub const ET_ETA_PT: &str = "et_eta_pt";

pub const QA_RUN_ETA: &str = "qa_run_eta";
pub const QA_RUN_PHI: &str = "qa_run_phi";
pub const QA_VERTEX_Z: &str = "qa_vertex_z";
pub const QA_CENTRALITY: &str = "qa_centrality";

/// Number of track categories with a dedicated QA histogram.
pub const TRACK_CATEGORIES: u8 = 3;

const MAX_MULTIPLICITY: f64 = 4000.0;
const MAX_RHO: f64 = 250.0;
const MAX_TRACK_PT: f64 = 20.0;
const JET_PT_RANGE: [f64; 2] = [-50.0, 200.0];
const MAX_ET: f64 = 2000.0;

fn qa_category(category: u8) -> String {
    format!("qa_eta_phi_category_{}", category)
}

fn phi_axis() -> BinAxis {
    BinAxis::uniform(60, 0.0, TAU)
}

fn eta_axis() -> BinAxis {
    BinAxis::uniform(40, -1.0, 1.0)
}

fn rho_axis() -> BinAxis {
    BinAxis::uniform(125, 0.0, MAX_RHO)
}

fn multiplicity_axis() -> BinAxis {
    BinAxis::uniform(100, 0.0, MAX_MULTIPLICITY)
}

fn centrality_axis() -> BinAxis {
    BinAxis::uniform(100, 0.0, 100.0)
}

fn jet_pt_axis() -> BinAxis {
    BinAxis::uniform(250, JET_PT_RANGE[0], JET_PT_RANGE[1])
}

/// Bin of the event rejection histogram.
fn event_rejection_bin(error: &EventError) -> usize {
    match error {
        EventError::MissingVertex => 0,
        EventError::MissingRho => 1,
        EventError::MissingCentrality => 2,
        EventError::VertexOutOfRange(_) => 3,
        EventError::VertexMismatch(_) => 4,
        EventError::CentralityOutOfRange(_) => 5,
        EventError::CentralityMismatch(_) => 6,
        EventError::NoCentralityClass(_) => 7,
    }
}

/// Bin of the fit rejection histogram.
fn fit_rejection_bin(reason: &RejectReason) -> usize {
    match reason {
        RejectReason::NoEntries => 0,
        RejectReason::NonPositiveRho => 1,
        RejectReason::UndefinedPlane(_) => 2,
        RejectReason::NoDegreesOfFreedom => 3,
        RejectReason::NonPositiveNormalization => 4,
        RejectReason::SolveFailed => 5,
        RejectReason::QualityOutOfWindow => 6,
        RejectReason::NegativeModulation => 7,
    }
}

/// Names of the histograms filled by random cones of a single kind.
#[derive(Debug, Clone)]
struct ConeHistograms {
    eta_phi: String,
    pt: String,
    rho_area_vs_pt: String,
    delta_pt_vs_dphi2: String,
    delta_pt_vs_dphi3: String,
}

impl ConeHistograms {
    fn new(prefix: &str, label: &str) -> Self {
        ConeHistograms {
            eta_phi: format!("{}_eta_phi_{}", prefix, label),
            pt: format!("{}_pt_{}", prefix, label),
            rho_area_vs_pt: format!("{}_rho_area_vs_pt_{}", prefix, label),
            delta_pt_vs_dphi2: format!("{}_delta_pt_vs_dphi2_{}", prefix, label),
            delta_pt_vs_dphi3: format!("{}_delta_pt_vs_dphi3_{}", prefix, label),
        }
    }

    fn book(&self, sink: &mut impl HistogramSink) {
        sink.book_2d(&self.eta_phi, eta_axis(), phi_axis());
        sink.book_1d(&self.pt, BinAxis::uniform(200, 0.0, 200.0));
        sink.book_2d(
            &self.rho_area_vs_pt,
            BinAxis::uniform(200, 0.0, 200.0),
            BinAxis::uniform(200, 0.0, 200.0),
        );
        sink.book_2d(&self.delta_pt_vs_dphi2, phi_axis(), jet_pt_axis());
        sink.book_2d(&self.delta_pt_vs_dphi3, phi_axis(), jet_pt_axis());
    }
}

/// Names of all histograms booked for a single centrality class.
#[derive(Debug, Clone)]
struct ClassHistograms {
    fit_quality: String,
    resolution: [String; 2],
    track_pt: String,
    psi2: [String; 3],
    rho: String,
    rho_vs_multiplicity: String,
    rho_area_vs_multiplicity: String,
    jet_pt_raw: String,
    jet_pt_corrected: String,
    jet_eta_phi: String,
    jet_pt_vs_area: String,
    jet_pt_vs_constituents: String,
    jet_eta_vs_pt_over_area: String,
    /// φ_jet − ψ2 of TPC, VZERO-A and VZERO-C vs corrected jet momentum.
    jet_dphi: [String; 3],
    /// φ_track − ψ for (TPC, VZERO-A, VZERO-C) × (ψ2, ψ3).
    track_dphi: [[String; 2]; 3],
    et_charged: String,
    cones: [ConeHistograms; 3],
}

const DETECTORS: [&str; 3] = ["tpc", "vzero_a", "vzero_c"];

impl ClassHistograms {
    fn new(label: &str) -> Self {
        let per_detector = |base: &str| DETECTORS.map(|d| format!("{}_{}_{}", base, d, label));

        ClassHistograms {
            fit_quality: format!("fit_quality_{}", label),
            resolution: [
                format!("resolution_psi2_{}", label),
                format!("resolution_psi3_{}", label),
            ],
            track_pt: format!("track_pt_{}", label),
            psi2: per_detector("psi2"),
            rho: format!("rho_{}", label),
            rho_vs_multiplicity: format!("rho_vs_multiplicity_{}", label),
            rho_area_vs_multiplicity: format!("rho_area_vs_multiplicity_{}", label),
            jet_pt_raw: format!("jet_pt_raw_{}", label),
            jet_pt_corrected: format!("jet_pt_corrected_{}", label),
            jet_eta_phi: format!("jet_eta_phi_{}", label),
            jet_pt_vs_area: format!("jet_pt_vs_area_{}", label),
            jet_pt_vs_constituents: format!("jet_pt_vs_constituents_{}", label),
            jet_eta_vs_pt_over_area: format!("jet_eta_vs_pt_over_area_{}", label),
            jet_dphi: per_detector("jet_dphi2"),
            track_dphi: DETECTORS.map(|d| {
                [
                    format!("track_dphi2_{}_{}", d, label),
                    format!("track_dphi3_{}_{}", d, label),
                ]
            }),
            et_charged: format!("et_charged_{}", label),
            cones: [
                ConeHistograms::new("rc", label),
                ConeHistograms::new("rc_excluding_leading", label),
                ConeHistograms::new("rc_randomized", label),
            ],
        }
    }

    fn book(&self, sink: &mut impl HistogramSink) {
        sink.book_1d(&self.fit_quality, BinAxis::uniform(100, 0.0, 1.0));
        for name in self.resolution.iter() {
            sink.book_profile(name, BinAxis::labeled(&RESOLUTION_LABELS));
        }
        sink.book_1d(&self.track_pt, BinAxis::uniform(200, 0.0, MAX_TRACK_PT));
        for name in self.psi2.iter() {
            sink.book_1d(name, BinAxis::uniform(40, 0.0, PI));
        }

        sink.book_1d(&self.rho, rho_axis());
        sink.book_2d(&self.rho_vs_multiplicity, multiplicity_axis(), rho_axis());
        sink.book_2d(
            &self.rho_area_vs_multiplicity,
            multiplicity_axis(),
            BinAxis::uniform(200, 0.0, 200.0),
        );

        sink.book_1d(&self.jet_pt_raw, BinAxis::uniform(200, 0.0, 200.0));
        sink.book_1d(&self.jet_pt_corrected, jet_pt_axis());
        sink.book_2d(&self.jet_eta_phi, eta_axis(), phi_axis());
        sink.book_2d(&self.jet_pt_vs_area, jet_pt_axis(), BinAxis::uniform(50, 0.0, 1.0));
        sink.book_2d(
            &self.jet_pt_vs_constituents,
            jet_pt_axis(),
            BinAxis::uniform(100, 0.0, 100.0),
        );
        sink.book_2d(
            &self.jet_eta_vs_pt_over_area,
            eta_axis(),
            BinAxis::uniform(100, 0.0, 500.0),
        );
        for name in self.jet_dphi.iter() {
            sink.book_2d(name, phi_axis(), jet_pt_axis());
        }

        for name in self.track_dphi.iter().flatten() {
            sink.book_1d(name, phi_axis());
        }

        sink.book_1d(&self.et_charged, BinAxis::uniform(200, 0.0, MAX_ET));

        for cones in self.cones.iter() {
            cones.book(sink);
        }
    }
}

/// Event planes of all detectors for one event.
#[derive(Debug, Clone, Copy)]
struct EventPlanes {
    tpc: TpcPlanes,
    vzero: VzeroPlanes,
}

impl EventPlanes {
    /// Planes of the TPC, VZERO-A and VZERO-C detectors for the given harmonic.
    fn by_detector(&self, harmonic: usize) -> [EventPlane; 3] {
        [
            self.tpc.full().get(harmonic),
            self.vzero.side_a().get(harmonic),
            self.vzero.side_c().get(harmonic),
        ]
    }

    /// Planes used for the fit.
    fn for_fit(&self, detector: DetectorType) -> FitPlanes {
        match detector {
            DetectorType::Tpc => FitPlanes::Single(self.tpc.full()),
            DetectorType::TpcSub => FitPlanes::SubEvents {
                full: self.tpc.full(),
                sub_a: self.tpc.sub_a(),
                sub_b: self.tpc.sub_b(),
            },
            DetectorType::VzeroA => FitPlanes::Single(self.vzero.side_a()),
            DetectorType::VzeroC => FitPlanes::Single(self.vzero.side_c()),
        }
    }

    /// The ten angles of the event plane control profile, in label order.
    fn control_angles(&self) -> [EventPlane; 10] {
        let (tpc, a, b) = (self.tpc.full(), self.tpc.sub_a(), self.tpc.sub_b());
        let (v0a, v0c) = (self.vzero.side_a(), self.vzero.side_c());
        [
            tpc.psi2(),
            tpc.psi3(),
            a.psi2(),
            a.psi3(),
            b.psi2(),
            b.psi3(),
            v0a.psi2(),
            v0a.psi3(),
            v0c.psi2(),
            v0c.psi3(),
        ]
    }
}

/// Rho modulation analysis applied to one event after another.
///
/// Create the task using `RhoVnTask::initialize`, feed it events using
/// `RhoVnTask::process_event` and collect the filled sink using `RhoVnTask::finalize`.
pub struct RhoVnTask<S: HistogramSink> {
    analysis: Analysis,
    sink: S,
    fitter: ModulationFitter,
    sampler: RandomConeSampler,
    classes: Vec<ClassHistograms>,
    et: HadronicEt,
    n_processed: usize,
    n_selected: usize,
    n_accepted: usize,
    accepted_v2: Vec<f64>,
    accepted_v3: Vec<f64>,
}

impl<S: HistogramSink> RhoVnTask<S> {
    /// Validate the configuration and book all histograms.
    pub fn initialize(analysis: &Analysis, mut sink: S) -> Result<Self, ConfigError> {
        analysis.validate()?;

        sink.book_1d(SUMMARY, BinAxis::labeled(&SUMMARY_LABELS));
        sink.book_1d(EVENT_REJECTIONS, BinAxis::labeled(&EVENT_REJECTION_LABELS));
        sink.book_1d(FIT_REJECTIONS, BinAxis::labeled(&FIT_REJECTION_LABELS));

        if analysis.fill_qa() {
            let runs: Vec<String> = (0..=KNOWN_RUNS.len()).map(run_label).collect();
            sink.book_2d(QA_RUN_ETA, BinAxis::labeled(&runs), eta_axis());
            sink.book_2d(QA_RUN_PHI, BinAxis::labeled(&runs), phi_axis());
            for category in 0..TRACK_CATEGORIES {
                sink.book_2d(&qa_category(category), eta_axis(), phi_axis());
            }
            sink.book_1d(QA_VERTEX_Z, BinAxis::uniform(100, -25.0, 25.0));
            sink.book_1d(QA_CENTRALITY, centrality_axis());
        }

        sink.book_profile(EP_CONTROL, BinAxis::labeled(&EP_CONTROL_LABELS));
        sink.book_profile(EP_SPREAD, BinAxis::labeled(&EP_SPREAD_LABELS));
        sink.book_profile(V2_PROFILE, centrality_axis());
        sink.book_profile(V3_PROFILE, centrality_axis());
        sink.book_2d(RHO_VS_CENTRALITY, centrality_axis(), rho_axis());
        sink.book_2d(
            RHO_AREA_VS_CENTRALITY,
            centrality_axis(),
            BinAxis::uniform(200, 0.0, 200.0),
        );
        sink.book_2d(
            ET_ETA_PT,
            BinAxis::from_edges(&et::PT_AXIS),
            BinAxis::from_edges(&et::ETA_AXIS),
        );

        let classes: Vec<ClassHistograms> = (0..analysis.n_classes())
            .map(|c| ClassHistograms::new(&analysis.centrality().label(c)))
            .collect();
        for class in classes.iter() {
            class.book(&mut sink);
        }

        Ok(RhoVnTask {
            analysis: analysis.clone(),
            sink,
            fitter: ModulationFitter::new(analysis),
            sampler: RandomConeSampler::new(analysis),
            classes,
            et: HadronicEt::default(),
            n_processed: 0,
            n_selected: 0,
            n_accepted: 0,
            accepted_v2: Vec::new(),
            accepted_v3: Vec::new(),
        })
    }

    /// Sink receiving the histograms.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn n_processed(&self) -> usize {
        self.n_processed
    }

    pub fn n_selected(&self) -> usize {
        self.n_selected
    }

    /// Number of events with an accepted modulation fit.
    pub fn n_accepted(&self) -> usize {
        self.n_accepted
    }

    /// Analyze a single event.
    ///
    /// Returns an error if the event does not pass the event selection.
    /// Such event is skipped and the analysis may continue with the next one.
    pub fn process_event(&mut self, event: &Event) -> Result<FitResult, EventError> {
        self.n_processed += 1;
        self.sink.fill(SUMMARY, 0.0, 1.0);

        let selected = match select_event(
            event,
            &self.analysis.event_cuts(),
            self.analysis.centrality(),
        ) {
            Ok(x) => x,
            Err(e) => {
                log::debug!("Skipping event from run {}: {}.", event.run_number(), e);
                self.sink
                    .fill(EVENT_REJECTIONS, event_rejection_bin(&e) as f64, 1.0);
                return Err(e);
            }
        };

        self.n_selected += 1;
        self.sink.fill(SUMMARY, 1.0, 1.0);

        if self.analysis.fill_qa() {
            self.fill_qa(event, &selected);
        }

        let tracks = event.tracks();
        let jets = event.jets();
        let excluder = LeadingJetExcluder::new(
            jets,
            &self.analysis.jet_cuts(),
            self.analysis.jet_radius(),
            self.analysis.exclude_leading_jets(),
        );

        let planes = EventPlanes {
            tpc: TpcPlanes::estimate(
                tracks,
                &self.analysis.track_cuts(),
                self.analysis.ep_pt_window(),
                self.analysis.use_pt_weight(),
                &excluder,
            ),
            vzero: VzeroPlanes::estimate(event.vzero()),
        };

        let fit = self.fitter.fit(
            tracks,
            &excluder,
            selected.rho,
            &planes.for_fit(self.fitter.detector()),
            planes.tpc.n_tracks(),
        );

        self.fill_fit(&fit, &planes, &selected);
        self.fill_tracks(tracks, &planes, selected.class);
        self.fill_jets(jets, &fit, &planes, &selected, tracks);
        self.fill_event_planes(&planes, selected.class);
        self.fill_transverse_energy(tracks, selected.class);
        self.fill_random_cones(tracks, jets, &fit, &selected);

        Ok(fit)
    }

    /// Log the summary of the analysis and return the sink with all the histograms.
    pub fn finalize(self) -> S {
        log::info!(
            "Processed {} events: {} selected, {} with accepted modulation fit.",
            self.n_processed,
            self.n_selected,
            self.n_accepted
        );

        for (harmonic, values) in [(2, &self.accepted_v2), (3, &self.accepted_v3)] {
            match values.len() {
                0 => (),
                1 => log::info!("Accepted v{}: {:.4}.", harmonic, values[0]),
                _ => log::info!(
                    "Accepted v{}: {:.4} ± {:.4} (mean ± std).",
                    harmonic,
                    statistical::mean(values),
                    statistical::standard_deviation(values, None)
                ),
            }
        }

        self.sink
    }

    fn fill_qa(&mut self, event: &Event, selected: &SelectedEvent) {
        let run = run_index(event.run_number()) as f64;
        for track in event.tracks().iter().filter(|t| t.accepted()) {
            self.sink.fill_2d(QA_RUN_ETA, run, track.eta(), 1.0);
            self.sink.fill_2d(QA_RUN_PHI, run, track.phi(), 1.0);
            if track.category() < TRACK_CATEGORIES {
                self.sink
                    .fill_2d(&qa_category(track.category()), track.eta(), track.phi(), 1.0);
            }
        }

        self.sink.fill(QA_VERTEX_Z, selected.vertex_z, 1.0);
        self.sink.fill(QA_CENTRALITY, selected.centrality, 1.0);
    }

    fn fill_fit(&mut self, fit: &FitResult, planes: &EventPlanes, selected: &SelectedEvent) {
        let class = selected.class;
        if let Some(quality) = fit.quality() {
            self.sink.fill(&self.classes[class].fit_quality, quality, 1.0);
        }

        if let Some(reason) = fit.reject_reason() {
            log::debug!("Modulation fit rejected: {}.", reason);
            self.sink
                .fill(FIT_REJECTIONS, fit_rejection_bin(&reason) as f64, 1.0);
            let bin = if reason.is_short_circuit() { 3.0 } else { 4.0 };
            self.sink.fill(SUMMARY, bin, 1.0);
            return;
        }

        self.n_accepted += 1;
        self.sink.fill(SUMMARY, 2.0, 1.0);

        if !self.fitter.mode().publishes_harmonics() {
            return;
        }

        let model = fit.model();
        for &harmonic in self.fitter.mode().harmonics() {
            let amplitude = model.amplitude(harmonic);
            let (profile, accepted) = match harmonic {
                2 => (V2_PROFILE, &mut self.accepted_v2),
                _ => (V3_PROFILE, &mut self.accepted_v3),
            };
            self.sink
                .fill_profile(profile, selected.centrality, amplitude);
            accepted.push(amplitude);
        }

        for (i, harmonic) in [2, 3].into_iter().enumerate() {
            for (bin, value) in resolution_terms(&planes.tpc, &planes.vzero, harmonic) {
                self.sink
                    .fill_profile(&self.classes[class].resolution[i], bin as f64, value);
            }
        }
    }

    fn fill_tracks(&mut self, tracks: &[Track], planes: &EventPlanes, class: usize) {
        let cuts = self.analysis.track_cuts();
        let detector_planes = [planes.by_detector(2), planes.by_detector(3)];

        for track in tracks.iter().filter(|t| cuts.accepts(t)) {
            self.sink.fill(&self.classes[class].track_pt, track.pt(), 1.0);

            for (d, names) in self.classes[class].track_dphi.iter().enumerate() {
                for (h, name) in names.iter().enumerate() {
                    if let Some(psi) = detector_planes[h][d].defined_angle() {
                        self.sink.fill(name, wrap_angle(track.phi() - psi), 1.0);
                    }
                }
            }
        }
    }

    fn fill_jets(
        &mut self,
        jets: &[Jet],
        fit: &FitResult,
        planes: &EventPlanes,
        selected: &SelectedEvent,
        tracks: &[Track],
    ) {
        let cuts = self.analysis.jet_cuts();
        let radius = self.analysis.jet_radius();
        let multiplicity = self.multiplicity(tracks);
        let psi2 = planes.by_detector(2);
        let names = &self.classes[selected.class];

        for jet in jets.iter().filter(|j| cuts.accepts(j)) {
            let local_rho = fit
                .model_at(jet.eta())
                .local_rho(jet.phi(), radius, selected.rho);
            let corrected = jet.pt() - jet.area() * local_rho;

            self.sink.fill(&names.jet_pt_raw, jet.pt(), 1.0);
            self.sink.fill(&names.jet_pt_corrected, corrected, 1.0);
            self.sink.fill_2d(&names.jet_eta_phi, jet.eta(), jet.phi(), 1.0);
            self.sink.fill_2d(&names.jet_pt_vs_area, corrected, jet.area(), 1.0);
            self.sink.fill_2d(
                &names.jet_pt_vs_constituents,
                corrected,
                jet.constituents() as f64,
                1.0,
            );
            if jet.area() > 0.0 {
                self.sink.fill_2d(
                    &names.jet_eta_vs_pt_over_area,
                    jet.eta(),
                    jet.pt() / jet.area(),
                    1.0,
                );
            }

            for (name, plane) in names.jet_dphi.iter().zip(psi2.iter()) {
                if let Some(psi) = plane.defined_angle() {
                    self.sink
                        .fill_2d(name, wrap_angle(jet.phi() - psi), corrected, 1.0);
                }
            }

            let rho_area = selected.rho * jet.area();
            self.sink
                .fill_2d(&names.rho_area_vs_multiplicity, multiplicity, rho_area, 1.0);
            self.sink
                .fill_2d(RHO_AREA_VS_CENTRALITY, selected.centrality, rho_area, 1.0);
        }

        self.sink.fill(&names.rho, selected.rho, 1.0);
        self.sink
            .fill_2d(&names.rho_vs_multiplicity, multiplicity, selected.rho, 1.0);
        self.sink
            .fill_2d(RHO_VS_CENTRALITY, selected.centrality, selected.rho, 1.0);
    }

    fn fill_event_planes(&mut self, planes: &EventPlanes, class: usize) {
        for (bin, plane) in planes.control_angles().iter().enumerate() {
            if let Some(angle) = plane.defined_angle() {
                self.sink.fill_profile(EP_CONTROL, bin as f64, angle);
            }
        }

        let pairs = [
            (planes.tpc.sub_a().psi2(), planes.tpc.sub_b().psi2()),
            (planes.vzero.side_a().psi2(), planes.vzero.side_c().psi2()),
            (planes.vzero.side_a().psi2(), planes.tpc.full().psi2()),
            (planes.vzero.side_c().psi2(), planes.tpc.full().psi2()),
        ];
        for (bin, (a, b)) in pairs.iter().enumerate() {
            if let (Some(psi_a), Some(psi_b)) = (a.defined_angle(), b.defined_angle()) {
                self.sink
                    .fill_profile(EP_SPREAD, bin as f64, (psi_a - psi_b).abs());
            }
        }

        for (name, plane) in self.classes[class].psi2.iter().zip(planes.by_detector(2)) {
            if let Some(psi) = plane.defined_angle() {
                self.sink.fill(name, psi, 1.0);
            }
        }
    }

    /// Charged-hadron transverse energy of the event under the pion mass hypothesis.
    fn fill_transverse_energy(&mut self, tracks: &[Track], class: usize) {
        let cuts = self.analysis.track_cuts();
        self.et.reset();

        for track in tracks.iter().filter(|t| cuts.accepts(t)) {
            let momentum = track.pt() * track.eta().cosh();
            let theta = et::theta_from_eta(track.eta());
            let code = if track.charge() < 0 {
                -et::PI_PLUS_CODE
            } else {
                et::PI_PLUS_CODE
            };

            match et::transverse_energy(momentum, theta, code, track.charge()) {
                Ok(value) => {
                    self.et.add_charged(value, track.eta());
                    self.sink.fill_2d(ET_ETA_PT, track.pt(), track.eta(), value);
                }
                Err(e) => log::debug!("Skipping track in transverse energy: {}", e),
            }
        }

        self.sink
            .fill(&self.classes[class].et_charged, self.et.charged_acceptance(), 1.0);
    }

    fn fill_random_cones(
        &mut self,
        tracks: &[Track],
        jets: &[Jet],
        fit: &FitResult,
        selected: &SelectedEvent,
    ) {
        let leading = leading_jet(jets, &self.analysis.jet_cuts());

        for _ in 0..self.analysis.random_cone().n_cones() {
            let cones = [
                self.sampler.sample(tracks, None),
                self.sampler.sample(tracks, leading),
                self.sampler.sample_randomized(tracks, None),
            ];

            for (kind, cone) in cones.iter().enumerate() {
                let Some(cone) = cone.filter(|c| c.pt() > 0.0) else {
                    continue;
                };

                let names = &self.classes[selected.class].cones[kind];
                fill_cone(&mut self.sink, names, &cone, &fit.model_at(cone.eta()), selected.rho);
            }
        }
    }

    /// Number of accepted tracks.
    fn multiplicity(&self, tracks: &[Track]) -> f64 {
        let cuts = self.analysis.track_cuts();
        tracks.iter().filter(|t| cuts.accepts(t)).count() as f64
    }
}

fn fill_cone(
    sink: &mut impl HistogramSink,
    names: &ConeHistograms,
    cone: &Cone,
    model: &ModulationModel,
    rho: f64,
) {
    let local_rho = model.local_rho(cone.phi(), cone.radius(), rho);
    let expected = local_rho * cone.area();
    let delta_pt = cone.pt() - expected;

    sink.fill_2d(&names.eta_phi, cone.eta(), cone.phi(), 1.0);
    sink.fill(&names.pt, cone.pt(), 1.0);
    sink.fill_2d(&names.rho_area_vs_pt, cone.pt(), expected, 1.0);
    sink.fill_2d(
        &names.delta_pt_vs_dphi2,
        wrap_angle(cone.phi() - model.psi2()),
        delta_pt,
        1.0,
    );
    sink.fill_2d(
        &names.delta_pt_vs_dphi3,
        wrap_angle(cone.phi() - model.psi3()),
        delta_pt,
        1.0,
    );
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::event::{Centrality, Vertex, VZERO_CHANNELS};
    use crate::input::{FitModulationType, RandomCone};
    use crate::presentation::HistogramCollection;

    /// Event with `n_tracks` tracks following a second-harmonic modulation.
    fn event(seed: u64, n_tracks: usize, v2: f64, psi2: f64) -> Event {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut tracks = Vec::with_capacity(n_tracks);
        while tracks.len() < n_tracks {
            let phi = rng.random::<f64>() * TAU;
            let density = 1.0 + 2.0 * v2 * (2.0 * (phi - psi2)).cos();
            if rng.random::<f64>() * (1.0 + 2.0 * v2) < density {
                let eta = rng.random::<f64>() * 1.6 - 0.8;
                let pt = 0.2 + rng.random::<f64>() * 2.0;
                let charge = if tracks.len() % 2 == 0 { 1 } else { -1 };
                tracks.push(Track::new(phi, eta, pt, charge).with_category((tracks.len() % 3) as u8));
            }
        }

        let mut vzero = vec![10.0; VZERO_CHANNELS];
        vzero[0] += 5.0;
        vzero[36] += 5.0;

        Event::new(167813)
            .with_vertex(Vertex::new(1.0, Some(1.1)))
            .with_centrality(Centrality::new(5.0, 6.0))
            .with_rho(80.0)
            .with_tracks(tracks)
            .with_jets(vec![
                Jet::new(1.0, 0.1, 60.0, 0.5, 12),
                Jet::new(4.0, -0.2, 40.0, 0.45, 8),
                Jet::new(2.0, 0.8, 90.0, 0.5, 10),
            ])
            .with_vzero(vzero)
    }

    fn analysis(mode: FitModulationType, detector: DetectorType) -> Analysis {
        Analysis::new()
            .fit_modulation(mode)
            .detector(detector)
            .random_cone(RandomCone::new(None, None, Some(5), Some(42)).unwrap())
            .build()
            .unwrap()
    }

    fn task(mode: FitModulationType, detector: DetectorType) -> RhoVnTask<HistogramCollection> {
        RhoVnTask::initialize(&analysis(mode, detector), HistogramCollection::new()).unwrap()
    }

    #[test]
    fn books_histograms() {
        let task = task(FitModulationType::Combined, DetectorType::Tpc);
        let sink = task.sink();

        assert!(sink.histogram_1d(SUMMARY).is_some());
        assert!(sink.histogram_2d(QA_RUN_ETA).is_some());
        assert_eq!(
            sink.histogram_2d(QA_RUN_ETA).unwrap().x_axis().n_bins(),
            KNOWN_RUNS.len() + 1
        );
        assert!(sink.profile(EP_CONTROL).is_some());
        assert_eq!(
            sink.histogram_2d(ET_ETA_PT).unwrap().x_axis().n_bins(),
            111
        );

        // five default centrality classes
        for label in ["0-20", "20-40", "40-60", "60-80", "80-100"] {
            assert!(sink.histogram_1d(&format!("rho_{}", label)).is_some());
            assert!(sink.profile(&format!("resolution_psi2_{}", label)).is_some());
            assert!(sink
                .histogram_2d(&format!("rc_randomized_delta_pt_vs_dphi3_{}", label))
                .is_some());
        }
        assert!(sink.histogram_1d("rho_0-10").is_none());
    }

    #[test]
    fn without_qa() {
        let analysis = Analysis::new().fill_qa(false).build().unwrap();
        let task = RhoVnTask::initialize(&analysis, HistogramCollection::new()).unwrap();
        assert!(task.sink().get(QA_RUN_PHI).is_none());
        assert!(task.sink().get(SUMMARY).is_some());
    }

    #[test]
    fn invalid_configuration() {
        let mut analysis = analysis(FitModulationType::V2, DetectorType::Tpc);
        analysis.set_silent(true);
        assert!(RhoVnTask::initialize(&analysis, HistogramCollection::new()).is_ok());

        let analysis: Result<Analysis, _> = serde_yaml::from_str("jet_radius: -0.2");
        let analysis = analysis.unwrap();
        assert!(RhoVnTask::initialize(&analysis, HistogramCollection::new()).is_err());
    }

    #[test]
    fn skipped_event() {
        let mut task = task(FitModulationType::V2, DetectorType::Tpc);
        let event = event(1, 100, 0.0, 0.0).with_vertex(Vertex::new(15.0, None));

        assert_eq!(
            task.process_event(&event),
            Err(EventError::VertexOutOfRange(15.0))
        );
        assert_eq!(task.n_processed(), 1);
        assert_eq!(task.n_selected(), 0);

        let sink = task.finalize();
        let rejections = sink.histogram_1d(EVENT_REJECTIONS).unwrap();
        assert_relative_eq!(rejections.content(3), 1.0);
        assert_relative_eq!(rejections.integral(), 1.0);
        let summary = sink.histogram_1d(SUMMARY).unwrap();
        assert_relative_eq!(summary.content(0), 1.0);
        assert_relative_eq!(summary.content(1), 0.0);
    }

    #[test]
    fn accepted_event() {
        let mut task = task(FitModulationType::V2, DetectorType::Tpc);
        let event = event(2, 3000, 0.1, 0.5);
        let fit = task.process_event(&event).unwrap();

        assert!(fit.is_accepted(), "{:?}", fit.reject_reason());
        assert_eq!(task.n_accepted(), 1);

        let sink = task.finalize();
        let summary = sink.histogram_1d(SUMMARY).unwrap();
        assert_eq!(summary.contents(), &[1.0, 1.0, 1.0, 0.0, 0.0]);

        let v2 = sink.profile(V2_PROFILE).unwrap();
        assert_relative_eq!(v2.mean(5).unwrap(), fit.model().v2());
        // v3 is not fitted in this mode
        assert_eq!(sink.profile(V3_PROFILE).unwrap().entries(), 0);

        // all eight resolution bins are defined
        let resolution = sink.profile("resolution_psi2_0-20").unwrap();
        assert!(resolution.counts().iter().all(|&c| c == 1));
        assert!(sink.histogram_1d("fit_quality_0-20").unwrap().integral() > 0.0);

        // accepted tracks enter the momentum spectrum
        assert_relative_eq!(sink.histogram_1d("track_pt_0-20").unwrap().integral(), 3000.0);
        // jet at η = 0.8 does not pass the jet acceptance
        assert_relative_eq!(sink.histogram_1d("jet_pt_raw_0-20").unwrap().integral(), 2.0);
        assert_relative_eq!(sink.histogram_1d("rho_0-20").unwrap().content(40), 1.0);

        let et = sink.histogram_1d("et_charged_0-20").unwrap();
        assert_eq!(et.entries(), 1);
        assert!(sink.histogram_2d(ET_ETA_PT).unwrap().integral() > 0.0);

        let qa = sink.histogram_2d(QA_RUN_PHI).unwrap();
        assert_relative_eq!(qa.contents()[0].iter().sum::<f64>(), 3000.0);
        for category in 0..TRACK_CATEGORIES {
            assert_relative_eq!(
                sink.histogram_2d(&qa_category(category)).unwrap().integral(),
                1000.0
            );
        }

        let control = sink.profile(EP_CONTROL).unwrap();
        assert!(control.counts().iter().all(|&c| c == 1));
    }

    #[test]
    fn rejected_fit_publishes_nothing() {
        let mut task = task(FitModulationType::V2, DetectorType::Tpc);
        let event = event(3, 50, 0.0, 0.0).with_tracks(vec![]);
        let fit = task.process_event(&event).unwrap();

        assert_eq!(fit.reject_reason(), Some(RejectReason::NoEntries));
        let sink = task.finalize();
        assert_eq!(sink.profile(V2_PROFILE).unwrap().entries(), 0);
        assert_eq!(
            sink.profile("resolution_psi2_0-20").unwrap().entries(),
            0
        );
        assert_relative_eq!(sink.histogram_1d(FIT_REJECTIONS).unwrap().content(0), 1.0);
        assert_relative_eq!(sink.histogram_1d(SUMMARY).unwrap().content(3), 1.0);
        // rho is still filled for selected events
        assert_relative_eq!(sink.histogram_1d("rho_0-20").unwrap().integral(), 1.0);
    }

    #[test]
    fn flat_mode_does_not_publish() {
        let mut task = task(FitModulationType::Flat, DetectorType::Tpc);
        for seed in 0..10 {
            let fit = task.process_event(&event(seed, 1000, 0.0, 0.0)).unwrap();
            // normalization is fixed to the event rho
            assert_relative_eq!(fit.model().normalization(), 80.0);
            assert_relative_eq!(fit.model().v2(), 0.0);
            assert_relative_eq!(fit.model().v3(), 0.0);
            assert!(fit.quality().is_some());
        }

        let sink = task.finalize();
        assert_eq!(sink.profile(V2_PROFILE).unwrap().entries(), 0);
        assert_eq!(sink.profile(V3_PROFILE).unwrap().entries(), 0);
    }

    #[test]
    fn single_harmonic_modes_publish_only_fitted_harmonic() {
        for (mode, v2, fitted, unfitted) in [
            (FitModulationType::V2, 0.1, V2_PROFILE, V3_PROFILE),
            (FitModulationType::V3, 0.0, V3_PROFILE, V2_PROFILE),
        ] {
            let mut task = task(mode, DetectorType::Tpc);
            let mut accepted = 0;
            for seed in 0..10 {
                if task.process_event(&event(seed, 3000, v2, 0.7)).unwrap().is_accepted() {
                    accepted += 1;
                }
            }

            assert!(accepted > 0);
            let sink = task.finalize();
            assert_eq!(sink.profile(fitted).unwrap().entries(), accepted);
            assert_eq!(sink.profile(unfitted).unwrap().entries(), 0);
        }
    }

    #[test]
    fn combined_mode_publishes_both_harmonics() {
        let mut task = task(FitModulationType::Combined, DetectorType::Tpc);
        let mut accepted = 0;
        for seed in 0..10 {
            if task.process_event(&event(seed, 3000, 0.1, 0.7)).unwrap().is_accepted() {
                accepted += 1;
            }
        }

        assert!(accepted > 0);
        let sink = task.finalize();
        assert_eq!(sink.profile(V2_PROFILE).unwrap().entries(), accepted);
        assert_eq!(sink.profile(V3_PROFILE).unwrap().entries(), accepted);
    }

    #[test]
    fn subevent_detector() {
        let mut task = task(FitModulationType::Combined, DetectorType::TpcSub);
        let fit = task.process_event(&event(4, 4000, 0.1, 1.0)).unwrap();

        if fit.is_accepted() {
            assert!(fit.side_models().is_some());
        } else {
            assert!(fit.side_models().is_none());
        }
    }

    #[test]
    fn vzero_detector_without_vzero() {
        let mut task = task(FitModulationType::V2, DetectorType::VzeroA);
        let event = Event::new(1)
            .with_vertex(Vertex::new(0.0, None))
            .with_centrality(Centrality::new(30.0, 30.0))
            .with_rho(40.0)
            .with_tracks(event(5, 500, 0.0, 0.0).tracks().clone());

        let fit = task.process_event(&event).unwrap();
        assert_eq!(fit.reject_reason(), Some(RejectReason::UndefinedPlane(2)));
        assert_relative_eq!(fit.model().normalization(), 40.0);
    }

    #[test]
    fn random_cones_filled() {
        let mut task = task(FitModulationType::V2, DetectorType::Tpc);
        task.process_event(&event(6, 5000, 0.05, 0.0)).unwrap();
        let sink = task.finalize();

        // 5 cones per variant; a dense event never leaves a cone empty
        for prefix in ["rc", "rc_excluding_leading", "rc_randomized"] {
            let pt = sink.histogram_1d(&format!("{}_pt_0-20", prefix)).unwrap();
            assert_eq!(pt.entries(), 5);
        }
    }

    #[test]
    fn finalize_summary() {
        let mut task = task(FitModulationType::Combined, DetectorType::Tpc);
        for seed in 0..5 {
            let _ = task.process_event(&event(10 + seed, 2000, 0.08, 0.3));
        }

        assert_eq!(task.n_processed(), 5);
        assert_eq!(task.n_selected(), 5);
        let accepted = task.n_accepted();
        let sink = task.finalize();
        assert_relative_eq!(
            sink.histogram_1d(SUMMARY).unwrap().content(2),
            accepted as f64
        );
    }
}
