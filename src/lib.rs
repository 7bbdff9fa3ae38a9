// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! # rhovn: Azimuthal modulation of the jet background density
//!
//! Crate for estimating event planes from the TPC and VZERO detectors, fitting the
//! Fourier-harmonic modulation of the background transverse-momentum density (rho)
//! and correcting jets and random cones for it.
//!
//! ## Usage
//!
//! Run:
//!
//! ```bash
//! $ cargo add rhovn
//! ```
//!
//! Import the crate in your Rust code:
//!
//! ```rust
//! use rhovn::prelude::*;
//! ```
//!
//! `rhovn` is also available as a command line tool. You can install it using:
//! ```bash
//! $ cargo install rhovn
//! ```
//!
//! ## Examples
//!
//! Analysis of events stored in a yaml file.
//! ```no_run
//! use rhovn::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     // construct the analysis
//!     let analysis = Analysis::new()
//!             .events("events.yaml")                     // events to analyze
//!             .output("histograms.yaml")                 // output yaml file
//!             .fit_modulation(FitModulationType::Combined) // fit second and third harmonic
//!             .detector(DetectorType::VzeroC)            // event planes from VZERO-C
//!             .build()?;                                 // constructing the analysis
//!
//!     // activate colog if you want logging (requires the `colog` crate)
//!     colog::init();
//!
//!     // run the analysis and write the output
//!     analysis.run()?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ***
//!
//! Processing events one by one, with histograms collected by any `HistogramSink`.
//!
//! ```no_run
//! use rhovn::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let analysis = Analysis::new()
//!             .fit_modulation(FitModulationType::V2)
//!             .detector(DetectorType::TpcSub)            // sub-event planes from the TPC
//!             .exclude_leading_jets(1.0)                 // exclude |Δη| < R around the leading jets
//!             .quality_window([0.01, 0.99])              // accepted fit quality
//!             .random_cone(RandomCone::new(None, None, Some(10), Some(42))?)
//!             .build()?;
//!
//!     let mut task = RhoVnTask::initialize(&analysis, HistogramCollection::new())?;
//!     for event in Event::read_events("events.yaml")? {
//!         match task.process_event(&event) {
//!             Ok(fit) if fit.is_accepted() => println!("v2 = {}", fit.model().v2()),
//!             Ok(_) => println!("modulation fit rejected"),
//!             Err(e) => println!("event skipped: {}", e),
//!         }
//!     }
//!
//!     let histograms = task.finalize();
//!     histograms.write_yaml("histograms.yaml", false)?;
//!
//!     Ok(())
//! }
//! ```

/// Version of the `rhovn` crate.
pub const RHOVN_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod analysis;
pub mod errors;
pub mod et;
pub mod event;
pub mod input;
pub mod presentation;

/// This module contains re-exported public structures of the `rhovn` crate.
pub mod prelude {
    pub use super::input::{
        Analysis, AnalysisBuilder, CentralityClasses, DetectorType, EventCuts, FitModulationType,
        JetCuts, JetCutsBuilder, RandomCone, TrackCuts, TrackCutsBuilder,
    };

    pub use super::event::{Centrality, Event, Jet, Track, Vertex};

    pub use super::analysis::{
        flow::{EventPlane, FlowVector, Planes, TpcPlanes, VzeroPlanes},
        leading::{leading_jet, LeadingJetExcluder},
        modulation::{
            FitPlanes, FitResult, FitState, ModulationFitter, ModulationModel, RejectReason,
        },
        random_cone::{Cone, RandomConeSampler},
        resolution::resolution_terms,
        runs::run_index,
        selection::{select_event, SelectedEvent},
        task::RhoVnTask,
    };

    pub use super::et::{HadronicEt, Particle, Species};

    pub use super::presentation::{
        BinAxis, Histogram, Histogram1D, Histogram2D, HistogramCollection, HistogramSink, Profile,
    };
}
