// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! This module contains structures and methods for specifying parameters of the analysis.

pub mod analysis;
pub mod centrality;
pub mod cuts;
pub mod fit;
pub mod random_cone;

pub use analysis::{Analysis, AnalysisBuilder};
pub use centrality::CentralityClasses;
pub use cuts::{EventCuts, JetCuts, JetCutsBuilder, TrackCuts, TrackCutsBuilder};
pub use fit::{DetectorType, FitModulationType};
pub use random_cone::RandomCone;
