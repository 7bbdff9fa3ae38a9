// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Contains the implementation of the `CentralityClasses` structure.

use serde::Deserialize;

use crate::errors::ConfigError;

/// Half-open centrality bins `[lo, hi)` defined by strictly increasing edges.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<f64>")]
pub struct CentralityClasses {
    edges: Vec<f64>,
}

impl Default for CentralityClasses {
    fn default() -> Self {
        CentralityClasses {
            edges: vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0],
        }
    }
}

impl TryFrom<Vec<f64>> for CentralityClasses {
    type Error = ConfigError;

    fn try_from(edges: Vec<f64>) -> Result<Self, Self::Error> {
        CentralityClasses::new(edges)
    }
}

impl CentralityClasses {
    /// Construct centrality classes from the provided edges.
    pub fn new(edges: Vec<f64>) -> Result<Self, ConfigError> {
        if edges.len() < 2 {
            return Err(ConfigError::NotEnoughCentralityEdges(edges.len()));
        }

        for pair in edges.windows(2) {
            if !(pair[0] < pair[1]) {
                return Err(ConfigError::CentralityEdgesNotIncreasing(pair[0], pair[1]));
            }
        }

        Ok(CentralityClasses { edges })
    }

    /// Number of centrality classes.
    #[inline(always)]
    pub fn n_classes(&self) -> usize {
        self.edges.len() - 1
    }

    #[inline(always)]
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Index of the class the centrality belongs to.
    pub fn find(&self, centrality: f64) -> Option<usize> {
        self.edges
            .windows(2)
            .position(|pair| centrality >= pair[0] && centrality < pair[1])
    }

    /// Lower and upper edge of the class.
    pub fn bounds(&self, class: usize) -> (f64, f64) {
        (self.edges[class], self.edges[class + 1])
    }

    /// Label of the class, e.g. "20-40".
    pub fn label(&self, class: usize) -> String {
        let (lo, hi) = self.bounds(class);
        format!("{}-{}", lo, hi)
    }
}
