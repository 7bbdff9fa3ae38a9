// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! In-memory histograms and profiles.

use getset::{CopyGetters, Getters};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Binning of a single histogram axis.
#[derive(Debug, Clone, PartialEq, Getters, Serialize)]
pub struct BinAxis {
    /// Edges of the bins. Always contains at least two strictly increasing values.
    #[getset(get = "pub")]
    edges: Vec<f64>,
    /// Optional names of the individual bins.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[getset(get = "pub")]
    labels: Option<Vec<String>>,
}

/// Position of a value with respect to an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinPosition {
    Underflow,
    Bin(usize),
    Overflow,
}

impl BinAxis {
    /// Axis with `n_bins` bins of equal width spanning `[min, max)`.
    ///
    /// ## Panics
    /// Panics if `n_bins` is zero or if `min` is not lower than `max`.
    pub fn uniform(n_bins: usize, min: f64, max: f64) -> Self {
        assert!(n_bins > 0, "FATAL RHOVN ERROR | BinAxis::uniform | Axis must have at least one bin.");
        assert!(min < max, "FATAL RHOVN ERROR | BinAxis::uniform | Invalid axis range [{}, {}).", min, max);

        let width = (max - min) / n_bins as f64;
        let mut edges: Vec<f64> = (0..n_bins).map(|i| min + i as f64 * width).collect();
        edges.push(max);

        BinAxis { edges, labels: None }
    }

    /// Axis with variable bin widths.
    ///
    /// ## Panics
    /// Panics if fewer than two edges are provided or if they are not strictly increasing.
    pub fn from_edges(edges: &[f64]) -> Self {
        assert!(
            edges.len() >= 2 && edges.windows(2).all(|w| w[0] < w[1]),
            "FATAL RHOVN ERROR | BinAxis::from_edges | Edges must be strictly increasing and there must be at least two of them."
        );

        BinAxis {
            edges: edges.to_vec(),
            labels: None,
        }
    }

    /// Axis with one named bin per label. Bin `i` spans `[i, i + 1)`.
    pub fn labeled<S: ToString>(labels: &[S]) -> Self {
        let mut axis = BinAxis::uniform(labels.len().max(1), 0.0, labels.len().max(1) as f64);
        axis.labels = Some(labels.iter().map(|l| l.to_string()).collect());
        axis
    }

    #[inline(always)]
    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    #[inline(always)]
    pub fn min(&self) -> f64 {
        self.edges[0]
    }

    #[inline(always)]
    pub fn max(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Center of the bin with the given index.
    #[inline]
    pub fn bin_center(&self, bin: usize) -> f64 {
        0.5 * (self.edges[bin] + self.edges[bin + 1])
    }

    /// Locate the value. Returns `None` for NaN.
    pub fn locate(&self, x: f64) -> Option<BinPosition> {
        if x.is_nan() {
            None
        } else if x < self.min() {
            Some(BinPosition::Underflow)
        } else if x >= self.max() {
            Some(BinPosition::Overflow)
        } else {
            // number of edges lower than or equal to x, minus one
            Some(BinPosition::Bin(
                self.edges.partition_point(|&edge| edge <= x) - 1,
            ))
        }
    }
}

/// One-dimensional histogram with the sum of squared weights.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters, Serialize)]
pub struct Histogram1D {
    #[getset(get = "pub")]
    axis: BinAxis,
    #[getset(get = "pub")]
    contents: Vec<f64>,
    #[getset(get = "pub")]
    sum_w2: Vec<f64>,
    #[getset(get_copy = "pub")]
    underflow: f64,
    #[getset(get_copy = "pub")]
    overflow: f64,
    /// Number of fill requests including under- and overflows.
    #[getset(get_copy = "pub")]
    entries: usize,
}

impl Histogram1D {
    pub fn new(axis: BinAxis) -> Self {
        let n_bins = axis.n_bins();
        Histogram1D {
            axis,
            contents: vec![0.0; n_bins],
            sum_w2: vec![0.0; n_bins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
        }
    }

    pub fn fill(&mut self, x: f64, weight: f64) {
        let Some(position) = self.axis.locate(x) else {
            return;
        };

        self.entries += 1;
        match position {
            BinPosition::Underflow => self.underflow += weight,
            BinPosition::Overflow => self.overflow += weight,
            BinPosition::Bin(bin) => {
                self.contents[bin] += weight;
                self.sum_w2[bin] += weight * weight;
            }
        }
    }

    /// Content of the bin with the given index.
    #[inline]
    pub fn content(&self, bin: usize) -> f64 {
        self.contents[bin]
    }

    /// Statistical uncertainty of the bin content.
    #[inline]
    pub fn error(&self, bin: usize) -> f64 {
        self.sum_w2[bin].sqrt()
    }

    /// Sum of all in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.contents.iter().sum()
    }
}

/// Two-dimensional histogram. Contents are stored row-wise, one row per x bin.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters, Serialize)]
pub struct Histogram2D {
    #[getset(get = "pub")]
    x_axis: BinAxis,
    #[getset(get = "pub")]
    y_axis: BinAxis,
    #[getset(get = "pub")]
    contents: Vec<Vec<f64>>,
    #[getset(get = "pub")]
    sum_w2: Vec<Vec<f64>>,
    /// Summed weight of fills outside of the range of at least one axis.
    #[getset(get_copy = "pub")]
    outside: f64,
    #[getset(get_copy = "pub")]
    entries: usize,
}

impl Histogram2D {
    pub fn new(x_axis: BinAxis, y_axis: BinAxis) -> Self {
        let row = vec![0.0; y_axis.n_bins()];
        let n_rows = x_axis.n_bins();
        Histogram2D {
            x_axis,
            y_axis,
            contents: vec![row.clone(); n_rows],
            sum_w2: vec![row; n_rows],
            outside: 0.0,
            entries: 0,
        }
    }

    pub fn fill(&mut self, x: f64, y: f64, weight: f64) {
        let (Some(px), Some(py)) = (self.x_axis.locate(x), self.y_axis.locate(y)) else {
            return;
        };

        self.entries += 1;
        match (px, py) {
            (BinPosition::Bin(i), BinPosition::Bin(j)) => {
                self.contents[i][j] += weight;
                self.sum_w2[i][j] += weight * weight;
            }
            _ => self.outside += weight,
        }
    }

    #[inline]
    pub fn content(&self, x_bin: usize, y_bin: usize) -> f64 {
        self.contents[x_bin][y_bin]
    }

    pub fn integral(&self) -> f64 {
        self.contents.iter().flatten().sum()
    }
}

/// Mean of y values in bins of x.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct Profile {
    #[getset(get = "pub")]
    axis: BinAxis,
    #[getset(get = "pub")]
    counts: Vec<usize>,
    sum_y: Vec<f64>,
    sum_y2: Vec<f64>,
    #[getset(get_copy = "pub")]
    entries: usize,
}

impl Profile {
    pub fn new(axis: BinAxis) -> Self {
        let n_bins = axis.n_bins();
        Profile {
            axis,
            counts: vec![0; n_bins],
            sum_y: vec![0.0; n_bins],
            sum_y2: vec![0.0; n_bins],
            entries: 0,
        }
    }

    /// Add a y value to the bin of x. Values outside of the axis only count as entries.
    pub fn fill(&mut self, x: f64, y: f64) {
        let Some(position) = self.axis.locate(x) else {
            return;
        };

        self.entries += 1;
        if let BinPosition::Bin(bin) = position {
            self.counts[bin] += 1;
            self.sum_y[bin] += y;
            self.sum_y2[bin] += y * y;
        }
    }

    /// Mean y value of the bin. `None` for empty bins.
    pub fn mean(&self, bin: usize) -> Option<f64> {
        match self.counts[bin] {
            0 => None,
            n => Some(self.sum_y[bin] / n as f64),
        }
    }

    /// Standard error of the mean y value of the bin. `None` for empty bins.
    pub fn error(&self, bin: usize) -> Option<f64> {
        let n = self.counts[bin] as f64;
        let mean = self.mean(bin)?;
        let variance = (self.sum_y2[bin] / n - mean * mean).max(0.0);
        Some((variance / n).sqrt())
    }
}

impl Serialize for Profile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let n_bins = self.axis.n_bins();
        let means: Vec<Option<f64>> = (0..n_bins).map(|b| self.mean(b)).collect();
        let errors: Vec<Option<f64>> = (0..n_bins).map(|b| self.error(b)).collect();

        let mut state = serializer.serialize_struct("Profile", 5)?;
        state.serialize_field("axis", &self.axis)?;
        state.serialize_field("counts", &self.counts)?;
        state.serialize_field("mean", &means)?;
        state.serialize_field("error", &errors)?;
        state.serialize_field("entries", &self.entries)?;
        state.end()
    }
}

/// Any histogram stored in the collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Histogram {
    #[serde(rename = "1d")]
    OneD(Histogram1D),
    #[serde(rename = "2d")]
    TwoD(Histogram2D),
    #[serde(rename = "profile")]
    Profile(Profile),
}
