// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Per-event azimuthal distribution of tracks.

use std::f64::consts::TAU;

use super::flow::wrap_angle;

/// Lower bound on the number of tracks used to derive the number of bins.
const MIN_REBIN_TRACKS: usize = 49;

/// Number of azimuthal bins for an event with `n_tracks` accepted tracks.
///
/// With `rebin_on_the_fly`, this is `ceil(sqrt(max(n_tracks, 49)))`, otherwise `fixed`.
pub fn number_of_bins(n_tracks: usize, rebin_on_the_fly: bool, fixed: usize) -> usize {
    if rebin_on_the_fly {
        (n_tracks.max(MIN_REBIN_TRACKS) as f64).sqrt().ceil() as usize
    } else {
        fixed.max(1)
    }
}

/// Histogram of track azimuths over [0, 2π).
#[derive(Debug, Clone, PartialEq)]
pub struct AzimuthalHistogram {
    contents: Vec<f64>,
    /// Number of entries with non-zero weight.
    n_entries: usize,
}

impl AzimuthalHistogram {
    /// Create an empty histogram. At least one bin is always created.
    pub fn new(n_bins: usize) -> Self {
        AzimuthalHistogram {
            contents: vec![0.0; n_bins.max(1)],
            n_entries: 0,
        }
    }

    #[inline]
    pub fn fill(&mut self, phi: f64, weight: f64) {
        let bin = ((wrap_angle(phi) / self.bin_width()) as usize).min(self.n_bins() - 1);
        self.contents[bin] += weight;
        if weight != 0.0 {
            self.n_entries += 1;
        }
    }

    #[inline(always)]
    pub fn n_bins(&self) -> usize {
        self.contents.len()
    }

    #[inline(always)]
    pub fn bin_width(&self) -> f64 {
        TAU / self.n_bins() as f64
    }

    #[inline(always)]
    pub fn bin_center(&self, bin: usize) -> f64 {
        (bin as f64 + 0.5) * self.bin_width()
    }

    #[inline(always)]
    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    /// Poisson error of the bin.
    #[inline(always)]
    pub fn error(&self, bin: usize) -> f64 {
        self.contents[bin].max(0.0).sqrt()
    }

    #[inline(always)]
    pub fn n_entries(&self) -> usize {
        self.n_entries
    }

    /// Sum of all bin contents.
    pub fn integral(&self) -> f64 {
        self.contents.iter().sum()
    }

    /// Bins with non-zero error as (center, content, error).
    pub fn points(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        (0..self.n_bins())
            .map(|bin| (self.bin_center(bin), self.contents[bin], self.error(bin)))
            .filter(|(_, _, error)| *error > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn bins_on_the_fly() {
        assert_eq!(number_of_bins(0, true, 20), 7);
        assert_eq!(number_of_bins(49, true, 20), 7);
        assert_eq!(number_of_bins(50, true, 20), 8);
        assert_eq!(number_of_bins(100, true, 20), 10);
        assert_eq!(number_of_bins(101, true, 20), 11);
        assert_eq!(number_of_bins(1000, false, 20), 20);
    }

    #[test]
    fn fill_and_errors() {
        let mut histogram = AzimuthalHistogram::new(4);
        histogram.fill(0.1, 2.0);
        histogram.fill(TAU - 0.1, 1.0);
        histogram.fill(-0.1, 1.0);
        histogram.fill(TAU, 3.0);
        histogram.fill(2.0, 0.0);

        assert_eq!(histogram.contents(), &[5.0, 0.0, 0.0, 2.0]);
        assert_eq!(histogram.n_entries(), 4);
        assert_relative_eq!(histogram.error(0), 5.0f64.sqrt());
        assert_relative_eq!(histogram.integral(), 7.0);
        assert_relative_eq!(histogram.bin_center(1), 3.0 * TAU / 8.0);

        let points: Vec<_> = histogram.points().collect();
        assert_eq!(points.len(), 2);
        assert_relative_eq!(points[1].0, 7.0 * TAU / 8.0);
        assert_relative_eq!(points[1].1, 2.0);
    }

    #[test]
    fn at_least_one_bin() {
        let mut histogram = AzimuthalHistogram::new(0);
        histogram.fill(3.0, 1.0);
        assert_eq!(histogram.n_bins(), 1);
        assert_eq!(histogram.contents(), &[1.0]);
    }
}
