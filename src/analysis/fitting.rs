// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Weighted linear least squares and chi-square goodness of fit.

use nalgebra::{DMatrix, DVector, SVD};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Singular values smaller than this fraction of the largest one are treated as zero.
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Result of a linear least-squares fit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LinearFit {
    pub parameters: Vec<f64>,
    pub chi2: f64,
}

/// Find parameters `p` minimizing `Σ ((y - Σ_j p_j f_j(x)) / σ)²`.
///
/// `points` are (x, y, σ) triples with σ > 0, `basis` returns the values of
/// `f_j(x)` for all `n_parameters` basis functions.
/// Returns `None` if the system is degenerate or the solution is not finite.
pub(crate) fn linear_least_squares(
    points: &[(f64, f64, f64)],
    n_parameters: usize,
    basis: impl Fn(f64) -> Vec<f64>,
) -> Option<LinearFit> {
    if points.len() < n_parameters || n_parameters == 0 {
        return None;
    }

    let mut design = DMatrix::<f64>::zeros(points.len(), n_parameters);
    let mut rhs = DVector::<f64>::zeros(points.len());

    for (i, &(x, y, sigma)) in points.iter().enumerate() {
        let values = basis(x);
        for (j, value) in values.iter().take(n_parameters).enumerate() {
            design[(i, j)] = value / sigma;
        }
        rhs[i] = y / sigma;
    }

    let svd = SVD::new(design.clone(), true, true);
    let largest = svd.singular_values.max();
    if !(largest > 0.0) {
        return None;
    }

    // the system must have full rank
    if svd
        .singular_values
        .iter()
        .any(|&s| s <= SINGULAR_TOLERANCE * largest)
    {
        return None;
    }

    let solution = svd.solve(&rhs, SINGULAR_TOLERANCE * largest).ok()?;
    if solution.iter().any(|p| !p.is_finite()) {
        return None;
    }

    let residuals = design * &solution - rhs;
    let chi2 = residuals.norm_squared();

    Some(LinearFit {
        parameters: solution.iter().copied().collect(),
        chi2,
    })
}

/// Probability of obtaining a chi-square at least as large as `chi2`
/// for `ndf` degrees of freedom, i.e. `1 - CDF(chi2)`.
/// Returns `None` for non-positive `ndf`.
pub(crate) fn chi2_quality(chi2: f64, ndf: i64) -> Option<f64> {
    if ndf <= 0 {
        return None;
    }

    let distribution = ChiSquared::new(ndf as f64).ok()?;
    Some(distribution.sf(chi2.max(0.0)))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn straight_line() {
        let points: Vec<_> = (0..10)
            .map(|i| {
                let x = i as f64;
                (x, 2.0 + 0.5 * x, 1.0)
            })
            .collect();

        let fit = linear_least_squares(&points, 2, |x| vec![1.0, x]).unwrap();
        assert_relative_eq!(fit.parameters[0], 2.0, epsilon = 1e-10);
        assert_relative_eq!(fit.parameters[1], 0.5, epsilon = 1e-10);
        assert_relative_eq!(fit.chi2, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn weighted_mean() {
        // constant fit returns the inverse-variance weighted mean
        let points = [(0.0, 1.0, 1.0), (1.0, 3.0, 2.0)];
        let fit = linear_least_squares(&points, 1, |_| vec![1.0]).unwrap();
        let expected = (1.0 / 1.0 + 3.0 / 4.0) / (1.0 + 0.25);
        assert_relative_eq!(fit.parameters[0], expected, epsilon = 1e-12);
        let chi2 = (1.0 - expected).powi(2) + ((3.0 - expected) / 2.0).powi(2);
        assert_relative_eq!(fit.chi2, chi2, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_system() {
        let points = [(0.0, 1.0, 1.0), (1.0, 2.0, 1.0), (2.0, 3.0, 1.0)];
        // two identical basis functions
        assert!(linear_least_squares(&points, 2, |_| vec![1.0, 1.0]).is_none());
        // more parameters than points
        assert!(linear_least_squares(&points[..1], 2, |x| vec![1.0, x]).is_none());
    }

    #[test]
    fn quality() {
        assert!(chi2_quality(1.0, 0).is_none());
        assert_relative_eq!(chi2_quality(0.0, 3).unwrap(), 1.0);
        // median of chi-square with 2 degrees of freedom is 2 ln 2
        assert_relative_eq!(
            chi2_quality(2.0 * 2.0f64.ln(), 2).unwrap(),
            0.5,
            epsilon = 1e-9
        );
        assert!(chi2_quality(1000.0, 5).unwrap() < 1e-10);
    }
}
