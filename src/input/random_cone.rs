// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Contains the implementation of the `RandomCone` structure and its methods.

use getset::CopyGetters;
use serde::Deserialize;

use crate::errors::ConfigError;

/// Default radius of the random cones.
const DEFAULT_RADIUS: f64 = 0.4;
/// Default number of random cones sampled per event and variant.
const DEFAULT_N_CONES: usize = 20;

/// Parameters of the random cone sampling.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandomCone {
    /// Radius of the cones.
    #[serde(default = "default_radius")]
    #[getset(get_copy = "pub")]
    radius: f64,
    /// Minimal distance between a cone and the leading jet.
    /// If not provided, half of the jet radius is used.
    #[serde(default, alias = "min_distance_to_leading_jet")]
    #[getset(get_copy = "pub")]
    min_distance: Option<f64>,
    /// Number of cones drawn per event for each variant.
    #[serde(default = "default_n_cones")]
    #[getset(get_copy = "pub")]
    n_cones: usize,
    /// Seed of the random number generator.
    /// If not provided, the generator is seeded from the operating system.
    #[serde(default)]
    #[getset(get_copy = "pub")]
    seed: Option<u64>,
}

impl Default for RandomCone {
    fn default() -> Self {
        RandomCone {
            radius: DEFAULT_RADIUS,
            min_distance: None,
            n_cones: DEFAULT_N_CONES,
            seed: None,
        }
    }
}

fn default_radius() -> f64 {
    DEFAULT_RADIUS
}

fn default_n_cones() -> usize {
    DEFAULT_N_CONES
}

impl RandomCone {
    /// Specify parameters of the random cones.
    /// If any of them is `None`, the default value is used.
    pub fn new(
        radius: Option<f64>,
        min_distance: Option<f64>,
        n_cones: Option<usize>,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let cone = RandomCone {
            radius: radius.unwrap_or(DEFAULT_RADIUS),
            min_distance,
            n_cones: n_cones.unwrap_or(DEFAULT_N_CONES),
            seed,
        };
        cone.validate()?;
        Ok(cone)
    }

    /// Minimal distance to the leading jet, falling back to half of the jet radius.
    #[inline]
    pub fn min_distance_or(&self, jet_radius: f64) -> f64 {
        match self.min_distance {
            Some(d) if d > 0.0 => d,
            _ => 0.5 * jet_radius,
        }
    }

    /// Area of a single cone.
    #[inline]
    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.radius <= 0.0 {
            return Err(ConfigError::NotPositive("random cone radius", self.radius));
        }
        if let Some(d) = self.min_distance {
            if d < 0.0 {
                return Err(ConfigError::Negative("minimal random cone distance", d));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn random_cone_default() {
        let cone = RandomCone::default();
        assert_relative_eq!(cone.radius(), 0.4);
        assert_eq!(cone.n_cones(), 20);
        assert!(cone.seed().is_none());
        assert_relative_eq!(cone.min_distance_or(0.4), 0.2);
        assert_relative_eq!(cone.area(), 0.16 * std::f64::consts::PI);
    }

    #[test]
    fn random_cone_new() {
        let cone = RandomCone::new(Some(0.2), Some(1.0), Some(5), Some(42)).unwrap();
        assert_relative_eq!(cone.radius(), 0.2);
        assert_relative_eq!(cone.min_distance_or(0.4), 1.0);
        assert_eq!(cone.n_cones(), 5);
        assert_eq!(cone.seed(), Some(42));

        assert!(RandomCone::new(Some(0.0), None, None, None).is_err());
        assert!(RandomCone::new(None, Some(-1.0), None, None).is_err());
    }

    #[test]
    fn random_cone_from_yaml() {
        let cone: RandomCone = serde_yaml::from_str("radius: 0.3\nseed: 7").unwrap();
        assert_relative_eq!(cone.radius(), 0.3);
        assert_eq!(cone.seed(), Some(7));
        assert_eq!(cone.n_cones(), 20);

        let cone: RandomCone =
            serde_yaml::from_str("min_distance_to_leading_jet: 0.8").unwrap();
        assert_eq!(cone.min_distance(), Some(0.8));

        assert!(serde_yaml::from_str::<RandomCone>("size: 0.4").is_err());
    }
}
