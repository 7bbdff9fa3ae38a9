// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Flow vectors and event planes of the TPC and VZERO detectors.

use std::f64::consts::{PI, TAU};

use getset::CopyGetters;

use crate::event::{Track, VZERO_CHANNELS};
use crate::input::TrackCuts;

use super::leading::LeadingJetExcluder;

/// Harmonics for which the event planes are estimated.
pub const HARMONICS: [usize; 2] = [2, 3];

/// Flow vectors shorter than this fraction of the summed weight do not define a plane.
const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Wrap an angle into [0, 2π).
#[inline]
pub fn wrap_angle(phi: f64) -> f64 {
    wrap_into(phi, TAU)
}

/// Wrap an event plane angle of harmonic `n` into [0, 2π/n).
#[inline]
pub fn wrap_event_plane(psi: f64, harmonic: usize) -> f64 {
    wrap_into(psi, TAU / harmonic as f64)
}

#[inline(always)]
fn wrap_into(value: f64, period: f64) -> f64 {
    let wrapped = value.rem_euclid(period);
    // rem_euclid may return `period` for tiny negative inputs
    if wrapped >= period {
        0.0
    } else {
        wrapped
    }
}

/// Weighted sum of unit vectors of angle `n·φ`.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
pub struct FlowVector {
    #[getset(get_copy = "pub")]
    harmonic: usize,
    #[getset(get_copy = "pub")]
    qx: f64,
    #[getset(get_copy = "pub")]
    qy: f64,
    /// Sum of the weights of all entries.
    #[getset(get_copy = "pub")]
    sum_weights: f64,
    #[getset(get_copy = "pub")]
    n_entries: usize,
}

impl FlowVector {
    /// Create an empty flow vector for the given harmonic.
    pub fn new(harmonic: usize) -> Self {
        FlowVector {
            harmonic,
            qx: 0.0,
            qy: 0.0,
            sum_weights: 0.0,
            n_entries: 0,
        }
    }

    /// Construct a flow vector from (angle, weight) pairs.
    pub fn from_angles(harmonic: usize, angles: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut q = FlowVector::new(harmonic);
        for (phi, weight) in angles {
            q.add(phi, weight);
        }
        q
    }

    #[inline]
    pub fn add(&mut self, phi: f64, weight: f64) {
        let n = self.harmonic as f64;
        self.qx += weight * (n * phi).cos();
        self.qy += weight * (n * phi).sin();
        self.sum_weights += weight;
        self.n_entries += 1;
    }

    #[inline(always)]
    pub fn magnitude(&self) -> f64 {
        self.qx.hypot(self.qy)
    }

    /// Does the flow vector point anywhere?
    pub fn is_defined(&self) -> bool {
        self.sum_weights > 0.0 && self.magnitude() >= RELATIVE_TOLERANCE * self.sum_weights
    }

    /// Event plane angle ψ = atan2(qy, qx) / n, wrapped into [0, 2π/n).
    pub fn event_plane(&self) -> EventPlane {
        let angle = if self.qx == 0.0 && self.qy == 0.0 {
            0.0
        } else {
            wrap_event_plane(self.qy.atan2(self.qx) / self.harmonic as f64, self.harmonic)
        };

        EventPlane {
            angle,
            harmonic: self.harmonic,
            defined: self.is_defined(),
        }
    }
}

/// Orientation of the n-th harmonic anisotropy.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
pub struct EventPlane {
    #[getset(get_copy = "pub")]
    angle: f64,
    #[getset(get_copy = "pub")]
    harmonic: usize,
    defined: bool,
}

impl EventPlane {
    /// Event plane with a known orientation.
    pub fn new(angle: f64, harmonic: usize) -> Self {
        EventPlane {
            angle: wrap_event_plane(angle, harmonic),
            harmonic,
            defined: true,
        }
    }

    pub fn undefined(harmonic: usize) -> Self {
        EventPlane {
            angle: 0.0,
            harmonic,
            defined: false,
        }
    }

    #[inline(always)]
    pub fn is_defined(&self) -> bool {
        self.defined
    }

    /// Angle of the plane, if it is defined.
    #[inline(always)]
    pub fn defined_angle(&self) -> Option<f64> {
        self.defined.then_some(self.angle)
    }
}

/// Second and third harmonic event planes of a single detector (or sub-event).
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
pub struct Planes {
    #[getset(get_copy = "pub")]
    psi2: EventPlane,
    #[getset(get_copy = "pub")]
    psi3: EventPlane,
}

impl Planes {
    /// Estimate the planes from (angle, weight) pairs.
    pub fn from_angles(angles: &[(f64, f64)]) -> Self {
        Planes {
            psi2: FlowVector::from_angles(2, angles.iter().copied()).event_plane(),
            psi3: FlowVector::from_angles(3, angles.iter().copied()).event_plane(),
        }
    }

    pub fn new(psi2: EventPlane, psi3: EventPlane) -> Self {
        Planes { psi2, psi3 }
    }

    pub fn undefined() -> Self {
        Planes {
            psi2: EventPlane::undefined(2),
            psi3: EventPlane::undefined(3),
        }
    }

    /// Event plane of the given harmonic. Panics for harmonics other than 2 and 3.
    #[inline]
    pub fn get(&self, harmonic: usize) -> EventPlane {
        match harmonic {
            2 => self.psi2,
            3 => self.psi3,
            _ => panic!("FATAL RHOVN ERROR | Planes::get | Unsupported harmonic '{}'.", harmonic),
        }
    }
}

/// Event planes estimated from the TPC tracks.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
pub struct TpcPlanes {
    /// All tracks.
    #[getset(get_copy = "pub")]
    full: Planes,
    /// Tracks with η < 0.
    #[getset(get_copy = "pub")]
    sub_a: Planes,
    /// Tracks with η ≥ 0.
    #[getset(get_copy = "pub")]
    sub_b: Planes,
    /// Number of tracks used for the full planes.
    #[getset(get_copy = "pub")]
    n_tracks: usize,
}

/// Does the track enter the event plane and modulation estimation?
#[inline]
pub(crate) fn is_soft_track(
    track: &Track,
    cuts: &TrackCuts,
    pt_window: [f64; 2],
    excluder: &LeadingJetExcluder,
) -> bool {
    cuts.accepts(track)
        && track.pt() >= pt_window[0]
        && track.pt() <= pt_window[1]
        && !excluder.excludes(track.eta())
}

/// Weight of a track.
#[inline(always)]
pub(crate) fn track_weight(track: &Track, use_pt_weight: bool) -> f64 {
    if use_pt_weight {
        track.pt()
    } else {
        1.0
    }
}

impl TpcPlanes {
    /// Estimate the TPC event planes from accepted tracks in the momentum window
    /// that are not excluded by the leading jets.
    pub fn estimate(
        tracks: &[Track],
        cuts: &TrackCuts,
        pt_window: [f64; 2],
        use_pt_weight: bool,
        excluder: &LeadingJetExcluder,
    ) -> Self {
        let mut full = Vec::new();
        let mut sub_a = Vec::new();
        let mut sub_b = Vec::new();

        for track in tracks
            .iter()
            .filter(|t| is_soft_track(t, cuts, pt_window, excluder))
        {
            let entry = (track.phi(), track_weight(track, use_pt_weight));
            full.push(entry);
            if track.eta() < 0.0 {
                sub_a.push(entry);
            } else {
                sub_b.push(entry);
            }
        }

        TpcPlanes {
            full: Planes::from_angles(&full),
            sub_a: Planes::from_angles(&sub_a),
            sub_b: Planes::from_angles(&sub_b),
            n_tracks: full.len(),
        }
    }
}

/// Azimuthal angle of the center of a VZERO segment.
#[inline(always)]
pub fn vzero_segment_phi(segment: usize) -> f64 {
    PI / 4.0 * (0.5 + (segment % 8) as f64)
}

/// Event planes estimated from the VZERO segment multiplicities.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
pub struct VzeroPlanes {
    #[getset(get_copy = "pub")]
    side_a: Planes,
    #[getset(get_copy = "pub")]
    side_c: Planes,
}

impl VzeroPlanes {
    /// Estimate the planes. Segments 0-31 belong to side A, 32-63 to side C.
    /// Missing multiplicities produce undefined planes.
    pub fn estimate(multiplicities: Option<&[f64]>) -> Self {
        let Some(multiplicities) = multiplicities else {
            return VzeroPlanes {
                side_a: Planes::undefined(),
                side_c: Planes::undefined(),
            };
        };

        let half = VZERO_CHANNELS / 2;
        let angles: Vec<(f64, f64)> = multiplicities
            .iter()
            .take(VZERO_CHANNELS)
            .enumerate()
            .map(|(i, &m)| (vzero_segment_phi(i), m))
            .collect();

        VzeroPlanes {
            side_a: Planes::from_angles(&angles[..half.min(angles.len())]),
            side_c: Planes::from_angles(&angles[half.min(angles.len())..]),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::event::Jet;
    use crate::input::JetCuts;

    #[test]
    fn three_tracks() {
        let q = FlowVector::from_angles(2, [(0.0, 1.0), (PI / 2.0, 1.0), (PI, 1.0)]);
        assert_relative_eq!(q.qx(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(q.qy(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.sum_weights(), 3.0);
        assert_eq!(q.n_entries(), 3);

        let plane = q.event_plane();
        assert!(plane.is_defined());
        assert_relative_eq!(plane.angle(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn plane_range() {
        for harmonic in HARMONICS {
            for i in 0..100 {
                let phi = -10.0 + 0.37 * i as f64;
                let plane =
                    FlowVector::from_angles(harmonic, [(phi, 1.0), (phi + 0.1, 2.0)]).event_plane();
                assert!(plane.angle() >= 0.0);
                assert!(plane.angle() < TAU / harmonic as f64);
            }
        }
    }

    #[test]
    fn rotational_equivariance() {
        let angles = [(0.3, 1.0), (0.5, 2.0), (2.0, 0.5), (4.1, 1.5)];
        for harmonic in HARMONICS {
            let psi = FlowVector::from_angles(harmonic, angles).event_plane().angle();
            for delta in [0.1, 1.0, 2.5, 5.0] {
                let rotated = angles.map(|(phi, w)| (wrap_angle(phi + delta), w));
                let psi_rot = FlowVector::from_angles(harmonic, rotated)
                    .event_plane()
                    .angle();
                let n = harmonic as f64;
                let diff = n * (psi_rot - (psi + delta));
                assert_relative_eq!(diff.cos(), 1.0, epsilon = 1e-9);
                assert_relative_eq!(diff.sin(), 0.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn isotropic_is_undefined() {
        // four tracks at 90 degrees cancel for the second harmonic
        let angles = [(0.0, 1.0), (PI / 2.0, 1.0), (PI, 1.0), (3.0 * PI / 2.0, 1.0)];
        let q = FlowVector::from_angles(2, angles);
        assert!(q.magnitude() < 1e-9 * q.sum_weights());
        assert!(!q.event_plane().is_defined());
        assert!(q.event_plane().defined_angle().is_none());

        // six equidistant tracks cancel for the third harmonic
        let angles: Vec<_> = (0..6).map(|i| (i as f64 * TAU / 6.0, 1.0)).collect();
        assert!(!FlowVector::from_angles(3, angles).is_defined());
    }

    #[test]
    fn empty_is_undefined() {
        let q = FlowVector::new(3);
        let plane = q.event_plane();
        assert!(!plane.is_defined());
        assert_eq!(plane.angle(), 0.0);
    }

    #[test]
    fn wrapping() {
        assert_relative_eq!(wrap_angle(-0.5), TAU - 0.5);
        assert_relative_eq!(wrap_angle(TAU + 0.5), 0.5, epsilon = 1e-12);
        assert_eq!(wrap_angle(-1e-18), 0.0);
        assert_relative_eq!(wrap_event_plane(PI + 0.2, 2), 0.2, epsilon = 1e-12);
        assert_relative_eq!(wrap_event_plane(-0.1, 3), TAU / 3.0 - 0.1, epsilon = 1e-12);
    }

    #[test]
    fn tpc_planes_split() {
        let tracks = vec![
            Track::new(0.2, -0.5, 1.0, 1),
            Track::new(0.3, -0.2, 1.0, -1),
            Track::new(1.8, 0.4, 2.0, 1),
            Track::new(1.9, 0.7, 2.0, 1),
            // outside of the momentum window
            Track::new(3.0, 0.1, 10.0, 1),
            // rejected by the event source
            Track::new(3.0, 0.1, 1.0, 1).rejected(),
        ];

        let planes = TpcPlanes::estimate(
            &tracks,
            &TrackCuts::default(),
            [0.15, 5.0],
            true,
            &LeadingJetExcluder::disabled(),
        );

        assert_eq!(planes.n_tracks(), 4);
        let expected_a = FlowVector::from_angles(2, [(0.2, 1.0), (0.3, 1.0)]).event_plane();
        let expected_b = FlowVector::from_angles(2, [(1.8, 2.0), (1.9, 2.0)]).event_plane();
        assert_relative_eq!(planes.sub_a().psi2().angle(), expected_a.angle());
        assert_relative_eq!(planes.sub_b().psi2().angle(), expected_b.angle());
        assert!(planes.full().psi2().is_defined());
        assert!(planes.full().psi3().is_defined());
    }

    #[test]
    fn tpc_planes_with_exclusion() {
        let tracks = vec![
            Track::new(0.2, -0.5, 1.0, 1),
            Track::new(1.0, 0.0, 1.0, 1),
            Track::new(2.0, 0.05, 1.0, 1),
        ];
        let jets = vec![
            Jet::new(1.0, 0.0, 30.0, 0.5, 10),
            Jet::new(4.0, 0.1, 20.0, 0.5, 10),
        ];
        let excluder = LeadingJetExcluder::new(&jets, &JetCuts::default(), 0.4, 1.0);

        let planes =
            TpcPlanes::estimate(&tracks, &TrackCuts::default(), [0.15, 5.0], false, &excluder);
        assert_eq!(planes.n_tracks(), 1);
        assert!(!planes.sub_b().psi2().is_defined());
    }

    #[test]
    fn tpc_planes_unweighted() {
        let tracks = vec![Track::new(0.0, 0.1, 4.0, 1), Track::new(PI / 2.0, 0.1, 1.0, 1)];
        let planes = TpcPlanes::estimate(
            &tracks,
            &TrackCuts::default(),
            [0.15, 5.0],
            false,
            &LeadingJetExcluder::disabled(),
        );
        // equal weights at 90 degrees cancel for the second harmonic
        assert!(!planes.full().psi2().is_defined());
    }

    #[test]
    fn vzero_segments() {
        assert_relative_eq!(vzero_segment_phi(0), PI / 8.0);
        assert_relative_eq!(vzero_segment_phi(7), 7.5 * PI / 4.0);
        assert_relative_eq!(vzero_segment_phi(8), PI / 8.0);
        assert_relative_eq!(vzero_segment_phi(63), 7.5 * PI / 4.0);
    }

    #[test]
    fn vzero_planes() {
        let mut multiplicities = vec![1.0; VZERO_CHANNELS];
        // enhance segment at φ = π/8 on side A and at φ = 5π/8 on side C
        multiplicities[0] += 10.0;
        multiplicities[34] += 10.0;

        let planes = VzeroPlanes::estimate(Some(&multiplicities));
        assert_relative_eq!(planes.side_a().psi2().angle(), PI / 8.0, epsilon = 1e-9);
        assert_relative_eq!(planes.side_c().psi2().angle(), 5.0 * PI / 8.0, epsilon = 1e-9);
        assert_relative_eq!(planes.side_a().psi3().angle(), PI / 8.0, epsilon = 1e-9);
    }

    #[test]
    fn vzero_uniform_and_missing() {
        let planes = VzeroPlanes::estimate(Some(&[2.0; VZERO_CHANNELS]));
        assert!(!planes.side_a().psi2().is_defined());
        assert!(!planes.side_c().psi3().is_defined());

        let planes = VzeroPlanes::estimate(None);
        assert!(!planes.side_a().psi2().is_defined());
        assert!(!planes.side_c().psi2().is_defined());
    }
}
