// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Transverse energy of hadrons as it would be measured by a calorimeter.

use getset::CopyGetters;

use crate::errors::EtError;

/// Mass of charged pions (GeV/c²).
pub const PION_MASS: f64 = 0.13957;
/// Mass of charged kaons (GeV/c²).
pub const KAON_MASS: f64 = 0.493677;
/// Mass of electrons (GeV/c²).
pub const ELECTRON_MASS: f64 = 0.000511;
/// Mass of protons (GeV/c²).
pub const PROTON_MASS: f64 = 0.938272;
/// Mass of neutrons (GeV/c²).
pub const NEUTRON_MASS: f64 = 0.939565;

/// Edges of the pseudorapidity axis of the transverse energy histograms.
pub const ETA_AXIS: [f64; 17] = [
    -0.78, -0.7, -0.58, -0.46, -0.34, -0.22, -0.12, -0.06, 0.0, 0.06, 0.12, 0.22, 0.34, 0.46, 0.58,
    0.7, 0.78,
];

/// Edges of the transverse momentum axis of the transverse energy histograms (GeV/c).
pub const PT_AXIS: [f64; 112] = [
    0.0, 0.01, 0.02, 0.03, 0.04, 0.05, 0.06, 0.07, 0.08, 0.09, 0.1, 0.11, 0.12, 0.13, 0.14, 0.15,
    0.16, 0.17, 0.18, 0.19, 0.2, 0.22, 0.24, 0.26, 0.28, 0.3, 0.32, 0.34, 0.36, 0.38, 0.4, 0.42,
    0.44, 0.46, 0.48, 0.5, 0.52, 0.54, 0.56, 0.58, 0.6, 0.62, 0.64, 0.66, 0.68, 0.7, 0.72, 0.74,
    0.76, 0.78, 0.8, 0.82, 0.84, 0.86, 0.88, 0.9, 0.92, 0.94, 0.96, 0.98, 1.0, 1.05, 1.1, 1.15,
    1.2, 1.25, 1.3, 1.35, 1.4, 1.45, 1.5, 1.55, 1.6, 1.65, 1.7, 1.75, 1.8, 1.85, 1.9, 1.95, 2.0,
    2.2, 2.4, 2.6, 2.8, 3.0, 3.2, 3.4, 3.6, 3.8, 4.0, 4.2, 4.4, 4.6, 4.8, 5.0, 5.5, 6.0, 6.5, 7.0,
    7.5, 8.0, 8.5, 9.0, 9.5, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 25.0,
];

pub const PI_PLUS_CODE: i32 = 211;
pub const K_PLUS_CODE: i32 = 321;
pub const POSITRON_CODE: i32 = -11;
pub const PROTON_CODE: i32 = 2212;
pub const NEUTRON_CODE: i32 = 2112;

/// Particle species relevant for the transverse energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Species {
    Pion,
    Kaon,
    Electron,
    Proton,
    Neutron,
}

impl Species {
    /// Identify the species from a PDG code. Antiparticles map to the same species.
    pub fn from_pdg(code: i32) -> Result<Species, EtError> {
        match code.abs() {
            211 => Ok(Species::Pion),
            321 => Ok(Species::Kaon),
            11 => Ok(Species::Electron),
            2212 => Ok(Species::Proton),
            2112 => Ok(Species::Neutron),
            _ => Err(EtError::UnsupportedParticle(code)),
        }
    }

    pub fn mass(&self) -> f64 {
        match self {
            Species::Pion => PION_MASS,
            Species::Kaon => KAON_MASS,
            Species::Electron => ELECTRON_MASS,
            Species::Proton => PROTON_MASS,
            Species::Neutron => NEUTRON_MASS,
        }
    }
}

/// Polar angle corresponding to the pseudorapidity.
#[inline(always)]
pub fn theta_from_eta(eta: f64) -> f64 {
    2.0 * (-eta).exp().atan()
}

/// Transverse energy of a charged particle with momentum `p` and polar angle `theta`.
///
/// Protons deposit their kinetic energy only, antiprotons additionally
/// their annihilation energy.
pub fn transverse_energy(p: f64, theta: f64, pdg: i32, charge: i8) -> Result<f64, EtError> {
    let species = Species::from_pdg(pdg)?;
    let mass = species.mass();
    let energy = (p * p + mass * mass).sqrt();

    let et = match species {
        Species::Pion | Species::Kaon | Species::Electron => energy,
        Species::Proton => match charge {
            c if c < 0 => energy + mass,
            c if c > 0 => energy - mass,
            _ => return Err(EtError::NeutralProton),
        },
        Species::Neutron => return Err(EtError::UnsupportedParticle(pdg)),
    };

    Ok(et * theta.sin())
}

/// Generated particle with a known total energy.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Particle {
    pdg: i32,
    /// Total momentum (GeV/c).
    momentum: f64,
    /// Total energy (GeV).
    energy: f64,
    mass: f64,
    theta: f64,
}

impl Particle {
    pub fn new(pdg: i32, momentum: f64, mass: f64, theta: f64) -> Self {
        Particle {
            pdg,
            momentum,
            energy: (momentum * momentum + mass * mass).sqrt(),
            mass,
            theta,
        }
    }

    /// Transverse energy of the particle.
    ///
    /// With a positive `mass_hypothesis`, the energy is recalculated using that mass.
    /// Otherwise nucleons contribute `E - m`, antinucleons `E + m` and all other particles `E`.
    pub fn transverse_energy(&self, mass_hypothesis: Option<f64>) -> f64 {
        if let Some(mass) = mass_hypothesis.filter(|m| *m > 0.0) {
            return (self.momentum * self.momentum + mass * mass).sqrt() * self.theta.sin();
        }

        let energy = match self.pdg {
            PROTON_CODE | NEUTRON_CODE => self.energy - self.mass,
            c if c == -PROTON_CODE || c == -NEUTRON_CODE => self.energy + self.mass,
            _ => self.energy,
        };

        energy * self.theta.sin()
    }
}

/// Per-event sums of the transverse energy.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct HadronicEt {
    /// Particles with |η| below this value are inside the acceptance.
    eta_acceptance: f64,
    total: f64,
    total_acceptance: f64,
    charged: f64,
    charged_acceptance: f64,
    neutral: f64,
    neutral_acceptance: f64,
    multiplicity: usize,
    charged_multiplicity: usize,
    neutral_multiplicity: usize,
}

impl Default for HadronicEt {
    fn default() -> Self {
        HadronicEt::new(ETA_AXIS[ETA_AXIS.len() - 1])
    }
}

impl HadronicEt {
    pub fn new(eta_acceptance: f64) -> Self {
        HadronicEt {
            eta_acceptance,
            total: 0.0,
            total_acceptance: 0.0,
            charged: 0.0,
            charged_acceptance: 0.0,
            neutral: 0.0,
            neutral_acceptance: 0.0,
            multiplicity: 0,
            charged_multiplicity: 0,
            neutral_multiplicity: 0,
        }
    }

    /// Add transverse energy of a charged particle.
    pub fn add_charged(&mut self, et: f64, eta: f64) {
        self.total += et;
        self.charged += et;
        self.multiplicity += 1;
        self.charged_multiplicity += 1;
        if eta.abs() < self.eta_acceptance {
            self.total_acceptance += et;
            self.charged_acceptance += et;
        }
    }

    /// Add transverse energy of a neutral particle.
    pub fn add_neutral(&mut self, et: f64, eta: f64) {
        self.total += et;
        self.neutral += et;
        self.multiplicity += 1;
        self.neutral_multiplicity += 1;
        if eta.abs() < self.eta_acceptance {
            self.total_acceptance += et;
            self.neutral_acceptance += et;
        }
    }

    /// Start a new event.
    pub fn reset(&mut self) {
        *self = HadronicEt::new(self.eta_acceptance);
    }
}
