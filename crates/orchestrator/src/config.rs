//! Configuration lookup and validation for initial-state setups
//!
//! Input files are JSON objects of sections, each mapping a key to a list of
//! values. A scalar is shorthand for a one-element list:
//!
//! ```json
//! {
//!   "Setup":     { "mass": 0.5, "seeding": "per_cell_lattice" },
//!   "Particles": { "count": ["per_cell", 2] }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use kernel::DomainDescriptor;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SetupError, SetupResult};
use crate::seeding::{
    per_cell_slots, RandomBounds, SeedingStrategy, DEFAULT_CULL_PROBABILITY,
    DEFAULT_MARGIN_FRACTION, DEFAULT_VELOCITY_AMPLITUDE,
};

/// Sectioned key/value input with typed, index-addressed lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Input {
    sections: BTreeMap<String, BTreeMap<String, Vec<Value>>>,
}

impl Input {
    /// Create an empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an input from a JSON file
    pub fn load(path: impl AsRef<Path>) -> SetupResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        tracing::debug!("Read input file {}", path.display());
        Self::from_json_str(&contents)
    }

    /// Parse an input from JSON text.
    pub fn from_json_str(contents: &str) -> SetupResult<Self> {
        let raw: BTreeMap<String, BTreeMap<String, Value>> = serde_json::from_str(contents)?;

        let sections = raw
            .into_iter()
            .map(|(section, keys)| {
                let keys = keys
                    .into_iter()
                    .map(|(key, value)| match value {
                        Value::Array(values) => (key, values),
                        scalar => (key, vec![scalar]),
                    })
                    .collect();
                (section, keys)
            })
            .collect();

        Ok(Self { sections })
    }

    /// Replace the values stored under `[section] key`.
    pub fn set(&mut self, section: &str, key: &str, values: Vec<Value>) -> &mut Self {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), values);
        self
    }

    /// Whether `[section] key` exists.
    pub fn has(&self, section: &str, key: &str) -> bool {
        self.sections
            .get(section)
            .is_some_and(|keys| keys.contains_key(key))
    }

    fn value(&self, section: &str, key: &str, index: usize) -> Option<&Value> {
        self.sections.get(section)?.get(key)?.get(index)
    }

    fn parse<T: DeserializeOwned>(
        section: &str,
        key: &str,
        index: usize,
        value: &Value,
    ) -> SetupResult<T> {
        serde_json::from_value(value.clone()).map_err(|e| SetupError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            index,
            reason: e.to_string(),
        })
    }

    /// Read entry `index` of `[section] key` as `T`; absence is an error.
    pub fn get<T: DeserializeOwned>(&self, section: &str, key: &str, index: usize) -> SetupResult<T> {
        let value = self
            .value(section, key, index)
            .ok_or_else(|| SetupError::MissingKey {
                section: section.to_string(),
                key: key.to_string(),
                index,
            })?;
        Self::parse(section, key, index, value)
    }

    /// Read entry `index` of `[section] key` as `T`, falling back to `default` when absent.
    ///
    /// A present value of the wrong type is still an error.
    pub fn get_or<T: DeserializeOwned>(
        &self,
        section: &str,
        key: &str,
        index: usize,
        default: T,
    ) -> SetupResult<T> {
        match self.value(section, key, index) {
            Some(value) => Self::parse(section, key, index, value),
            None => Ok(default),
        }
    }
}

/// How the engine sizes the initial particle population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleCount {
    /// `N` particles per interior cell
    PerCell(usize),
    /// `N` particles in the local domain
    Total(usize),
}

impl ParticleCount {
    /// Read `[Particles] count`; absent means no particles.
    pub fn from_input(input: &Input) -> SetupResult<Self> {
        if !input.has("Particles", "count") {
            return Ok(ParticleCount::Total(0));
        }

        let mode: String = input.get("Particles", "count", 0)?;
        let n: usize = input.get("Particles", "count", 1)?;
        match mode.as_str() {
            "per_cell" => Ok(ParticleCount::PerCell(n)),
            "total" => Ok(ParticleCount::Total(n)),
            other => Err(SetupError::Config(format!(
                "unknown particle count mode '{}', expected 'per_cell' or 'total'",
                other
            ))),
        }
    }

    /// Particle slots to allocate for `domain`.
    ///
    /// A per-cell count whose product with the interior cell count does not
    /// fit in `usize` is a configuration error.
    pub fn capacity(&self, domain: &DomainDescriptor) -> SetupResult<usize> {
        match *self {
            ParticleCount::PerCell(n) => per_cell_slots(n, domain),
            ParticleCount::Total(n) => Ok(n),
        }
    }

    /// Per-cell count, if this is per-cell mode.
    pub fn per_cell(&self) -> Option<usize> {
        match *self {
            ParticleCount::PerCell(n) => Some(n),
            ParticleCount::Total(_) => None,
        }
    }
}

/// Everything a setup reads from its input, resolved once at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupConfig {
    /// Mass given to every seeded particle
    pub particle_mass: f32,
    /// Particle-count mode
    pub count: ParticleCount,
    /// Seeding strategy and its parameters
    pub seeding: SeedingStrategy,
    /// Random seed; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            particle_mass: 0.0,
            count: ParticleCount::Total(0),
            seeding: SeedingStrategy::UniformRandom {
                velocity_amplitude: DEFAULT_VELOCITY_AMPLITUDE,
            },
            seed: None,
        }
    }
}

impl SetupConfig {
    /// Load and validate a configuration from a JSON input file
    pub fn load(path: impl AsRef<Path>) -> SetupResult<Self> {
        let input = Input::load(path)?;
        Self::from_input(&input)
    }

    /// Resolve and validate a configuration from an input.
    pub fn from_input(input: &Input) -> SetupResult<Self> {
        let config = Self {
            particle_mass: input.get_or("Setup", "mass", 0, 0.0)?,
            count: ParticleCount::from_input(input)?,
            seeding: seeding_from_input(input)?,
            seed: input.get_or("Setup", "seed", 0, None)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> SetupResult<()> {
        if !self.particle_mass.is_finite() || self.particle_mass < 0.0 {
            return Err(SetupError::Config(format!(
                "particle mass must be finite and non-negative, got {}",
                self.particle_mass
            )));
        }

        match self.seeding {
            SeedingStrategy::UniformRandom { velocity_amplitude } => {
                if !velocity_amplitude.is_finite() || velocity_amplitude < 0.0 {
                    return Err(SetupError::Config(format!(
                        "velocity amplitude must be finite and non-negative, got {}",
                        velocity_amplitude
                    )));
                }
            }
            SeedingStrategy::PerCellLattice => {
                if self.count.per_cell().is_none() {
                    return Err(SetupError::Config(
                        "this setup requires initial particle count to use 'per_cell' mode"
                            .to_string(),
                    ));
                }
            }
            SeedingStrategy::CornerCluster { margin_fraction } => {
                if !(0.0..0.5).contains(&margin_fraction) {
                    return Err(SetupError::Config(format!(
                        "corner margin must be in [0, 0.5), got {}",
                        margin_fraction
                    )));
                }
            }
            SeedingStrategy::RandomizedCulled { cull_probability, .. } => {
                if !(0.0..=1.0).contains(&cull_probability) {
                    return Err(SetupError::Config(format!(
                        "cull probability must be in [0, 1], got {}",
                        cull_probability
                    )));
                }
            }
            SeedingStrategy::FieldOnly => {}
        }

        Ok(())
    }
}

fn seeding_from_input(input: &Input) -> SetupResult<SeedingStrategy> {
    let name: String = input.get_or("Setup", "seeding", 0, "uniform_random".to_string())?;

    let strategy = match name.as_str() {
        "uniform_random" => SeedingStrategy::UniformRandom {
            velocity_amplitude: input.get_or(
                "Setup",
                "velocity_amplitude",
                0,
                DEFAULT_VELOCITY_AMPLITUDE,
            )?,
        },
        "per_cell_lattice" => SeedingStrategy::PerCellLattice,
        "corner_cluster" => SeedingStrategy::CornerCluster {
            margin_fraction: input.get_or("Setup", "margin", 0, DEFAULT_MARGIN_FRACTION)?,
        },
        "randomized_culled" => {
            let bounds: String = input.get_or("Setup", "random_bounds", 0, "shared_k".to_string())?;
            let bounds = match bounds.as_str() {
                "shared_k" => RandomBounds::SharedKAxis,
                "per_axis" => RandomBounds::PerAxis,
                other => {
                    return Err(SetupError::Config(format!(
                        "unknown random bounds '{}', expected 'shared_k' or 'per_axis'",
                        other
                    )))
                }
            };
            SeedingStrategy::RandomizedCulled {
                cull_probability: input.get_or(
                    "Setup",
                    "cull_probability",
                    0,
                    DEFAULT_CULL_PROBABILITY,
                )?,
                bounds,
            }
        }
        "field_only" => SeedingStrategy::FieldOnly,
        other => {
            return Err(SetupError::Config(format!("unknown seeding strategy '{}'", other)));
        }
    };

    Ok(strategy)
}
