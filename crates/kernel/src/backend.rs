//! Commit seam between host-side setup and the execution backend.
//!
//! Setup code fills [`FieldState`] and [`ParticleArrays`] on the host and then
//! hands both to an [`ExecutionBackend`]. A commit either takes the whole
//! state or nothing: a failed commit leaves whatever the backend held before.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::FieldState;
use crate::particle::ParticleArrays;

/// Reasons a backend refuses a commit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommitError {
    /// The field holds no cells.
    #[error("field array is empty")]
    EmptyField,
    /// A cell carries a density that is not strictly positive.
    #[error("non-positive density {value} at cell (k={k}, j={j}, i={i})")]
    NonPositiveDensity {
        /// Cell index along x3
        k: usize,
        /// Cell index along x2
        j: usize,
        /// Cell index along x1
        i: usize,
        /// Offending value
        value: f32,
    },
    /// The particle arrays are not parallel.
    #[error("particle channel lengths disagree: {0}")]
    RaggedParticles(String),
}

/// Anything that can take ownership of a freshly initialized state.
pub trait ExecutionBackend {
    /// Make `field` and `particles` visible to the downstream solver stage.
    fn commit(&mut self, field: &FieldState, particles: &ParticleArrays) -> Result<(), CommitError>;

    /// Short name used in log lines.
    fn name(&self) -> &str {
        "backend"
    }
}

/// Snapshot of a committed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedState {
    /// Field array as committed
    pub field: FieldState,
    /// Particle arrays as committed
    pub particles: ParticleArrays,
}

/// Reference in-process backend that validates and keeps a copy of the state.
#[derive(Debug, Default)]
pub struct HostBackend {
    committed: Option<CommittedState>,
    commit_count: u64,
}

impl HostBackend {
    /// Create a backend with nothing committed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently committed state, if any.
    pub fn committed(&self) -> Option<&CommittedState> {
        self.committed.as_ref()
    }

    /// Take the committed state out of the backend.
    pub fn take(&mut self) -> Option<CommittedState> {
        self.committed.take()
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> u64 {
        self.commit_count
    }
}

fn check_field(field: &FieldState) -> Result<(), CommitError> {
    if field.is_empty() {
        return Err(CommitError::EmptyField);
    }
    // `!(v > 0.0)` also catches NaN
    if let Some(idx) = field.rho.iter().position(|&v| !(v > 0.0)) {
        let (k, j, i) = field.unravel(idx);
        return Err(CommitError::NonPositiveDensity {
            k,
            j,
            i,
            value: field.rho[idx],
        });
    }
    Ok(())
}

fn check_particles(particles: &ParticleArrays) -> Result<(), CommitError> {
    let n = particles.x1.len();
    let lengths = [
        ("x2", particles.x2.len()),
        ("x3", particles.x3.len()),
        ("vx1", particles.vx1.len()),
        ("vx2", particles.vx2.len()),
        ("vx3", particles.vx3.len()),
        ("mass", particles.mass.len()),
        ("active", particles.active.len()),
    ];
    for (name, len) in lengths {
        if len != n {
            return Err(CommitError::RaggedParticles(format!(
                "x1 has {} slots, {} has {}",
                n, name, len
            )));
        }
    }
    Ok(())
}

impl ExecutionBackend for HostBackend {
    fn commit(&mut self, field: &FieldState, particles: &ParticleArrays) -> Result<(), CommitError> {
        check_field(field)?;
        check_particles(particles)?;

        self.committed = Some(CommittedState {
            field: field.clone(),
            particles: particles.clone(),
        });
        self.commit_count += 1;

        tracing::debug!(
            "Host commit #{}: {} cells, {} particle slots ({} active)",
            self.commit_count,
            field.len(),
            particles.len(),
            particles.count_active()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "host"
    }
}
