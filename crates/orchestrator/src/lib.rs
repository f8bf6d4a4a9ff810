//! Initial-state construction
//!
//! This crate turns a setup configuration and a local domain descriptor into
//! a committed field + particle state, including:
//! - Typed, sectioned input lookup with defaults
//! - Particle seeding strategies and their culling rules
//! - The `InitialStateBuilder` that fills, seeds and commits
//! - Regular partitioning of a global domain for multi-partition runs

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod partition;
pub mod seeding;
pub mod setup;

pub use config::{Input, ParticleCount, SetupConfig};
pub use error::{SetupError, SetupResult};
pub use partition::{split_domain, ProcessGrid};
pub use seeding::{CullRule, RandomBounds, SeedReport, SeedingStrategy};
pub use setup::{AnalysisHook, InitialStateBuilder, NoAnalysis};

use kernel::{DomainDescriptor, ExecutionBackend, FieldState, ParticleArrays};
use std::path::Path;

/// Field and particle arrays after a successful setup.
#[derive(Debug, Clone)]
pub struct InitialState {
    /// Initialized field
    pub field: FieldState,
    /// Seeded particles
    pub particles: ParticleArrays,
    /// What the seeding pass did
    pub report: SeedReport,
}

/// Build and commit the initial state for one local domain from an input.
///
/// This function performs the full setup pipeline:
/// 1. Resolve and validate the configuration
/// 2. Allocate the field over the ghost-inclusive cell range
/// 3. Allocate particle slots from the particle-count mode
/// 4. Initialize the field, seed the particles and commit both
/// 5. Run the analysis hook
pub fn build_initial_state(
    input: &Input,
    domain: &DomainDescriptor,
    backend: &mut dyn ExecutionBackend,
    hook: &mut dyn AnalysisHook,
) -> SetupResult<InitialState> {
    let mut builder = InitialStateBuilder::from_input(input)?;

    let mut field = FieldState::new(domain.np_tot);
    let capacity = builder.config().count.capacity(domain)?;
    let mut particles = ParticleArrays::new(capacity);
    tracing::debug!(
        "Allocated {} cells and {} particle slots",
        field.len(),
        particles.capacity()
    );

    let report =
        builder.init_flow_with_analysis(domain, &mut field, &mut particles, backend, hook)?;

    Ok(InitialState {
        field,
        particles,
        report,
    })
}

/// Build and commit the initial state from a JSON input file
///
/// # Example
/// ```no_run
/// use kernel::{DomainDescriptor, HostBackend};
/// use orchestrator::create_initial_state;
///
/// let domain = DomainDescriptor::uniform([0.0; 3], [1.0; 3], [16, 16, 16], [2, 2, 2]);
/// let mut backend = HostBackend::new();
/// let state = create_initial_state("configs/max_frag.json", &domain, &mut backend)?;
/// println!("{} active particles", state.particles.count_active());
/// # Ok::<(), orchestrator::SetupError>(())
/// ```
pub fn create_initial_state(
    config_path: impl AsRef<Path>,
    domain: &DomainDescriptor,
    backend: &mut dyn ExecutionBackend,
) -> SetupResult<InitialState> {
    let config_path = config_path.as_ref();
    tracing::info!("Creating initial state from config: {}", config_path.display());

    let input = Input::load(config_path)?;
    build_initial_state(&input, domain, backend, &mut NoAnalysis)
}
