//! Initial-state builder: field initialization, particle seeding and commit

use kernel::{
    DomainDescriptor, ExecutionBackend, FieldChannel, FieldState, ParticleArrays, IDIR, JDIR,
    KDIR,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{Input, SetupConfig};
use crate::error::{SetupError, SetupResult};
use crate::seeding::{seed_particles, SeedReport};

/// Reference density written to every cell.
pub const REFERENCE_DENSITY: f32 = 1.0;

/// Extension point run after a successful commit.
pub trait AnalysisHook {
    /// Inspect the freshly committed state.
    fn analyse(&mut self, field: &FieldState, particles: &ParticleArrays);
}

/// Hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnalysis;

impl AnalysisHook for NoAnalysis {
    fn analyse(&mut self, _field: &FieldState, _particles: &ParticleArrays) {}
}

/// Builds the combined field + particle state for one local domain.
///
/// Configuration is resolved and validated once, at construction. A builder
/// whose strategy cannot run with the configured particle-count mode is never
/// constructed, so no particle slot is touched on a configuration error.
pub struct InitialStateBuilder {
    config: SetupConfig,
    rng: StdRng,
}

impl InitialStateBuilder {
    /// Create a builder from a resolved configuration.
    pub fn new(config: SetupConfig) -> SetupResult<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        tracing::info!(
            "Setup: strategy={}, mass={}, count={:?}, seed={:?}",
            config.seeding.name(),
            config.particle_mass,
            config.count,
            config.seed
        );

        Ok(Self { config, rng })
    }

    /// Create a builder straight from an input.
    pub fn from_input(input: &Input) -> SetupResult<Self> {
        Self::new(SetupConfig::from_input(input)?)
    }

    /// Resolved configuration.
    pub fn config(&self) -> &SetupConfig {
        &self.config
    }

    /// Set unit density and zero velocity on every cell, ghosts included.
    pub fn init_field(&self, field: &mut FieldState) {
        let dims = field.dims();
        for k in 0..dims[KDIR] {
            for j in 0..dims[JDIR] {
                for i in 0..dims[IDIR] {
                    field.set(FieldChannel::Rho, k, j, i, REFERENCE_DENSITY);
                    field.set(FieldChannel::Vx1, k, j, i, 0.0);
                    field.set(FieldChannel::Vx2, k, j, i, 0.0);
                    field.set(FieldChannel::Vx3, k, j, i, 0.0);
                }
            }
        }
        tracing::debug!("Field initialized: {} cells ({:?})", field.len(), dims);
    }

    /// Run the configured seeding strategy over `particles`.
    pub fn seed_particles(
        &mut self,
        domain: &DomainDescriptor,
        particles: &mut ParticleArrays,
    ) -> SetupResult<SeedReport> {
        let report = seed_particles(
            &self.config.seeding,
            domain,
            particles,
            self.config.particle_mass,
            self.config.count.per_cell(),
            &mut self.rng,
        )?;

        tracing::info!(
            "Seeded {} particles with {} ({} deactivated, {} slots allocated)",
            report.seeded,
            self.config.seeding.name(),
            report.deactivated,
            particles.capacity()
        );
        Ok(report)
    }

    fn check_capacity(&self, domain: &DomainDescriptor, particles: &ParticleArrays) -> SetupResult<()> {
        let required = self
            .config
            .seeding
            .required_slots(domain, particles, self.config.count.per_cell())?;
        if required > particles.capacity() {
            return Err(SetupError::CapacityExceeded {
                required,
                capacity: particles.capacity(),
            });
        }
        Ok(())
    }

    /// Populate field and particles for a fresh run, then commit both.
    ///
    /// Capacity is checked before anything is written. Nothing reaches the
    /// backend unless every stage succeeds.
    pub fn init_flow(
        &mut self,
        domain: &DomainDescriptor,
        field: &mut FieldState,
        particles: &mut ParticleArrays,
        backend: &mut dyn ExecutionBackend,
    ) -> SetupResult<SeedReport> {
        if field.dims() != domain.np_tot {
            return Err(SetupError::Config(format!(
                "field dimensions {:?} do not match the domain's total cell counts {:?}",
                field.dims(),
                domain.np_tot
            )));
        }
        self.check_capacity(domain, particles)?;

        self.init_field(field);
        let report = self.seed_particles(domain, particles)?;

        backend.commit(field, particles)?;
        tracing::info!(
            "Committed initial state to {} backend: {} cells, {} active particles",
            backend.name(),
            field.len(),
            particles.count_active()
        );

        Ok(report)
    }

    /// [`InitialStateBuilder::init_flow`] followed by the analysis hook.
    pub fn init_flow_with_analysis(
        &mut self,
        domain: &DomainDescriptor,
        field: &mut FieldState,
        particles: &mut ParticleArrays,
        backend: &mut dyn ExecutionBackend,
        hook: &mut dyn AnalysisHook,
    ) -> SetupResult<SeedReport> {
        let report = self.init_flow(domain, field, particles, backend)?;
        hook.analyse(field, particles);
        Ok(report)
    }
}
