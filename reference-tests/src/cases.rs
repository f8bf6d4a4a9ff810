//! The named reference cases, one per shipped configuration.

use std::path::Path;

use kernel::DomainDescriptor;

use crate::{
    ActiveFractionCheck, ExpectedResult, FieldCheck, MassCheck, PositionBoundsCheck,
    ReferenceTest,
};

/// Interior cells per axis of the reference domain
pub const CELLS: usize = 8;
/// Ghost cells per side of the reference domain
pub const GHOSTS: usize = 2;

/// Unit cube with `CELLS` interior cells and `GHOSTS` ghosts along every axis.
pub fn reference_domain() -> DomainDescriptor {
    DomainDescriptor::uniform([0.0; 3], [1.0; 3], [CELLS; 3], [GHOSTS; 3])
}

fn unit_bounds() -> Option<PositionBoundsCheck> {
    Some(PositionBoundsCheck {
        min: [0.0; 3],
        max: [1.0; 3],
    })
}

fn unit_field() -> Option<FieldCheck> {
    Some(FieldCheck { density: 1.0 })
}

fn case(name: &str, config_dir: &Path, file: &str, expected: ExpectedResult) -> ReferenceTest {
    ReferenceTest {
        name: name.to_string(),
        config_path: config_dir.join(file).to_string_lossy().to_string(),
        domain: reference_domain(),
        expected,
    }
}

/// Uniform random particles, two per cell, all active
pub fn baseline(config_dir: &Path) -> ReferenceTest {
    case(
        "Baseline",
        config_dir,
        "baseline.json",
        ExpectedResult {
            seeded: Some(2 * CELLS.pow(3)),
            position_bounds: unit_bounds(),
            mass: Some(MassCheck { expected: 1.0 }),
            active_fraction: Some(ActiveFractionCheck { min: 1.0, max: 1.0 }),
            field: unit_field(),
            restart: false,
        },
    )
}

/// Two particles at each cell center, even x1 columns culled
pub fn lattice(config_dir: &Path) -> ReferenceTest {
    case(
        "Lattice",
        config_dir,
        "lattice.json",
        ExpectedResult {
            seeded: Some(2 * CELLS.pow(3)),
            position_bounds: unit_bounds(),
            mass: Some(MassCheck { expected: 1.0 }),
            active_fraction: Some(ActiveFractionCheck { min: 0.5, max: 0.5 }),
            field: unit_field(),
            restart: false,
        },
    )
}

/// Every slot in one of the 8 inset corners, every other slot culled
pub fn max_frag(config_dir: &Path) -> ReferenceTest {
    case(
        "Max Fragmentation",
        config_dir,
        "max_frag.json",
        ExpectedResult {
            seeded: Some(64),
            position_bounds: Some(PositionBoundsCheck {
                min: [0.049; 3],
                max: [0.951; 3],
            }),
            mass: Some(MassCheck { expected: 1.0 }),
            active_fraction: Some(ActiveFractionCheck { min: 0.5, max: 0.5 }),
            field: unit_field(),
            restart: false,
        },
    )
}

/// Random scatter with independent coin-flip culling
pub fn randomized_max_frag(config_dir: &Path) -> ReferenceTest {
    case(
        "Randomized Max Fragmentation",
        config_dir,
        "randomized_max_frag.json",
        ExpectedResult {
            seeded: Some(1000),
            position_bounds: unit_bounds(),
            mass: Some(MassCheck { expected: 1.0 }),
            // Binomial(1000, 0.5): about 6 sigma either side
            active_fraction: Some(ActiveFractionCheck { min: 0.4, max: 0.6 }),
            field: unit_field(),
            restart: false,
        },
    )
}

/// Field only, no particle slots
pub fn no_particles(config_dir: &Path) -> ReferenceTest {
    case(
        "No Particles",
        config_dir,
        "no_particles.json",
        ExpectedResult {
            seeded: Some(0),
            field: unit_field(),
            ..Default::default()
        },
    )
}

/// Mixed active/inactive population written to a snapshot and read back
pub fn with_restart(config_dir: &Path) -> ReferenceTest {
    case(
        "With Restart",
        config_dir,
        "max_frag.json",
        ExpectedResult {
            seeded: Some(64),
            active_fraction: Some(ActiveFractionCheck { min: 0.5, max: 0.5 }),
            restart: true,
            ..Default::default()
        },
    )
}

/// Every reference case, reading configurations from `config_dir`.
pub fn all_cases(config_dir: &Path) -> Vec<ReferenceTest> {
    vec![
        baseline(config_dir),
        lattice(config_dir),
        max_frag(config_dir),
        randomized_max_frag(config_dir),
        no_particles(config_dir),
        with_restart(config_dir),
    ]
}
