//! Reference test framework for initial-state validation
//!
//! Each case builds the initial state for a shipped configuration on a fixed
//! local domain, then runs a set of checks against what was committed.

pub mod cases;


use kernel::{CommittedState, DomainDescriptor, FieldState, HostBackend, ParticleArrays};
use orchestrator::{create_initial_state, SeedReport};

/// Expected result criteria for a reference test
#[derive(Debug, Clone, Default)]
pub struct ExpectedResult {
    /// Number of slots the seeding pass must write
    pub seeded: Option<usize>,
    /// Seeded particle position bounds
    pub position_bounds: Option<PositionBoundsCheck>,
    /// Per-particle mass
    pub mass: Option<MassCheck>,
    /// Fraction of seeded particles left active
    pub active_fraction: Option<ActiveFractionCheck>,
    /// Field contents
    pub field: Option<FieldCheck>,
    /// JSON snapshot round trip of the committed state
    pub restart: bool,
}

/// Check that seeded particles lie within bounds
#[derive(Debug, Clone)]
pub struct PositionBoundsCheck {
    /// Minimum allowed position [x1, x2, x3]
    pub min: [f32; 3],
    /// Maximum allowed position [x1, x2, x3]
    pub max: [f32; 3],
}

/// Check that every seeded particle carries the configured mass
#[derive(Debug, Clone)]
pub struct MassCheck {
    /// Expected mass of each particle
    pub expected: f32,
}

/// Check the active share of the seeded population
#[derive(Debug, Clone)]
pub struct ActiveFractionCheck {
    /// Lowest accepted fraction (0.0 to 1.0)
    pub min: f64,
    /// Highest accepted fraction (0.0 to 1.0)
    pub max: f64,
}

/// Check that the field is uniform and at rest
#[derive(Debug, Clone)]
pub struct FieldCheck {
    /// Expected density in every cell
    pub density: f32,
}

/// Result of running a reference test
#[derive(Debug)]
pub struct TestResult {
    /// Test name
    pub name: String,
    /// Whether test passed
    pub passed: bool,
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// What the seeding pass did
    pub report: SeedReport,
    /// Cells in the committed field, ghosts included
    pub cells: usize,
}

/// Result of an individual validation check
#[derive(Debug)]
pub struct CheckResult {
    /// Check name
    pub name: String,
    /// Whether check passed
    pub passed: bool,
    /// Detail, or the reason for failure
    pub message: Option<String>,
}

impl CheckResult {
    fn pass(name: &str, message: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message,
        }
    }

    fn fail(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: Some(message),
        }
    }
}

/// A reference test case
pub struct ReferenceTest {
    /// Test name
    pub name: String,
    /// Path to configuration file
    pub config_path: String,
    /// Local domain the state is built on
    pub domain: DomainDescriptor,
    /// Expected results to validate
    pub expected: ExpectedResult,
}

impl ReferenceTest {
    /// Run the reference test and return results
    pub fn run(&self) -> Result<TestResult, String> {
        tracing::info!("Running reference test: {}", self.name);

        let mut backend = HostBackend::new();
        let state = create_initial_state(&self.config_path, &self.domain, &mut backend)
            .map_err(|e| e.to_string())?;
        let committed = backend
            .committed()
            .ok_or("backend holds no committed state")?;

        tracing::info!(
            "Initialized: {} cells, {} seeded, {} active",
            state.field.len(),
            state.report.seeded,
            state.report.active()
        );

        let mut checks = Vec::new();

        if let Some(expected) = self.expected.seeded {
            checks.push(validate_seeded(&state.report, expected));
        }
        if let Some(ref bounds) = self.expected.position_bounds {
            checks.push(validate_position_bounds(&committed.particles, &state.report, bounds));
        }
        if let Some(ref mass) = self.expected.mass {
            checks.push(validate_mass(&committed.particles, &state.report, mass));
        }
        if let Some(ref fraction) = self.expected.active_fraction {
            checks.push(validate_active_fraction(&committed.particles, &state.report, fraction));
        }
        if let Some(ref field) = self.expected.field {
            checks.push(validate_field(&committed.field, field));
        }
        if self.expected.restart {
            checks.push(validate_restart(committed));
        }

        Ok(TestResult {
            name: self.name.clone(),
            passed: checks.iter().all(|c| c.passed),
            checks,
            report: state.report,
            cells: state.field.len(),
        })
    }
}

fn validate_seeded(report: &SeedReport, expected: usize) -> CheckResult {
    if report.seeded == expected {
        CheckResult::pass("Seeded Count", Some(format!("{} slots", report.seeded)))
    } else {
        CheckResult::fail(
            "Seeded Count",
            format!("Expected {} slots, got {}", expected, report.seeded),
        )
    }
}

/// Validate that seeded particles remain within specified bounds
fn validate_position_bounds(
    particles: &ParticleArrays,
    report: &SeedReport,
    bounds: &PositionBoundsCheck,
) -> CheckResult {
    let mut violations = 0;
    let mut max_violation = 0.0_f32;

    for n in 0..report.seeded {
        let pos = particles.position(n);
        for axis in 0..3 {
            if pos[axis] < bounds.min[axis] {
                violations += 1;
                max_violation = max_violation.max(bounds.min[axis] - pos[axis]);
            }
            if pos[axis] > bounds.max[axis] {
                violations += 1;
                max_violation = max_violation.max(pos[axis] - bounds.max[axis]);
            }
        }
    }

    if violations == 0 {
        CheckResult::pass("Position Bounds", None)
    } else {
        CheckResult::fail(
            "Position Bounds",
            format!(
                "{} coordinates out of bounds (max violation: {:.6})",
                violations, max_violation
            ),
        )
    }
}

fn validate_mass(particles: &ParticleArrays, report: &SeedReport, check: &MassCheck) -> CheckResult {
    let wrong = (0..report.seeded)
        .filter(|&n| particles.mass[n] != check.expected)
        .count();

    if wrong == 0 {
        CheckResult::pass(
            "Particle Mass",
            Some(format!(
                "{} particles at {}, active mass {:.3}",
                report.seeded,
                check.expected,
                particles.active_mass()
            )),
        )
    } else {
        CheckResult::fail(
            "Particle Mass",
            format!("{} / {} particles differ from {}", wrong, report.seeded, check.expected),
        )
    }
}

fn validate_active_fraction(
    particles: &ParticleArrays,
    report: &SeedReport,
    check: &ActiveFractionCheck,
) -> CheckResult {
    if report.seeded == 0 {
        return CheckResult::fail("Active Fraction", "No particles seeded".to_string());
    }

    let active = (0..report.seeded).filter(|&n| particles.is_active(n)).count();
    if active != report.active() {
        return CheckResult::fail(
            "Active Fraction",
            format!("{} active flags set, report says {}", active, report.active()),
        );
    }

    let fraction = active as f64 / report.seeded as f64;
    let message = format!(
        "{:.1}% active (accepted: {:.1}% to {:.1}%)",
        fraction * 100.0,
        check.min * 100.0,
        check.max * 100.0
    );
    if (check.min..=check.max).contains(&fraction) {
        CheckResult::pass("Active Fraction", Some(message))
    } else {
        CheckResult::fail("Active Fraction", message)
    }
}

/// Validate that every cell, ghosts included, holds the expected density at rest
fn validate_field(field: &FieldState, check: &FieldCheck) -> CheckResult {
    let bad_density = field.rho.iter().filter(|&&r| r != check.density).count();
    let moving = field
        .vx1
        .iter()
        .chain(&field.vx2)
        .chain(&field.vx3)
        .filter(|&&v| v != 0.0)
        .count();

    if bad_density == 0 && moving == 0 {
        CheckResult::pass(
            "Uniform Field",
            Some(format!("{} cells at density {}", field.len(), check.density)),
        )
    } else {
        CheckResult::fail(
            "Uniform Field",
            format!(
                "{} cells off density {}, {} nonzero velocity components",
                bad_density, check.density, moving
            ),
        )
    }
}

/// Validate that the committed state survives a JSON snapshot round trip
fn validate_restart(committed: &CommittedState) -> CheckResult {
    let snapshot = match serde_json::to_string(committed) {
        Ok(s) => s,
        Err(e) => return CheckResult::fail("Restart Snapshot", format!("serialize: {}", e)),
    };
    let restored: CommittedState = match serde_json::from_str(&snapshot) {
        Ok(state) => state,
        Err(e) => return CheckResult::fail("Restart Snapshot", format!("deserialize: {}", e)),
    };

    let particles = &committed.particles;
    let flipped = (0..particles.capacity())
        .filter(|&n| restored.particles.is_active(n) != particles.is_active(n))
        .count();

    if restored == *committed {
        CheckResult::pass(
            "Restart Snapshot",
            Some(format!(
                "{} bytes, {} / {} active restored",
                snapshot.len(),
                restored.particles.count_active(),
                restored.particles.capacity()
            )),
        )
    } else {
        CheckResult::fail(
            "Restart Snapshot",
            format!("restored state differs ({} active flags changed)", flipped),
        )
    }
}

impl TestResult {
    /// Print a summary of the test result
    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(80));
        println!("Test: {}", self.name);
        println!("{}", "=".repeat(80));
        println!("Status: {}", if self.passed { "PASSED" } else { "FAILED" });
        println!("Cells: {}", self.cells);
        println!(
            "Particles: {} seeded, {} deactivated",
            self.report.seeded, self.report.deactivated
        );
        println!("\nValidation Checks:");
        for check in &self.checks {
            let status = if check.passed { "PASS" } else { "FAIL" };
            print!("  [{}] {}", status, check.name);
            if let Some(ref msg) = check.message {
                print!(" - {}", msg);
            }
            println!();
        }
        println!("{}", "=".repeat(80));
    }
}
