//! Field and particle state for the tracer setup pipeline
//!
//! This crate holds the containers that setup code fills before a run starts
//! and the seam through which the filled state is handed to an execution
//! backend. It performs no physics.
//!
//! # Modules
//! - [`domain`] -- Local domain descriptor: bounds, cell counts, cell-center lookup.
//! - [`field`] -- Cell-centered density and velocity storage.
//! - [`particle`] -- Fixed-capacity struct-of-arrays tracer particle storage.
//! - [`backend`] -- `ExecutionBackend` commit trait and the reference `HostBackend`.

#![warn(missing_docs)]

pub mod backend;
pub mod domain;
pub mod field;
pub mod particle;

pub use backend::{CommitError, CommittedState, ExecutionBackend, HostBackend};
pub use domain::{DomainDescriptor, DomainError, DIMENSIONS, IDIR, JDIR, KDIR};
pub use field::{FieldChannel, FieldState};
pub use particle::{ParticleArrays, ParticleChannel};
