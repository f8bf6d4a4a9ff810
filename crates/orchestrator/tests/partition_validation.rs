//! Multi-partition setup: every rank seeds only inside its own local bounds.
//!
//! The global domain is split with `split_domain` and each local descriptor
//! runs the full pipeline independently, the same way one process per rank
//! would.

use kernel::{DomainDescriptor, HostBackend, IDIR, JDIR, KDIR};
use orchestrator::{build_initial_state, split_domain, Input, NoAnalysis, ProcessGrid};
use serde_json::json;

fn corner_input(total: usize) -> Input {
    let mut input = Input::new();
    input
        .set("Setup", "mass", vec![json!(1.0)])
        .set("Setup", "seeding", vec![json!("corner_cluster")])
        .set("Setup", "margin", vec![json!(0.05)])
        .set("Particles", "count", vec![json!("total"), json!(total)]);
    input
}

fn global_domain() -> DomainDescriptor {
    DomainDescriptor::uniform([0.0; 3], [2.0, 1.0, 1.0], [8, 4, 4], [2, 2, 2])
}

#[test]
fn corners_stay_inside_each_partition() {
    let global = global_domain();
    let grid = ProcessGrid::for_ranks(8).unwrap();
    let locals = split_domain(&global, grid).unwrap();
    assert_eq!(locals.len(), 8);

    let input = corner_input(16);
    for (rank, local) in locals.iter().enumerate() {
        let mut backend = HostBackend::new();
        let state = build_initial_state(&input, local, &mut backend, &mut NoAnalysis).unwrap();

        println!(
            "rank {} {:?}: x1 [{}, {}], {} active",
            rank,
            grid.coords(rank),
            local.xbeg[IDIR],
            local.xend[IDIR],
            state.particles.count_active()
        );

        for n in 0..state.particles.capacity() {
            let p = state.particles.position(n);
            assert!(local.contains(p), "rank {} slot {} at {:?} outside {:?}..{:?}", rank, n, p, local.xbeg, local.xend);
        }
        assert_eq!(state.report.active(), 8);
        assert_eq!(backend.commit_count(), 1);
    }
}

#[test]
fn partitions_tile_the_global_domain() {
    let global = global_domain();
    let grid = ProcessGrid::for_ranks(4).unwrap();
    let locals = split_domain(&global, grid).unwrap();

    // Total interior cells are conserved
    let cells: usize = locals.iter().map(|d| d.interior_cells()).sum();
    assert_eq!(cells, global.interior_cells());

    // Neighbouring partitions share their face along x1
    for rank in 0..grid.ranks() {
        let c = grid.coords(rank);
        if c[IDIR] + 1 < grid.dims[IDIR] {
            let right = rank + 1;
            assert_eq!(locals[rank].xend[IDIR], locals[right].xbeg[IDIR]);
        }
    }

    // x3 is not split at 4 ranks
    for local in &locals {
        assert_eq!(local.xbeg[KDIR], global.xbeg[KDIR]);
        assert_eq!(local.xend[KDIR], global.xend[KDIR]);
        assert_eq!(local.np_int[KDIR], global.np_int[KDIR]);
    }
}

#[test]
fn lattice_seeds_interior_centers_per_partition() {
    let global = global_domain();
    let locals = split_domain(&global, ProcessGrid::new([2, 1, 1])).unwrap();

    let mut input = Input::new();
    input
        .set("Setup", "mass", vec![json!(0.5)])
        .set("Setup", "seeding", vec![json!("per_cell_lattice")])
        .set("Particles", "count", vec![json!("per_cell"), json!(1)]);

    let mut seeded = 0;
    for local in &locals {
        let mut backend = HostBackend::new();
        let state = build_initial_state(&input, local, &mut backend, &mut NoAnalysis).unwrap();
        seeded += state.report.seeded;

        // First slot sits on the first interior cell, not on a ghost
        let first = state.particles.position(0);
        assert_eq!(first[IDIR], local.x(IDIR, local.nghost[IDIR]));
        assert_eq!(first[JDIR], local.x(JDIR, local.nghost[JDIR]));
        assert!(local.contains(first));
    }
    assert_eq!(seeded, global.interior_cells());
}
