//! Regular partitioning of a global domain into per-rank local descriptors
//!
//! Setup code only ever reads local bounds. This module produces them for
//! reference runs and tests that need several partitions side by side; it
//! does no communication.

use kernel::{DomainDescriptor, DIMENSIONS};

use crate::error::{SetupError, SetupResult};

/// Number of partitions along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessGrid {
    /// Partitions per axis, x1 first
    pub dims: [usize; 3],
}

impl ProcessGrid {
    /// Explicit process grid.
    pub fn new(dims: [usize; 3]) -> Self {
        Self { dims }
    }

    /// Process grid for a power-of-two rank count.
    ///
    /// Every factor of 8 doubles all three axes. A remaining factor of 4
    /// doubles x1 and x2, a remaining factor of 2 doubles x1.
    pub fn for_ranks(nproc: usize) -> SetupResult<Self> {
        if !nproc.is_power_of_two() {
            return Err(SetupError::Config(format!(
                "expected a power-of-two rank count, got {}",
                nproc
            )));
        }

        let mut dims = [1usize; 3];
        let mut rest = nproc;
        while rest % 8 == 0 {
            dims.iter_mut().for_each(|d| *d *= 2);
            rest /= 8;
        }
        match rest {
            4 => {
                dims[0] *= 2;
                dims[1] *= 2;
            }
            2 => dims[0] *= 2,
            _ => {}
        }

        Ok(Self { dims })
    }

    /// Total number of ranks.
    pub fn ranks(&self) -> usize {
        self.dims.iter().product()
    }

    /// Partition coordinates of `rank`, x1 varying fastest.
    pub fn coords(&self, rank: usize) -> [usize; 3] {
        [
            rank % self.dims[0],
            (rank / self.dims[0]) % self.dims[1],
            rank / (self.dims[0] * self.dims[1]),
        ]
    }
}

/// Split `global` into one local descriptor per rank of `grid`.
///
/// Interior cells are divided evenly; each local descriptor keeps the global
/// ghost width, and its ghost centers are the neighbouring cells of the
/// global table. Interior partition faces sit halfway between the centers
/// on either side.
pub fn split_domain(global: &DomainDescriptor, grid: ProcessGrid) -> SetupResult<Vec<DomainDescriptor>> {
    for axis in 0..DIMENSIONS {
        if grid.dims[axis] == 0 || global.np_int[axis] % grid.dims[axis] != 0 {
            return Err(SetupError::Config(format!(
                "{} interior cells on axis {} cannot be split into {} partitions",
                global.np_int[axis], axis, grid.dims[axis]
            )));
        }
    }

    let local_int: [usize; 3] = std::array::from_fn(|axis| global.np_int[axis] / grid.dims[axis]);
    let nghost = global.nghost;

    let locals = (0..grid.ranks())
        .map(|rank| {
            let c = grid.coords(rank);

            let mut xbeg = [0.0_f32; 3];
            let mut xend = [0.0_f32; 3];
            let centers: [Vec<f32>; 3] = std::array::from_fn(|axis| {
                // First interior cell of this partition in global (ghost-inclusive) indexing
                let first = nghost[axis] + c[axis] * local_int[axis];
                let last = first + local_int[axis] - 1;

                xbeg[axis] = if c[axis] == 0 {
                    global.xbeg[axis]
                } else {
                    0.5 * (global.x(axis, first - 1) + global.x(axis, first))
                };
                xend[axis] = if c[axis] + 1 == grid.dims[axis] {
                    global.xend[axis]
                } else {
                    0.5 * (global.x(axis, last) + global.x(axis, last + 1))
                };

                (first - nghost[axis]..=last + nghost[axis])
                    .map(|g| global.x(axis, g))
                    .collect()
            });

            DomainDescriptor::from_centers(xbeg, xend, local_int, nghost, centers)
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        "Split {:?} interior cells over {:?} partitions ({:?} cells each)",
        global.np_int,
        grid.dims,
        local_int
    );

    Ok(locals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::{IDIR, JDIR};

    #[test]
    fn rank_counts_map_to_grids() {
        assert_eq!(ProcessGrid::for_ranks(1).unwrap().dims, [1, 1, 1]);
        assert_eq!(ProcessGrid::for_ranks(2).unwrap().dims, [2, 1, 1]);
        assert_eq!(ProcessGrid::for_ranks(4).unwrap().dims, [2, 2, 1]);
        assert_eq!(ProcessGrid::for_ranks(8).unwrap().dims, [2, 2, 2]);
        assert_eq!(ProcessGrid::for_ranks(16).unwrap().dims, [4, 2, 2]);
        assert_eq!(ProcessGrid::for_ranks(32).unwrap().dims, [4, 4, 2]);
        assert_eq!(ProcessGrid::for_ranks(64).unwrap().dims, [4, 4, 4]);
    }

    #[test]
    fn non_power_of_two_is_rejected() {
        assert!(ProcessGrid::for_ranks(6).is_err());
        assert!(ProcessGrid::for_ranks(0).is_err());
    }

    #[test]
    fn coords_are_x1_fastest() {
        let grid = ProcessGrid::new([2, 2, 2]);
        assert_eq!(grid.coords(0), [0, 0, 0]);
        assert_eq!(grid.coords(1), [1, 0, 0]);
        assert_eq!(grid.coords(2), [0, 1, 0]);
        assert_eq!(grid.coords(7), [1, 1, 1]);
    }

    #[test]
    fn split_halves_along_x1() {
        let global = DomainDescriptor::uniform([0.0; 3], [1.0; 3], [4, 4, 4], [2, 2, 2]);
        let locals = split_domain(&global, ProcessGrid::new([2, 1, 1])).unwrap();
        assert_eq!(locals.len(), 2);

        let (left, right) = (&locals[0], &locals[1]);
        assert_eq!(left.np_int, [2, 4, 4]);
        assert_eq!(left.np_tot, [6, 8, 8]);
        assert!((left.xend[IDIR] - 0.5).abs() < 1e-6);
        assert!((right.xbeg[IDIR] - 0.5).abs() < 1e-6);
        assert_eq!(right.xend[IDIR], 1.0);
        assert_eq!(left.xend[JDIR], 1.0);

        // Right partition's first interior center is the global third cell
        assert_eq!(right.x(IDIR, 2), global.x(IDIR, 4));
        // And its left ghosts are the left partition's interior cells
        assert_eq!(right.x(IDIR, 1), left.x(IDIR, 3));
    }

    #[test]
    fn uneven_split_is_rejected() {
        let global = DomainDescriptor::uniform([0.0; 3], [1.0; 3], [3, 4, 4], [0; 3]);
        assert!(split_domain(&global, ProcessGrid::new([2, 1, 1])).is_err());
    }
}
