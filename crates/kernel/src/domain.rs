//! Local domain descriptor: bounds, cell counts and cell-center coordinates
//! of the partition owned by one rank.
//!
//! Cell indices come in two flavours. *Local* interior indices run over
//! `0..np_int[axis]`; *global* indices run over the ghost-inclusive range
//! `0..np_tot[axis]` and are what the coordinate lookup [`DomainDescriptor::x`]
//! expects. A local interior index maps to a global one by adding
//! `nghost[axis]`.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// First axis (x1).
pub const IDIR: usize = 0;
/// Second axis (x2).
pub const JDIR: usize = 1;
/// Third axis (x3).
pub const KDIR: usize = 2;
/// Number of spatial dimensions.
pub const DIMENSIONS: usize = 3;

/// Inconsistent cell counts or center tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A center table does not cover the ghost-inclusive range.
    #[error("center table for axis {axis} has the wrong length: expected {expected}, found {found}")]
    CenterTable {
        /// Offending axis
        axis: usize,
        /// `np_int + 2 * nghost` on that axis
        expected: usize,
        /// Entries present
        found: usize,
    },
    /// Stored total cell count disagrees with interior and ghost counts.
    #[error("total cell count on axis {axis} is {found}, but interior and ghosts give {expected}")]
    TotalCells {
        /// Offending axis
        axis: usize,
        /// `np_int + 2 * nghost` on that axis
        expected: usize,
        /// Stored `np_tot`
        found: usize,
    },
}

/// Read-only description of a local domain partition.
///
/// Deserialization goes through [`DomainDescriptor::try_from_centers`], so a
/// snapshot whose tables disagree with its cell counts is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DomainRecord", into = "DomainRecord")]
pub struct DomainDescriptor {
    /// Lower bound of the local domain per axis
    pub xbeg: [f32; 3],
    /// Upper bound of the local domain per axis
    pub xend: [f32; 3],
    /// Total (ghost-inclusive) cell count per axis
    pub np_tot: [usize; 3],
    /// Interior cell count per axis
    pub np_int: [usize; 3],
    /// Ghost cells on each side, per axis
    pub nghost: [usize; 3],
    /// Cell-center coordinates per axis, indexed by global cell index
    centers: [Vec<f32>; 3],
}

impl DomainDescriptor {
    /// Build a descriptor for a uniformly spaced grid.
    ///
    /// Ghost-cell centers continue the interior spacing past the bounds.
    pub fn uniform(xbeg: [f32; 3], xend: [f32; 3], np_int: [usize; 3], nghost: [usize; 3]) -> Self {
        let centers = std::array::from_fn(|axis| {
            assert!(
                xend[axis] > xbeg[axis],
                "xend must exceed xbeg on axis {}: [{}, {}]",
                axis,
                xbeg[axis],
                xend[axis]
            );
            assert!(np_int[axis] > 0, "axis {} needs at least one interior cell", axis);

            let dx = (xend[axis] - xbeg[axis]) / np_int[axis] as f32;
            let total = np_int[axis] + 2 * nghost[axis];
            (0..total)
                .map(|g| xbeg[axis] + (g as f32 - nghost[axis] as f32 + 0.5) * dx)
                .collect::<Vec<f32>>()
        });

        Self::from_centers(xbeg, xend, np_int, nghost, centers)
    }

    /// Build a descriptor from explicit cell-center tables.
    ///
    /// # Panics
    /// If a table does not hold `np_int[axis] + 2 * nghost[axis]` entries.
    pub fn from_centers(
        xbeg: [f32; 3],
        xend: [f32; 3],
        np_int: [usize; 3],
        nghost: [usize; 3],
        centers: [Vec<f32>; 3],
    ) -> Self {
        match Self::try_from_centers(xbeg, xend, np_int, nghost, centers) {
            Ok(domain) => domain,
            Err(e) => panic!("{}", e),
        }
    }

    /// Fallible [`DomainDescriptor::from_centers`].
    pub fn try_from_centers(
        xbeg: [f32; 3],
        xend: [f32; 3],
        np_int: [usize; 3],
        nghost: [usize; 3],
        centers: [Vec<f32>; 3],
    ) -> Result<Self, DomainError> {
        let np_tot: [usize; 3] = std::array::from_fn(|axis| np_int[axis] + 2 * nghost[axis]);
        for axis in 0..DIMENSIONS {
            if centers[axis].len() != np_tot[axis] {
                return Err(DomainError::CenterTable {
                    axis,
                    expected: np_tot[axis],
                    found: centers[axis].len(),
                });
            }
        }

        Ok(Self {
            xbeg,
            xend,
            np_tot,
            np_int,
            nghost,
            centers,
        })
    }

    /// Cell-center coordinate on `axis` for a global (ghost-inclusive) cell index.
    pub fn x(&self, axis: usize, global_index: usize) -> f32 {
        self.centers[axis][global_index]
    }

    /// Width of the local domain along `axis`.
    pub fn width(&self, axis: usize) -> f32 {
        self.xend[axis] - self.xbeg[axis]
    }

    /// Global index range covering the interior cells of `axis`.
    pub fn interior_range(&self, axis: usize) -> Range<usize> {
        self.nghost[axis]..self.nghost[axis] + self.np_int[axis]
    }

    /// Number of interior cells in the local domain.
    pub fn interior_cells(&self) -> usize {
        self.np_int.iter().product()
    }

    /// Number of cells including ghosts.
    pub fn total_cells(&self) -> usize {
        self.np_tot.iter().product()
    }

    /// Whether `position` lies inside the local bounds (inclusive on both ends).
    pub fn contains(&self, position: [f32; 3]) -> bool {
        (0..DIMENSIONS).all(|axis| {
            position[axis] >= self.xbeg[axis] && position[axis] <= self.xend[axis]
        })
    }
}

/// Serialized form of [`DomainDescriptor`].
#[derive(Serialize, Deserialize)]
struct DomainRecord {
    xbeg: [f32; 3],
    xend: [f32; 3],
    np_tot: [usize; 3],
    np_int: [usize; 3],
    nghost: [usize; 3],
    centers: [Vec<f32>; 3],
}

impl TryFrom<DomainRecord> for DomainDescriptor {
    type Error = DomainError;

    fn try_from(record: DomainRecord) -> Result<Self, Self::Error> {
        for axis in 0..DIMENSIONS {
            let expected = record.np_int[axis] + 2 * record.nghost[axis];
            if record.np_tot[axis] != expected {
                return Err(DomainError::TotalCells {
                    axis,
                    expected,
                    found: record.np_tot[axis],
                });
            }
        }
        Self::try_from_centers(
            record.xbeg,
            record.xend,
            record.np_int,
            record.nghost,
            record.centers,
        )
    }
}

impl From<DomainDescriptor> for DomainRecord {
    fn from(domain: DomainDescriptor) -> Self {
        Self {
            xbeg: domain.xbeg,
            xend: domain.xend,
            np_tot: domain.np_tot,
            np_int: domain.np_int,
            nghost: domain.nghost,
            centers: domain.centers,
        }
    }
}
