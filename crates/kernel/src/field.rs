//! Cell-centered field storage (density and velocity) over the ghost-inclusive
//! cell range of a local domain.

use serde::{Deserialize, Serialize};

/// Field channel discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FieldChannel {
    /// Mass density
    Rho = 0,
    /// Velocity along x1
    Vx1 = 1,
    /// Velocity along x2
    Vx2 = 2,
    /// Velocity along x3
    Vx3 = 3,
}

impl FieldChannel {
    /// Every channel, in storage order.
    pub const ALL: [FieldChannel; 4] = [
        FieldChannel::Rho,
        FieldChannel::Vx1,
        FieldChannel::Vx2,
        FieldChannel::Vx3,
    ];
}

/// Struct-of-arrays field storage indexed by `(k, j, i)`.
///
/// `i` runs fastest. Dimensions are given per axis (`IDIR` first) and cover
/// the total cell range, ghosts included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    dims: [usize; 3],
    /// Density
    pub rho: Vec<f32>,
    /// Velocity along x1
    pub vx1: Vec<f32>,
    /// Velocity along x2
    pub vx2: Vec<f32>,
    /// Velocity along x3
    pub vx3: Vec<f32>,
}

impl FieldState {
    /// Allocate a zeroed field for `np_tot` cells per axis.
    pub fn new(np_tot: [usize; 3]) -> Self {
        let n = np_tot.iter().product();
        Self {
            dims: np_tot,
            rho: vec![0.0; n],
            vx1: vec![0.0; n],
            vx2: vec![0.0; n],
            vx3: vec![0.0; n],
        }
    }

    /// Cell counts per axis.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.rho.len()
    }

    /// Return `true` if the field holds no cells.
    pub fn is_empty(&self) -> bool {
        self.rho.is_empty()
    }

    /// Flat storage index of cell `(k, j, i)`.
    #[inline]
    pub fn index(&self, k: usize, j: usize, i: usize) -> usize {
        debug_assert!(i < self.dims[0] && j < self.dims[1] && k < self.dims[2]);
        (k * self.dims[1] + j) * self.dims[0] + i
    }

    /// Inverse of [`FieldState::index`], returning `(k, j, i)`.
    pub fn unravel(&self, index: usize) -> (usize, usize, usize) {
        let i = index % self.dims[0];
        let j = (index / self.dims[0]) % self.dims[1];
        let k = index / (self.dims[0] * self.dims[1]);
        (k, j, i)
    }

    /// Read-only view of one channel.
    pub fn channel(&self, channel: FieldChannel) -> &[f32] {
        match channel {
            FieldChannel::Rho => &self.rho,
            FieldChannel::Vx1 => &self.vx1,
            FieldChannel::Vx2 => &self.vx2,
            FieldChannel::Vx3 => &self.vx3,
        }
    }

    /// Mutable view of one channel.
    pub fn channel_mut(&mut self, channel: FieldChannel) -> &mut [f32] {
        match channel {
            FieldChannel::Rho => &mut self.rho,
            FieldChannel::Vx1 => &mut self.vx1,
            FieldChannel::Vx2 => &mut self.vx2,
            FieldChannel::Vx3 => &mut self.vx3,
        }
    }

    /// Value of `channel` at cell `(k, j, i)`.
    pub fn get(&self, channel: FieldChannel, k: usize, j: usize, i: usize) -> f32 {
        let idx = self.index(k, j, i);
        self.channel(channel)[idx]
    }

    /// Overwrite `channel` at cell `(k, j, i)`.
    pub fn set(&mut self, channel: FieldChannel, k: usize, j: usize, i: usize, value: f32) {
        let idx = self.index(k, j, i);
        self.channel_mut(channel)[idx] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_field_is_zeroed() {
        let f = FieldState::new([3, 2, 4]);
        assert_eq!(f.len(), 24);
        assert!(!f.is_empty());
        for ch in FieldChannel::ALL {
            assert!(f.channel(ch).iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn index_is_i_fastest() {
        let f = FieldState::new([3, 2, 4]);
        assert_eq!(f.index(0, 0, 1), 1);
        assert_eq!(f.index(0, 1, 0), 3);
        assert_eq!(f.index(1, 0, 0), 6);
        assert_eq!(f.unravel(f.index(3, 1, 2)), (3, 1, 2));
    }

    #[test]
    fn set_touches_one_channel() {
        let mut f = FieldState::new([2, 2, 2]);
        f.set(FieldChannel::Vx2, 1, 0, 1, 0.5);
        assert_eq!(f.get(FieldChannel::Vx2, 1, 0, 1), 0.5);
        assert_eq!(f.get(FieldChannel::Vx1, 1, 0, 1), 0.0);
        assert_eq!(f.get(FieldChannel::Vx2, 0, 0, 1), 0.0);
    }

    #[test]
    fn channel_repr() {
        assert_eq!(FieldChannel::Rho as u8, 0);
        assert_eq!(FieldChannel::Vx3 as u8, 3);
    }
}
