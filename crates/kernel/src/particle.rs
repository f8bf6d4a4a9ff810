//! Tracer particle storage using struct-of-arrays layout.

use serde::{Deserialize, Serialize};

/// Particle channel discriminator for indexed access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ParticleChannel {
    /// Position along x1
    X1 = 0,
    /// Position along x2
    X2 = 1,
    /// Position along x3
    X3 = 2,
    /// Velocity along x1
    Vx1 = 3,
    /// Velocity along x2
    Vx2 = 4,
    /// Velocity along x3
    Vx3 = 5,
    /// Particle mass
    Mass = 6,
}

impl ParticleChannel {
    /// Position channel for a given axis; `None` past the third axis.
    pub fn position(axis: usize) -> Option<Self> {
        match axis {
            0 => Some(ParticleChannel::X1),
            1 => Some(ParticleChannel::X2),
            2 => Some(ParticleChannel::X3),
            _ => None,
        }
    }

    /// Velocity channel for a given axis; `None` past the third axis.
    pub fn velocity(axis: usize) -> Option<Self> {
        match axis {
            0 => Some(ParticleChannel::Vx1),
            1 => Some(ParticleChannel::Vx2),
            2 => Some(ParticleChannel::Vx3),
            _ => None,
        }
    }
}

/// Fixed-capacity struct-of-arrays particle storage.
///
/// All arrays are parallel: index `n` across every array refers to the same
/// slot. Capacity is set at allocation and never changes. Slots start zeroed
/// and active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleArrays {
    // ---- Positions ----
    /// x1 positions
    pub x1: Vec<f32>,
    /// x2 positions
    pub x2: Vec<f32>,
    /// x3 positions
    pub x3: Vec<f32>,

    // ---- Velocities ----
    /// x1 velocities
    pub vx1: Vec<f32>,
    /// x2 velocities
    pub vx2: Vec<f32>,
    /// x3 velocities
    pub vx3: Vec<f32>,

    /// Particle mass
    pub mass: Vec<f32>,
    /// Whether the slot takes part in subsequent steps
    pub active: Vec<bool>,

    /// Number of slots the engine considers live at start-up
    active_count: usize,
}

impl ParticleArrays {
    /// Allocate `capacity` zeroed, active slots. The active count equals the capacity.
    pub fn new(capacity: usize) -> Self {
        Self::with_active_count(capacity, capacity)
    }

    /// Allocate `capacity` slots with an engine-reported active count.
    ///
    /// The active count is not clamped; seeding checks it against the capacity.
    pub fn with_active_count(capacity: usize, active_count: usize) -> Self {
        Self {
            x1: vec![0.0; capacity],
            x2: vec![0.0; capacity],
            x3: vec![0.0; capacity],
            vx1: vec![0.0; capacity],
            vx2: vec![0.0; capacity],
            vx3: vec![0.0; capacity],
            mass: vec![0.0; capacity],
            active: vec![true; capacity],
            active_count,
        }
    }

    /// Number of allocated slots.
    pub fn capacity(&self) -> usize {
        self.x1.len()
    }

    /// Number of allocated slots.
    pub fn len(&self) -> usize {
        self.x1.len()
    }

    /// Return `true` if no slot is allocated.
    pub fn is_empty(&self) -> bool {
        self.x1.is_empty()
    }

    /// Engine-reported count of live slots at start-up.
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    fn channel(&self, channel: ParticleChannel) -> &Vec<f32> {
        match channel {
            ParticleChannel::X1 => &self.x1,
            ParticleChannel::X2 => &self.x2,
            ParticleChannel::X3 => &self.x3,
            ParticleChannel::Vx1 => &self.vx1,
            ParticleChannel::Vx2 => &self.vx2,
            ParticleChannel::Vx3 => &self.vx3,
            ParticleChannel::Mass => &self.mass,
        }
    }

    fn channel_mut(&mut self, channel: ParticleChannel) -> &mut Vec<f32> {
        match channel {
            ParticleChannel::X1 => &mut self.x1,
            ParticleChannel::X2 => &mut self.x2,
            ParticleChannel::X3 => &mut self.x3,
            ParticleChannel::Vx1 => &mut self.vx1,
            ParticleChannel::Vx2 => &mut self.vx2,
            ParticleChannel::Vx3 => &mut self.vx3,
            ParticleChannel::Mass => &mut self.mass,
        }
    }

    /// Value of `channel` for slot `n`.
    pub fn get(&self, channel: ParticleChannel, n: usize) -> f32 {
        self.channel(channel)[n]
    }

    /// Overwrite `channel` for slot `n`.
    pub fn set(&mut self, channel: ParticleChannel, n: usize, value: f32) {
        self.channel_mut(channel)[n] = value;
    }

    /// Position of slot `n`.
    pub fn position(&self, n: usize) -> [f32; 3] {
        [self.x1[n], self.x2[n], self.x3[n]]
    }

    /// Velocity of slot `n`.
    pub fn velocity(&self, n: usize) -> [f32; 3] {
        [self.vx1[n], self.vx2[n], self.vx3[n]]
    }

    /// Overwrite position, velocity and mass of slot `n` in one call.
    pub fn write(&mut self, n: usize, position: [f32; 3], velocity: [f32; 3], mass: f32) {
        self.x1[n] = position[0];
        self.x2[n] = position[1];
        self.x3[n] = position[2];
        self.vx1[n] = velocity[0];
        self.vx2[n] = velocity[1];
        self.vx3[n] = velocity[2];
        self.mass[n] = mass;
    }

    /// Whether slot `n` is active.
    pub fn is_active(&self, n: usize) -> bool {
        self.active[n]
    }

    /// Set the active flag of slot `n`.
    pub fn set_active(&mut self, n: usize, active: bool) {
        self.active[n] = active;
    }

    /// Count of slots whose active flag is set.
    pub fn count_active(&self) -> usize {
        self.active.iter().filter(|&&a| a).count()
    }

    /// Sum of the mass of active slots.
    pub fn active_mass(&self) -> f64 {
        self.mass
            .iter()
            .zip(&self.active)
            .filter(|(_, a)| **a)
            .map(|(&m, _)| m as f64)
            .sum()
    }
}

impl Default for ParticleArrays {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_particle_arrays() {
        let pa = ParticleArrays::default();
        assert_eq!(pa.len(), 0);
        assert!(pa.is_empty());
        assert_eq!(pa.active_count(), 0);
    }

    #[test]
    fn new_slots_are_zeroed_and_active() {
        let pa = ParticleArrays::new(5);
        assert_eq!(pa.capacity(), 5);
        assert_eq!(pa.active_count(), 5);
        assert_eq!(pa.count_active(), 5);
        assert_eq!(pa.position(4), [0.0; 3]);
        assert_eq!(pa.get(ParticleChannel::Mass, 2), 0.0);
    }

    #[test]
    fn write_and_read_back() {
        let mut pa = ParticleArrays::new(2);
        pa.write(1, [1.0, 2.0, 3.0], [0.1, 0.2, 0.3], 0.5);
        assert_eq!(pa.position(1), [1.0, 2.0, 3.0]);
        assert_eq!(pa.velocity(1), [0.1, 0.2, 0.3]);
        assert_eq!(pa.get(ParticleChannel::Mass, 1), 0.5);
        assert_eq!(pa.get(ParticleChannel::X2, 0), 0.0);
    }

    #[test]
    fn active_mass_skips_inactive() {
        let mut pa = ParticleArrays::new(3);
        for n in 0..3 {
            pa.set(ParticleChannel::Mass, n, 2.0);
        }
        pa.set_active(1, false);
        assert_eq!(pa.count_active(), 2);
        assert_eq!(pa.active_mass(), 4.0);
    }

    #[test]
    fn channel_for_axis() {
        assert_eq!(ParticleChannel::position(0), Some(ParticleChannel::X1));
        assert_eq!(ParticleChannel::position(2), Some(ParticleChannel::X3));
        assert_eq!(ParticleChannel::velocity(1), Some(ParticleChannel::Vx2));
        assert_eq!(ParticleChannel::velocity(2), Some(ParticleChannel::Vx3));
    }

    #[test]
    fn out_of_range_axis_has_no_channel() {
        assert_eq!(ParticleChannel::position(3), None);
        assert_eq!(ParticleChannel::velocity(3), None);
        assert_eq!(ParticleChannel::velocity(usize::MAX), None);
    }
}
