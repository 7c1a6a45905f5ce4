//! Deterministic corner jitter
//!
//! A corner's displacement is a pure function of its position quantized to
//! 1e-6 and the grid seed. Every cell sharing a corner therefore computes the
//! same jittered point without looking its neighbours up.

use glam::DVec2;

/// Quantization applied before hashing a corner
const QUANTIZATION: f64 = 1e6;

/// SplitMix64 finalizer
#[inline]
pub fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Map the top 53 bits of a hash to `[-1, 1)`
#[inline]
fn to_signed_unit(h: u64) -> f64 {
    let unit = (h >> 11) as f64 / (1u64 << 53) as f64;
    unit * 2.0 - 1.0
}

/// Hash-derived offset in `[-1, 1)²` for a corner
pub fn jitter_offset(p: DVec2, seed: u32) -> DVec2 {
    let qx = (p.x * QUANTIZATION).round() as i64 as u64;
    let qy = (p.y * QUANTIZATION).round() as i64 as u64;
    let h = splitmix64(qx ^ splitmix64(qy ^ splitmix64(seed as u64)));
    DVec2::new(to_signed_unit(h), to_signed_unit(splitmix64(h)))
}

/// Jitter parameters for one grid
#[derive(Debug, Clone, Copy)]
pub struct CornerJitter {
    seed: u32,
    amplitude: DVec2,
}

impl CornerJitter {
    /// `amount` is a fraction of the cell size; a corner moves at most half of it per axis
    pub fn new(seed: u32, amount: f64, cell_size: DVec2) -> Option<Self> {
        if amount <= 0.0 {
            return None;
        }
        Some(Self {
            seed,
            amplitude: cell_size * (amount * 0.5),
        })
    }

    #[inline]
    pub fn apply(&self, p: DVec2) -> DVec2 {
        p + jitter_offset(p, self.seed) * self.amplitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_is_pure() {
        let p = DVec2::new(0.125, -0.25);
        assert_eq!(jitter_offset(p, 7), jitter_offset(p, 7));
        assert_ne!(jitter_offset(p, 7), jitter_offset(p, 8));
    }

    #[test]
    fn test_jitter_ignores_sub_quantum_noise() {
        let p = DVec2::new(0.1, 0.3);
        let noisy = p + DVec2::splat(1e-12);
        assert_eq!(jitter_offset(p, 3), jitter_offset(noisy, 3));
    }

    #[test]
    fn test_jitter_range() {
        for i in 0..200 {
            let p = DVec2::new(i as f64 * 0.01, -(i as f64) * 0.003);
            let o = jitter_offset(p, 42);
            assert!(o.x >= -1.0 && o.x < 1.0);
            assert!(o.y >= -1.0 && o.y < 1.0);
        }
    }

    #[test]
    fn test_corner_jitter_amplitude() {
        assert!(CornerJitter::new(1, 0.0, DVec2::ONE).is_none());
        let jitter = CornerJitter::new(1, 0.4, DVec2::new(0.1, 0.2)).unwrap();
        let p = DVec2::new(0.2, 0.2);
        let moved = jitter.apply(p);
        assert!((moved.x - p.x).abs() <= 0.02);
        assert!((moved.y - p.y).abs() <= 0.04);
    }
}
