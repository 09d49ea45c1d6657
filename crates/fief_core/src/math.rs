//! Fixed-point math utilities for deterministic simulation.
//!
//! All match simulation uses fixed-point arithmetic so that the same
//! intent stream replayed against the same seed always produces the
//! same positions, tick for tick, regardless of platform.

use fixed::types::I32F32;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D point/vector in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer world coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Calculate the straight-line distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Vector length.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y
    }

    /// Scale by a fixed-point factor.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len)
    }

    /// A point at most `step` units from `self` along the bearing toward `target`.
    ///
    /// Returns `target` itself when it is closer than one step.
    #[must_use]
    pub fn step_toward(self, target: Self, step: Fixed) -> Self {
        let delta = target - self;
        let dist = delta.length();
        if dist <= step {
            target
        } else {
            self + delta.scale(step / dist)
        }
    }
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::from_num(1) {
        value
    } else {
        Fixed::from_num(1)
    };

    for _ in 0..32 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

/// Draw a unit-length direction vector from a seeded RNG.
///
/// Rejection-samples integer offsets and normalizes with fixed-point math,
/// so the result depends only on the RNG stream.
#[must_use]
pub fn random_direction<R: Rng>(rng: &mut R) -> Vec2Fixed {
    for _ in 0..8 {
        let x = rng.gen_range(-1000i32..=1000);
        let y = rng.gen_range(-1000i32..=1000);
        if x != 0 || y != 0 {
            return Vec2Fixed::from_ints(x, y).normalize();
        }
    }
    Vec2Fixed::from_ints(1, 0)
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::AddAssign for Vec2Fixed {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_distance_squared() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_distance_is_sqrt_of_squared() {
        let a = Vec2Fixed::from_ints(0, 0);
        let b = Vec2Fixed::from_ints(3, 4);
        let dist = a.distance(b);
        let five = Fixed::from_num(5);
        let epsilon = Fixed::from_num(1) / Fixed::from_num(10000);
        assert!((dist - five).abs() < epsilon, "expected ~5, got {dist:?}");
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }

    #[test]
    fn test_normalize_preserves_direction() {
        let v = Vec2Fixed::from_ints(3, 4);
        let norm = v.normalize();

        let len_sq = norm.dot(norm);
        let one = Fixed::from_num(1);
        let epsilon = one / Fixed::from_num(10000);
        assert!(
            (len_sq - one).abs() < epsilon,
            "normalized length² should be ~1, got {len_sq:?}"
        );

        // x/y ratio matches original 3/4
        let ratio_diff = (norm.x * Fixed::from_num(4)) - (norm.y * Fixed::from_num(3));
        assert!(ratio_diff.abs() < epsilon, "direction not preserved");
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vec2Fixed::ZERO.normalize(), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_step_toward_clamps_to_target() {
        let from = Vec2Fixed::from_ints(0, 0);
        let to = Vec2Fixed::from_ints(3, 0);
        assert_eq!(from.step_toward(to, Fixed::from_num(10)), to);

        let partial = from.step_toward(to, Fixed::from_num(1));
        let epsilon = Fixed::from_num(1) / Fixed::from_num(1000);
        assert!((partial.x - Fixed::from_num(1)).abs() < epsilon);
        assert_eq!(partial.y, Fixed::ZERO);
    }

    #[test]
    fn test_random_direction_is_unit_and_seeded() {
        let mut rng1 = SmallRng::seed_from_u64(7);
        let mut rng2 = SmallRng::seed_from_u64(7);
        let d1 = random_direction(&mut rng1);
        let d2 = random_direction(&mut rng2);
        assert_eq!(d1, d2);

        let len_sq = d1.dot(d1);
        let one = Fixed::from_num(1);
        let epsilon = one / Fixed::from_num(1000);
        assert!((len_sq - one).abs() < epsilon);
    }
}
