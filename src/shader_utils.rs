//! Shared WGSL utility functions and their exact Rust mirrors.
//!
//! Turbulence and bounce jitter need pseudo-randomness that is reproducible
//! across the two backends: the kernel hashes the particle index together
//! with a frame-scoped seed counter, and the sequential backend runs the
//! identical hash on the CPU. No wall-clock time, no global RNG.

/// WGSL hash/random helpers, prepended to every generated step kernel.
pub const RANDOM_WGSL: &str = r#"
// Hash functions for pseudo-random number generation
fn hash(n: u32) -> u32 {
    var x = n;
    x = x ^ (x >> 17u);
    x = x * 0xed5ad4bbu;
    x = x ^ (x >> 11u);
    x = x * 0xac4c1b51u;
    x = x ^ (x >> 15u);
    x = x * 0x31848babu;
    x = x ^ (x >> 14u);
    return x;
}

// Random float in [0, 1)
fn rand(seed: u32) -> f32 {
    return f32(hash(seed)) / 4294967295.0;
}

// Random direction vector (not normalized), components in [-1, 1)
fn rand_vec3(seed: u32) -> vec3<f32> {
    return vec3<f32>(
        rand(seed) * 2.0 - 1.0,
        rand(seed + 1u) * 2.0 - 1.0,
        rand(seed + 2u) * 2.0 - 1.0
    );
}
"#;

/// CPU mirror of the WGSL `hash` function above. Must stay bit-identical.
#[inline]
pub fn hash(n: u32) -> u32 {
    let mut x = n;
    x ^= x >> 17;
    x = x.wrapping_mul(0xed5a_d4bb);
    x ^= x >> 11;
    x = x.wrapping_mul(0xac4c_1b51);
    x ^= x >> 15;
    x = x.wrapping_mul(0x3184_8bab);
    x ^= x >> 14;
    x
}

/// CPU mirror of the WGSL `rand` function: float in `[0, 1)`.
#[inline]
pub fn rand(seed: u32) -> f32 {
    hash(seed) as f32 / 4294967295.0
}

/// CPU mirror of the WGSL `rand_vec3` function.
#[inline]
pub fn rand_vec3(seed: u32) -> glam::Vec3 {
    glam::Vec3::new(
        rand(seed) * 2.0 - 1.0,
        rand(seed.wrapping_add(1)) * 2.0 - 1.0,
        rand(seed.wrapping_add(2)) * 2.0 - 1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash(42), hash(42));
        assert_ne!(hash(42), hash(43));
    }

    #[test]
    fn test_rand_in_unit_range() {
        for seed in 0..1000 {
            let r = rand(seed);
            assert!((0.0..=1.0).contains(&r), "rand({seed}) = {r}");
        }
    }

    #[test]
    fn test_rand_vec3_components_bounded() {
        for seed in 0..100 {
            let v = rand_vec3(seed * 3);
            assert!(v.abs().max_element() <= 1.0);
        }
    }
}
