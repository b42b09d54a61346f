//! Force fields applied to particle velocity.
//!
//! Forces form an ordered list and are applied cumulatively per particle per
//! step, on both backends. Order matters for [`ForceField::Drag`] (it must
//! see the velocity produced by the forces before it); the additive forces
//! commute.
//!
//! Each variant knows how to apply itself on the CPU and how to generate
//! the equivalent WGSL for the step kernel. The two paths use the same
//! formulas and the same hash-based randomness (see [`crate::shader_utils`])
//! so the backends agree qualitatively.
//!
//! # Example
//!
//! ```ignore
//! let config = SystemConfig::new()
//!     .with_force(ForceField::Gravity { acceleration: Vec3::new(0.0, -9.8, 0.0) })
//!     .with_force(ForceField::Wind { velocity: Vec3::new(2.0, 0.0, 0.0) })
//!     .with_force(ForceField::Drag { coefficient: 0.5 });
//! ```

use glam::Vec3;

use crate::shader_utils::rand_vec3;

/// Softening added to the distance in the inverse-distance point force, to
/// keep the force finite near the center.
const POINT_SOFTENING: f32 = 0.01;

/// A single force field acting on particle velocity.
#[derive(Clone, Debug, PartialEq)]
pub enum ForceField {
    /// Constant acceleration, typically `(0, -9.8, 0)`.
    ///
    /// `velocity += acceleration * dt`
    Gravity {
        /// Acceleration in units per second squared.
        acceleration: Vec3,
    },

    /// Directional wind: a constant push along a fixed vector.
    ///
    /// `velocity += velocity_target * dt`
    Wind {
        /// Wind vector (direction and strength).
        velocity: Vec3,
    },

    /// Linear drag scaling velocity toward zero.
    ///
    /// `velocity *= max(0, 1 - coefficient * dt)`
    ///
    /// Applied at its position in the force list, so it damps whatever the
    /// preceding forces produced this step.
    Drag {
        /// Damping coefficient; 1.0 stops particles in roughly a second.
        coefficient: f32,
    },

    /// Attract toward (positive strength) or repel from (negative strength)
    /// a point, scaled by inverse distance with softening.
    Point {
        /// Center of attraction/repulsion.
        center: Vec3,
        /// Force magnitude; sign selects attract vs repel.
        strength: f32,
    },

    /// Pseudo-random velocity offset, hashed from the particle index and a
    /// frame-scoped seed. The seed increments once per step so repeated
    /// frames diverge, while identical seed sequences reproduce exactly.
    Turbulence {
        /// Offset magnitude.
        strength: f32,
    },
}

impl ForceField {
    /// Apply this force to `velocity` on the CPU.
    ///
    /// `slot` is the force's position in the configured list; it decorrelates
    /// the randomness of multiple turbulence fields.
    pub fn apply(
        &self,
        index: u32,
        slot: u32,
        frame_seed: u32,
        position: Vec3,
        velocity: &mut Vec3,
        dt: f32,
    ) {
        match *self {
            ForceField::Gravity { acceleration } => {
                *velocity += acceleration * dt;
            }
            ForceField::Wind { velocity: wind } => {
                *velocity += wind * dt;
            }
            ForceField::Drag { coefficient } => {
                *velocity *= (1.0 - coefficient * dt).max(0.0);
            }
            ForceField::Point { center, strength } => {
                let dir = center - position;
                let dist = dir.length();
                if dist > 0.001 {
                    *velocity += dir / dist * (strength / (dist + POINT_SOFTENING)) * dt;
                }
            }
            ForceField::Turbulence { strength } => {
                let seed = turbulence_seed(index, slot, frame_seed);
                *velocity += rand_vec3(seed) * strength * dt;
            }
        }
    }

    /// Generate the WGSL statements applying this force inside the step
    /// kernel. Assumes `p` (the particle), `index` and `sim` are in scope.
    pub fn to_wgsl(&self, slot: usize) -> String {
        match *self {
            ForceField::Gravity { acceleration } => format!(
                "    // Gravity\n    p.velocity += vec3<f32>({:?}, {:?}, {:?}) * sim.delta_time;",
                acceleration.x, acceleration.y, acceleration.z
            ),

            ForceField::Wind { velocity } => format!(
                "    // Wind\n    p.velocity += vec3<f32>({:?}, {:?}, {:?}) * sim.delta_time;",
                velocity.x, velocity.y, velocity.z
            ),

            ForceField::Drag { coefficient } => format!(
                "    // Drag\n    p.velocity *= max(0.0, 1.0 - {coefficient:?} * sim.delta_time);"
            ),

            ForceField::Point { center, strength } => format!(
                r#"    // Point attract/repel
    {{
        let point_dir = vec3<f32>({:?}, {:?}, {:?}) - p.position;
        let point_dist = length(point_dir);
        if point_dist > 0.001 {{
            p.velocity += point_dir / point_dist * ({:?} / (point_dist + {:?})) * sim.delta_time;
        }}
    }}"#,
                center.x, center.y, center.z, strength, POINT_SOFTENING
            ),

            ForceField::Turbulence { strength } => format!(
                r#"    // Turbulence
    {{
        let turb_seed = index * 3u + sim.frame_seed * 0x9e3779b9u + {slot}u;
        p.velocity += rand_vec3(turb_seed) * {strength:?} * sim.delta_time;
    }}"#
            ),
        }
    }
}

/// Seed for a turbulence lookup. Must match the WGSL expression in
/// [`ForceField::to_wgsl`] exactly.
#[inline]
fn turbulence_seed(index: u32, slot: u32, frame_seed: u32) -> u32 {
    index
        .wrapping_mul(3)
        .wrapping_add(frame_seed.wrapping_mul(0x9e37_79b9))
        .wrapping_add(slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_apply() {
        let g = ForceField::Gravity {
            acceleration: Vec3::new(0.0, -9.8, 0.0),
        };
        let mut v = Vec3::new(0.0, 5.0, 0.0);
        g.apply(0, 0, 0, Vec3::ZERO, &mut v, 0.1);
        assert!((v.y - 4.02).abs() < 1e-5);
    }

    #[test]
    fn test_wind_apply() {
        let w = ForceField::Wind {
            velocity: Vec3::new(2.0, 0.0, 0.0),
        };
        let mut v = Vec3::ZERO;
        w.apply(0, 0, 0, Vec3::ZERO, &mut v, 0.5);
        assert_eq!(v, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_drag_scales_toward_zero() {
        let d = ForceField::Drag { coefficient: 1.0 };
        let mut v = Vec3::new(4.0, 0.0, 0.0);
        d.apply(0, 0, 0, Vec3::ZERO, &mut v, 0.25);
        assert_eq!(v.x, 3.0);
    }

    #[test]
    fn test_drag_never_reverses() {
        // A huge delta time must clamp at zero, not flip the direction.
        let d = ForceField::Drag { coefficient: 1.0 };
        let mut v = Vec3::new(4.0, 0.0, 0.0);
        d.apply(0, 0, 0, Vec3::ZERO, &mut v, 10.0);
        assert_eq!(v, Vec3::ZERO);
    }

    #[test]
    fn test_drag_sees_pre_drag_velocity() {
        // Gravity then drag: drag damps the post-gravity velocity.
        let forces = [
            ForceField::Gravity {
                acceleration: Vec3::new(0.0, -10.0, 0.0),
            },
            ForceField::Drag { coefficient: 0.5 },
        ];
        let mut v = Vec3::ZERO;
        for (slot, f) in forces.iter().enumerate() {
            f.apply(0, slot as u32, 0, Vec3::ZERO, &mut v, 0.1);
        }
        // -1.0 after gravity, then scaled by (1 - 0.05).
        assert!((v.y - (-0.95)).abs() < 1e-6);
    }

    #[test]
    fn test_point_attracts_and_repels() {
        let attract = ForceField::Point {
            center: Vec3::new(1.0, 0.0, 0.0),
            strength: 1.0,
        };
        let mut v = Vec3::ZERO;
        attract.apply(0, 0, 0, Vec3::ZERO, &mut v, 0.1);
        assert!(v.x > 0.0);

        let repel = ForceField::Point {
            center: Vec3::new(1.0, 0.0, 0.0),
            strength: -1.0,
        };
        let mut v = Vec3::ZERO;
        repel.apply(0, 0, 0, Vec3::ZERO, &mut v, 0.1);
        assert!(v.x < 0.0);
    }

    #[test]
    fn test_turbulence_reproducible_per_seed() {
        let t = ForceField::Turbulence { strength: 1.0 };
        let mut a = Vec3::ZERO;
        let mut b = Vec3::ZERO;
        t.apply(7, 0, 3, Vec3::ZERO, &mut a, 0.1);
        t.apply(7, 0, 3, Vec3::ZERO, &mut b, 0.1);
        assert_eq!(a, b);

        let mut c = Vec3::ZERO;
        t.apply(7, 0, 4, Vec3::ZERO, &mut c, 0.1);
        assert_ne!(a, c);
    }

    #[test]
    fn test_wgsl_snippets() {
        let g = ForceField::Gravity {
            acceleration: Vec3::new(0.0, -9.8, 0.0),
        };
        assert!(g.to_wgsl(0).contains("-9.8"));

        let d = ForceField::Drag { coefficient: 1.5 };
        assert!(d.to_wgsl(0).contains("1.5"));
        assert!(d.to_wgsl(0).contains("p.velocity *="));

        let t = ForceField::Turbulence { strength: 2.0 };
        let wgsl = t.to_wgsl(3);
        assert!(wgsl.contains("3u"));
        assert!(wgsl.contains("rand_vec3"));
    }
}
