//! Collision primitives and response.
//!
//! Collision is a parallel-backend feature: the sequential fallback reports
//! `supports_collision() == false` and skips it entirely. The configured
//! primitive is tested against each particle's integrated position and the
//! response is baked into the step kernel as WGSL.
//!
//! # Example
//!
//! ```ignore
//! // Sparks bounce off the ground plane, losing half their energy.
//! let collision = CollisionConfig::plane(Vec3::ZERO, Vec3::Y)
//!     .response(CollisionResponse::Bounce)
//!     .bounciness(0.5)
//!     .bounce_chance(1.0);
//! ```

use glam::Vec3;

/// The collision primitive particles are tested against.
#[derive(Clone, Debug, PartialEq)]
pub enum CollisionShape {
    /// Infinite plane through `point` with unit `normal`; the half-space
    /// behind the normal is solid.
    Plane { point: Vec3, normal: Vec3 },
    /// Solid sphere; particles inside it are in violation.
    Sphere { center: Vec3, radius: f32 },
    /// Solid axis-aligned box; particles inside it are in violation.
    Box { min: Vec3, max: Vec3 },
}

/// What happens to a particle that violates the collision primitive.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CollisionResponse {
    /// Zero the particle's remaining life. It is not captured for
    /// sub-emission.
    #[default]
    Kill,
    /// Reflect velocity about the surface normal: normal component scaled
    /// by `bounciness`, tangential component by `1 - friction`, direction
    /// optionally jittered up to `bounce_spread`.
    Bounce,
}

/// Collision configuration for one particle system.
///
/// `bounce_chance` is the probability a qualifying collision actually
/// bounces; a failed roll kills the particle instead, which keeps particles
/// from tunneling forever along a chance boundary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionConfig {
    /// Primitive to test against; `None` disables collision entirely.
    pub shape: Option<CollisionShape>,
    /// Response on violation.
    pub response: CollisionResponse,
    /// Scale applied to the reflected normal speed.
    pub bounciness: f32,
    /// Fraction of tangential speed removed per bounce.
    pub friction: f32,
    /// Probability in `[0, 1]` that a collision bounces rather than kills.
    pub bounce_chance: f32,
    /// Magnitude of the random angular jitter added to the reflected
    /// direction.
    pub bounce_spread: f32,
}

impl CollisionConfig {
    /// Collision disabled.
    pub fn none() -> Self {
        Self::default()
    }

    /// Collide against an infinite plane. The normal is normalized here so
    /// the kernel never has to.
    pub fn plane(point: Vec3, normal: Vec3) -> Self {
        Self {
            shape: Some(CollisionShape::Plane {
                point,
                normal: normal.normalize_or(Vec3::Y),
            }),
            response: CollisionResponse::Bounce,
            bounciness: 1.0,
            friction: 0.0,
            bounce_chance: 1.0,
            bounce_spread: 0.0,
        }
    }

    /// Collide against a solid sphere.
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self {
            shape: Some(CollisionShape::Sphere { center, radius }),
            ..Self::plane(Vec3::ZERO, Vec3::Y)
        }
    }

    /// Collide against a solid axis-aligned box.
    pub fn aabb(min: Vec3, max: Vec3) -> Self {
        Self {
            shape: Some(CollisionShape::Box { min, max }),
            ..Self::plane(Vec3::ZERO, Vec3::Y)
        }
    }

    /// Set the response mode.
    pub fn response(mut self, response: CollisionResponse) -> Self {
        self.response = response;
        self
    }

    /// Set the reflected-speed scale.
    pub fn bounciness(mut self, bounciness: f32) -> Self {
        self.bounciness = bounciness;
        self
    }

    /// Set the tangential friction.
    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction.clamp(0.0, 1.0);
        self
    }

    /// Set the bounce probability.
    pub fn bounce_chance(mut self, chance: f32) -> Self {
        self.bounce_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Set the random angular jitter added to bounces.
    pub fn bounce_spread(mut self, spread: f32) -> Self {
        self.bounce_spread = spread.max(0.0);
        self
    }

    /// Whether any collision work is configured.
    pub fn is_enabled(&self) -> bool {
        self.shape.is_some()
    }

    /// Generate the WGSL collision block for the step kernel, or an empty
    /// string when disabled. Assumes `p`, `index` and `sim` are in scope.
    ///
    /// The shape code establishes `coll_n` (surface normal) and `coll_d`
    /// (signed distance, negative on violation); the response code is shared
    /// across shapes.
    pub fn to_wgsl(&self) -> String {
        let Some(shape) = &self.shape else {
            return String::new();
        };

        let response = self.response_wgsl();
        match shape {
            CollisionShape::Plane { point, normal } => format!(
                r#"    // Collision: infinite plane
    {{
        let coll_n = vec3<f32>({:?}, {:?}, {:?});
        let coll_d = dot(p.position - vec3<f32>({:?}, {:?}, {:?}), coll_n);
        if coll_d < 0.0 {{
{response}
        }}
    }}"#,
                normal.x, normal.y, normal.z, point.x, point.y, point.z
            ),

            CollisionShape::Sphere { center, radius } => format!(
                r#"    // Collision: solid sphere
    {{
        let coll_rel = p.position - vec3<f32>({:?}, {:?}, {:?});
        let coll_dist = length(coll_rel);
        if coll_dist < {radius:?} {{
            var coll_n = vec3<f32>(0.0, 1.0, 0.0);
            if coll_dist > 0.0001 {{
                coll_n = coll_rel / coll_dist;
            }}
            let coll_d = coll_dist - {radius:?};
{response}
        }}
    }}"#,
                center.x, center.y, center.z
            ),

            CollisionShape::Box { min, max } => format!(
                r#"    // Collision: solid axis-aligned box
    {{
        let coll_min = vec3<f32>({:?}, {:?}, {:?});
        let coll_max = vec3<f32>({:?}, {:?}, {:?});
        if all(p.position > coll_min) && all(p.position < coll_max) {{
            // Push out through the nearest face.
            let to_min = p.position - coll_min;
            let to_max = coll_max - p.position;
            var coll_n = vec3<f32>(-1.0, 0.0, 0.0);
            var coll_pen = to_min.x;
            if to_max.x < coll_pen {{ coll_pen = to_max.x; coll_n = vec3<f32>(1.0, 0.0, 0.0); }}
            if to_min.y < coll_pen {{ coll_pen = to_min.y; coll_n = vec3<f32>(0.0, -1.0, 0.0); }}
            if to_max.y < coll_pen {{ coll_pen = to_max.y; coll_n = vec3<f32>(0.0, 1.0, 0.0); }}
            if to_min.z < coll_pen {{ coll_pen = to_min.z; coll_n = vec3<f32>(0.0, 0.0, -1.0); }}
            if to_max.z < coll_pen {{ coll_pen = to_max.z; coll_n = vec3<f32>(0.0, 0.0, 1.0); }}
            let coll_d = -coll_pen;
{response}
        }}
    }}"#,
                min.x, min.y, min.z, max.x, max.y, max.z
            ),
        }
    }

    fn response_wgsl(&self) -> String {
        match self.response {
            CollisionResponse::Kill => "            p.remaining_life = 0.0;".to_string(),
            CollisionResponse::Bounce => {
                let spread = if self.bounce_spread > 0.0 {
                    format!(
                        r#"
                let bounce_speed = length(bounced);
                if bounce_speed > 0.0001 {{
                    let jitter = rand_vec3(index * 7u + sim.frame_seed * 0xc2b2ae35u) * {:?};
                    bounced = normalize(bounced / bounce_speed + jitter) * bounce_speed;
                }}"#,
                        self.bounce_spread
                    )
                } else {
                    String::new()
                };
                format!(
                    r#"            let bounce_roll = rand(index * 5u + sim.frame_seed * 0x85ebca6bu);
            if bounce_roll > {chance:?} {{
                p.remaining_life = 0.0;
            }} else {{
                p.position -= coll_n * coll_d;
                let coll_vn = dot(p.velocity, coll_n);
                let coll_tangent = p.velocity - coll_vn * coll_n;
                var bounced = coll_n * (-coll_vn * {bounciness:?}) + coll_tangent * (1.0 - {friction:?});{spread}
                p.velocity = bounced;
            }}"#,
                    chance = self.bounce_chance,
                    bounciness = self.bounciness,
                    friction = self.friction,
                )
            }
        }
    }
}
