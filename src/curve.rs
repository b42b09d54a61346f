//! Piecewise-linear keyframe curves.
//!
//! Curves map normalized particle lifetime (`age` in `[0, 1]`) to a value
//! and are used for velocity-over-lifetime and rotation-over-lifetime
//! modulation. Evaluation is a pure function: both physics backends can
//! sample the same curve independently and get the same answer.
//!
//! # Example
//!
//! ```ignore
//! // Particles speed up over the first fifth of their life, then coast.
//! let curve = Curve::new(vec![(0.0, 0.2), (0.2, 1.0), (1.0, 1.0)]);
//! assert_eq!(curve.evaluate(0.1, 1.0), 0.6);
//! ```

/// An ordered list of `(time, value)` keyframes, monotonic in time,
/// linearly interpolated between adjacent keys and clamped outside `[0, 1]`.
///
/// An empty curve is "disabled": it evaluates to a caller-supplied default
/// rather than failing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Curve {
    keys: Vec<(f32, f32)>,
}

impl Curve {
    /// Build a curve from keyframes. Keys are sorted by time so callers may
    /// supply them in any order.
    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    /// A curve that evaluates to `value` everywhere.
    pub fn constant(value: f32) -> Self {
        Self {
            keys: vec![(0.0, value)],
        }
    }

    /// Whether the curve has no keyframes (disabled).
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The keyframes, sorted by time.
    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }

    /// Evaluate the curve at `t`.
    ///
    /// - zero keyframes: returns `default`
    /// - one keyframe: returns that constant
    /// - two or more: linear interpolation between the bracketing keys;
    ///   `t` outside the key range clamps to the nearest endpoint
    ///
    /// Evaluation at a keyframe's exact time returns that keyframe's value
    /// exactly.
    pub fn evaluate(&self, t: f32, default: f32) -> f32 {
        let keys = &self.keys;
        match keys.len() {
            0 => return default,
            1 => return keys[0].1,
            _ => {}
        }

        if t <= keys[0].0 {
            return keys[0].1;
        }
        let last = keys[keys.len() - 1];
        if t >= last.0 {
            return last.1;
        }

        for pair in keys.windows(2) {
            let (t0, v0) = pair[0];
            let (t1, v1) = pair[1];
            if t == t0 {
                return v0;
            }
            if t < t1 {
                let span = t1 - t0;
                if span <= 0.0 {
                    // Duplicate key times behave as a step.
                    return v1;
                }
                let f = (t - t0) / span;
                return v0 + (v1 - v0) * f;
            }
        }
        last.1
    }

    /// Generate a WGSL function `fn {name}(t: f32) -> f32` evaluating this
    /// curve with the same clamping semantics as [`Curve::evaluate`].
    ///
    /// The keyframes are baked into an if-chain, so the kernel pays only
    /// for the keys it actually has. An empty curve bakes the `default`.
    pub fn to_wgsl_fn(&self, name: &str, default: f32) -> String {
        let keys = &self.keys;
        if keys.is_empty() {
            return format!(
                "fn {name}(t: f32) -> f32 {{\n    return {default:?};\n}}\n"
            );
        }
        if keys.len() == 1 {
            let v = keys[0].1;
            return format!("fn {name}(t: f32) -> f32 {{\n    return {v:?};\n}}\n");
        }

        let mut body = String::new();
        let (t0, v0) = keys[0];
        body.push_str(&format!("    if t <= {t0:?} {{ return {v0:?}; }}\n"));
        for pair in keys.windows(2) {
            let (ta, va) = pair[0];
            let (tb, vb) = pair[1];
            let span = tb - ta;
            if span <= 0.0 {
                continue;
            }
            body.push_str(&format!(
                "    if t < {tb:?} {{ return mix({va:?}, {vb:?}, (t - {ta:?}) / {span:?}); }}\n"
            ));
        }
        let vn = keys[keys.len() - 1].1;
        body.push_str(&format!("    return {vn:?};\n"));
        format!("fn {name}(t: f32) -> f32 {{\n{body}}}\n")
    }
}

/// Velocity-over-lifetime modulation: either one uniform scalar curve
/// multiplying all axes, or three independent per-axis curves.
///
/// The two shapes flatten differently into the kernel; each backend does
/// its own flattening so the wire layout never leaks into this type.
#[derive(Clone, Debug, PartialEq)]
pub enum VelocityCurve {
    /// One scalar curve multiplying all three velocity axes.
    Uniform(Curve),
    /// Independent curves per axis.
    PerAxis { x: Curve, y: Curve, z: Curve },
}

impl VelocityCurve {
    /// Evaluate the per-axis multipliers at `t`. Disabled (empty) curves
    /// contribute a multiplier of 1.
    pub fn evaluate(&self, t: f32) -> [f32; 3] {
        match self {
            VelocityCurve::Uniform(c) => {
                let s = c.evaluate(t, 1.0);
                [s, s, s]
            }
            VelocityCurve::PerAxis { x, y, z } => {
                [x.evaluate(t, 1.0), y.evaluate(t, 1.0), z.evaluate(t, 1.0)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_curve_returns_default() {
        let c = Curve::default();
        assert_eq!(c.evaluate(0.5, 7.25), 7.25);
        assert!(c.is_empty());
    }

    #[test]
    fn test_single_key_is_constant() {
        let c = Curve::constant(3.5);
        assert_eq!(c.evaluate(0.0, 0.0), 3.5);
        assert_eq!(c.evaluate(1.0, 0.0), 3.5);
    }

    #[test]
    fn test_linear_interpolation() {
        let c = Curve::new(vec![(0.0, 0.0), (1.0, 2.0)]);
        assert_eq!(c.evaluate(0.25, 0.0), 0.5);
        assert_eq!(c.evaluate(0.5, 0.0), 1.0);
    }

    #[test]
    fn test_exact_key_value() {
        let c = Curve::new(vec![(0.0, 1.0), (0.3, 5.0), (1.0, 2.0)]);
        assert_eq!(c.evaluate(0.0, 0.0), 1.0);
        assert_eq!(c.evaluate(0.3, 0.0), 5.0);
        assert_eq!(c.evaluate(1.0, 0.0), 2.0);
    }

    #[test]
    fn test_clamps_outside_range() {
        let c = Curve::new(vec![(0.2, 1.0), (0.8, 3.0)]);
        assert_eq!(c.evaluate(0.0, 0.0), 1.0);
        assert_eq!(c.evaluate(-5.0, 0.0), 1.0);
        assert_eq!(c.evaluate(1.0, 0.0), 3.0);
    }

    #[test]
    fn test_idempotent_evaluation() {
        let c = Curve::new(vec![(0.0, 0.1), (0.4, 2.0), (1.0, 0.5)]);
        for i in 0..=100 {
            let t = i as f32 / 100.0;
            assert_eq!(c.evaluate(t, 0.0), c.evaluate(t, 0.0));
        }
    }

    #[test]
    fn test_unsorted_keys_are_sorted() {
        let c = Curve::new(vec![(1.0, 2.0), (0.0, 0.0)]);
        assert_eq!(c.evaluate(0.5, 0.0), 1.0);
    }

    #[test]
    fn test_velocity_curve_uniform() {
        let vc = VelocityCurve::Uniform(Curve::constant(0.5));
        assert_eq!(vc.evaluate(0.3), [0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_velocity_curve_per_axis_empty_axis_is_one() {
        let vc = VelocityCurve::PerAxis {
            x: Curve::constant(2.0),
            y: Curve::default(),
            z: Curve::constant(0.0),
        };
        assert_eq!(vc.evaluate(0.5), [2.0, 1.0, 0.0]);
    }

    #[test]
    fn test_wgsl_fn_shapes() {
        let empty = Curve::default().to_wgsl_fn("eval_rot", 0.0);
        assert!(empty.contains("return 0.0;"));

        let single = Curve::constant(4.0).to_wgsl_fn("eval_rot", 0.0);
        assert!(single.contains("return 4.0;"));

        let multi = Curve::new(vec![(0.0, 1.0), (1.0, 3.0)]).to_wgsl_fn("eval_rot", 0.0);
        assert!(multi.contains("mix(1.0, 3.0,"));
        assert!(multi.contains("if t <= 0.0"));
    }
}
