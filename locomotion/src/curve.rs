/*!
Piecewise-linear curves sampled by the locomotion core.

Curves are authored as `[time, value]` key lists (TOML arrays) and are kept
sorted by time. Sampling clamps to the first and last keys.
*/

use serde::Deserialize;

use crate::math::Vec3;

fn sample_keys<V: Copy>(keys: &[(f32, V)], t: f32, lerp: impl Fn(V, V, f32) -> V) -> Option<V> {
    let first = keys.first()?;
    let last = keys.last()?;
    if t <= first.0 {
        return Some(first.1);
    }
    if t >= last.0 {
        return Some(last.1);
    }
    let upper = keys.partition_point(|(time, _)| *time <= t);
    let (t0, v0) = keys[upper - 1];
    let (t1, v1) = keys[upper];
    let span = t1 - t0;
    if span <= f32::EPSILON {
        return Some(v1);
    }
    Some(lerp(v0, v1, (t - t0) / span))
}

fn sorted<V>(mut keys: Vec<(f32, V)>) -> Vec<(f32, V)> {
    keys.sort_by(|a, b| a.0.total_cmp(&b.0));
    keys
}

/// Scalar curve. An empty curve samples as zero.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "Vec<(f32, f32)>")]
pub struct FloatCurve {
    keys: Vec<(f32, f32)>,
}

impl From<Vec<(f32, f32)>> for FloatCurve {
    fn from(keys: Vec<(f32, f32)>) -> Self {
        Self { keys: sorted(keys) }
    }
}

impl FloatCurve {
    pub fn new(keys: Vec<(f32, f32)>) -> Self {
        keys.into()
    }

    pub fn constant(value: f32) -> Self {
        Self::new(vec![(0.0, value)])
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn sample(&self, t: f32) -> f32 {
        sample_keys(&self.keys, t, |a, b, alpha| a + (b - a) * alpha).unwrap_or(0.0)
    }

    /// `(min, max)` key times, `(0, 0)` when empty.
    pub fn time_range(&self) -> (f32, f32) {
        match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first.0, last.0),
            _ => (0.0, 0.0),
        }
    }
}

/// Three-channel curve. An empty curve samples as the zero vector.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "Vec<(f32, [f32; 3])>")]
pub struct VectorCurve {
    keys: Vec<(f32, [f32; 3])>,
}

impl From<Vec<(f32, [f32; 3])>> for VectorCurve {
    fn from(keys: Vec<(f32, [f32; 3])>) -> Self {
        Self { keys: sorted(keys) }
    }
}

impl VectorCurve {
    pub fn new(keys: Vec<(f32, [f32; 3])>) -> Self {
        keys.into()
    }

    pub fn constant(value: [f32; 3]) -> Self {
        Self::new(vec![(0.0, value)])
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn sample(&self, t: f32) -> Vec3 {
        let v = sample_keys(&self.keys, t, |a, b, alpha| {
            [
                a[0] + (b[0] - a[0]) * alpha,
                a[1] + (b[1] - a[1]) * alpha,
                a[2] + (b[2] - a[2]) * alpha,
            ]
        })
        .unwrap_or([0.0; 3]);
        Vec3::new(v[0], v[1], v[2])
    }

    pub fn time_range(&self) -> (f32, f32) {
        match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first.0, last.0),
            _ => (0.0, 0.0),
        }
    }
}
