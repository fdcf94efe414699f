//! Minimal 3-float vector used during vertex generation.

/// Plain 3-component vector; arithmetic lives in free functions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Float3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Unit up vector, also the fallback for degenerate normals.
pub const UP: Float3 = Float3::new(0.0, 1.0, 0.0);

impl Float3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Float3 {
    fn from(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }
}

pub fn add(a: Float3, b: Float3) -> Float3 {
    Float3::new(a.x + b.x, a.y + b.y, a.z + b.z)
}

pub fn sub(a: Float3, b: Float3) -> Float3 {
    Float3::new(a.x - b.x, a.y - b.y, a.z - b.z)
}

pub fn scale(a: Float3, s: f32) -> Float3 {
    Float3::new(a.x * s, a.y * s, a.z * s)
}

pub fn dot(a: Float3, b: Float3) -> f32 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

pub fn cross(a: Float3, b: Float3) -> Float3 {
    Float3::new(
        a.y * b.z - a.z * b.y,
        a.z * b.x - a.x * b.z,
        a.x * b.y - a.y * b.x,
    )
}

pub fn length(a: Float3) -> f32 {
    dot(a, a).sqrt()
}

/// Unit vector along `a`, or [`UP`] when `a` has no usable direction.
pub fn normalize(a: Float3) -> Float3 {
    let len = length(a);
    if len.is_finite() && len > f32::EPSILON {
        scale(a, 1.0 / len)
    } else {
        UP
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_follows_right_hand_rule() {
        let x = Float3::new(1.0, 0.0, 0.0);
        let y = Float3::new(0.0, 1.0, 0.0);
        assert_eq!(cross(x, y), Float3::new(0.0, 0.0, 1.0));
        assert_eq!(dot(cross(x, y), x), 0.0);
    }

    #[test]
    fn test_normalize_and_fallback() {
        let n = normalize(Float3::new(3.0, 0.0, 4.0));
        assert!((length(n) - 1.0).abs() < 1e-6);
        assert!((n.x - 0.6).abs() < 1e-6);
        assert_eq!(normalize(Float3::default()), UP);
        assert_eq!(normalize(Float3::new(f32::NAN, 1.0, 0.0)), UP);
    }

    #[test]
    fn test_add_sub_scale() {
        let a = Float3::new(1.0, 2.0, 3.0);
        let b = Float3::from([0.5, 0.5, 0.5]);
        assert_eq!(add(a, b), Float3::new(1.5, 2.5, 3.5));
        assert_eq!(sub(a, b), Float3::new(0.5, 1.5, 2.5));
        assert_eq!(scale(a, 2.0).to_array(), [2.0, 4.0, 6.0]);
    }
}
