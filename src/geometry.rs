// Geometry primitives: vectors and circles in the shared coordinate space.
//
// Everything here is pure math. Tolerances are passed explicitly so the
// layout config stays the single source of truth for epsilons.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector pointing from `from` to `to`.
    pub fn between(from: Vector, to: Vector) -> Vector {
        to - from
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Unit vector in the same direction. The zero vector maps to the x axis
    /// so callers always get a usable direction.
    pub fn normalized(&self) -> Vector {
        let len = self.length();
        if len <= f64::EPSILON {
            Vector::new(1.0, 0.0)
        } else {
            Vector::new(self.x / len, self.y / len)
        }
    }

    pub fn scaled(&self, factor: f64) -> Vector {
        Vector::new(self.x * factor, self.y * factor)
    }

    /// Rotate counter-clockwise by `angle` radians.
    pub fn rotated(&self, angle: f64) -> Vector {
        let (sin, cos) = angle.sin_cos();
        Vector::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    pub fn distance(&self, other: Vector) -> f64 {
        (*self - other).length()
    }
}

impl Add for Vector {
    type Output = Vector;
    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector {
    type Output = Vector;
    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;
    fn mul(self, rhs: f64) -> Vector {
        self.scaled(rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;
    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

impl Circle {
    pub const fn new(x: f64, y: f64, r: f64) -> Self {
        Self { x, y, r }
    }

    pub fn at(center: Vector, r: f64) -> Self {
        Self { x: center.x, y: center.y, r }
    }

    pub fn center(&self) -> Vector {
        Vector::new(self.x, self.y)
    }

    pub fn translated(&self, delta: Vector) -> Circle {
        Circle::new(self.x + delta.x, self.y + delta.y, self.r)
    }

    pub fn inflated(&self, by: f64) -> Circle {
        Circle::new(self.x, self.y, self.r + by)
    }

    /// True if `other` lies completely inside this circle (up to `eps`).
    pub fn contains(&self, other: &Circle, eps: f64) -> bool {
        self.center().distance(other.center()) + other.r <= self.r + eps
    }

    /// True if the two circles intersect by more than `eps`.
    /// Touching circles do not overlap.
    pub fn overlaps(&self, other: &Circle, eps: f64) -> bool {
        self.center().distance(other.center()) < self.r + other.r - eps
    }

    /// Closest point on the rim to `point`.
    pub fn project_onto_rim(&self, point: Vector) -> Vector {
        let dir = Vector::between(self.center(), point).normalized();
        self.center() + dir * self.r
    }

    /// Smallest circle enclosing both `a` and `b`.
    pub fn enclose_pair(a: &Circle, b: &Circle) -> Circle {
        let d = a.center().distance(b.center());
        if d + b.r <= a.r {
            return *a;
        }
        if d + a.r <= b.r {
            return *b;
        }
        let r = (d + a.r + b.r) / 2.0;
        let dir = Vector::between(a.center(), b.center()).normalized();
        Circle::at(a.center() + dir * (r - a.r), r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_vector_arithmetic() {
        let a = Vector::new(1.0, 2.0);
        let b = Vector::new(4.0, 6.0);
        assert_eq!(Vector::between(a, b), Vector::new(3.0, 4.0));
        assert_eq!(Vector::between(a, b).length(), 5.0);
        assert_eq!(a + b, Vector::new(5.0, 8.0));
        assert_eq!(-a * 2.0, Vector::new(-2.0, -4.0));
    }

    #[test]
    fn test_normalized_zero_vector_is_usable() {
        assert_eq!(Vector::ZERO.normalized(), Vector::new(1.0, 0.0));
        let n = Vector::new(0.0, -3.0).normalized();
        assert!((n.y + 1.0).abs() < EPS);
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let v = Vector::new(1.0, 0.0).rotated(std::f64::consts::FRAC_PI_2);
        assert!(v.x.abs() < EPS);
        assert!((v.y - 1.0).abs() < EPS);
    }

    #[test]
    fn test_contains_and_overlaps() {
        let big = Circle::new(0.0, 0.0, 10.0);
        let inner = Circle::new(3.0, 0.0, 7.0);
        let outside = Circle::new(20.0, 0.0, 5.0);
        let touching = Circle::new(15.0, 0.0, 5.0);

        assert!(big.contains(&inner, EPS));
        assert!(!big.contains(&outside, EPS));
        assert!(big.overlaps(&inner, EPS));
        assert!(!big.overlaps(&outside, EPS));
        assert!(!big.overlaps(&touching, EPS));
        assert!(!touching.overlaps(&big, EPS));
    }

    #[test]
    fn test_projection() {
        let c = Circle::new(0.0, 0.0, 10.0);
        assert_eq!(c.project_onto_rim(Vector::new(3.0, 0.0)), Vector::new(10.0, 0.0));
    }

    #[test]
    fn test_enclose_pair() {
        let a = Circle::new(0.0, 0.0, 10.0);
        let b = Circle::new(30.0, 0.0, 5.0);
        let e = Circle::enclose_pair(&a, &b);
        assert!((e.r - 22.5).abs() < EPS);
        assert!((e.x - 12.5).abs() < EPS);
        assert!(e.contains(&a, 1e-6));
        assert!(e.contains(&b, 1e-6));

        // One circle already inside the other
        let small = Circle::new(1.0, 1.0, 2.0);
        assert_eq!(Circle::enclose_pair(&a, &small), a);
        assert_eq!(Circle::enclose_pair(&small, &a), a);
    }
}
