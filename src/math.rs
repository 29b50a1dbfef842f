use core::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use bytemuck::{Pod, Zeroable};

const EPSILON: f32 = 0.01;

pub(crate) fn float_equal(left: f32, right: f32) -> bool {
    let diff = left - right;
    diff < EPSILON && diff > -EPSILON
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component on the given axis, `0` for x and `1` for y.
    #[inline]
    pub fn axis(&self, axis: usize) -> f32 {
        if axis == 0 {
            self.x
        } else {
            self.y
        }
    }

    #[inline]
    pub fn axis_mut(&mut self, axis: usize) -> &mut f32 {
        if axis == 0 {
            &mut self.x
        } else {
            &mut self.y
        }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero-length input.
    #[inline]
    pub fn normalized(&self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            Self::ZERO
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    #[inline]
    pub fn dot(&self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }
}

impl From<(f32, f32)> for Vector2 {
    fn from(value: (f32, f32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl Add for Vector2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vector2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vector2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle in screen space, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_pos_size(pos: Vector2, size: Vector2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    #[inline]
    pub fn min(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> Vector2 {
        Vector2::new(self.x + self.width, self.y + self.height)
    }

    #[inline]
    pub fn size(&self) -> Vector2 {
        Vector2::new(self.width, self.height)
    }

    /// Zero or negative extent on either axis.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Edges are inclusive.
    pub fn contains(&self, point: Vector2) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Intersection of two rectangles. Disjoint inputs produce a rectangle with
    /// zero extent on the separating axis, so the result is always degenerate
    /// when either input is.
    pub fn intersect(&self, other: &BoundingBox) -> BoundingBox {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.width).min(other.x + other.width);
        let y1 = (self.y + self.height).min(other.y + other.height);
        BoundingBox::new(x0, y0, (x1 - x0).max(0.0), (y1 - y0).max(0.0))
    }

    /// Cheap rejection test used before drawing or descending into a subtree.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.x <= other.x + other.width
            && other.x <= self.x + self.width
            && self.y <= other.y + other.height
            && other.y <= self.y + self.height
    }

    pub fn approx_eq(&self, other: &BoundingBox) -> bool {
        float_equal(self.x, other.x)
            && float_equal(self.y, other.y)
            && float_equal(self.width, other.width)
            && float_equal(self.height, other.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_is_commutative_and_associative() {
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let b = BoundingBox::new(50.0, 20.0, 100.0, 30.0);
        let c = BoundingBox::new(60.0, 0.0, 10.0, 200.0);

        assert_eq!(a.intersect(&b), b.intersect(&a));
        assert_eq!(a.intersect(&b).intersect(&c), a.intersect(&b.intersect(&c)));
        assert_eq!(a.intersect(&b), BoundingBox::new(50.0, 20.0, 50.0, 30.0));
    }

    #[test]
    fn intersect_with_degenerate_is_degenerate() {
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let empty = BoundingBox::new(10.0, 10.0, 0.0, 50.0);
        assert!(a.intersect(&empty).is_degenerate());

        let disjoint = BoundingBox::new(200.0, 200.0, 10.0, 10.0);
        assert!(a.intersect(&disjoint).is_degenerate());
    }

    #[test]
    fn contains_is_edge_inclusive() {
        let r = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(Vector2::new(10.0, 30.0)));
        assert!(!r.contains(Vector2::new(9.9, 15.0)));
    }

    #[test]
    fn normalized_zero_stays_zero() {
        assert_eq!(Vector2::ZERO.normalized(), Vector2::ZERO);
        let n = Vector2::new(3.0, 4.0).normalized();
        assert!(float_equal(n.length(), 1.0));
    }
}
