//! Integer board coordinates
//!
//! Board geometry is stored in integer nanometres. Angles are degrees; a positive angle
//! turns counterclockwise as seen on the board, whose Y axis points down.

use std::ops::{Add, AddAssign, Neg, Sub};

use copper_core::Point;
use serde::{Deserialize, Serialize};

/// Point in board units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntPoint {
    pub x: i32,
    pub y: i32,
}

impl IntPoint {
    pub const ZERO: IntPoint = IntPoint { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Rotate around the origin by `degrees`
    pub fn rotated(self, degrees: f64) -> Self {
        if degrees == 0.0 {
            return self;
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (x, y) = (f64::from(self.x), f64::from(self.y));
        Self::new(round(x * cos + y * sin), round(y * cos - x * sin))
    }

    /// Rotate around `center` by `degrees`
    pub fn rotated_around(self, center: IntPoint, degrees: f64) -> Self {
        (self - center).rotated(degrees) + center
    }

    pub fn distance(self, other: IntPoint) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        dx.hypot(dy)
    }

    /// Direction from `self` to `other` in degrees, measured in board axes (Y down)
    pub fn angle_to(self, other: IntPoint) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        dy.atan2(dx).to_degrees()
    }

    pub fn to_point(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }
}

impl Add for IntPoint {
    type Output = IntPoint;

    fn add(self, rhs: IntPoint) -> IntPoint {
        IntPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for IntPoint {
    fn add_assign(&mut self, rhs: IntPoint) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for IntPoint {
    type Output = IntPoint;

    fn sub(self, rhs: IntPoint) -> IntPoint {
        IntPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for IntPoint {
    type Output = IntPoint;

    fn neg(self) -> IntPoint {
        IntPoint::new(-self.x, -self.y)
    }
}

/// Size in board units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntSize {
    pub x: i32,
    pub y: i32,
}

impl IntSize {
    pub const ZERO: IntSize = IntSize { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn min_dimension(self) -> i32 {
        self.x.min(self.y)
    }
}

/// Round to the nearest board unit, saturating at the `i32` range
pub fn round(value: f64) -> i32 {
    value.round() as i32
}
