// THEORY:
// A `Region` is the boundary of one connected cluster of foreground pixels, kept
// as the ordered polygon produced by border following. It is a "dumb" data
// container that only knows how to summarize its own geometry. Regions are
// rebuilt from scratch every frame and never outlive it.

/// A pixel position on a region boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionPoint {
    pub x: i32,
    pub y: i32,
}

impl RegionPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The closed boundary polygon of one foreground blob.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Boundary pixels in traversal order. The polygon closes implicitly.
    points: Vec<RegionPoint>,
}

impl Region {
    pub fn new(points: Vec<RegionPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[RegionPoint] {
        &self.points
    }

    /// Number of boundary pixels.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Enclosed polygon area by the shoelace formula. Always non-negative;
    /// fewer than three points enclose nothing.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }

        let mut twice_area = 0i64;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
        }
        (twice_area as f64 / 2.0).abs()
    }
}
