use std::fmt;

use serde::{Deserialize, Serialize};

/// Leftmost x a node may occupy.
pub const MIN_X: i32 = 5;
/// Rightmost x a node may occupy.
pub const MAX_X: i32 = 234;
/// Topmost y a node may occupy. The band above it is reserved for the HUD.
pub const MIN_Y: i32 = 41;
/// Bottommost y a node may occupy.
pub const MAX_Y: i32 = 234;

/// A screen coordinate in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether the point lies inside the playfield (bounds inclusive).
    pub fn in_playfield(self) -> bool {
        (MIN_X..=MAX_X).contains(&self.x) && (MIN_Y..=MAX_Y).contains(&self.y)
    }

    /// Squared euclidean distance, widened so it cannot overflow.
    pub fn distance_sq(self, other: Point) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Turn direction of an ordered point triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

/// Orientation of the triple `(p, q, r)`.
///
/// Computed from the sign of `(q.y - p.y)(r.x - q.x) - (q.x - p.x)(r.y - q.y)`
/// in 64-bit integers: zero is collinear, positive clockwise, negative
/// counter-clockwise.
pub fn orientation(p: Point, q: Point, r: Point) -> Orientation {
    let val = (q.y as i64 - p.y as i64) * (r.x as i64 - q.x as i64)
        - (q.x as i64 - p.x as i64) * (r.y as i64 - q.y as i64);
    match val.signum() {
        0 => Orientation::Collinear,
        1 => Orientation::Clockwise,
        _ => Orientation::CounterClockwise,
    }
}

/// Whether `q` lies within the bounding box of segment `p`-`r`.
///
/// Only meaningful once [`orientation`] has reported the three points collinear.
pub fn on_segment(p: Point, q: Point, r: Point) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Whether segment `p1`-`q1` and segment `p2`-`q2` cross or touch.
pub fn segments_intersect(p1: Point, q1: Point, p2: Point, q2: Point) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    // Collinear endpoint lying on the other segment.
    (o1 == Orientation::Collinear && on_segment(p1, p2, q1))
        || (o2 == Orientation::Collinear && on_segment(p1, q2, q1))
        || (o3 == Orientation::Collinear && on_segment(p2, p1, q2))
        || (o4 == Orientation::Collinear && on_segment(p2, q1, q2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn collinear_diagonal() {
        assert_eq!(orientation(p(0, 0), p(1, 1), p(2, 2)), Orientation::Collinear);
    }

    #[test]
    fn orientation_turns() {
        // Positive cross term is clockwise.
        assert_eq!(
            orientation(p(0, 0), p(4, 4), p(1, 2)),
            Orientation::CounterClockwise
        );
        assert_eq!(orientation(p(0, 0), p(4, 4), p(2, 1)), Orientation::Clockwise);
    }

    #[test]
    fn classic_x_crossing() {
        assert!(segments_intersect(p(0, 0), p(2, 2), p(0, 2), p(2, 0)));
    }

    #[test]
    fn parallel_segments_do_not_cross() {
        assert!(!segments_intersect(p(0, 0), p(10, 0), p(0, 5), p(10, 5)));
    }

    #[test]
    fn collinear_overlap_counts() {
        assert!(segments_intersect(p(0, 0), p(10, 0), p(5, 0), p(15, 0)));
    }

    #[test]
    fn collinear_disjoint_does_not_count() {
        assert!(!segments_intersect(p(0, 0), p(4, 0), p(5, 0), p(9, 0)));
    }

    #[test]
    fn endpoint_touching_counts() {
        // T-junction: the second segment ends on the first.
        assert!(segments_intersect(p(0, 0), p(10, 0), p(5, 0), p(5, 8)));
    }

    #[test]
    fn on_segment_bounding_box() {
        assert!(on_segment(p(0, 0), p(3, 3), p(5, 5)));
        assert!(!on_segment(p(0, 0), p(6, 6), p(5, 5)));
    }

    #[test]
    fn playfield_bounds_inclusive() {
        assert!(p(MIN_X, MIN_Y).in_playfield());
        assert!(p(MAX_X, MAX_Y).in_playfield());
        assert!(!p(MIN_X - 1, 100).in_playfield());
        assert!(!p(100, MIN_Y - 1).in_playfield());
        assert!(!p(MAX_X + 1, 100).in_playfield());
    }

    #[test]
    fn distance_is_squared() {
        assert_eq!(p(0, 0).distance_sq(p(3, 4)), 25);
    }

    fn coord() -> impl Strategy<Value = i32> {
        0..256i32
    }

    fn point() -> impl Strategy<Value = Point> {
        (coord(), coord()).prop_map(|(x, y)| Point::new(x, y))
    }

    proptest! {
        #[test]
        fn intersection_is_symmetric(a in point(), b in point(), c in point(), d in point()) {
            let forward = segments_intersect(a, b, c, d);
            prop_assert_eq!(forward, segments_intersect(c, d, a, b));
            prop_assert_eq!(forward, segments_intersect(b, a, c, d));
            prop_assert_eq!(forward, segments_intersect(a, b, d, c));
        }

        #[test]
        fn swapping_ends_flips_orientation(a in point(), b in point(), c in point()) {
            let o = orientation(a, b, c);
            let flipped = orientation(c, b, a);
            let expected = match o {
                Orientation::Collinear => Orientation::Collinear,
                Orientation::Clockwise => Orientation::CounterClockwise,
                Orientation::CounterClockwise => Orientation::Clockwise,
            };
            prop_assert_eq!(flipped, expected);
        }

        #[test]
        fn shared_endpoint_always_touches(a in point(), b in point(), c in point()) {
            prop_assert!(segments_intersect(a, b, b, c));
        }
    }
}
