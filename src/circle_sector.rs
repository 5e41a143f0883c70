//! Angular sectors over the 16-bit polar angle ring around the depot.

/// Size of the angle ring.
const RING: i32 = 65536;

/// Arc `[start, end]` of polar angles, walked counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CircleSector {
    pub start: i32,
    pub end: i32,
}

impl CircleSector {
    /// Reduce an angle to `0..65536`.
    #[inline]
    pub fn positive_mod(i: i32) -> i32 {
        i.rem_euclid(RING)
    }

    /// Sector containing the single angle `point`.
    pub fn new(point: i32) -> Self {
        CircleSector {
            start: point,
            end: point,
        }
    }

    /// Whether `point` lies on the arc.
    pub fn is_enclosed(&self, point: i32) -> bool {
        Self::positive_mod(point - self.start) <= Self::positive_mod(self.end - self.start)
    }

    /// Grow the arc to cover `point` along the shorter side; ties extend the end.
    pub fn extend(&mut self, point: i32) {
        if !self.is_enclosed(point) {
            if Self::positive_mod(point - self.end) <= Self::positive_mod(self.start - point) {
                self.end = point;
            } else {
                self.start = point;
            }
        }
    }

    /// Whether two arcs share at least one angle.
    pub fn overlap(a: &CircleSector, b: &CircleSector) -> bool {
        Self::positive_mod(b.start - a.start) <= Self::positive_mod(a.end - a.start)
            || Self::positive_mod(a.start - b.start) <= Self::positive_mod(b.end - b.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_mod_wraps_negatives() {
        assert_eq!(CircleSector::positive_mod(-1), 65535);
        assert_eq!(CircleSector::positive_mod(65536), 0);
        assert_eq!(CircleSector::positive_mod(70000), 70000 - 65536);
    }

    #[test]
    fn test_extend_prefers_shorter_arc() {
        let mut sector = CircleSector::new(100);
        sector.extend(200);
        assert_eq!(sector, CircleSector { start: 100, end: 200 });

        // 50 is closer going backwards from the start
        sector.extend(50);
        assert_eq!(sector, CircleSector { start: 50, end: 200 });
    }

    #[test]
    fn test_extend_across_zero() {
        let mut sector = CircleSector::new(65500);
        sector.extend(30);
        assert_eq!(sector.start, 65500);
        assert_eq!(sector.end, 30);
        assert!(sector.is_enclosed(0));
        assert!(sector.is_enclosed(65535));
        assert!(!sector.is_enclosed(100));
    }

    #[test]
    fn test_overlap_disjoint_sectors() {
        let a = CircleSector { start: 0, end: 100 };
        let b = CircleSector { start: 200, end: 300 };
        assert!(!CircleSector::overlap(&a, &b));
        assert!(!CircleSector::overlap(&b, &a));

        let c = CircleSector { start: 50, end: 250 };
        assert!(CircleSector::overlap(&a, &c));
        assert!(CircleSector::overlap(&c, &b));
    }
}
