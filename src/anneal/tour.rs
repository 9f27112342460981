use std::fmt;

use super::point::Point;

/// A cyclic visiting order over a borrowed set of cities.
///
/// Tours are values: moves build a fresh tour and leave the original alone,
/// so a rejected candidate is simply dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Tour<'a> {
    order: Vec<&'a Point>,
}

impl<'a> Tour<'a> {
    /// Visits `points` in the order they are given.
    pub fn new(points: &'a [Point]) -> Self {
        Self {
            order: points.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &'a Point> + '_ {
        self.order.iter().copied()
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.points().map(Point::id).collect()
    }

    /// Total length of the closed cycle, including the edge from the last
    /// city back to the first.
    pub fn cost(&self) -> f64 {
        self.order
            .iter()
            .zip(self.order.iter().cycle().skip(1))
            .fold(0.0, |acc, (a, b)| acc + a.distance_from(b))
    }

    /// The neighbor of this tour with positions `i` and `j` exchanged.
    pub fn swap_neighbor(&self, i: usize, j: usize) -> Tour<'a> {
        debug_assert!(i != j, "swap positions must differ");
        debug_assert!(i < self.len() && j < self.len());

        let mut order = self.order.clone();
        order.swap(i, j);
        Tour { order }
    }
}

impl fmt::Display for Tour<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = match self.order.first() {
            Some(first) => first,
            None => return Ok(()),
        };

        if self.order.len() == 1 {
            return write!(f, "{}", first.id());
        }

        for point in &self.order {
            write!(f, "{}:", point.id())?;
        }
        write!(f, "{}", first.id())
    }
}
