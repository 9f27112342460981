/// A named city on the Euclidean plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    id: String,
    x: f64,
    y: f64,
}

impl Point {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn distance_from(&self, other: &Point) -> f64 {
        ((other.y - self.y).powi(2) + (other.x - self.x).powi(2)).sqrt()
    }
}
