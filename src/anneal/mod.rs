pub use annealer::{acceptance_probability, Annealed, Annealer};
pub use error::SolveError;
pub use point::Point;
pub use problem::Problem;
pub use random::RandomSource;
pub use schedule::CoolingSchedule;
pub use tour::Tour;

mod annealer;
mod error;
mod point;
mod problem;
mod random;
mod schedule;
mod tour;
