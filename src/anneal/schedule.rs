use strum::{Display, EnumString};

const GEOMETRIC_FACTOR: f64 = 0.9999;

/// How the temperature falls between iterations.
///
/// Parses from the CLI selector (`1`, `2`, `3`) or from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum CoolingSchedule {
    /// `t - 1`
    #[strum(to_string = "linear", serialize = "1")]
    Linear,
    /// `t * 0.9999`
    #[strum(to_string = "geometric", serialize = "2")]
    Geometric,
    /// `initial / (iteration + 1)`, ignoring the current temperature.
    #[strum(to_string = "inverse-iteration", serialize = "3")]
    InverseIteration,
}

impl CoolingSchedule {
    /// Temperature for the next iteration, given the run's starting
    /// temperature, the current temperature and the iteration that just
    /// completed.
    pub fn next(self, initial: f64, temperature: f64, iteration: u64) -> f64 {
        match self {
            CoolingSchedule::Linear => temperature - 1.0,
            CoolingSchedule::Geometric => temperature * GEOMETRIC_FACTOR,
            CoolingSchedule::InverseIteration => initial / (iteration as f64 + 1.0),
        }
    }

    /// Number of cooling steps needed to bring `initial` down to `threshold`
    /// or below. Acceptance decisions never affect this count.
    pub fn cooling_steps(self, initial: f64, threshold: f64) -> u64 {
        let mut temperature = initial;
        let mut steps = 0;
        while temperature > threshold {
            steps += 1;
            temperature = self.next(initial, temperature, steps);
        }
        steps
    }
}
