use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tracing::{debug, info, trace, warn};

use super::{
    error::SolveError, point::Point, random::RandomSource, schedule::CoolingSchedule, tour::Tour,
};

const INITIAL_TEMPERATURE: f64 = 100.0;

// Below this, regressive moves are so unlikely that searching on is pointless.
const STOP_TEMPERATURE: f64 = 0.05;

/// Probability of moving to a candidate whose cost is `delta` lower than the
/// current tour's. Improvements are always taken; anything else is taken with
/// probability `e^(delta / temperature)`, which is exactly 1 for `delta == 0`.
pub fn acceptance_probability(delta: f64, temperature: f64) -> f64 {
    if delta > 0.0 {
        1.0
    } else {
        (delta / temperature).exp()
    }
}

/// Outcome of an annealing run.
#[derive(Debug, Clone)]
pub struct Annealed<'a> {
    pub tour: Tour<'a>,
    pub cost: f64,
    pub iterations: u64,
    pub accepted_moves: u64,
    pub improving_moves: u64,
    pub final_temperature: f64,
    pub cancelled: bool,
}

/// Simulated annealing over swap moves.
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use tsp_anneal::anneal::{Annealer, CoolingSchedule, Point};
///
/// let points = vec![Point::new("A", 0.0, 0.0), Point::new("B", 3.0, 4.0)];
/// let mut rng = StdRng::seed_from_u64(7);
/// let tour = Annealer::default()
///     .with_max_iterations(1_000)
///     .solve(&points, CoolingSchedule::Geometric, &mut rng)?;
///
/// assert_eq!(tour.len(), 2);
/// assert_eq!(tour.cost(), 10.0);
/// # Ok::<(), tsp_anneal::anneal::SolveError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Annealer {
    initial_temperature: f64,
    stop_temperature: f64,
    max_iterations: Option<u64>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for Annealer {
    fn default() -> Self {
        Self {
            initial_temperature: INITIAL_TEMPERATURE,
            stop_temperature: STOP_TEMPERATURE,
            max_iterations: None,
            cancel: None,
        }
    }
}

impl Annealer {
    pub fn with_initial_temperature(mut self, temperature: f64) -> Self {
        self.initial_temperature = temperature;
        self
    }

    pub fn with_stop_temperature(mut self, temperature: f64) -> Self {
        self.stop_temperature = temperature;
        self
    }

    /// Hard ceiling on iterations; the search returns its current tour once hit.
    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    /// Flag polled between iterations; setting it ends the search early.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn validate(&self) -> Result<(), SolveError> {
        if !self.initial_temperature.is_finite() || self.initial_temperature <= 0.0 {
            return Err(SolveError::InvalidConfig(format!(
                "initial temperature must be finite and positive, got {}",
                self.initial_temperature
            )));
        }
        if self.stop_temperature.is_nan() || self.stop_temperature < 0.0 {
            return Err(SolveError::InvalidConfig(format!(
                "stop temperature must be non-negative, got {}",
                self.stop_temperature
            )));
        }
        if self.stop_temperature >= self.initial_temperature {
            return Err(SolveError::InvalidConfig(
                "stop temperature must be below the initial temperature".into(),
            ));
        }
        if self.max_iterations == Some(0) {
            return Err(SolveError::InvalidConfig(
                "iteration ceiling must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Anneals a tour over `points`, returning only the final tour.
    pub fn solve<'a, R>(
        &self,
        points: &'a [Point],
        schedule: CoolingSchedule,
        rng: &mut R,
    ) -> Result<Tour<'a>, SolveError>
    where
        R: RandomSource + ?Sized,
    {
        self.anneal(points, schedule, rng).map(|annealed| annealed.tour)
    }

    /// Anneals a tour over `points`, starting from their input order.
    pub fn anneal<'a, R>(
        &self,
        points: &'a [Point],
        schedule: CoolingSchedule,
        rng: &mut R,
    ) -> Result<Annealed<'a>, SolveError>
    where
        R: RandomSource + ?Sized,
    {
        self.validate()?;

        if points.is_empty() {
            return Err(SolveError::InvalidInput(
                "cannot build a tour over an empty point set".into(),
            ));
        }

        let mut state = SearchState::start(Tour::new(points), self.initial_temperature);

        // A lone city is already its own optimal tour.
        if points.len() == 1 {
            return Ok(state.finish(false));
        }

        debug!(
            cities = points.len(),
            %schedule,
            initial_temperature = self.initial_temperature,
            stop_temperature = self.stop_temperature,
            initial_cost = state.cost,
            "starting search"
        );

        let mut cancelled = false;
        while state.temperature > self.stop_temperature {
            if self.is_cancelled() {
                cancelled = true;
                break;
            }
            if let Some(max) = self.max_iterations {
                if state.iteration >= max {
                    warn!(
                        iterations = state.iteration,
                        temperature = state.temperature,
                        "iteration ceiling reached before cooling finished"
                    );
                    break;
                }
            }

            state.step(schedule, self.initial_temperature, rng);
        }

        let annealed = state.finish(cancelled);
        info!(
            iterations = annealed.iterations,
            accepted = annealed.accepted_moves,
            improving = annealed.improving_moves,
            cost = annealed.cost,
            final_temperature = annealed.final_temperature,
            cancelled = annealed.cancelled,
            "search finished"
        );

        Ok(annealed)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }
}

/// Mutable state of one search, owned by a single `anneal` call.
struct SearchState<'a> {
    tour: Tour<'a>,
    cost: f64,
    temperature: f64,
    iteration: u64,
    accepted_moves: u64,
    improving_moves: u64,
}

impl<'a> SearchState<'a> {
    fn start(tour: Tour<'a>, temperature: f64) -> Self {
        let cost = tour.cost();
        Self {
            tour,
            cost,
            temperature,
            iteration: 0,
            accepted_moves: 0,
            improving_moves: 0,
        }
    }

    fn step<R: RandomSource + ?Sized>(
        &mut self,
        schedule: CoolingSchedule,
        initial_temperature: f64,
        rng: &mut R,
    ) {
        self.iteration += 1;

        let (i, j) = rng.distinct_pair(self.tour.len());
        let candidate = self.tour.swap_neighbor(i, j);
        let candidate_cost = candidate.cost();

        // Positive when the candidate is shorter.
        let delta = self.cost - candidate_cost;

        let accept = if delta > 0.0 {
            self.improving_moves += 1;
            true
        } else {
            rng.unit() < acceptance_probability(delta, self.temperature)
        };

        if accept {
            self.tour = candidate;
            self.cost = candidate_cost;
            self.accepted_moves += 1;
            trace!(
                iteration = self.iteration,
                temperature = self.temperature,
                cost = self.cost,
                "accepted move"
            );
        }

        self.temperature = schedule.next(initial_temperature, self.temperature, self.iteration);
    }

    fn finish(self, cancelled: bool) -> Annealed<'a> {
        Annealed {
            tour: self.tour,
            cost: self.cost,
            iterations: self.iteration,
            accepted_moves: self.accepted_moves,
            improving_moves: self.improving_moves,
            final_temperature: self.temperature,
            cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{atomic::AtomicBool, Arc};

    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    use super::{acceptance_probability, Annealer};
    use crate::anneal::{random::Scripted, CoolingSchedule, Point, SolveError, Tour};

    const SCHEDULES: [CoolingSchedule; 3] = [
        CoolingSchedule::Linear,
        CoolingSchedule::Geometric,
        CoolingSchedule::InverseIteration,
    ];

    fn unit_square() -> Vec<Point> {
        vec![
            Point::new("A", 0.0, 0.0),
            Point::new("B", 1.0, 0.0),
            Point::new("C", 1.0, 1.0),
            Point::new("D", 0.0, 1.0),
        ]
    }

    fn sorted_ids(points: impl IntoIterator<Item = String>) -> Vec<String> {
        let mut ids: Vec<String> = points.into_iter().collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn empty_input_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = Annealer::default().solve(&[], CoolingSchedule::Linear, &mut rng);
        assert!(matches!(result, Err(SolveError::InvalidInput(_))));
    }

    #[test]
    fn single_city_returns_immediately() {
        let points = vec![Point::new("Only", 3.0, 4.0)];
        let mut rng = StdRng::seed_from_u64(1);

        for schedule in SCHEDULES {
            let annealed = Annealer::default().anneal(&points, schedule, &mut rng).unwrap();
            assert_eq!(annealed.tour.ids(), vec!["Only"]);
            assert_eq!(annealed.iterations, 0);
            assert_eq!(annealed.cost, 0.0);
        }
    }

    #[test]
    fn unit_square_reaches_its_perimeter() {
        let points = unit_square();
        for (seed, schedule) in [
            (42, CoolingSchedule::Geometric),
            (42, CoolingSchedule::InverseIteration),
        ] {
            let mut rng = StdRng::seed_from_u64(seed);
            let tour = Annealer::default().solve(&points, schedule, &mut rng).unwrap();
            assert!(
                (tour.cost() - 4.0).abs() < 1e-9,
                "{schedule} ended at {} with cost {}",
                tour,
                tour.cost()
            );
        }
    }

    #[test]
    fn iteration_count_follows_schedule_alone() {
        let points = unit_square();
        for schedule in SCHEDULES {
            let expected = schedule.cooling_steps(100.0, 0.05);
            for seed in [1, 2] {
                let mut rng = StdRng::seed_from_u64(seed);
                let annealed = Annealer::default().anneal(&points, schedule, &mut rng).unwrap();
                assert_eq!(annealed.iterations, expected, "{schedule}");
                assert!(annealed.final_temperature <= 0.05);
                assert!(!annealed.cancelled);
            }
        }
        assert_eq!(CoolingSchedule::Linear.cooling_steps(100.0, 0.05), 100);
    }

    #[test]
    fn same_seed_gives_same_tour() {
        let points: Vec<Point> = (0..12)
            .map(|i| Point::new(format!("c{i}"), (i * 7 % 5) as f64, (i * 3 % 11) as f64))
            .collect();

        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            Annealer::default()
                .solve(&points, CoolingSchedule::InverseIteration, &mut rng)
                .unwrap()
                .to_string()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn regressions_follow_the_drawn_probability() {
        // Square in order costs 4; swapping positions 0 and 1 crosses it.
        let points = unit_square();
        let square = Tour::new(&points);
        let crossed = square.swap_neighbor(0, 1);
        let p = acceptance_probability(square.cost() - crossed.cost(), 100.0);
        assert!(p < 1.0);

        let annealer = Annealer::default().with_max_iterations(1);

        let mut below = Scripted {
            units: vec![p - 1e-6],
            indices: vec![0, 1],
        };
        let taken = annealer.anneal(&points, CoolingSchedule::Linear, &mut below).unwrap();
        assert_eq!(taken.tour.ids(), vec!["B", "A", "C", "D"]);
        assert_eq!(taken.accepted_moves, 1);
        assert_eq!(taken.improving_moves, 0);

        let mut above = Scripted {
            units: vec![p],
            indices: vec![0, 1],
        };
        let kept = annealer.anneal(&points, CoolingSchedule::Linear, &mut above).unwrap();
        assert_eq!(kept.tour.ids(), vec!["A", "B", "C", "D"]);
        assert_eq!(kept.accepted_moves, 0);
    }

    #[test]
    fn improvements_skip_the_random_draw() {
        let points = vec![
            Point::new("A", 0.0, 0.0),
            Point::new("C", 1.0, 1.0),
            Point::new("B", 1.0, 0.0),
            Point::new("D", 0.0, 1.0),
        ];
        let mut scripted = Scripted {
            units: vec![],
            indices: vec![1, 2],
        };
        let annealed = Annealer::default()
            .with_max_iterations(1)
            .anneal(&points, CoolingSchedule::Geometric, &mut scripted)
            .unwrap();

        assert_eq!(annealed.tour.ids(), vec!["A", "B", "C", "D"]);
        assert_eq!(annealed.improving_moves, 1);
        assert!((annealed.cost - 4.0).abs() < 1e-12);
    }

    #[test]
    fn probability_boundaries() {
        assert_eq!(acceptance_probability(0.0, 50.0), 1.0);
        assert_eq!(acceptance_probability(0.5, 1e-9), 1.0);
        assert!(acceptance_probability(-1.0, 1e-300) < 1e-12);
        assert!(acceptance_probability(-1.0, 10.0) < acceptance_probability(-1.0, 100.0));
        assert!(acceptance_probability(-5.0, 1.0) < acceptance_probability(-1.0, 1.0));
    }

    #[test]
    fn iteration_ceiling_stops_early() {
        let points = unit_square();
        let mut rng = StdRng::seed_from_u64(3);
        let annealed = Annealer::default()
            .with_max_iterations(10)
            .anneal(&points, CoolingSchedule::Geometric, &mut rng)
            .unwrap();
        assert_eq!(annealed.iterations, 10);
        assert!(annealed.final_temperature > 0.05);
    }

    #[test]
    fn inverse_iteration_cools_from_a_low_start() {
        let points = unit_square();
        let mut rng = StdRng::seed_from_u64(5);

        let first = Annealer::default()
            .with_initial_temperature(1.0)
            .with_max_iterations(1)
            .anneal(&points, CoolingSchedule::InverseIteration, &mut rng)
            .unwrap();
        assert_eq!(first.iterations, 1);
        assert_eq!(first.final_temperature, 0.5);

        let full = Annealer::default()
            .with_initial_temperature(1.0)
            .anneal(&points, CoolingSchedule::InverseIteration, &mut rng)
            .unwrap();
        assert_eq!(
            full.iterations,
            CoolingSchedule::InverseIteration.cooling_steps(1.0, 0.05)
        );
        assert!(full.final_temperature <= 0.05);
    }

    #[test]
    fn cancellation_is_honoured() {
        let points = unit_square();
        let mut rng = StdRng::seed_from_u64(3);
        let annealed = Annealer::default()
            .with_cancel(Arc::new(AtomicBool::new(true)))
            .anneal(&points, CoolingSchedule::Geometric, &mut rng)
            .unwrap();
        assert!(annealed.cancelled);
        assert_eq!(annealed.iterations, 0);
        assert_eq!(annealed.tour.ids(), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn bad_configuration_is_rejected() {
        let points = unit_square();
        let mut rng = StdRng::seed_from_u64(3);
        for annealer in [
            Annealer::default().with_initial_temperature(-1.0),
            Annealer::default().with_initial_temperature(f64::INFINITY),
            Annealer::default().with_stop_temperature(f64::NAN),
            Annealer::default().with_stop_temperature(200.0),
            Annealer::default().with_max_iterations(0),
        ] {
            let result = annealer.solve(&points, CoolingSchedule::Linear, &mut rng);
            assert!(matches!(result, Err(SolveError::InvalidConfig(_))), "{annealer:?}");
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn result_is_a_permutation_of_the_input(
            coords in prop::collection::vec((-50f64..50.0, -50f64..50.0), 1..10),
            seed in any::<u64>(),
            schedule in prop::sample::select(SCHEDULES.to_vec()),
        ) {
            let points: Vec<Point> = coords
                .into_iter()
                .enumerate()
                .map(|(i, (x, y))| Point::new(format!("p{i}"), x, y))
                .collect();
            let mut rng = StdRng::seed_from_u64(seed);

            let annealed = Annealer::default()
                .with_max_iterations(5_000)
                .anneal(&points, schedule, &mut rng)
                .unwrap();

            prop_assert_eq!(annealed.tour.len(), points.len());
            prop_assert_eq!(
                sorted_ids(annealed.tour.points().map(|p| p.id().to_string())),
                sorted_ids(points.iter().map(|p| p.id().to_string()))
            );
            prop_assert!((annealed.cost - annealed.tour.cost()).abs() < 1e-9);
        }
    }
}
