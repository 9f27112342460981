//! Approximate travelling-salesman tours by simulated annealing.
//!
//! [`anneal::Annealer`] searches over [`anneal::Tour`]s of borrowed
//! [`anneal::Point`]s, cooling by one of the [`anneal::CoolingSchedule`]s.
//! [`anneal::Problem`] reads the plain-text city list the binary consumes.

pub mod anneal;
