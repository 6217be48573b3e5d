//! Sample data for development databases.

use tracing::info;

use crate::context::Context;
use crate::error::StoreError;

use super::{NewSchedule, ScheduleStore};

/// The sample timetable, in insertion order.
pub fn sample_schedules() -> Vec<NewSchedule> {
    [
        ("Calculus", "256", 3),
        ("Discrete Structures", "269a", 3),
        ("Linear Algebra", "259", 3),
        ("Calculus II", "283", 3),
        ("Statistics", "351", 4),
        ("Programming Principles", "269", 4),
        ("OOP", "269", 4),
        ("Programming Principles II", "461", 4),
        ("Databases", "428", 3),
        ("Algorithms", "Konaev Hall", 3),
        ("Android Development", "272", 3),
        ("Advanced Android", "272", 3),
        ("Golang", "383", 3),
        ("Spring", "444", 3),
        ("Web Development", "359", 4),
        ("IOS Development", "283", 3),
        ("Software Development", "461", 3),
    ]
    .into_iter()
    .map(|(discipline, cabinet, time_period)| NewSchedule::new(discipline, cabinet, time_period))
    .collect()
}

/// Insert every sample schedule into `store`. Returns how many were written.
pub fn populate<S: ScheduleStore + ?Sized>(store: &S, ctx: &Context) -> Result<usize, StoreError> {
    let samples = sample_schedules();
    for schedule in &samples {
        store.insert(ctx, schedule)?;
    }
    info!(count = samples.len(), "seeded sample schedules");
    Ok(samples.len())
}
