//! Utility functions and structures for the HGS-CVRP algorithm.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::solution::Solution;

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

/// Write a solution in the CVRPLIB format: one `Route #k:` line per
/// non-empty route followed by the cost.
pub fn write_cvrplib_format<W: Write>(solution: &Solution, out: &mut W) -> Result<()> {
    for (i, route) in solution.routes.iter().filter(|r| !r.is_empty()).enumerate() {
        write!(out, "Route #{}:", i + 1)?;
        for &customer in &route.customers {
            write!(out, " {}", customer)?;
        }
        writeln!(out)?;
    }
    writeln!(out, "Cost {}", solution.penalized_cost)?;
    Ok(())
}

/// Save a solution to a file in the CVRPLIB format.
pub fn export_cvrplib_format<P: AsRef<Path>>(solution: &Solution, path: P) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    write_cvrplib_format(solution, &mut file)?;
    file.flush()?;
    Ok(())
}

/// Save the search progress, one `instance;seed;cost;seconds` line per
/// improvement of the best solution.
pub fn export_search_progress<P: AsRef<Path>>(
    progress: &[(Duration, f64)],
    instance_name: &str,
    seed: u64,
    path: P,
) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    for (elapsed, cost) in progress {
        writeln!(
            file,
            "{};{};{};{}",
            instance_name,
            seed,
            cost,
            elapsed.as_secs_f64()
        )?;
    }
    file.flush()?;
    Ok(())
}

/// Generate statistics about the search process.
#[derive(Debug, Clone)]
pub struct SearchStatistics {
    pub iterations: usize,
    pub restarts: usize,
    pub runtime: Duration,
    pub best_solution_cost: f64,
    pub best_solution_distance: f64,
    pub best_solution_is_feasible: bool,
    pub best_solution_routes: usize,
    pub feasible_population_size: usize,
    pub infeasible_population_size: usize,
    pub final_capacity_penalty: f64,
    pub final_duration_penalty: f64,
}

impl SearchStatistics {
    /// Format the statistics as a string.
    pub fn format(&self) -> String {
        format!(
            "Search Statistics:
- Iterations: {}
- Restarts: {}
- Runtime: {}
- Best Solution Cost: {:.2}
- Best Solution Distance: {:.2}
- Best Solution Feasible: {}
- Best Solution Routes: {}
- Population Size: {} feasible, {} infeasible
- Final Capacity Penalty: {:.2}
- Final Duration Penalty: {:.2}",
            self.iterations,
            self.restarts,
            format_duration(self.runtime),
            self.best_solution_cost,
            self.best_solution_distance,
            self.best_solution_is_feasible,
            self.best_solution_routes,
            self.feasible_population_size,
            self.infeasible_population_size,
            self.final_capacity_penalty,
            self.final_duration_penalty
        )
    }
}
