//! Console tables summarizing a family's overhead records.
//!
//! Purely presentational: one row per record, showing the configuration axes
//! and the median of the record's sorted sample sequence. Tables are rendered
//! to a `String` so they can be asserted on; the sweep engine prints them
//! unless quiet mode is selected.

use std::fmt::Write;

use crate::Trial;

/// Renders the work-sharing family table.
#[must_use]
pub fn worksharing_table(test_name: &str, records: &[Trial]) -> String {
    let mut table = String::new();

    writeln!(table, "Name of test: {test_name}").expect("writing to a String cannot fail");
    writeln!(
        table,
        "Repetitions | Threads | Iterations | Workload in iterations | Overhead in us "
    )
    .expect("writing to a String cannot fail");

    for record in records {
        let median = record.median_sample().unwrap_or(0.0);
        writeln!(
            table,
            "{:>11} | {:>7} | {:>10} | {:>22} | {:>14.4}",
            record.repetitions, record.threads, record.iterations, record.workload, median
        )
        .expect("writing to a String cannot fail");
    }

    writeln!(
        table,
        "----------------------------------------------------------------------------"
    )
    .expect("writing to a String cannot fail");

    table
}

/// Renders the offload family table, including the CPU baseline it was
/// compared against.
#[must_use]
pub fn offload_table(test_name: &str, records: &[Trial]) -> String {
    let mut table = String::new();

    writeln!(table, "Name of test: {test_name}").expect("writing to a String cannot fail");
    if let Some(first) = records.first() {
        writeln!(table, "Compared to {} threads", first.threads)
            .expect("writing to a String cannot fail");
    }
    writeln!(
        table,
        "Teams  | Max Threads per Team |   Arraysize   | Iterations | Workload | Time in us "
    )
    .expect("writing to a String cannot fail");

    for record in records {
        let median = record.median_sample().unwrap_or(0.0);
        writeln!(
            table,
            "{:>6} | {:>20} | {:>13} | {:>10} | {:>8} | {:>10.4}",
            record.teams,
            record.gpu_threads,
            record.array_size,
            record.iterations,
            record.workload,
            median
        )
        .expect("writing to a String cannot fail");
    }

    writeln!(
        table,
        "----------------------------------------------------------------------------------"
    )
    .expect("writing to a String cannot fail");

    table
}

/// Renders the task-tree family table.
#[must_use]
pub fn task_tree_table(test_name: &str, records: &[Trial]) -> String {
    let mut table = String::new();

    writeln!(table, "Name of test: {test_name}").expect("writing to a String cannot fail");
    writeln!(
        table,
        "Repetitions | Branches | Number of Tasks to create | Workload foreach Task | Overhead in us "
    )
    .expect("writing to a String cannot fail");

    for record in records {
        let median = record.median_sample().unwrap_or(0.0);
        writeln!(
            table,
            "{:>11} | {:>8} | {:>25} | {:>21} | {:>14.4}",
            record.repetitions, record.child_nodes, record.tasks, record.workload, median
        )
        .expect("writing to a String cannot fail");
    }

    writeln!(
        table,
        "----------------------------------------------------------------------------"
    )
    .expect("writing to a String cannot fail");

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worksharing_row_shows_the_median() {
        let record = Trial {
            repetitions: 3,
            threads: 4,
            iterations: 100,
            workload: 2,
            samples: vec![30.0, 10.0, 20.0],
            ..Trial::default()
        };

        let table = worksharing_table("DOALL", &[record]);

        assert!(table.contains("Name of test: DOALL"));
        assert!(table.contains("20.0000"));
        assert!(table.contains("Repetitions | Threads"));
    }

    #[test]
    fn offload_table_names_the_baseline() {
        let record = Trial {
            threads: 8,
            teams: 5,
            gpu_threads: 10,
            array_size: 1000,
            iterations: 10,
            workload: 10,
            samples: vec![1.5],
            ..Trial::default()
        };

        let table = offload_table("COPY", &[record]);

        assert!(table.contains("Compared to 8 threads"));
        assert!(table.contains("Teams"));
    }

    #[test]
    fn task_tree_row_shows_branching_factor() {
        let record = Trial {
            repetitions: 5,
            child_nodes: 2,
            tasks: 100,
            workload: 2,
            samples: vec![7.0],
            ..Trial::default()
        };

        let table = task_tree_table("TASKTREELEAVES", &[record]);

        assert!(table.contains("Branches"));
        assert!(table.contains("7.0000"));
    }

    #[test]
    fn empty_record_set_still_renders_the_header() {
        let table = worksharing_table("EMPTY", &[]);

        assert!(table.contains("Name of test: EMPTY"));
    }
}
