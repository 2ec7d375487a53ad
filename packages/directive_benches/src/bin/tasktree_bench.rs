//! Task-tree overhead: creating a fixed number of tasks through a recursive
//! tree of spawned tasks, compared against a flat loop spawning the same
//! number of tasks directly.

use std::process::ExitCode;

use directive_benches::{banner, delay};
use rayon::Scope;
use sweep_bench::{Session, SessionError, TaskTreeArgs, Trial, pool_for};

const FAMILY: &str = "TASKTREE";

fn main() -> ExitCode {
    let args: TaskTreeArgs = argh::from_env();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: TaskTreeArgs) -> Result<(), SessionError> {
    let (params, options) = args.into_inputs()?;
    banner("tasktree_bench", options.quiet);

    let mut session = Session::new(params, options);
    if options.save_results {
        session.remove_prior_results(FAMILY)?;
    }

    session.run_task_tree(FAMILY, "TASKTREE", &tree_all_nodes, &reference)?;
    session.run_task_tree(FAMILY, "TASKTREELEAVES", &tree_leaves_only, &reference)?;

    Ok(())
}

/// Flat task creation: the same total task count, spawned from one loop.
fn reference(trial: &Trial) {
    let pool = pool_for(trial.threads);

    pool.install(|| {
        rayon::scope(|scope| {
            for i in 0..trial.tasks {
                scope.spawn(move |_| delay(i, trial.workload));
            }
        });
    });
}

/// Every tree node carries work.
fn tree_all_nodes(trial: &Trial) {
    let pool = pool_for(trial.threads);

    pool.install(|| {
        rayon::scope(|scope| {
            spawn_tree(scope, trial.tasks, trial.child_nodes, trial.workload, false);
        });
    });
}

/// Only the leaves carry work; interior nodes exist purely to fan out.
fn tree_leaves_only(trial: &Trial) {
    let pool = pool_for(trial.threads);

    pool.install(|| {
        rayon::scope(|scope| {
            spawn_tree(scope, trial.tasks, trial.child_nodes, trial.workload, true);
        });
    });
}

/// Recursively spawns a tree consuming exactly `tasks` task creations.
///
/// Each node takes one task from the total and splits the remainder as evenly
/// as possible across its children, so the total task count is independent of
/// the branching factor. A branching factor of 0 or a share of 1 terminates
/// the recursion at a leaf.
fn spawn_tree<'scope>(
    scope: &Scope<'scope>,
    tasks: u64,
    child_nodes: u32,
    workload: u64,
    leaves_only: bool,
) {
    if tasks == 0 {
        return;
    }

    if tasks == 1 || child_nodes == 0 {
        delay(tasks, workload);
        return;
    }

    if !leaves_only {
        delay(tasks, workload);
    }

    let remaining = tasks - 1;
    let per_child = remaining / u64::from(child_nodes);
    let mut extra = remaining % u64::from(child_nodes);

    for _ in 0..child_nodes {
        let mut share = per_child;
        if extra > 0 {
            share += 1;
            extra -= 1;
        }
        if share == 0 {
            continue;
        }

        scope.spawn(move |scope| {
            spawn_tree(scope, share, child_nodes, workload, leaves_only);
        });
    }
}
