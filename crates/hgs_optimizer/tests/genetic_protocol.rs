mod setup;

use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};

use hgs_optimizer::{
    error::SolverError,
    solver::{genetic::Genetic, solver_params::SolverParams},
};
use setup::{IdleLocalSearch, RepairingLocalSearch, ScriptedPopulation};

fn scripted_genetic(
    outcomes: &[bool],
    params: SolverParams,
) -> Genetic<ScriptedPopulation, IdleLocalSearch> {
    let problem = setup::circle_problem(8, 1.0, 100.0);
    let population = ScriptedPopulation::new(&problem, outcomes);

    Genetic::with_components(
        problem,
        params,
        Timestamp::now(),
        population,
        IdleLocalSearch::default(),
    )
    .unwrap()
}

fn repairing_genetic(params: SolverParams) -> Genetic<ScriptedPopulation, RepairingLocalSearch> {
    let problem = setup::circle_problem(8, 1.0, 4.0);
    let population = ScriptedPopulation::new(&problem, &[]).with_repair_outcomes(&[true; 1024]);
    let local_search = RepairingLocalSearch::new(&problem);

    Genetic::with_components(problem, params, Timestamp::now(), population, local_search).unwrap()
}

/// Insertion flags grouped per generation, each generation starting with a `true`.
fn insertions_per_generation(insertions: &[bool]) -> Vec<Vec<bool>> {
    let mut generations: Vec<Vec<bool>> = Vec::new();
    for &flag in insertions {
        if flag {
            generations.push(vec![flag]);
        } else {
            generations
                .last_mut()
                .expect("a repaired insertion follows a regular one")
                .push(flag);
        }
    }
    generations
}

#[test]
fn test_stagnation_counter() {
    let params = SolverParams {
        nb_iter: 3,
        nb_iter_traces: 1,
        ..setup::quiet_params()
    };
    let mut genetic = scripted_genetic(&[false, false, true, false, false, false], params);

    genetic.run();

    assert_eq!(
        *genetic.population().traces.borrow(),
        vec![(0, 2), (1, 3), (2, 1), (3, 2), (4, 3), (5, 4)]
    );
    assert_eq!(genetic.iterations(), 6);
    assert_eq!(genetic.population().generated, 1);
    assert_eq!(genetic.population().restarts, 0);
}

#[test]
fn test_terminates_after_bound_without_improvement() {
    let params = SolverParams {
        nb_iter: 5,
        ..setup::quiet_params()
    };
    let mut genetic = scripted_genetic(&[], params);

    genetic.run();

    assert_eq!(genetic.iterations(), 5);
    assert_eq!(genetic.population().insertions, vec![true; 5]);
    assert_eq!(genetic.restarts(), 0);
}

#[test]
fn test_penalty_management_cadence() {
    let params = SolverParams {
        nb_iter: 5,
        nb_iter_penalty_management: 2,
        nb_iter_traces: 3,
        ..setup::quiet_params()
    };
    let mut genetic = scripted_genetic(&[], params);

    genetic.run();

    // Generations 0, 2 and 4
    assert_eq!(genetic.population().penalty_updates, 3);
    // Generations 0 and 3
    assert_eq!(
        *genetic.population().traces.borrow(),
        vec![(0, 2), (3, 5)]
    );
}

#[test]
fn test_restarts_under_time_limit() {
    let params = SolverParams {
        nb_iter: 3,
        nb_iter_traces: 1,
        time_limit: Some(SignedDuration::from_millis(100)),
        ..setup::quiet_params()
    };
    let mut genetic = scripted_genetic(&[], params);

    genetic.run();

    let iterations = genetic.iterations();
    assert!(iterations >= 2);
    assert_eq!(genetic.restarts(), iterations / 2);
    assert_eq!(genetic.population().restarts, genetic.restarts());

    let traces = genetic.population().traces.borrow();
    assert_eq!(traces[..2], [(0, 2), (1, 3)]);
    assert!(
        traces
            .iter()
            .all(|&(iteration, counter)| counter == 2 + iteration % 2)
    );
}

#[test]
fn test_improvement_resets_before_restart() {
    let params = SolverParams {
        nb_iter: 3,
        nb_iter_traces: 1,
        time_limit: Some(SignedDuration::from_millis(50)),
        ..setup::quiet_params()
    };
    let mut genetic = scripted_genetic(&[false, true, false, false], params);

    genetic.run();

    let traces = genetic.population().traces.borrow();
    assert_eq!(traces[..4], [(0, 2), (1, 1), (2, 2), (3, 3)]);
    assert_eq!(genetic.population().restarts, genetic.restarts());
    assert!(genetic.restarts() >= 1);
}

#[test]
fn test_statistics_track_phases() {
    let mut genetic = scripted_genetic(&[], setup::quiet_params());

    genetic.run();

    let statistics = genetic.statistics();
    assert_eq!(statistics.iterations, 50);
    assert_eq!(statistics.restarts, 0);
    assert!(!statistics.elapsed.is_negative());
    assert!(statistics.crossover <= statistics.elapsed);
}

#[test]
fn test_rejects_zero_cadences() {
    let problem = setup::circle_problem(8, 1.0, 100.0);

    for params in [
        SolverParams {
            nb_iter_traces: 0,
            ..setup::quiet_params()
        },
        SolverParams {
            nb_iter_penalty_management: 0,
            ..setup::quiet_params()
        },
    ] {
        let result = Genetic::with_components(
            Arc::clone(&problem),
            params,
            Timestamp::now(),
            ScriptedPopulation::new(&problem, &[]),
            IdleLocalSearch::default(),
        );
        assert!(matches!(result, Err(SolverError::InvalidParameter { .. })));
    }
}

#[test]
fn test_repair_pass_uses_scaled_penalties() {
    let weights = ScriptedPopulation::weights();
    let mut repairs = 0;

    for seed in 0..8 {
        let params = SolverParams {
            nb_iter: 3,
            seed,
            ..setup::quiet_params()
        };
        let mut genetic = repairing_genetic(params);

        genetic.run();

        let generations = insertions_per_generation(&genetic.population().insertions);
        assert_eq!(generations.len(), genetic.iterations());
        assert!(
            generations
                .iter()
                .all(|flags| flags[..] == [true] || flags[..] == [true, false])
        );

        let received = &genetic.local_search().received;
        let mut calls = received.iter();
        for flags in &generations {
            assert_eq!(calls.next(), Some(&weights));
            if flags.len() == 2 {
                assert_eq!(calls.next(), Some(&weights.scaled(10.0)));
                repairs += 1;
            }
        }
        assert_eq!(calls.next(), None);
    }

    assert!(repairs > 0);
}

#[test]
fn test_repaired_insertion_resets_counter() {
    for seed in 0..8 {
        let params = SolverParams {
            nb_iter: 3,
            nb_iter_traces: 1,
            seed,
            ..setup::quiet_params()
        };
        let mut genetic = repairing_genetic(params);

        genetic.run();

        // Regular insertions never improve, repaired ones always do
        let mut counter = 1;
        let expected: Vec<(usize, usize)> =
            insertions_per_generation(&genetic.population().insertions)
                .iter()
                .enumerate()
                .map(|(iteration, flags)| {
                    counter = if flags.len() == 2 { 1 } else { counter + 1 };
                    (iteration, counter)
                })
                .collect();

        assert_eq!(*genetic.population().traces.borrow(), expected);
        assert_eq!(expected.last().map(|&(_, counter)| counter), Some(4));
    }
}
