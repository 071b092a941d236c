use std::{hint::black_box, sync::Arc};

use criterion::{Criterion, criterion_group, criterion_main};
use hgs_optimizer::{
    problem::{
        client::Client,
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
    solver::{
        crossover::crossover_ox,
        individual::Individual,
        ls::{improve_individual::ImproveIndividual, local_search::LocalSearch},
        penalty::PenaltyWeights,
        split::Split,
    },
};
use rand::{Rng, SeedableRng, rngs::SmallRng};

fn random_problem(nb_clients: usize, capacity: f64) -> Arc<VehicleRoutingProblem> {
    let mut rng = SmallRng::seed_from_u64(2427121);
    let mut clients = vec![Client::from_cartesian(500.0, 500.0, 0.0)];
    clients.extend((0..nb_clients).map(|_| {
        Client::from_cartesian(
            rng.random_range(0.0..1000.0),
            rng.random_range(0.0..1000.0),
            rng.random_range(1..=100) as f64,
        )
    }));

    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .set_clients(clients)
        .set_vehicle_capacity(capacity)
        .set_round_distances(true);

    Arc::new(builder.build().unwrap())
}

fn split_benchmark(c: &mut Criterion) {
    let problem = random_problem(200, 400.0);
    let penalties = PenaltyWeights::initial(&problem);
    let mut split = Split::new(Arc::clone(&problem));
    let mut rng = SmallRng::seed_from_u64(1);
    let mut individual = Individual::random(&problem, &mut rng);

    c.bench_function("split (200 clients, unlimited fleet)", |b| {
        b.iter(|| split.general_split(black_box(&mut individual), problem.nb_vehicles(), &penalties))
    });

    let lower_bound = problem.vehicles_lower_bound();
    c.bench_function("split (200 clients, limited fleet)", |b| {
        b.iter(|| split.general_split(black_box(&mut individual), lower_bound, &penalties))
    });
}

fn crossover_benchmark(c: &mut Criterion) {
    let problem = random_problem(200, 400.0);
    let penalties = PenaltyWeights::initial(&problem);
    let mut split = Split::new(Arc::clone(&problem));
    let mut rng = SmallRng::seed_from_u64(2);

    let mut parent1 = Individual::random(&problem, &mut rng);
    let mut parent2 = Individual::random(&problem, &mut rng);
    split.general_split(&mut parent1, problem.nb_vehicles(), &penalties);
    split.general_split(&mut parent2, problem.nb_vehicles(), &penalties);
    let mut offspring = Individual::new(&problem);

    c.bench_function("crossover ox + split (200 clients)", |b| {
        b.iter(|| {
            crossover_ox(
                black_box(&mut offspring),
                &parent1,
                &parent2,
                &mut split,
                &penalties,
                &mut rng,
            )
        })
    });
}

fn local_search_benchmark(c: &mut Criterion) {
    let problem = random_problem(200, 400.0);
    let penalties = PenaltyWeights::initial(&problem);
    let mut split = Split::new(Arc::clone(&problem));
    let mut local_search = LocalSearch::new(Arc::clone(&problem), 20);
    let mut rng = SmallRng::seed_from_u64(3);

    let mut initial = Individual::random(&problem, &mut rng);
    split.general_split(&mut initial, problem.nb_vehicles(), &penalties);

    c.bench_function("local search from random (200 clients)", |b| {
        b.iter_batched(
            || initial.clone(),
            |mut individual| {
                local_search.run(&mut individual, &penalties, &mut rng);
                individual
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    split_benchmark,
    crossover_benchmark,
    local_search_benchmark
);
criterion_main!(benches);
