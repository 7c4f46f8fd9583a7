use partition_selection::prelude::*;

fn main() {
    let epsilon = 0.5;
    let delta = 0.02;

    let preaggregation = PreaggregationPartitionSelection::builder()
        .with_epsilon(epsilon)
        .with_delta(delta)
        .with_max_partitions_contributed(1)
        .build()
        .expect("valid strategy");
    let laplace = LaplacePartitionSelection::builder()
        .with_epsilon(epsilon)
        .with_delta(delta)
        .with_max_partitions_contributed(1)
        .build()
        .expect("valid strategy");

    println!(
        "crossovers: {} {}, laplace threshold: {:.4}",
        preaggregation.first_crossover(),
        preaggregation.second_crossover(),
        laplace.threshold()
    );
    println!("{:>5} {:>14} {:>10}", "users", "preaggregation", "laplace");
    for n in 0..=15 {
        println!(
            "{n:>5} {:>14.6} {:>10.6}",
            preaggregation.keep_probability(n as f64),
            laplace.keep_probability(n as f64)
        );
    }
}
