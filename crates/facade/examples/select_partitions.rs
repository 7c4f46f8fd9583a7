use partition_selection::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn main() {
    let counts = [("a", 1), ("b", 3), ("c", 7), ("d", 12), ("e", 40)];
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for kind in [PartitionSelectionKind::Preaggregation, PartitionSelectionKind::Laplace] {
        let strategy = PartitionSelection::builder(kind)
            .with_epsilon(1.0)
            .with_delta(1e-3)
            .with_max_partitions_contributed(2)
            .build()
            .expect("valid strategy");
        let kept: Vec<&str> = counts
            .iter()
            .filter(|(_, n)| strategy.should_keep_with_rng(*n, &mut rng))
            .map(|(name, _)| *name)
            .collect();
        println!("{kind:?}: kept {kept:?}");
    }
}
