use partition_selection::{calculate_delta, calculate_threshold};

fn main() {
    let epsilon = 1.0986;
    for k in [1, 2, 5, 10] {
        let threshold = calculate_threshold(epsilon, 1e-5, k);
        let delta = calculate_delta(epsilon, threshold, k);
        println!("k={k:>2} threshold={threshold:.3} delta={delta:.2e}");
    }
}
