//! Draws from the same 1:1:3 distribution with each backing and prints the
//! observed frequencies.
//!
//! Run with `cargo run --example histogram [seed]`, and `RUST_LOG=debug` for
//! library logging.

use probdist_rs::{
    ArrayDistribution, DistResult, LinkedListDistribution, ProbabilityDistribution,
    TreeDistribution,
};

const DRAWS: usize = 1000;

fn histogram(dist: &mut dyn ProbabilityDistribution<usize>) -> DistResult<[usize; 4]> {
    dist.add(1, 1.0)?;
    dist.add(2, 1.0)?;
    dist.add(3, 3.0)?;

    let mut counts = [0usize; 4];
    for _ in 0..DRAWS {
        counts[dist.sample()?] += 1;
    }
    Ok(counts)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let seed: u64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => rand::random(),
    };

    let mut backings: Vec<(&str, Box<dyn ProbabilityDistribution<usize>>)> = vec![
        ("array", Box::new(ArrayDistribution::with_seed(seed))),
        ("linked_list", Box::new(LinkedListDistribution::with_seed(seed))),
        ("tree", Box::new(TreeDistribution::with_seed(seed))),
    ];

    println!("--- Sanity demo (seed {seed}) ---");
    for (name, dist) in backings.iter_mut() {
        let counts = histogram(dist.as_mut())?;
        println!("{:<12} {:>5} {:>5} {:>5}", name, counts[1], counts[2], counts[3]);
    }
    println!("-------------------");

    Ok(())
}
