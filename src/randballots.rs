use clap::Parser;
use log::info;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Generates random ballots in the CSV input format of irving.
///
/// Every ballot ranks all the candidates, in a uniformly random order.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// The number of candidates. They are named 0, 1, 2, ...
    #[clap(short, long, value_parser, default_value_t = 7)]
    candidates: usize,

    /// The number of ballots.
    #[clap(short, long, value_parser, default_value_t = 275)]
    ballots: usize,

    /// Seed of the generator, to produce the same ballots again.
    #[clap(short, long, value_parser)]
    seed: Option<u64>,
}

fn generate_ballots<R: Rng>(rng: &mut R, num_candidates: usize, num_ballots: usize) -> Vec<String> {
    let mut candidates: Vec<usize> = (0..num_candidates).collect();
    (0..num_ballots)
        .map(|idx| {
            candidates.shuffle(rng);
            let mut line = idx.to_string();
            for c in candidates.iter() {
                line.push(',');
                line.push_str(&c.to_string());
            }
            line
        })
        .collect()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    info!("randballots: seed {}", seed);
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    for line in generate_ballots(&mut rng, args.candidates, args.ballots) {
        println!("{}", line);
    }
}
