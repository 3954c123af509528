use clap::Parser;

/// This is an instant-runoff voting tabulation program.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the election: contest, input files and rules.
    /// See the manual of the instant_runoff library for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the outcome of an election in JSON format. If provided, irving will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, '-' or empty) The file containing the ballots, one per line: voter id first, then the candidates
    /// in order of preference. Reads from the standard input if '-' or if neither this option nor --config is given.
    /// Setting this option overrides the sources of the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default lexicographic) How to break a tie for the last place: lexicographic, useCandidateOrder or random.
    #[clap(long, value_parser)]
    pub tiebreak: Option<String>,

    /// The seed of the random tiebreak mode.
    #[clap(long, value_parser)]
    pub seed: Option<u32>,

    /// (default 1) The line of the candidate list in the input (1-based). Use 2 to skip a title line.
    #[clap(long, value_parser)]
    pub first_vote_row: Option<usize>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
