use log::{debug, info, warn};

use instant_runoff::builder::Builder;
use instant_runoff::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::rcv::config_reader::*;
use crate::rcv::io_csv::read_csv_ranking;

pub mod config_reader;
mod io_common;
mod io_csv;
mod report;

/// The input path that stands for the standard input.
const STDIN: &str = "-";
/// The output path that stands for the standard output.
const STDOUT: &str = "stdout";
const SUMMARY_FILE_NAME: &str = "summary.json";

#[derive(Debug, Snafu)]
pub enum RcvError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Expected a positive integer"))]
    ParsingJsonNumber {},
    #[snafu(display("Could not find the directory of the configuration file"))]
    MissingParentDir {},
    #[snafu(display("Error opening the CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingSummary { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The tabulation failed: {source}"))]
    Voting { source: VotingErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type RcvResult<T> = Result<T, RcvError>;

fn result_stats_to_json(rs: &VotingResult) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round_stat in rs.round_stats.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (name, count) in round_stat.tally.iter() {
            tally.insert(name.clone(), json!(count.to_string()));
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        if let Some(elim_stats) = &round_stat.eliminated {
            let mut transfers: JSMap<String, JSValue> = JSMap::new();
            for (name, count) in elim_stats.transfers.iter() {
                transfers.insert(name.clone(), json!(count.to_string()));
            }
            if elim_stats.exhausted > 0 {
                transfers.insert(
                    "exhausted".to_string(),
                    json!(elim_stats.exhausted.to_string()),
                );
            }
            tally_results.push(json!({
                "eliminated": elim_stats.name,
                "transfers": transfers
            }));
        }
        if let Some(winner_name) = &round_stat.elected {
            tally_results.push(json!({
                "elected": winner_name,
                "transfers": {}
            }));
        }

        let js = json!({"round": round_stat.round, "tally": tally, "tallyResults": tally_results});
        l.push(js);
    }
    l
}

fn validate_rules(rcv_rules: &RcvRules) -> RcvResult<VoteRules> {
    let tiebreak_mode = match rcv_rules.tiebreak_mode.as_deref() {
        None | Some("lexicographic") => TieBreakMode::Lexicographic,
        Some("useCandidateOrder") => TieBreakMode::UseCandidateOrder,
        Some("random") => {
            let seed = match rcv_rules.random_seed.as_ref().map(|s| s.trim().parse::<u32>()) {
                Some(Result::Ok(x)) => x,
                x => {
                    whatever!(
                        "The random tiebreak mode needs a numeric seed (randomSeed or --seed), got {:?}",
                        x
                    )
                }
            };
            TieBreakMode::Random(seed)
        }
        Some(x) => {
            whatever!(
                "Unknown tiebreak mode {:?}: expected lexicographic, useCandidateOrder or random",
                x
            )
        }
    };
    Ok(VoteRules { tiebreak_mode })
}

fn build_summary_js(config: &RcvConfig, rv: &VotingResult) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_jurisdiction.clone(),
        office: config.output_settings.contest_office.clone(),
        threshold: Some(rv.threshold.to_string()),
    };
    json!({
        "config": c,
        "results": result_stats_to_json(rv) })
}

fn resolve_path(root: &Path, path: &str) -> String {
    if path == STDIN {
        path.to_string()
    } else {
        root.join(path).to_string_lossy().to_string()
    }
}

/// Reads a configuration file. The paths it contains are resolved relative to
/// the directory of the file.
fn load_config(config_path: &str) -> RcvResult<RcvConfig> {
    let mut config = read_config(config_path)?;
    let root = Path::new(config_path)
        .parent()
        .context(MissingParentDirSnafu {})?;
    for cfs in config.cvr_file_sources.iter_mut() {
        cfs.file_path = resolve_path(root, &cfs.file_path);
    }
    if let Some(dir) = &config.output_settings.output_directory {
        config.output_settings.output_directory = Some(resolve_path(root, dir));
    }
    Ok(config)
}

/// Command line flags take precedence over the configuration file.
fn apply_args(config: &mut RcvConfig, args: &Args) {
    if let Some(input) = &args.input {
        config.cvr_file_sources = vec![FileSource::csv(input, None)];
    }
    if config.cvr_file_sources.is_empty() {
        info!("No input provided, reading the ballots from the standard input");
        config.cvr_file_sources = vec![FileSource::csv(STDIN, None)];
    }
    if let Some(row) = args.first_vote_row {
        for cfs in config.cvr_file_sources.iter_mut() {
            cfs.set_first_vote_row_index(row);
        }
    }
    if let Some(mode) = &args.tiebreak {
        config.rules.tiebreak_mode = Some(mode.clone());
    }
    if let Some(seed) = args.seed {
        config.rules.random_seed = Some(seed.to_string());
    }
}

fn read_ranking_data(cfs: &FileSource) -> RcvResult<Vec<BallotRecord>> {
    match cfs.provider.as_str() {
        "csv" => read_csv_ranking(cfs.file_path.as_str(), cfs),
        x => whatever!("Provider {:?} not supported: only csv files can be read", x),
    }
}

/// Reads all the sources in order and runs the tabulation.
fn tabulate_config(config: &RcvConfig) -> RcvResult<(ValidatedElection, VotingResult)> {
    let rules = validate_rules(&config.rules)?;

    let mut builder = Builder::new();
    for cfs in config.cvr_file_sources.iter() {
        let records = read_ranking_data(cfs)?;
        builder.add_records(&records);
    }
    let election = builder.finish().context(VotingSnafu {})?;
    info!(
        "tabulate_config: {} valid ballots, {} invalid, {} malformed",
        election.valid_count(),
        election.invalid_count(),
        election.malformed_count()
    );

    let result =
        run_voting_stats(&election.universe, &election.ballots, &rules).context(VotingSnafu {})?;
    debug!("tabulate_config: result: {:?}", result);
    Ok((election, result))
}

fn summary_destination(config: &RcvConfig, args: &Args) -> Option<String> {
    match (&args.out, &config.output_settings.output_directory) {
        (Some(out), _) if !out.is_empty() => Some(out.clone()),
        (_, Some(dir)) => Some(
            Path::new(dir)
                .join(SUMMARY_FILE_NAME)
                .to_string_lossy()
                .to_string(),
        ),
        _ => None,
    }
}

fn write_summary(path: &str, pretty_js_stats: &str) -> RcvResult<()> {
    if path == STDOUT {
        println!("{}", pretty_js_stats);
        return Ok(());
    }
    if let Some(dir) = Path::new(path).parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).context(WritingSummarySnafu { path })?;
        }
    }
    fs::write(path, pretty_js_stats).context(WritingSummarySnafu { path })?;
    info!("write_summary: summary written to {}", path);
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> RcvResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("check_reference: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(SerializingSummarySnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

pub fn run_election_cli(args: &Args) -> RcvResult<()> {
    let mut config = match &args.config {
        Some(config_path) => load_config(config_path)?,
        None => RcvConfig::default(),
    };
    apply_args(&mut config, args);
    info!("config: {:?}", config);

    let (election, result) = tabulate_config(&config)?;

    print!("{}", report::render_report(&election, &result));

    let result_js = build_summary_js(&config, &result);
    let pretty_js_stats =
        serde_json::to_string_pretty(&result_js).context(SerializingSummarySnafu {})?;

    if let Some(dest) = summary_destination(&config, args) {
        write_summary(&dest, &pretty_js_stats)?;
    }

    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js_stats)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_path(name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn bikeshed_matches_reference() {
        init();
        let config = load_config(&data_path("bikeshed_config.json")).unwrap();
        let (election, result) = tabulate_config(&config).unwrap();
        assert_eq!(election.valid_count(), 3);
        assert_eq!(result.winner_name(), Some("fuchsia"));

        let summary = build_summary_js(&config, &result);
        let pretty = serde_json::to_string_pretty(&summary).unwrap();
        check_reference(&data_path("bikeshed_expected_summary.json"), &pretty).unwrap();
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        init();
        let mut config = load_config(&data_path("bikeshed_config.json")).unwrap();
        config.output_settings.contest_name = "Another contest".to_string();
        let (_, result) = tabulate_config(&config).unwrap();
        let pretty = serde_json::to_string_pretty(&build_summary_js(&config, &result)).unwrap();
        assert!(check_reference(&data_path("bikeshed_expected_summary.json"), &pretty).is_err());
    }

    #[test]
    fn example_with_invalid_and_malformed_records() {
        init();
        let args = Args {
            input: Some(data_path("example.csv")),
            ..Args::default()
        };
        let mut config = RcvConfig::default();
        apply_args(&mut config, &args);
        let (election, result) = tabulate_config(&config).unwrap();
        assert_eq!(election.valid_count(), 4);
        assert_eq!(election.invalid_count(), 1);
        assert_eq!(election.malformed_count(), 1);
        assert_eq!(result.winner_name(), Some("A"));
        assert_eq!(result.round_stats.len(), 2);

        let js = result_stats_to_json(&result);
        assert_eq!(
            js[0]["tallyResults"][0],
            json!({"eliminated": "B", "transfers": {"A": "1"}})
        );
        assert_eq!(js[1]["tally"], json!({"A": "3", "C": "1"}));
        assert_eq!(
            js[1]["tallyResults"][0],
            json!({"elected": "A", "transfers": {}})
        );
    }

    #[test]
    fn command_line_overrides_the_config() {
        let mut config = load_config(&data_path("bikeshed_config.json")).unwrap();
        let args = Args {
            input: Some("ballots.csv".to_string()),
            tiebreak: Some("random".to_string()),
            seed: Some(7),
            first_vote_row: Some(3),
            ..Args::default()
        };
        apply_args(&mut config, &args);
        assert_eq!(config.cvr_file_sources.len(), 1);
        assert_eq!(config.cvr_file_sources[0].file_path, "ballots.csv");
        assert_eq!(config.cvr_file_sources[0].first_vote_row_index().unwrap(), 3);
        assert_eq!(
            validate_rules(&config.rules).unwrap().tiebreak_mode,
            TieBreakMode::Random(7)
        );
    }

    #[test]
    fn config_paths_are_relative_to_the_config() {
        let config = load_config(&data_path("bikeshed_config.json")).unwrap();
        assert_eq!(
            config.cvr_file_sources[0].file_path,
            data_path("bikeshed.csv")
        );
        assert_eq!(
            summary_destination(&config, &Args::default()),
            None,
            "no output directory in the fixture"
        );
        let args = Args {
            out: Some(STDOUT.to_string()),
            ..Args::default()
        };
        assert_eq!(summary_destination(&config, &args), Some(STDOUT.to_string()));
    }

    #[test]
    fn default_input_is_stdin() {
        let mut config = RcvConfig::default();
        apply_args(&mut config, &Args::default());
        assert_eq!(config.cvr_file_sources, vec![FileSource::csv(STDIN, None)]);
    }

    #[test]
    fn rules_validation() {
        let rules = |mode: Option<&str>, seed: Option<&str>| RcvRules {
            tiebreak_mode: mode.map(|s| s.to_string()),
            random_seed: seed.map(|s| s.to_string()),
            rules_description: None,
        };
        assert_eq!(
            validate_rules(&rules(None, None)).unwrap(),
            VoteRules::DEFAULT_RULES
        );
        assert_eq!(
            validate_rules(&rules(Some("useCandidateOrder"), None))
                .unwrap()
                .tiebreak_mode,
            TieBreakMode::UseCandidateOrder
        );
        assert_eq!(
            validate_rules(&rules(Some("random"), Some(" 42 ")))
                .unwrap()
                .tiebreak_mode,
            TieBreakMode::Random(42)
        );
        assert!(validate_rules(&rules(Some("random"), None)).is_err());
        assert!(validate_rules(&rules(Some("coinToss"), None)).is_err());
    }

    #[test]
    fn empty_input_is_fatal() {
        let mut config = RcvConfig::default();
        let args = Args {
            input: Some(data_path("empty.csv")),
            ..Args::default()
        };
        apply_args(&mut config, &args);
        assert!(matches!(
            tabulate_config(&config),
            Err(RcvError::Voting {
                source: VotingErrors::EmptyElection
            })
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let config = RcvConfig {
            cvr_file_sources: vec![FileSource::csv(&data_path("missing.csv"), None)],
            ..RcvConfig::default()
        };
        assert!(matches!(
            tabulate_config(&config),
            Err(RcvError::CsvOpen { .. })
        ));
    }
}
