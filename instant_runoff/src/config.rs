// ********* Input data structures ***********

use std::collections::HashSet;
use std::error::Error;
use std::fmt::Display;

/// A raw record, as handed over by a reader: the voter id followed by the
/// preference tokens in descending order of preference.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct BallotRecord {
    pub voter_id: String,
    pub choices: Vec<String>,
}

impl BallotRecord {
    pub fn new<S: AsRef<str>>(voter_id: &str, choices: &[S]) -> BallotRecord {
        BallotRecord {
            voter_id: voter_id.to_string(),
            choices: choices.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }
}

/// The fixed set of candidates contesting the election.
///
/// Names are kept in the order of the record that established them. This order
/// is used for reporting and by [`TieBreakMode::UseCandidateOrder`].
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Universe {
    names: Vec<String>,
}

impl Universe {
    /// Builds a universe from a list of names. Names are trimmed.
    ///
    /// Fails if a name is blank or appears twice. An empty list is accepted here
    /// and rejected later by the tabulation.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Universe, VotingErrors> {
        let mut seen: HashSet<&str> = HashSet::new();
        for name in names.iter().map(|s| s.as_ref().trim()) {
            if name.is_empty() {
                return Err(VotingErrors::BlankCandidate);
            }
            if !seen.insert(name) {
                return Err(VotingErrors::DuplicateCandidate(name.to_string()));
            }
        }
        Ok(Universe {
            names: names.iter().map(|s| s.as_ref().trim().to_string()).collect(),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Checks that a list of tokens is a permutation of this universe.
    pub fn check<S: AsRef<str>>(&self, choices: &[S]) -> Result<(), InvalidReason> {
        let mut seen: HashSet<&str> = HashSet::new();
        for c in choices.iter().map(|s| s.as_ref().trim()) {
            if c.is_empty() {
                return Err(InvalidReason::BlankCandidate);
            }
            if !seen.insert(c) {
                return Err(InvalidReason::DuplicateCandidate(c.to_string()));
            }
        }
        if seen.len() != self.names.len() || !seen.iter().all(|c| self.contains(c)) {
            return Err(InvalidReason::Mismatch);
        }
        Ok(())
    }
}

/// A valid ballot: a complete ranking of the universe.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Ballot {
    pub(crate) voter_id: String,
    pub(crate) ranking: Vec<String>,
}

impl Ballot {
    /// Creates a ballot, checking that the choices are a permutation of the universe.
    pub fn new<S: AsRef<str>>(
        universe: &Universe,
        voter_id: &str,
        choices: &[S],
    ) -> Result<Ballot, InvalidReason> {
        universe.check(choices)?;
        Ok(Ballot {
            voter_id: voter_id.to_string(),
            ranking: choices.iter().map(|s| s.as_ref().trim().to_string()).collect(),
        })
    }

    pub fn voter_id(&self) -> &str {
        &self.voter_id
    }

    pub fn ranking(&self) -> &[String] {
        &self.ranking
    }
}

/// Why a record was not accepted as a ballot.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum InvalidReason {
    /// The set of candidates differs from the universe (missing, extra or unknown names).
    Mismatch,
    /// The same candidate is ranked more than once.
    DuplicateCandidate(String),
    /// One of the preferences is empty.
    BlankCandidate,
}

impl Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidReason::Mismatch => write!(f, "candidates do not match the election"),
            InvalidReason::DuplicateCandidate(name) => {
                write!(f, "candidate {} is ranked more than once", name)
            }
            InvalidReason::BlankCandidate => write!(f, "blank preference"),
        }
    }
}

/// A record that was parsed but rejected. It is kept for reporting only.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct InvalidBallot {
    pub voter_id: String,
    pub choices: Vec<String>,
    pub reason: InvalidReason,
}

/// The output of the validation step: everything the tabulation needs,
/// plus what was rejected.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ValidatedElection {
    pub universe: Universe,
    pub ballots: Vec<Ballot>,
    pub invalid: Vec<InvalidBallot>,
    /// Voter ids of the records that had no preference at all.
    pub malformed: Vec<String>,
}

impl ValidatedElection {
    pub fn valid_count(&self) -> u64 {
        self.ballots.len() as u64
    }

    pub fn invalid_count(&self) -> u64 {
        self.invalid.len() as u64
    }

    pub fn malformed_count(&self) -> u64 {
        self.malformed.len() as u64
    }
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct EliminationStats {
    pub name: String,
    /// Where the ballots of the eliminated candidate went, in candidate order.
    pub transfers: Vec<(String, u64)>,
    pub exhausted: u64,
}

/// Statistics for one round
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundStats {
    pub round: u32,
    /// The count of every candidate still running, in candidate order.
    pub tally: Vec<(String, u64)>,
    /// Ballots that did not count in this round because all their candidates
    /// were eliminated.
    pub exhausted: u64,
    pub elected: Option<String>,
    pub eliminated: Option<EliminationStats>,
}

/// How the winner was declared.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum WinnerKind {
    /// Strictly more than half of the valid ballots.
    Majority,
    /// Sole remaining candidate after the last elimination round.
    LastStanding,
    /// The only candidate in the election. No round is run.
    Unopposed,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Winner {
    pub name: String,
    pub kind: WinnerKind,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VotingResult {
    pub winner: Option<Winner>,
    /// A candidate must have strictly more votes than this threshold to win.
    pub threshold: u64,
    pub valid_count: u64,
    pub round_stats: Vec<RoundStats>,
}

impl VotingResult {
    pub fn winner_name(&self) -> Option<&str> {
        self.winner.as_ref().map(|w| w.name.as_str())
    }

    /// The share of the valid ballots that a count represents, in percent.
    pub fn percentage(&self, count: u64) -> f64 {
        if self.valid_count == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.valid_count as f64
        }
    }
}

/// Errors that prevent the algorithm from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    /// No usable record: the candidates could not be established.
    EmptyElection,
    /// The tabulation was called without any candidate.
    NoCandidates,
    /// The tabulation was called without any valid ballot.
    NoBallots,
    DuplicateCandidate(String),
    BlankCandidate,
    /// A ballot names a candidate that is not part of the universe.
    UnknownCandidate { voter_id: String, name: String },
    NoConvergence,
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::EmptyElection => {
                write!(f, "empty election: no record to establish the candidates")
            }
            VotingErrors::NoCandidates => write!(f, "the election has no candidate"),
            VotingErrors::NoBallots => write!(f, "the election has no valid ballot"),
            VotingErrors::DuplicateCandidate(name) => {
                write!(f, "candidate {} is listed more than once", name)
            }
            VotingErrors::BlankCandidate => write!(f, "a candidate name is blank"),
            VotingErrors::UnknownCandidate { voter_id, name } => write!(
                f,
                "ballot of voter {} names unknown candidate {}",
                voter_id, name
            ),
            VotingErrors::NoConvergence => {
                write!(f, "the tabulation could not find a candidate to eliminate")
            }
        }
    }
}

// ********* Configuration **********

/// How to choose the candidate to eliminate when several share the lowest count.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum TieBreakMode {
    /// Eliminate the candidate with the smallest name (byte order).
    Lexicographic,
    /// Eliminate the candidate listed last in the record that established the candidates.
    UseCandidateOrder,
    /// Pseudo-random but reproducible: tied candidates are ordered by a SHA-256
    /// hash of the seed, the round number and their name.
    Random(u32),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRules {
    pub tiebreak_mode: TieBreakMode,
}

impl VoteRules {
    pub const DEFAULT_RULES: VoteRules = VoteRules {
        tiebreak_mode: TieBreakMode::Lexicographic,
    };
}

impl Default for VoteRules {
    fn default() -> Self {
        VoteRules::DEFAULT_RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universe_trims_and_rejects_duplicates() {
        let u = Universe::new(&[" A", "B "]).unwrap();
        assert_eq!(u.names(), &["A".to_string(), "B".to_string()]);
        assert_eq!(
            Universe::new(&["A", "B", " A"]),
            Err(VotingErrors::DuplicateCandidate("A".to_string()))
        );
        assert_eq!(Universe::new(&["A", ""]), Err(VotingErrors::BlankCandidate));
        assert!(Universe::new::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn check_accepts_any_order() {
        let u = Universe::new(&["A", "B", "C"]).unwrap();
        assert_eq!(u.check(&["C", "A", "B"]), Ok(()));
        assert_eq!(u.check(&["A", "B"]), Err(InvalidReason::Mismatch));
        assert_eq!(u.check(&["A", "B", "D"]), Err(InvalidReason::Mismatch));
        assert_eq!(u.check(&["A", "B", "C", "D"]), Err(InvalidReason::Mismatch));
        assert_eq!(
            u.check(&["A", "B", "B"]),
            Err(InvalidReason::DuplicateCandidate("B".to_string()))
        );
        assert_eq!(u.check(&["A", "", "C"]), Err(InvalidReason::BlankCandidate));
    }

    #[test]
    fn percentage_of_valid_ballots() {
        let res = VotingResult {
            winner: None,
            threshold: 2,
            valid_count: 4,
            round_stats: vec![],
        };
        assert_eq!(res.percentage(1), 25.0);
        assert_eq!(res.percentage(4), 100.0);
    }
}
