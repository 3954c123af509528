pub use crate::config::*;

use log::{debug, warn};

/// What happened to a record given to the [`Builder`].
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RecordStatus {
    /// The record defined the candidates of the election. It is not a ballot.
    Established,
    Valid,
    Invalid(InvalidReason),
    /// The record had no preference at all. It is not counted.
    Malformed,
}

/// Validates raw records and collects the ballots of an election.
///
/// The first acceptable record defines the candidates and is not counted as a
/// ballot. Every following record must rank exactly the same candidates, in any
/// order.
///
/// ```
/// use instant_runoff::builder::Builder;
/// use instant_runoff::{run_voting_stats, VoteRules};
/// # use instant_runoff::VotingErrors;
///
/// let mut builder = Builder::new();
/// builder.add_record("colors", &["sky blue", "fuchsia"]);
/// builder.add_record("joe", &["sky blue", "fuchsia"]);
/// builder.add_record("mary", &["fuchsia", "sky blue"]);
/// builder.add_record("bob", &["fuchsia", "sky blue"]);
/// builder.add_record("ann", &["fuchsia"]);
///
/// let election = builder.finish()?;
/// assert_eq!(election.valid_count(), 3);
/// assert_eq!(election.invalid_count(), 1);
///
/// let result = run_voting_stats(&election.universe, &election.ballots, &VoteRules::DEFAULT_RULES)?;
/// assert_eq!(result.winner_name(), Some("fuchsia"));
/// # Ok::<(), VotingErrors>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _universe: Option<Universe>,
    pub(crate) _ballots: Vec<Ballot>,
    pub(crate) _invalid: Vec<InvalidBallot>,
    pub(crate) _malformed: Vec<String>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// The candidates, once a record has established them.
    pub fn universe(&self) -> Option<&Universe> {
        self._universe.as_ref()
    }

    /// Adds one record.
    ///
    /// Invalid records are never an error: they are logged, kept aside and
    /// excluded from the tabulation.
    pub fn add_record<S: AsRef<str>>(&mut self, voter_id: &str, choices: &[S]) -> RecordStatus {
        if choices.is_empty() {
            warn!("Warning: record for voter {} has no preference", voter_id);
            self._malformed.push(voter_id.to_string());
            return RecordStatus::Malformed;
        }

        let universe = match &self._universe {
            Some(u) => u,
            None => return self.establish(voter_id, choices),
        };

        match Ballot::new(universe, voter_id, choices) {
            Ok(ballot) => {
                self._ballots.push(ballot);
                RecordStatus::Valid
            }
            Err(reason) => self.reject(voter_id, choices, reason),
        }
    }

    pub fn add_records(&mut self, records: &[BallotRecord]) {
        for r in records {
            self.add_record(&r.voter_id, &r.choices);
        }
    }

    /// Returns the validated election. Fails if no record could define the candidates.
    pub fn finish(self) -> Result<ValidatedElection, VotingErrors> {
        let universe = self._universe.ok_or(VotingErrors::EmptyElection)?;
        debug!(
            "finish: {} candidates, {} valid ballots, {} invalid, {} malformed",
            universe.len(),
            self._ballots.len(),
            self._invalid.len(),
            self._malformed.len()
        );
        Ok(ValidatedElection {
            universe,
            ballots: self._ballots,
            invalid: self._invalid,
            malformed: self._malformed,
        })
    }

    fn establish<S: AsRef<str>>(&mut self, voter_id: &str, choices: &[S]) -> RecordStatus {
        match Universe::new(choices) {
            Ok(universe) => {
                debug!(
                    "establish: candidates from voter {}: {:?}",
                    voter_id,
                    universe.names()
                );
                self._universe = Some(universe);
                RecordStatus::Established
            }
            Err(VotingErrors::DuplicateCandidate(name)) => {
                self.reject(voter_id, choices, InvalidReason::DuplicateCandidate(name))
            }
            Err(_) => self.reject(voter_id, choices, InvalidReason::BlankCandidate),
        }
    }

    fn reject<S: AsRef<str>>(
        &mut self,
        voter_id: &str,
        choices: &[S],
        reason: InvalidReason,
    ) -> RecordStatus {
        warn!("Warning: ballot for voter {} is invalid: {}", voter_id, reason);
        self._invalid.push(InvalidBallot {
            voter_id: voter_id.to_string(),
            choices: choices.iter().map(|s| s.as_ref().to_string()).collect(),
            reason: reason.clone(),
        });
        RecordStatus::Invalid(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn first_record_defines_the_candidates() {
        init();
        let mut b = Builder::new();
        assert_eq!(b.add_record("1", &[" A", "B ", "C"]), RecordStatus::Established);
        assert_eq!(b.add_record("2", &["C", "B", "A"]), RecordStatus::Valid);
        let e = b.finish().unwrap();
        assert_eq!(e.universe.names(), &["A", "B", "C"]);
        assert_eq!(e.valid_count(), 1);
        assert_eq!(e.ballots[0].ranking(), &["C", "B", "A"]);
        assert_eq!(e.ballots[0].voter_id(), "2");
    }

    #[test]
    fn candidate_record_is_not_a_ballot() {
        init();
        let mut b = Builder::new();
        assert_eq!(
            b.add_record("Joe", &["sky blue", "powder blue", "fuchsia"]),
            RecordStatus::Established
        );
        assert_eq!(
            b.add_record("Mary", &["fuchsia", "powder blue", "sky blue"]),
            RecordStatus::Valid
        );
        let e = b.finish().unwrap();
        assert_eq!(e.valid_count(), 1);
        assert_eq!(e.invalid_count(), 0);
        assert_eq!(e.ballots[0].voter_id(), "Mary");

        let mut b = Builder::new();
        b.add_record("header", &["A", "B"]);
        let e = b.finish().unwrap();
        assert!(e.ballots.is_empty());
        assert_eq!(
            crate::run_voting_stats(&e.universe, &e.ballots, &VoteRules::DEFAULT_RULES),
            Err(VotingErrors::NoBallots)
        );
    }

    #[test]
    fn wrong_candidate_sets_are_invalid() {
        init();
        let mut b = Builder::new();
        b.add_record("1", &["A", "B", "C", "D"]);
        assert_eq!(
            b.add_record("2", &["A", "B", "C"]),
            RecordStatus::Invalid(InvalidReason::Mismatch)
        );
        assert_eq!(
            b.add_record("3", &["A", "B", "C", "E"]),
            RecordStatus::Invalid(InvalidReason::Mismatch)
        );
        assert_eq!(
            b.add_record("4", &["A", "B", "C", "D", "E"]),
            RecordStatus::Invalid(InvalidReason::Mismatch)
        );
        assert_eq!(
            b.add_record("5", &["A", "A", "C", "D"]),
            RecordStatus::Invalid(InvalidReason::DuplicateCandidate("A".to_string()))
        );
        assert_eq!(b.add_record("6", &["D", "C", "B", "A"]), RecordStatus::Valid);
        let e = b.finish().unwrap();
        assert_eq!(e.valid_count(), 1);
        assert_eq!(e.invalid_count(), 4);
        assert_eq!(e.invalid[0].voter_id, "2");
        assert_eq!(e.invalid[0].choices.len(), 3);
    }

    #[test]
    fn candidates_are_never_learned_after_the_first_record() {
        let mut b = Builder::new();
        b.add_record("1", &["A", "B"]);
        b.add_record("2", &["A", "B", "C"]);
        b.add_record("3", &["C", "A", "B"]);
        assert_eq!(b.universe().map(|u| u.len()), Some(2));
        assert_eq!(b.finish().unwrap().invalid_count(), 2);
    }

    #[test]
    fn duplicate_first_record_is_rejected() {
        init();
        let mut b = Builder::new();
        assert_eq!(
            b.add_record("1", &["A", "A", "B"]),
            RecordStatus::Invalid(InvalidReason::DuplicateCandidate("A".to_string()))
        );
        assert!(b.universe().is_none());
        assert_eq!(b.add_record("2", &["B", "A"]), RecordStatus::Established);
        assert_eq!(b.add_record("3", &["A", "B"]), RecordStatus::Valid);
        let e = b.finish().unwrap();
        assert_eq!(e.universe.names(), &["B", "A"]);
        assert_eq!(e.invalid_count(), 1);
        assert_eq!(e.valid_count(), 1);
    }

    #[test]
    fn records_without_preferences_are_malformed() {
        let mut b = Builder::new();
        assert_eq!(b.add_record::<&str>("1", &[]), RecordStatus::Malformed);
        b.add_record("2", &["A", "B"]);
        assert_eq!(b.add_record::<String>("3", &[]), RecordStatus::Malformed);
        let e = b.finish().unwrap();
        assert_eq!(e.malformed, vec!["1".to_string(), "3".to_string()]);
        assert_eq!(e.valid_count(), 0);
        assert_eq!(e.invalid_count(), 0);
    }

    #[test]
    fn no_record_is_an_empty_election() {
        assert_eq!(Builder::new().finish(), Err(VotingErrors::EmptyElection));

        let mut b = Builder::new();
        b.add_record::<&str>("1", &[]);
        b.add_record("2", &["A", "A"]);
        assert_eq!(b.finish(), Err(VotingErrors::EmptyElection));
    }

    #[test]
    fn add_records_in_bulk() {
        let records = vec![
            BallotRecord::new("1", &["A", "B"]),
            BallotRecord::new("2", &["B", "A"]),
            BallotRecord::new("3", &["B"]),
        ];
        let mut b = Builder::new();
        b.add_records(&records);
        let e = b.finish().unwrap();
        assert_eq!((e.valid_count(), e.invalid_count()), (1, 1));
    }
}
