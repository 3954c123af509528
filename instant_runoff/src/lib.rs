/*!
Instant-runoff voting: ballot validation and round-by-round elimination.

Records go through the [`builder::Builder`]. The first record lists the
candidates and is not a ballot; the following ones are separated into valid and
invalid ballots. [`run_voting_stats`]
then runs the elimination rounds and returns a [`VotingResult`].

```
use instant_runoff::builder::Builder;
use instant_runoff::*;

let mut builder = Builder::new();
builder.add_record("candidates", &["A", "B", "C"]);
builder.add_record("1", &["A", "B", "C"]);
builder.add_record("2", &["A", "B", "C"]);
builder.add_record("3", &["B", "A", "C"]);
builder.add_record("4", &["C", "A", "B"]);
let election = builder.finish()?;

let result = run_voting_stats(&election.universe, &election.ballots, &VoteRules::DEFAULT_RULES)?;
assert_eq!(result.winner_name(), Some("A"));
assert_eq!(result.round_stats.len(), 2);
# Ok::<(), VotingErrors>(())
```
*/
pub mod builder;
mod config;
pub mod manual;

use log::{debug, info};

use std::{
    collections::{HashMap, HashSet},
    ops::{Add, AddAssign},
};

pub use crate::config::*;

// **** Private structures ****

type RoundId = u32;

// Position of the candidate in the universe.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
    const ONE: VoteCount = VoteCount(1);
}

impl std::iter::Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteCount(iter.map(|vc| vc.0).sum())
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

impl Add for VoteCount {
    type Output = VoteCount;
    fn add(self: VoteCount, rhs: VoteCount) -> VoteCount {
        VoteCount(self.0 + rhs.0)
    }
}

// Invariant: every candidate of the ranking belongs to the universe.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
struct VoteInternal {
    ranking: Vec<CandidateId>,
}

/// The active preference of a ballot.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
enum Cursor {
    /// Index in the ranking of the first candidate not yet eliminated.
    Active(usize),
    /// Every candidate on the ballot has been eliminated.
    Exhausted,
}

impl Cursor {
    fn candidate(self, vote: &VoteInternal) -> Option<CandidateId> {
        match self {
            Cursor::Active(idx) => vote.ranking.get(idx).cloned(),
            Cursor::Exhausted => None,
        }
    }

    // Only moves forward.
    fn advance(self, vote: &VoteInternal, eliminated: &HashSet<CandidateId>) -> Cursor {
        match self {
            Cursor::Exhausted => Cursor::Exhausted,
            Cursor::Active(start) => vote
                .ranking
                .iter()
                .enumerate()
                .skip(start)
                .find(|(_, cid)| !eliminated.contains(cid))
                .map(|(idx, _)| Cursor::Active(idx))
                .unwrap_or(Cursor::Exhausted),
        }
    }
}

/// Everything that changes from one round to the next.
#[derive(Eq, PartialEq, Debug, Clone)]
struct ElectionState {
    // One cursor per ballot, in ballot order.
    cursors: Vec<Cursor>,
    // In order of elimination.
    eliminated: Vec<CandidateId>,
}

impl ElectionState {
    fn initial(votes: &[VoteInternal]) -> ElectionState {
        let none = HashSet::new();
        ElectionState {
            cursors: votes
                .iter()
                .map(|v| Cursor::Active(0).advance(v, &none))
                .collect(),
            eliminated: Vec::new(),
        }
    }

    fn eliminated_set(&self) -> HashSet<CandidateId> {
        self.eliminated.iter().cloned().collect()
    }

    fn exhausted_count(&self) -> VoteCount {
        self.cursors
            .iter()
            .filter(|c| **c == Cursor::Exhausted)
            .map(|_| VoteCount::ONE)
            .sum()
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
enum RoundCandidateStatusInternal {
    StillRunning,
    Elected,
    /// if eliminated, the transfers of the votes to each candidate
    /// the last element is the number of exhausted votes
    Eliminated(Vec<(CandidateId, VoteCount)>, VoteCount),
}

#[derive(Eq, PartialEq, Debug, Clone)]
struct RoundStatistics {
    candidate_stats: Vec<(CandidateId, VoteCount, RoundCandidateStatusInternal)>,
    exhausted: VoteCount,
    decision: Option<(CandidateId, WinnerKind)>,
}

/// Runs the instant-runoff tabulation.
///
/// Arguments:
/// * `universe` the candidates of the election
/// * `ballots` the valid ballots, as produced by the [`builder::Builder`]
/// * `rules` the tie-break rule used when several candidates have the lowest count
///
/// The tabulation stops as soon as a candidate has a majority of the valid
/// ballots. Otherwise it runs `|universe| - 1` rounds and the last remaining
/// candidate wins.
pub fn run_voting_stats(
    universe: &Universe,
    ballots: &[Ballot],
    rules: &VoteRules,
) -> Result<VotingResult, VotingErrors> {
    info!(
        "run_voting_stats: Processing {:?} ballots, {:?} candidates, rules: {:?}",
        ballots.len(),
        universe.len(),
        rules
    );
    if universe.is_empty() {
        return Err(VotingErrors::NoCandidates);
    }
    if ballots.is_empty() {
        return Err(VotingErrors::NoBallots);
    }

    let checked_votes = checks(universe, ballots)?;
    let all_candidates: Vec<(String, CandidateId)> = universe
        .names()
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), CandidateId(idx as u32)))
        .collect();
    for (name, cid) in all_candidates.iter() {
        info!("Candidate: {}: {}", cid.0 + 1, name);
    }

    let valid_count = VoteCount(checked_votes.len() as u64);
    // Strictly more than half of the valid ballots.
    let threshold = VoteCount(valid_count.0 / 2);

    if let [(name, _)] = all_candidates.as_slice() {
        info!("run_voting_stats: {} is the only candidate", name);
        return Ok(VotingResult {
            winner: Some(Winner {
                name: name.clone(),
                kind: WinnerKind::Unopposed,
            }),
            threshold: threshold.0,
            valid_count: valid_count.0,
            round_stats: Vec::new(),
        });
    }

    let num_rounds = (all_candidates.len() - 1) as RoundId;
    let mut cur_state = ElectionState::initial(&checked_votes);
    let mut cur_stats: Vec<RoundStatistics> = Vec::new();

    for round_id in 1..=num_rounds {
        let (next_state, round_stats) = run_one_round(
            cur_state,
            &checked_votes,
            &all_candidates,
            threshold,
            rules,
            round_id,
            round_id == num_rounds,
        )?;
        info!("Round id: {:?} stats: {:?}", round_id, round_stats);
        assert!(
            next_state.eliminated.len() <= round_id as usize,
            "More than one candidate eliminated per round: {:?}",
            next_state.eliminated
        );
        cur_state = next_state;
        let decision = round_stats.decision;
        cur_stats.push(round_stats);

        if let Some((cid, kind)) = decision {
            let (name, _) = &all_candidates[cid.0 as usize];
            info!("run_voting_stats: winner {} ({:?})", name, kind);
            return Ok(VotingResult {
                winner: Some(Winner {
                    name: name.clone(),
                    kind,
                }),
                threshold: threshold.0,
                valid_count: valid_count.0,
                round_stats: round_results_to_stats(&cur_stats, &all_candidates),
            });
        }
    }

    // Only reachable if every ballot got exhausted.
    info!("run_voting_stats: no winner, all the ballots are exhausted");
    Ok(VotingResult {
        winner: None,
        threshold: threshold.0,
        valid_count: valid_count.0,
        round_stats: round_results_to_stats(&cur_stats, &all_candidates),
    })
}

fn round_results_to_stats(
    results: &[RoundStatistics],
    candidates: &[(String, CandidateId)],
) -> Vec<RoundStats> {
    results
        .iter()
        .enumerate()
        .map(|(idx, r)| round_result_to_stat(r, idx as RoundId + 1, candidates))
        .collect()
}

fn round_result_to_stat(
    stats: &RoundStatistics,
    round_id: RoundId,
    candidates: &[(String, CandidateId)],
) -> RoundStats {
    let name_of = |cid: &CandidateId| candidates[cid.0 as usize].0.clone();
    let mut rs = RoundStats {
        round: round_id,
        tally: Vec::new(),
        exhausted: stats.exhausted.0,
        elected: None,
        eliminated: None,
    };

    for (cid, c, status) in stats.candidate_stats.iter() {
        rs.tally.push((name_of(cid), c.0));
        match status {
            RoundCandidateStatusInternal::StillRunning => {
                // Nothing to say about this candidate
            }
            RoundCandidateStatusInternal::Elected => {
                rs.elected = Some(name_of(cid));
            }
            RoundCandidateStatusInternal::Eliminated(transfers, exhausted) => {
                rs.eliminated = Some(EliminationStats {
                    name: name_of(cid),
                    transfers: transfers
                        .iter()
                        .map(|(t_cid, t_count)| (name_of(t_cid), t_count.0))
                        .collect(),
                    exhausted: exhausted.0,
                });
            }
        }
    }
    rs
}

// Candidates are returned in universe order, including the ones without any vote.
fn compute_tally(
    state: &ElectionState,
    votes: &[VoteInternal],
    running: &[CandidateId],
) -> Vec<(CandidateId, VoteCount)> {
    let mut counts: HashMap<CandidateId, VoteCount> =
        running.iter().map(|cid| (*cid, VoteCount::EMPTY)).collect();
    for (cursor, v) in state.cursors.iter().zip(votes.iter()) {
        if let Some(vc) = cursor.candidate(v).and_then(|cid| counts.get_mut(&cid)) {
            *vc += VoteCount::ONE;
        }
    }
    running
        .iter()
        .map(|cid| (*cid, counts.get(cid).cloned().unwrap_or(VoteCount::EMPTY)))
        .collect()
}

/// Runs one round: tally, majority check, then elimination and transfer of the
/// ballots of the eliminated candidate.
///
/// The state is returned unchanged when a candidate wins by majority.
fn run_one_round(
    state: ElectionState,
    votes: &[VoteInternal],
    candidates: &[(String, CandidateId)],
    threshold: VoteCount,
    rules: &VoteRules,
    num_round: RoundId,
    last_round: bool,
) -> Result<(ElectionState, RoundStatistics), VotingErrors> {
    let eliminated_before = state.eliminated_set();
    let running: Vec<CandidateId> = candidates
        .iter()
        .map(|(_, cid)| *cid)
        .filter(|cid| !eliminated_before.contains(cid))
        .collect();

    let tally = compute_tally(&state, votes, &running);
    let exhausted = state.exhausted_count();
    debug!("run_one_round: tally: {:?} exhausted: {:?}", tally, exhausted);
    assert_eq!(
        tally.iter().map(|(_, vc)| *vc).sum::<VoteCount>() + exhausted,
        VoteCount(votes.len() as u64),
        "Every ballot is either counted once or exhausted"
    );

    // At most one candidate can have more than half of the ballots.
    if let Some((winner, _)) = tally.iter().find(|(_, vc)| *vc > threshold) {
        debug!(
            "run_one_round: {:?} is above threshold {:?}, marking as winner",
            winner, threshold
        );
        let candidate_stats = tally
            .iter()
            .map(|(cid, vc)| {
                let status = if cid == winner {
                    RoundCandidateStatusInternal::Elected
                } else {
                    RoundCandidateStatusInternal::StillRunning
                };
                (*cid, *vc, status)
            })
            .collect();
        let stats = RoundStatistics {
            candidate_stats,
            exhausted,
            decision: Some((*winner, WinnerKind::Majority)),
        };
        return Ok((state, stats));
    }

    let (loser, tiebreak) =
        find_eliminated_candidate(&tally, rules.tiebreak_mode, candidates, num_round)
            .ok_or(VotingErrors::NoConvergence)?;
    debug!(
        "run_one_round: eliminated candidate: {:?} tiebreak situation: {:?}",
        loser, tiebreak
    );

    let mut eliminated = state.eliminated;
    eliminated.push(loser);
    let eliminated_set: HashSet<CandidateId> = eliminated.iter().cloned().collect();

    // Move every ballot to its next preference, and record where the ballots of the
    // eliminated candidate went.
    let mut transfers: HashMap<CandidateId, VoteCount> = HashMap::new();
    let mut exhausted_now = VoteCount::EMPTY;
    let cursors: Vec<Cursor> = state
        .cursors
        .iter()
        .zip(votes.iter())
        .map(|(cursor, v)| {
            let next = cursor.advance(v, &eliminated_set);
            if cursor.candidate(v) == Some(loser) {
                match next.candidate(v) {
                    Some(cid) => *transfers.entry(cid).or_insert(VoteCount::EMPTY) += VoteCount::ONE,
                    None => exhausted_now += VoteCount::ONE,
                }
            }
            next
        })
        .collect();
    let next_state = ElectionState {
        cursors,
        eliminated,
    };

    // After the last round, only one candidate is left. It wins if some ballot
    // still supports it.
    let survivor: Option<CandidateId> = if last_round {
        let remaining: Vec<CandidateId> = running
            .iter()
            .filter(|cid| **cid != loser)
            .cloned()
            .collect();
        assert_eq!(remaining.len(), 1, "Only one candidate left after the last round");
        let all_exhausted = next_state.cursors.iter().all(|c| *c == Cursor::Exhausted);
        if all_exhausted {
            None
        } else {
            remaining.first().cloned()
        }
    } else {
        None
    };

    let candidate_stats = tally
        .iter()
        .map(|(cid, vc)| {
            let status = if *cid == loser {
                let mut ts: Vec<(CandidateId, VoteCount)> =
                    transfers.iter().map(|(c, n)| (*c, *n)).collect();
                ts.sort();
                RoundCandidateStatusInternal::Eliminated(ts, exhausted_now)
            } else if Some(*cid) == survivor {
                RoundCandidateStatusInternal::Elected
            } else {
                RoundCandidateStatusInternal::StillRunning
            };
            (*cid, *vc, status)
        })
        .collect();

    let stats = RoundStatistics {
        candidate_stats,
        exhausted,
        decision: survivor.map(|cid| (cid, WinnerKind::LastStanding)),
    };
    Ok((next_state, stats))
}

// Flag to indicate if a tiebreak happened.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
enum TiebreakSituation {
    Clean,           // Did not happen
    TiebreakOccured, // Happened and had to be resolved.
}

fn find_eliminated_candidate(
    tally: &[(CandidateId, VoteCount)],
    tiebreak: TieBreakMode,
    candidates: &[(String, CandidateId)],
    num_round: RoundId,
) -> Option<(CandidateId, TiebreakSituation)> {
    let min_count: VoteCount = tally.iter().map(|(_, vc)| *vc).min()?;

    let all_smallest: Vec<(CandidateId, String)> = tally
        .iter()
        .filter(|(_, vc)| *vc == min_count)
        .map(|(cid, _)| (*cid, candidates[cid.0 as usize].0.clone()))
        .collect();
    debug!(
        "find_eliminated_candidate: all_smallest: {:?}",
        all_smallest
    );

    // No tiebreak, the logic below is not relevant.
    if let [(cid, _)] = all_smallest.as_slice() {
        return Some((*cid, TiebreakSituation::Clean));
    }

    let sorted_candidates: Vec<CandidateId> = match tiebreak {
        TieBreakMode::Lexicographic => {
            let mut res = all_smallest;
            res.sort_by(|a, b| a.1.cmp(&b.1));
            res.iter().map(|(cid, _)| *cid).collect()
        }
        TieBreakMode::UseCandidateOrder => {
            // The candidate listed last goes first.
            let mut res: Vec<CandidateId> = all_smallest.iter().map(|(cid, _)| *cid).collect();
            res.sort();
            res.reverse();
            res
        }
        TieBreakMode::Random(seed) => candidate_permutation_crypto(&all_smallest, seed, num_round),
    };
    debug!(
        "find_eliminated_candidate: elimination queue using tiebreak mode {:?}: {:?}",
        tiebreak, sorted_candidates
    );
    sorted_candidates
        .first()
        .map(|cid| (*cid, TiebreakSituation::TiebreakOccured))
}

/// Generates a "random" permutation of the candidates. Random in this context means hard to guess in advance.
/// The order only depends on the seed, the round and the names.
fn candidate_permutation_crypto(
    candidates: &[(CandidateId, String)],
    seed: u32,
    num_round: RoundId,
) -> Vec<CandidateId> {
    let mut data: Vec<(CandidateId, String)> = candidates
        .iter()
        .map(|(cid, name)| {
            (
                *cid,
                sha256::digest(format!("{:08}{:08}{}", seed, num_round, name)),
            )
        })
        .collect();
    data.sort_by(|a, b| a.1.cmp(&b.1));
    data.iter().map(|p| p.0).collect()
}

// Converts the ballots to candidate ids.
fn checks(universe: &Universe, ballots: &[Ballot]) -> Result<Vec<VoteInternal>, VotingErrors> {
    let ids: HashMap<&str, CandidateId> = universe
        .names()
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), CandidateId(idx as u32)))
        .collect();
    let mut res: Vec<VoteInternal> = Vec::with_capacity(ballots.len());
    for b in ballots.iter() {
        let mut ranking: Vec<CandidateId> = Vec::with_capacity(b.ranking.len());
        for name in b.ranking.iter() {
            let cid = ids
                .get(name.as_str())
                .ok_or_else(|| VotingErrors::UnknownCandidate {
                    voter_id: b.voter_id.clone(),
                    name: name.clone(),
                })?;
            ranking.push(*cid);
        }
        res.push(VoteInternal { ranking });
    }
    debug!("checks: {} ballots, {} candidates", res.len(), ids.len());
    Ok(res)
}
