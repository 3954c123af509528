// Text report of an election, written to the standard output.

use std::fmt::Write;

use instant_runoff::*;

/// Renders the ballot counts, the winner and the history of the rounds.
///
/// Percentages are relative to the number of valid ballots, so the exhausted
/// ballots explain the gap to 100% in the later rounds.
pub fn render_report(election: &ValidatedElection, result: &VotingResult) -> String {
    let mut out = String::new();
    write_report(&mut out, election, result).ok();
    out
}

fn write_report(
    out: &mut String,
    election: &ValidatedElection,
    result: &VotingResult,
) -> std::fmt::Result {
    let total = election.valid_count() + election.invalid_count();
    writeln!(out, "Total ballots cast  {:6}", total)?;
    writeln!(out, "  Valid             {:6}", election.valid_count())?;
    writeln!(out, "  Invalid           {:6}", election.invalid_count())?;
    if election.malformed_count() > 0 {
        writeln!(out, "  Malformed         {:6}", election.malformed_count())?;
    }
    writeln!(out)?;

    match &result.winner {
        Some(winner) => {
            writeln!(out, "The winner is: {}", winner.name)?;
            if winner.kind == WinnerKind::Unopposed {
                writeln!(out, "({} is the only candidate, no round was needed)", winner.name)?;
            }
        }
        None => writeln!(out, "The winner is: (no winner)")?,
    }

    let width = election
        .universe
        .names()
        .iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0);

    for round in result.round_stats.iter() {
        writeln!(out)?;
        writeln!(out, "===== ROUND {} =====", round.round)?;
        writeln!(out)?;
        writeln!(out, "Vote counts:")?;
        for (name, count) in round.tally.iter() {
            writeln!(
                out,
                "  {:width$} {:6} {:6.2}%",
                name,
                count,
                result.percentage(*count),
                width = width
            )?;
        }
        if round.exhausted > 0 {
            writeln!(
                out,
                "  {:width$} {:6} {:6.2}%",
                "(exhausted)",
                round.exhausted,
                result.percentage(round.exhausted),
                width = width
            )?;
        }
        writeln!(out)?;
        if let Some(elim) = &round.eliminated {
            writeln!(out, "Eliminated candidate: {}", elim.name)?;
            for (name, count) in elim.transfers.iter() {
                writeln!(out, "  {} ballot(s) transferred to {}", count, name)?;
            }
            if elim.exhausted > 0 {
                writeln!(out, "  {} ballot(s) exhausted", elim.exhausted)?;
            }
        }
        if let Some(name) = &round.elected {
            writeln!(out, "Winner declared: {}", name)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use instant_runoff::builder::Builder;

    fn tabulate(candidates: &[&str], records: &[&[&str]]) -> (ValidatedElection, VotingResult) {
        let mut b = Builder::new();
        b.add_record("candidates", candidates);
        for (idx, choices) in records.iter().enumerate() {
            b.add_record(&format!("v{}", idx + 1), *choices);
        }
        let election = b.finish().unwrap();
        let result =
            run_voting_stats(&election.universe, &election.ballots, &VoteRules::default()).unwrap();
        (election, result)
    }

    #[test]
    fn example_report() {
        let (election, result) = tabulate(&["A", "B", "C"], &[
            &["A", "B", "C"],
            &["A", "B", "C"],
            &["B", "A", "C"],
            &["C", "A", "B"],
            &["A", "B"],
        ]);
        let report = render_report(&election, &result);
        let expected = "\
Total ballots cast       5
  Valid                  4
  Invalid                1

The winner is: A

===== ROUND 1 =====

Vote counts:
  A      2  50.00%
  B      1  25.00%
  C      1  25.00%

Eliminated candidate: B
  1 ballot(s) transferred to A

===== ROUND 2 =====

Vote counts:
  A      3  75.00%
  C      1  25.00%

Winner declared: A
";
        assert_eq!(report, expected);
    }

    #[test]
    fn unopposed_report() {
        let (election, result) = tabulate(&["Solo"], &[&["Solo"], &[]]);
        let report = render_report(&election, &result);
        assert!(report.contains("  Malformed              1\n"));
        assert!(report.contains("The winner is: Solo\n"));
        assert!(report.contains("only candidate"));
        assert!(!report.contains("ROUND"));
    }
}
