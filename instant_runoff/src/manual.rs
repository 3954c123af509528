/*!

This is the long-form manual for `instant_runoff` and `irving`.

## Input format

The input is a comma-separated text file, one ballot per line:

```text
colors, sky blue, powder blue, antique white, fuchsia
Joe,  sky blue, powder blue, antique white, fuchsia
Mary, fuchsia, powder blue, sky blue, antique white
Bob,  fuchsia, sky blue, powder blue, antique white
```

* The first column is the voter name or id. If it is empty, an id is made
  from the file name and the line number.
* The remaining columns are the candidates, in descending order of preference.
* Candidates are compared with string equality, after leading and trailing
  whitespace is removed.

The first line lists the candidates. It is not a ballot: its first column can
be any label. Every ballot must rank every candidate; a ballot that does not
rank exactly the same candidates is reported as invalid and left out of the
count. A line with a voter id but no candidate, or that cannot be decoded, is
ignored.

In the example above, `fuchsia` wins in the first round.

## Counting

Each round counts, for every candidate still running, the ballots whose
highest-ranked running candidate it is. A candidate with strictly more than
half of the valid ballots wins and the count stops. Otherwise the candidate
with the fewest votes is eliminated and its ballots go to their next choice.
With `n` candidates, at most `n - 1` rounds are run: if no one has a majority
by then, the last candidate standing wins.

### Ties

When several candidates share the lowest count, the tie-break mode decides who
is eliminated:

* `lexicographic` (default): the smallest name, in byte order.
* `useCandidateOrder`: the candidate listed last on the first line.
* `random`: a reproducible order derived from a SHA-256 hash of the seed
  (`randomSeed`), the round number and the names.

## Configuration

`irving` can be driven entirely from the command line. For repeated runs, the
same options can be kept in a JSON file passed with `--config`:

```text
{
  "outputSettings": {
    "contestName": "Bike shed color",
    "contestDate": "2022-10-01",
    "contestJurisdiction": "Building 4",
    "contestOffice": "Shed"
  },
  "cvrFileSources": [
    { "provider": "csv", "filePath": "ballots.csv", "firstVoteRowIndex": 1 }
  ],
  "rules": { "tiebreakMode": "lexicographic" }
}
```

File paths are relative to the configuration file. Several sources are read in
order, as if they were one file. `firstVoteRowIndex` is 1-based: use `2` to skip
a header row.

Command line flags take precedence over the configuration file.

## Output

The text report lists the number of ballots, the winner, and for every round
the count and share of each candidate, followed by the eliminated candidate or
the declared winner. With `--out`, a JSON summary compatible with
[RCVis](https://rcvis.com/) is also written.

 */
