// Primitives for reading CSV files.

use std::io;
use std::str::{self, Utf8Error};

use csv::{Reader, ReaderBuilder, Trim};

use crate::rcv::{io_common::make_default_id, *};

/// Reads the ballots of a CSV file, or of the standard input if the path is `-`.
///
/// Each line is a ballot: the voter id, then the candidates in order of
/// preference. All the fields are trimmed. A line that cannot be decoded is
/// kept without any preference, so that it is counted as malformed. Only I/O
/// errors stop the reading.
pub fn read_csv_ranking(path: &str, cfs: &FileSource) -> RcvResult<Vec<BallotRecord>> {
    let first_row = cfs.first_vote_row_index()?;
    if path == STDIN {
        parse_records(reader_builder().from_reader(io::stdin()), path, first_row)
    } else {
        let rdr = reader_builder()
            .from_path(path)
            .context(CsvOpenSnafu { path })?;
        parse_records(rdr, path, first_row)
    }
}

fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(false).flexible(true).trim(Trim::All);
    builder
}

fn parse_records<R: io::Read>(
    rdr: Reader<R>,
    path: &str,
    first_row: usize,
) -> RcvResult<Vec<BallotRecord>> {
    let default_id = make_default_id(path);
    let mut res: Vec<BallotRecord> = Vec::new();

    // The index starts at 1 to respect most conventions in the spreadsheet world
    for (idx, line_r) in rdr.into_byte_records().enumerate().skip(first_row - 1) {
        let line = match line_r {
            Ok(line) => line,
            Err(e) if e.is_io_error() => {
                return Err(e).context(CsvLineParseSnafu {
                    path,
                    lineno: idx + 1,
                });
            }
            Err(e) => {
                warn!(
                    "Warning: line {} of {} cannot be parsed and is not counted: {}",
                    idx + 1,
                    path,
                    e
                );
                res.push(BallotRecord {
                    voter_id: default_id(idx + 1),
                    choices: Vec::new(),
                });
                continue;
            }
        };
        let lineno = line
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);

        let id = match line.get(0) {
            Some(s) if !s.is_empty() => String::from_utf8_lossy(s).to_string(),
            _ => default_id(lineno),
        };
        let decoded: Result<Vec<String>, Utf8Error> = line
            .iter()
            .skip(1)
            .map(|s| str::from_utf8(s).map(|s| s.to_string()))
            .collect();
        let choices = match decoded {
            Ok(choices) => choices,
            Err(e) => {
                warn!(
                    "Warning: line {} of {} is not valid UTF-8 and is not counted: {}",
                    lineno, path, e
                );
                Vec::new()
            }
        };
        debug!(
            "read_csv_ranking: lineno: {:?} id: {:?} row: {:?}",
            lineno, id, &choices
        );

        res.push(BallotRecord {
            voter_id: id,
            choices,
        });
    }
    info!("read_csv_ranking: {} records read from {}", res.len(), path);
    Ok(res)
}
