// Primitives for reading CSV files.

use std::io;

use crate::poll::{io_common::make_default_id, *};

pub fn read_csv_ballots(path: &str, source: &BallotSource) -> PollResult<Vec<ParsedBallot>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {})?;
    read_csv_records(rdr, path, source)
}

pub fn read_csv_records<R: io::Read>(
    rdr: csv::Reader<R>,
    path: &str,
    source: &BallotSource,
) -> PollResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);

    let id_idx_o = source.id_column_index_int()?;
    let choices_start_col = source.first_vote_column_index()?;
    let first_row = source.first_vote_row_index()?;

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        // The index starts at 1 to respect most conventions in the excel world
        let lineno = idx + 1;
        if idx < first_row {
            debug!("read_csv_records: skipping line {}", lineno);
            continue;
        }
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let id = if let Some(id_idx) = id_idx_o {
            line.get(id_idx)
                .context(CsvLineTooShortSnafu { lineno })?
                .trim()
                .to_string()
        } else {
            default_id(lineno)
        };
        if line.len() <= choices_start_col {
            return CsvLineTooShortSnafu { lineno }.fail();
        }

        let choices: Vec<String> = line
            .iter()
            .skip(choices_start_col)
            .map(|s| s.to_string())
            .collect();
        debug!("read_csv_records: lineno: {:?} row: {:?}", lineno, &choices);

        res.push(ParsedBallot { id, choices });
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data.as_bytes())
    }

    #[test]
    fn with_voter_column_and_header() {
        let data = "voter,c1,c2,c3\nalice,A,B,C\nbob,B,C,A\n";
        let source = BallotSource {
            id_column_index: Some(json!(1)),
            _first_vote_column_index: Some(json!(2)),
            _first_vote_row_index: Some(json!(2)),
            ..BallotSource::simple("csv", "ballots.csv")
        };
        let res = read_csv_records(reader(data), "ballots.csv", &source).unwrap();
        assert_eq!(
            res,
            vec![
                ParsedBallot {
                    id: "alice".to_string(),
                    choices: vec!["A".to_string(), "B".to_string(), "C".to_string()],
                },
                ParsedBallot {
                    id: "bob".to_string(),
                    choices: vec!["B".to_string(), "C".to_string(), "A".to_string()],
                },
            ]
        );
    }

    #[test]
    fn default_voter_ids() {
        let data = "A,B\nB,A\n";
        let source = BallotSource::simple("csv", "/tmp/lunch.csv");
        let res = read_csv_records(reader(data), "/tmp/lunch.csv", &source).unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].id, "lunch.csv-00000001");
        assert_eq!(res[1].id, "lunch.csv-00000002");
        assert_eq!(res[1].choices, vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn short_line() {
        let data = "alice,A,B\nbob\n";
        let source = BallotSource {
            id_column_index: Some(json!(1)),
            _first_vote_column_index: Some(json!(2)),
            ..BallotSource::simple("csv", "ballots.csv")
        };
        let res = read_csv_records(reader(data), "ballots.csv", &source);
        assert!(matches!(res, Err(PollError::CsvLineTooShort { lineno: 2 })));
    }
}
