// Ballots stored as a JSON list.

use serde::Deserialize;

use crate::poll::{io_common::make_default_id, *};

#[derive(Debug, Clone, Deserialize)]
struct JsonBallot {
    voter: Option<String>,
    ranking: Vec<JSValue>,
}

pub fn read_json_ballots(path: &str) -> PollResult<Vec<ParsedBallot>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    parse_json_ballots(contents.as_str(), path)
}

fn parse_json_ballots(contents: &str, path: &str) -> PollResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);
    let ballots: Vec<JsonBallot> = serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, jb) in ballots.into_iter().enumerate() {
        let choices: Vec<String> = jb
            .ranking
            .iter()
            .map(|v| match v {
                JSValue::String(s) => s.clone(),
                JSValue::Null => String::new(),
                x => x.to_string(),
            })
            .collect();
        let id = jb.voter.unwrap_or_else(|| default_id(idx + 1));
        debug!("parse_json_ballots: {:?} {:?}", id, choices);
        res.push(ParsedBallot { id, choices });
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_numbers() {
        let js = r#"[
            {"voter": "alice", "ranking": ["A", "B"]},
            {"ranking": [2, 1]}
        ]"#;
        let res = parse_json_ballots(js, "polls/lunch.json").unwrap();
        assert_eq!(res[0].id, "alice");
        assert_eq!(res[0].choices, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(res[1].id, "lunch.json-00000002");
        assert_eq!(res[1].choices, vec!["2".to_string(), "1".to_string()]);
    }

    #[test]
    fn not_a_list() {
        let res = parse_json_ballots(r#"{"voter": "alice"}"#, "lunch.json");
        assert!(matches!(res, Err(PollError::ParsingJson { .. })));
    }
}
