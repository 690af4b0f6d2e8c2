use crate::poll::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputFile")]
    pub output_file: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteColumnIndex")]
    pub _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    pub _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "rankingFormat")]
    pub ranking_format: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl BallotSource {
    /// A source with all the defaults: no voter column, one ballot per row from
    /// the first row, choices starting from the first column.
    pub fn simple(provider: &str, file_path: &str) -> BallotSource {
        BallotSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            id_column_index: None,
            _first_vote_column_index: None,
            _first_vote_row_index: None,
            ranking_format: None,
            excel_worksheet_name: None,
        }
    }

    /// The 0-based index of the first column with a choice.
    pub fn first_vote_column_index(&self) -> PollResult<usize> {
        read_js_index(&self._first_vote_column_index)
    }

    /// The 0-based index of the first row with a ballot.
    pub fn first_vote_row_index(&self) -> PollResult<usize> {
        read_js_index(&self._first_vote_row_index)
    }

    pub fn id_column_index_int(&self) -> PollResult<Option<usize>> {
        if self.id_column_index.is_some() {
            read_js_index(&self.id_column_index).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn ranking_format(&self) -> PollResult<BallotEncoding> {
        match self.ranking_format.as_deref() {
            None | Some("order") => Ok(BallotEncoding::Order),
            Some("positions") => Ok(BallotEncoding::Positions),
            Some(x) => UnknownRankingFormatSnafu {
                format: x.to_string(),
            }
            .fail(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollCandidate {
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollRulesConfig {
    #[serde(rename = "maxIdentifierLength")]
    pub max_identifier_length: Option<String>,
    #[serde(rename = "ballotCapacity")]
    pub ballot_capacity: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub candidates: Vec<PollCandidate>,
    #[serde(default)]
    pub rules: PollRulesConfig,
    #[serde(rename = "ballotSources")]
    pub ballot_sources: Vec<BallotSource>,
}

pub fn read_config(path: &str) -> PollResult<PollConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: PollConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> PollResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

pub fn validate_rules(rules: &PollRulesConfig) -> PollResult<PollRules> {
    let max_identifier_len = match rules.max_identifier_length.as_deref() {
        None | Some("max") => None,
        Some(s) => match s.parse::<usize>() {
            Ok(x) if x > 0 => Some(x),
            x => {
                whatever!(
                    "Failed to understand maxIdentifierLength option: {:?}",
                    x
                )
            }
        },
    };
    let ballot_capacity = match rules.ballot_capacity.as_deref() {
        None => None,
        Some(s) => match s.parse::<u64>() {
            Ok(x) => Some(x),
            x => {
                whatever!("Failed to understand ballotCapacity option: {:?}", x)
            }
        },
    };
    Ok(PollRules {
        max_identifier_len,
        ballot_capacity,
    })
}

fn is_column_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic())
}

// Indices in the configuration start at 1, as in spreadsheets. Columns may also be
// given with their letters.
fn read_js_index(x: &Option<JSValue>) -> PollResult<usize> {
    let one_based: usize = match x {
        None => 1,
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingNumberSnafu {
                content: n.to_string(),
            })?,
        Some(JSValue::String(s)) if is_column_name(s) => s
            .to_ascii_lowercase()
            .chars()
            .try_fold(0usize, |acc, c| {
                acc.checked_mul(26)?
                    .checked_add(c as usize - 'a' as usize + 1)
            })
            .context(ParsingNumberSnafu { content: s.clone() })?,
        Some(JSValue::String(s)) => s
            .parse::<usize>()
            .ok()
            .context(ParsingNumberSnafu { content: s.clone() })?,
        Some(v) => {
            return ParsingNumberSnafu {
                content: v.to_string(),
            }
            .fail()
        }
    };
    if one_based == 0 {
        return ParsingNumberSnafu {
            content: "0".to_string(),
        }
        .fail();
    }
    Ok(one_based - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn indices() {
        assert_eq!(read_js_index(&None).unwrap(), 0);
        assert_eq!(read_js_index(&Some(json!(3))).unwrap(), 2);
        assert_eq!(read_js_index(&Some(json!("3"))).unwrap(), 2);
        assert_eq!(read_js_index(&Some(json!("C"))).unwrap(), 2);
        assert_eq!(read_js_index(&Some(json!("AA"))).unwrap(), 26);
        assert!(read_js_index(&Some(json!(0))).is_err());
        assert!(read_js_index(&Some(json!("x1"))).is_err());
        assert!(read_js_index(&Some(json!(true))).is_err());
    }

    #[test]
    fn column_name_too_long() {
        let res = read_js_index(&Some(json!("ZZZZZZZZZZZZZZZZ")));
        assert!(matches!(res, Err(PollError::ParsingNumber { .. })));
        assert_eq!(read_js_index(&Some(json!("zz"))).unwrap(), 701);
    }

    #[test]
    fn rules() {
        let r = validate_rules(&PollRulesConfig {
            max_identifier_length: Some("32".to_string()),
            ballot_capacity: Some("100".to_string()),
        })
        .unwrap();
        assert_eq!(r.max_identifier_len, Some(32));
        assert_eq!(r.ballot_capacity, Some(100));

        let r = validate_rules(&PollRulesConfig::default()).unwrap();
        assert_eq!(r, PollRules::DEFAULT_RULES);

        assert!(validate_rules(&PollRulesConfig {
            max_identifier_length: Some("lots".to_string()),
            ballot_capacity: None,
        })
        .is_err());
    }

    #[test]
    fn parse_config() {
        let js = r#"{
            "outputSettings": {"contestName": "Lunch"},
            "candidates": [{"name": "A"}, {"name": "B"}],
            "ballotSources": [
                {"provider": "csv", "filePath": "b.csv", "rankingFormat": "positions"}
            ]
        }"#;
        let config: PollConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.output_settings.contest_name, "Lunch");
        assert_eq!(config.rules, PollRulesConfig::default());
        let source = &config.ballot_sources[0];
        assert_eq!(source.ranking_format().unwrap(), BallotEncoding::Positions);
        assert_eq!(source.id_column_index_int().unwrap(), None);
        assert_eq!(source.first_vote_row_index().unwrap(), 0);
    }
}
