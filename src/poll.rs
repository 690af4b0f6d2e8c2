use log::{debug, info, warn};

use condorcet_tally::*;
use snafu::{prelude::*, ErrorCompat, Snafu};

use std::fmt::{self, Display};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::poll::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_json;
mod io_xlsx;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PollError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {name} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("The spreadsheet {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Unexpected cell content on line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive index, got {content}"))]
    ParsingNumber { content: String },
    #[snafu(display("Error opening CSV file"))]
    CsvOpen { source: csv::Error },
    #[snafu(display("Error parsing CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("CSV line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("The configuration path has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Unknown ballot provider {provider}"))]
    UnknownProvider { provider: String },
    #[snafu(display("Unknown ranking format {format}, expected 'order' or 'positions'"))]
    UnknownRankingFormat { format: String },
    #[snafu(display("Either --config or both --input and --candidates must be provided"))]
    MissingInput {},
    #[snafu(display("The poll could not be set up"))]
    Tally { source: TallyError },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PollResult<T> = Result<T, PollError>;

/// A ballot as read from a file, before it is matched against the candidates.
///
/// The choices are candidate names for the `order` encoding, and rank positions
/// (starting at 1) for the `positions` encoding.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: String,
    pub choices: Vec<String>,
}

/// Why a ballot from a file did not make it into the poll.
#[derive(Debug, Clone)]
enum Rejection {
    Tally(TallyError),
    BadPosition(String),
}

impl Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Tally(e) => write!(f, "{}", e),
            Rejection::BadPosition(s) => write!(f, "invalid position {}", s),
        }
    }
}

impl From<TallyError> for Rejection {
    fn from(e: TallyError) -> Self {
        Rejection::Tally(e)
    }
}

fn read_ballots(root_path: &Path, source: &BallotSource) -> PollResult<Vec<ParsedBallot>> {
    let p: PathBuf = [root_path, Path::new(source.file_path.as_str())]
        .iter()
        .collect();
    let p2 = p.as_os_str().to_str().unwrap_or(source.file_path.as_str());
    info!("read_ballots: provider: {} path: {}", source.provider, p2);
    match source.provider.as_str() {
        "csv" => io_csv::read_csv_ballots(p2, source),
        "json" => io_json::read_json_ballots(p2),
        "xlsx" => io_xlsx::read_excel_ballots(p2, source),
        x => UnknownProviderSnafu {
            provider: x.to_string(),
        }
        .fail(),
    }
}

// Blank choices are dropped: a ballot with missing entries is then too short.
fn to_ranking(
    poll: &Poll,
    ballot: &ParsedBallot,
    encoding: BallotEncoding,
) -> Result<Vec<usize>, Rejection> {
    let choices: Vec<&str> = ballot
        .choices
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    match encoding {
        BallotEncoding::Order => {
            let identifiers: Vec<Identifier> =
                choices.iter().map(|s| Identifier::from(*s)).collect();
            Ok(poll.ranking_from_identifiers(&identifiers)?)
        }
        BallotEncoding::Positions => {
            let mut positions: Vec<usize> = Vec::new();
            for s in choices {
                match s.parse::<usize>() {
                    Ok(x) if x > 0 => positions.push(x - 1),
                    _ => return Err(Rejection::BadPosition(s.to_string())),
                }
            }
            Ok(positions)
        }
    }
}

fn submit(poll: &Poll, ballot: &ParsedBallot, encoding: BallotEncoding) -> Result<(), Rejection> {
    let ranking = to_ranking(poll, ballot, encoding)?;
    let voter = VoterId::from(ballot.id.as_str());
    match encoding {
        BallotEncoding::Order => poll.submit_ballot(&voter, &ranking)?,
        BallotEncoding::Positions => poll.submit_ballot_positions(&voter, &ranking)?,
    };
    Ok(())
}

fn snapshot_to_json(poll: &Poll, snapshot: &StateSnapshot, voter: &str) -> JSValue {
    json!({
        "ballot": snapshot.sequence,
        "voter": voter,
        "stateMatrix": snapshot.matrix,
        "winner": winner_name(poll, &resolve_winner(snapshot)),
    })
}

fn winner_name(poll: &Poll, outcome: &Outcome) -> Option<String> {
    outcome
        .winner()
        .and_then(|idx| poll.registry().identifier(idx).ok())
        .map(|id| id.to_string())
}

/// Counts all the ballots of the configuration and assembles the summary.
fn tabulate(config: &PollConfig, root_path: &Path) -> PollResult<JSValue> {
    let rules = validate_rules(&config.rules)?;
    let names: Vec<Identifier> = config
        .candidates
        .iter()
        .map(|c| Identifier::from(c.name.as_str()))
        .collect();
    let poll = Poll::new(&names, &rules).context(TallySnafu {})?;

    if config.ballot_sources.is_empty() {
        warn!("tabulate: no ballot sources, the poll will be empty");
    }

    let mut accepted: Vec<String> = Vec::new();
    let mut rejected: Vec<JSValue> = Vec::new();
    for source in config.ballot_sources.iter() {
        let encoding = source.ranking_format()?;
        let ballots = read_ballots(root_path, source)?;
        debug!("tabulate: {} ballots read from {}", ballots.len(), source.file_path);
        for ballot in ballots.iter() {
            match submit(&poll, ballot, encoding) {
                Ok(()) => accepted.push(ballot.id.clone()),
                Err(r) => {
                    debug!("tabulate: ballot {:?} rejected: {}", ballot, r);
                    rejected.push(json!({"voter": ballot.id, "reason": r.to_string()}));
                }
            }
        }
    }
    poll.close();

    // The subscription replays every snapshot and ends with the closed poll.
    let results: Vec<JSValue> = poll
        .subscribe()
        .zip(accepted.iter())
        .map(|(snapshot, voter)| snapshot_to_json(&poll, &snapshot, voter))
        .collect();

    let last = poll.current_snapshot();
    let outcome = resolve_winner(&last);
    info!(
        "tabulate: {} ballots counted, {} rejected, outcome: {:?}, digest: {}",
        last.ballots_counted(),
        rejected.len(),
        outcome,
        last.digest
    );

    let candidates: Vec<String> = config.candidates.iter().map(|c| c.name.clone()).collect();
    Ok(json!({
        "config": {
            "contest": config.output_settings.contest_name,
            "candidates": candidates,
        },
        "results": results,
        "rejected": rejected,
        "outcome": {
            "winner": winner_name(&poll, &outcome),
            "ballotsCounted": last.ballots_counted(),
        },
    }))
}

fn write_summary(pretty_js: &str, out: Option<String>) -> PollResult<()> {
    match out.as_deref() {
        None | Some("") | Some("stdout") => {
            println!("{}", pretty_js);
        }
        Some(path) => {
            info!("write_summary: writing summary to {}", path);
            fs::write(path, pretty_js).context(WritingSummarySnafu { path })?;
        }
    }
    Ok(())
}

fn check_summary(pretty_js_stats: &str, check_summary_path: Option<String>) -> PollResult<()> {
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p.as_str())?;
        debug!("check_summary: reference: {:?}", summary_ref);
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
            return ReferenceMismatchSnafu {}.fail();
        }
        info!("check_summary: the summary matches {}", summary_p);
    }
    Ok(())
}

/// Runs a poll described by a configuration file.
///
/// `out` overrides the output file of the configuration. The output file of the
/// configuration is relative to the configuration directory.
pub fn run_poll(
    config_path: String,
    check_summary_path: Option<String>,
    out: Option<String>,
) -> PollResult<()> {
    let config = read_config(config_path.as_str())?;
    info!("config: {:?}", config);
    let root_p = Path::new(config_path.as_str())
        .parent()
        .context(MissingParentDirSnafu {})?;

    let result_js = tabulate(&config, root_p)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    let out_path = out.or_else(|| {
        config.output_settings.output_file.as_ref().map(|f| {
            let p: PathBuf = [root_p, Path::new(f.as_str())].iter().collect();
            p.to_string_lossy().to_string()
        })
    });
    write_summary(pretty_js_stats.as_str(), out_path)?;
    check_summary(pretty_js_stats.as_str(), check_summary_path)
}

/// Runs a poll from a single ballot file, with the candidates given on the command line.
pub fn run_poll_input(args: &Args) -> PollResult<()> {
    let (input, candidates) = match (&args.input, &args.candidates) {
        (Some(i), Some(c)) => (i, c),
        _ => return MissingInputSnafu {}.fail(),
    };
    let source = BallotSource {
        ranking_format: args.ranking_format.clone(),
        excel_worksheet_name: args.excel_worksheet_name.clone(),
        ..BallotSource::simple(args.input_type.as_deref().unwrap_or("csv"), input)
    };
    let config = PollConfig {
        output_settings: OutputSettings {
            contest_name: io_common::simplify_file_name(input),
            output_file: None,
        },
        candidates: candidates
            .iter()
            .map(|name| PollCandidate { name: name.clone() })
            .collect(),
        rules: PollRulesConfig::default(),
        ballot_sources: vec![source],
    };

    let result_js = tabulate(&config, Path::new(""))?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_summary(pretty_js_stats.as_str(), args.out.clone())?;
    check_summary(pretty_js_stats.as_str(), args.reference.clone())
}

pub fn run(args: &Args) -> PollResult<()> {
    match &args.config {
        Some(config_path) => run_poll(
            config_path.clone(),
            args.reference.clone(),
            args.out.clone(),
        ),
        None => run_poll_input(args),
    }
}

pub fn report_error(e: &PollError) {
    eprintln!("An error occured: {}", e);
    let mut source = std::error::Error::source(e);
    while let Some(s) = source {
        eprintln!("  caused by: {}", s);
        source = s.source();
    }
    if let Some(bt) = ErrorCompat::backtrace(e) {
        debug!("trace: {}", bt);
    }
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    let test_dir = format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), test_name);
    info!("Running test {}", test_name);
    let res = run_poll(
        format!("{}/{}_config.json", test_dir, test_name),
        Some(format!("{}/{}_expected_summary.json", test_dir, test_name)),
        None,
    );
    if let Err(e) = &res {
        report_error(e);
    }
    assert!(res.is_ok(), "test {} failed", test_name);
}
