use clap::Parser;

/// This is a tabulation program for Condorcet polls.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the poll configuration in JSON.
    /// For more information about the file format, read the documentation of condorcet_tally::manual
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the summary of a poll in JSON format. If provided, condorcet will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the poll will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The file containing the ballots, when no configuration file is provided.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv, json or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (repeated) The names of the candidates, in order, when no configuration file is provided.
    #[clap(long, value_parser)]
    pub candidates: Option<Vec<String>>,

    /// (default order) How the ballots are written: 'order' (most preferred first) or
    /// 'positions' (the rank of each candidate).
    #[clap(long, value_parser)]
    pub ranking_format: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
