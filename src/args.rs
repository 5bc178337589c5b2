use clap::Parser;

/// Risk-limiting audit of instant-runoff contests, from the assertions of an
/// assertion generator and the audited ballots.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file containing the audit description in JSON format: contest, assertions
    /// and audited ballots. See the manual of the irv_audit library for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the expected summary of the audit in JSON format.
    /// If provided, irvrla will check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the
    /// given location. By default, it is printed to the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) With --input-type ballots, the text file of raw ballots to interpret,
    /// one ballot per line.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default audit) The type of the input: 'audit' (with --config) or 'ballots' (with --input).
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (number in (0, 1)) If specified, overrides the risk limit of the audit description.
    #[clap(long, value_parser)]
    pub risk_limit: Option<f64>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
