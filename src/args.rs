use clap::Parser;

/// This is a stratified neighborhood sampling program for survey fieldwork planning.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON plan describing the register source, the column mapping,
    /// the sampling parameters and the special population adjustments.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path) A reference summary from a previous run in JSON format. If provided,
    /// stratsample will check that the computed plan matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the plan will be written
    /// in JSON format to the given location instead of the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A CSV of metropolitan province NUTS3 codes. Together with
    /// --other-provinces it restricts the register to the listed provinces before sampling.
    #[clap(long, value_parser)]
    pub metropol_provinces: Option<String>,

    /// (file path) A CSV of non-metropolitan province NUTS3 codes.
    #[clap(long, value_parser)]
    pub other_provinces: Option<String>,

    /// (directory, default current) Where the exported neighborhood code lists are written
    /// when the province filters are used.
    #[clap(long, value_parser)]
    pub codes_dir: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
