use crate::core::discovery::DEFAULT_MAX_FILE_SIZE;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "zqc",
    version,
    about = "Aggregate ALFA, TIN score and zPCA outputs into one report"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan directories and write the report.
    Run(RunArgs),
    /// Print the available modules and their search patterns.
    List,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Directories to search for tool outputs.
    #[arg(required = true)]
    pub dirs: Vec<PathBuf>,

    #[arg(long)]
    pub out: PathBuf,

    /// Restrict the run to these modules (default: all).
    #[arg(long = "module", value_enum)]
    pub modules: Vec<ModuleArg>,

    #[arg(long, value_name = "GLOB")]
    pub alfa_pattern: Option<String>,

    #[arg(long, value_name = "GLOB")]
    pub tin_pattern: Option<String>,

    #[arg(long, value_name = "GLOB")]
    pub pca_pattern: Option<String>,

    #[arg(long, value_name = "GLOB")]
    pub scree_pattern: Option<String>,

    /// ALFA result directories to report, in order.
    #[arg(long = "alfa-group", value_name = "NAME")]
    pub alfa_groups: Vec<String>,

    /// Skip input files larger than this many bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,

    #[arg(long, default_value = "zqc report")]
    pub title: String,

    #[arg(long, default_value_t = false)]
    pub no_zip: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ModuleArg {
    #[value(name = "alfa")]
    Alfa,
    #[value(name = "tin-score")]
    TinScore,
    #[value(name = "zpca")]
    Zpca,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_args_parse() {
        let cli = Cli::try_parse_from([
            "zqc",
            "-vv",
            "run",
            "a",
            "b",
            "--out",
            "o",
            "--module",
            "tin-score",
            "--alfa-group",
            "Unique",
            "--no-zip",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.dirs, vec![PathBuf::from("a"), PathBuf::from("b")]);
                assert_eq!(args.modules, vec![ModuleArg::TinScore]);
                assert_eq!(args.alfa_groups, vec!["Unique"]);
                assert_eq!(args.max_file_size, DEFAULT_MAX_FILE_SIZE);
                assert!(args.no_zip);
            }
            Commands::List => panic!("expected run"),
        }
    }

    #[test]
    fn run_needs_a_directory() {
        assert!(Cli::try_parse_from(["zqc", "run", "--out", "o"]).is_err());
    }
}
