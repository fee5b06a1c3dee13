use std::path::PathBuf;

/// The Scry command line tool.
#[derive(clap::Parser)]
pub struct CliOpts {
    /// The command to run.
    #[clap(subcommand)]
    pub action: CliAction,
}

/// The command to run.
#[derive(clap::Subcommand)]
pub enum CliAction {
    /// Command to hash strings, in the form of an external strings lookup.
    Hash {
        /// Use 32-bit hashes.
        #[clap(long)]
        short: bool,

        /// Strings to hash.
        #[clap(required = true)]
        strings: Vec<String>,
    },

    /// Command to replace the hashed strings of a text with their value.
    Decode {
        /// Path to the external strings lookup file.
        #[clap(short, long, value_name = "PATH")]
        lookup: PathBuf,

        /// Path to the text to decode (standard input if not given).
        #[clap(short, long, value_name = "PATH")]
        input: Option<PathBuf>,
    },

    /// Command to check a set of event specs.
    Specs {
        /// Event specs (KDL format).
        ///
        /// If it ends with `.kdl`, it is treated as a path to a file
        /// declaring the specs. Otherwise it is directly parsed as inline
        /// KDL-formatted specs.
        #[clap(value_name = "CONTENT/PATH")]
        specs: String,
    },
}

impl CliOpts {
    /// Parses the CLI from the command-line.
    ///
    /// # Warning
    ///
    /// Exits on error.
    pub fn parse_from_cmdline() -> Self {
        <Self as clap::Parser>::parse()
    }
}
