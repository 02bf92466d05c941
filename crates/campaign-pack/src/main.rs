use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    hash_pack, info_pack, validate_pack, HashPackArgs, InfoPackArgs, ValidatePackArgs,
};
use miette::Result;

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a content pack file and print an itemized report
    Validate {
        /// The path to the content pack file
        #[arg(short, long)]
        file_path: String,
    },
    /// Show information about a content pack
    Info {
        /// The path to the content pack file
        #[arg(short, long)]
        file_path: String,
    },
    /// Print the SHA-256 content hash of a pack
    Hash {
        /// The path to the content pack file
        #[arg(short, long)]
        file_path: String,
    },
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).expect("failed to parse arguments")
}

fn main() -> Result<()> {
    let args = parse_args();

    match args.command {
        Commands::Validate { file_path } => validate_pack(ValidatePackArgs { file_path }),
        Commands::Info { file_path } => info_pack(InfoPackArgs { file_path }),
        Commands::Hash { file_path } => hash_pack(HashPackArgs { file_path }),
    }
}
