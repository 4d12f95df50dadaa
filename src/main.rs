use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use vocab_deck::archive::{dump_collection, read_collection};
use vocab_deck::enrich::MediaServices;
use vocab_deck::pipeline::{BuildOptions, MediaStack, build_deck};
use vocab_deck::{config, logging, output};

#[derive(Parser)]
#[command(name = "vocab-deck")]
#[command(about = "Turn vocabulary tables into Anki decks")]
#[command(long_about = "\
Turn vocabulary tables into Anki decks

The header row of the input table decides what the cards look like:

  Front;Back                    one card per row
  Front;Back;Reverse            plus a reversed card where Reverse is filled
  Front;Back;Sound;Listen       a listening card instead of a reading card
  Front;Back;Q&A                question and answer sides are labelled

Columns named Phonetics, Sound or Image are filled automatically: IPA from
espeak-ng, pronunciations from a text-to-speech command, pictures from an
image search. Generated media is kept in a media directory next to the
input file and reused on the next build.

Run 'vocab-deck gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Delimited vocabulary table with a header row
    input: PathBuf,

    /// Deck name (defaults to the input file name)
    #[arg(long)]
    deck_name: Option<String>,

    /// Archive file name without extension (defaults to the deck name)
    #[arg(long)]
    package_name: Option<String>,

    /// Directory the .apkg is written to
    #[arg(long, short, default_value = ".")]
    output: PathBuf,

    /// Config file (defaults to config.toml next to the input)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Language of the first column, overriding the config
    #[arg(long)]
    language: Option<String>,

    /// Do not generate phonetics, sounds or images
    #[arg(long)]
    no_media: bool,

    /// Regenerate media that already exists
    #[arg(long)]
    force_media: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build an .apkg from a vocabulary table
    Build(BuildArgs),
    /// List the models and notes of an .apkg
    Inspect {
        /// Archive to read
        archive: PathBuf,
    },
    /// Write the notes of an .apkg back to CSV, one file per model
    Dump {
        /// Archive to read
        archive: PathBuf,
        /// Directory the CSV files are written to
        #[arg(long, short, default_value = ".")]
        output: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    match cli.command {
        Command::Build(args) => run_build(args)?,
        Command::Inspect { archive } => {
            let collection = read_collection(&archive)?;
            output::print_collection(&collection);
        }
        Command::Dump { archive, output: out_dir } => {
            let collection = read_collection(&archive)?;
            let files = dump_collection(&collection, &out_dir)?;
            output::print_dump_output(&files);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_build(args: BuildArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = BuildOptions {
        deck_name: args.deck_name,
        package_name: args.package_name,
        output_dir: args.output,
        no_media: args.no_media,
        force_media: args.force_media,
        language: args.language,
        ..BuildOptions::new(args.input)
    };

    let deck_config = match &args.config {
        Some(file) => {
            options.config_dir = Some(parent_dir(file).to_path_buf());
            config::load_config_file(file)?
        }
        None => config::load_config(options.input_dir())?,
    };

    println!("==> Building {}", options.input.display());
    let report = if options.no_media {
        build_deck(&options, &deck_config, MediaServices::none())?
    } else {
        let stack = MediaStack::from_config(&deck_config, options.language(&deck_config))?;
        build_deck(&options, &deck_config, stack.services())?
    };
    info!("Build finished");
    output::print_build_report(&report);
    Ok(())
}

fn parent_dir(file: &Path) -> &Path {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
