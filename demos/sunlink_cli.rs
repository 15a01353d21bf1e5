use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sunlink::{DefaultCollaborators, Mode, Options, StdinPrompter};

/// Overwrite files before unlinking them.
#[derive(clap::Parser)]
struct Args {
    /// Files or directories to remove.
    paths: Vec<PathBuf>,

    /// Ignore nonexistent files, never prompt.
    #[clap(short = 'f', long)]
    force: bool,

    /// Prompt before every removal.
    #[clap(short = 'i', long)]
    interactive: bool,

    /// Remove directories and their contents recursively.
    #[clap(short = 'r', long = "recursive", alias = "R")]
    recursive: bool,

    /// Don't descend into other filesystems.
    #[clap(short = 'x', long)]
    one_filesystem: bool,

    /// Repeat for more detail; up to three times.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[clap(long, value_enum, default_value_t = ModeArg::Gutmann35)]
    mode: ModeArg,
}

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum ModeArg {
    Simple,
    Openbsd,
    Dod,
    Doe,
    Rcmp,
    Gutmann35,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Simple => Mode::Simple,
            ModeArg::Openbsd => Mode::OpenBsd,
            ModeArg::Dod => Mode::Dod,
            ModeArg::Doe => Mode::Doe,
            ModeArg::Rcmp => Mode::Rcmp,
            ModeArg::Gutmann35 => Mode::Gutmann35,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let options = Options {
        verbose: sunlink::VerboseLevel::new(args.verbose),
        force: args.force,
        interactive: args.interactive,
        recursive: args.recursive,
        one_filesystem: args.one_filesystem,
        mode: args.mode.into(),
    };

    let collaborators = DefaultCollaborators::new();
    let collab = collaborators.as_collaborators();
    let prompter = StdinPrompter;

    if sunlink::walk(&args.paths, &options, &collab, &prompter) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
