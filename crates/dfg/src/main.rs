use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum, error::ErrorKind};
use clap_complete::{
    generate,
    shells::{Bash, Fish, Zsh},
};
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

use dfg_core::Error;
use dfg_core::decode::{decode_file, decode_file_at, decode_reader, decode_reader_at};
use dfg_core::exit_code::ExitCode;
use dfg_core::template::DockerfileTemplate;
use dfg_core::verify::verify;

const LONG_ABOUT: &str = "Generate Dockerfiles from YAML.\n\nThe input document holds a `stages` mapping from stage name to a list of instructions. Stages are emitted in the order they are declared. Use --target-field to read the stages from a nested location inside a larger YAML file.";

const AFTER_HELP: &str = "Examples:\n  dfg generate --input dfg.yaml --stdout\n  dfg generate -i dfg.yaml -o Dockerfile\n  dfg generate -i config.yaml --target-field .dev.servers[0].dockerfileConfig --stdout\n  cat dfg.yaml | dfg generate -i - --stdout --verify";

fn main() {
    let code = match run() {
        Ok(()) => ExitCode::Success,
        Err(app_error) => {
            if !app_error.message.is_empty() {
                eprintln!("{}", app_error.message);
            }
            app_error.code
        }
    };
    std::process::exit(code.as_i32());
}

#[derive(Debug)]
struct AppError {
    code: ExitCode,
    message: String,
}

impl AppError {
    fn usage(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::Usage,
            message: message.into(),
        }
    }
}

impl From<Error> for AppError {
    fn from(value: Error) -> Self {
        Self {
            code: ExitCode::from(&value),
            message: value.to_string(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Generate a Dockerfile from a YAML document")]
    Generate(GenerateArgs),
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum, value_name = "SHELL")]
        shell: CompletionShell,
    },
}

#[derive(Debug, clap::Args)]
struct GenerateArgs {
    #[arg(
        short = 'i',
        long = "input",
        value_name = "PATH",
        help = "YAML input file, or - for stdin"
    )]
    input: String,

    #[arg(
        short = 'o',
        long = "out",
        value_name = "PATH",
        help = "Write the Dockerfile to PATH",
        conflicts_with = "stdout"
    )]
    out: Option<PathBuf>,

    #[arg(long = "stdout", help = "Write the Dockerfile to stdout")]
    stdout: bool,

    #[arg(
        short = 't',
        long = "target-field",
        value_name = "PATH-EXPR",
        help = "Location of the stages inside the input",
        long_help = "Path expression selecting the node that holds `stages`, such as .dev.servers[0].dockerfileConfig. Defaults to the document root."
    )]
    target_field: Option<String>,

    #[arg(
        long = "verify",
        help = "Re-parse the generated Dockerfile",
        long_help = "Parse the generated Dockerfile again and fail if the parser rejects it or finds a different number of stages. A summary is printed to stderr."
    )]
    verify: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Debug, Parser)]
#[command(
    name = "dfg",
    version,
    about = "Generate Dockerfiles from YAML",
    long_about = LONG_ABOUT,
    after_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help = "Increase log verbosity (-v debug, -vv trace)",
        long_help = "Increase log verbosity on stderr. -v enables debug logs, -vv enables trace logs. RUST_LOG takes precedence when set."
    )]
    verbose: u8,
}

fn run() -> Result<(), AppError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) {
                print!("{err}");
                return Ok(());
            }
            return Err(AppError::usage(err.to_string()));
        }
    };

    init_logging(cli.verbose);
    trace!(args = ?std::env::args().collect::<Vec<_>>(), "parsed command line");

    match cli.command {
        Commands::Generate(args) => execute_generate(args),
        Commands::Completion { shell } => write_completion(shell),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .try_init();
}

fn execute_generate(args: GenerateArgs) -> Result<(), AppError> {
    validate_generate(&args)?;

    let build_file = match (args.input.as_str(), args.target_field.as_deref()) {
        ("-", None) => decode_reader(std::io::stdin().lock())?,
        ("-", Some(path)) => decode_reader_at(std::io::stdin().lock(), path)?,
        (input, None) => decode_file(input)?,
        (input, Some(path)) => decode_file_at(input, path)?,
    };

    if args.verify {
        let report = verify(&build_file)?;
        eprintln!(
            "verified: {} stages, {} instructions",
            report.stages.len(),
            report.instructions
        );
    }

    let template = DockerfileTemplate::new(build_file);
    match &args.out {
        Some(path) => {
            debug!(out = %path.display(), "writing dockerfile");
            let file = File::create(path).map_err(Error::from)?;
            template.render(&mut BufWriter::new(file))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            template.render(&mut stdout)?;
        }
    }

    Ok(())
}

fn validate_generate(args: &GenerateArgs) -> Result<(), AppError> {
    if args.out.is_none() && !args.stdout {
        return Err(AppError::usage("either --out or --stdout is required"));
    }
    if args.input.trim().is_empty() {
        return Err(AppError::usage("--input cannot be empty"));
    }
    Ok(())
}

fn write_completion(shell: CompletionShell) -> Result<(), AppError> {
    let mut command = Cli::command();
    let mut stdout = std::io::stdout().lock();
    match shell {
        CompletionShell::Bash => generate(Bash, &mut command, "dfg", &mut stdout),
        CompletionShell::Zsh => generate(Zsh, &mut command, "dfg", &mut stdout),
        CompletionShell::Fish => generate(Fish, &mut command, "dfg", &mut stdout),
    }
    stdout.flush().map_err(Error::from).map_err(AppError::from)
}
