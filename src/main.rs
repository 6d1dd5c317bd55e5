#[macro_use]
extern crate serde_derive;

use std::env;
use std::fmt;
use std::io;
use std::process;

use colored::Colorize;
use docopt::Docopt;

mod bigram;
mod cmd;
mod merge;
mod overflow;
mod record;
mod tokens;
mod util;
mod vocab;
mod window;

macro_rules! command_list {
    () => {
        "
    --version   Print the tool's version

## Corpus preparation
    vocab       Build a frequency-ranked vocabulary from a tokenized corpus

## Co-occurrence counting
    count       Accumulate weighted word-word co-occurrence records
"
    };
}

static USAGE: &str = concat!(
    "
Usage:
    cooccur [options] <command> [<args>...]
    cooccur [options]

Options:
    -h, --help    Display this message
    <command> -h  Display the command help message
    --version     Print version info and exit

Commands:",
    command_list!()
);

#[derive(Deserialize)]
struct Args {
    arg_command: Option<Command>,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| {
            d.options_first(true)
                .version(Some(util::version()))
                .deserialize()
        })
        .unwrap_or_else(|e| {
            match e {
                docopt::Error::Deserialize(_) => {
                    // Command mismatch
                    eprintln!(
                        "Please choose one of the following commands/flags:\n{}",
                        util::colorize_main_help(command_list!())
                    );
                    eprintln!(
                        "{}",
                        format!(
                            "Unknown command {}!\nUse one of the commands listed above.",
                            std::env::args()
                                .nth(1)
                                .unwrap_or_else(|| "<missing>".to_string())
                        )
                        .red()
                    );
                    process::exit(1);
                }
                _ => {
                    e.exit();
                }
            }
        });

    match args.arg_command {
        None => {
            println!(
                "{}",
                util::colorize_main_help(&format!(
                    "cooccur (v{}) computes word-word co-occurrence statistics.

Please choose one of the following commands/flags:\n{}",
                    util::version(),
                    command_list!()
                ))
            );
            process::exit(0);
        }
        Some(cmd) => match cmd.run() {
            Ok(()) => process::exit(0),
            Err(CliError::Flag(err)) => err.exit(),
            Err(CliError::Io(ref err)) if err.kind() == io::ErrorKind::BrokenPipe => {
                process::exit(0);
            }
            Err(CliError::Io(err)) => {
                eprintln!(
                    "cooccur {}: {}",
                    env::args().nth(1).unwrap_or("".to_string()),
                    err
                );
                process::exit(1);
            }
            Err(CliError::Other(msg)) => {
                eprintln!(
                    "cooccur {}: {}",
                    env::args().nth(1).unwrap_or("".to_string()),
                    msg
                );
                process::exit(1);
            }
            Err(CliError::Help(usage, exit_code)) => {
                println!("{}", usage);
                process::exit(exit_code);
            }
        },
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Command {
    Count,
    Help,
    Vocab,
}

impl Command {
    fn run(&self) -> CliResult<()> {
        let argv: Vec<_> = env::args().collect();
        let argv: Vec<_> = argv.iter().map(|s| &**s).collect();
        let argv = &*argv;

        match self {
            Command::Count => cmd::count::run(argv),
            Command::Help => {
                println!("{}", util::colorize_main_help(USAGE));
                Ok(())
            }
            Command::Vocab => cmd::vocab::run(argv),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub enum CliError {
    Flag(docopt::Error),
    Io(io::Error),
    Other(String),
    Help(String, i32),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CliError::Flag(ref e) => e.fmt(f),
            CliError::Io(ref e) => e.fmt(f),
            CliError::Other(ref s) => f.write_str(s),
            CliError::Help(ref s, _) => f.write_str(s),
        }
    }
}

impl From<docopt::Error> for CliError {
    fn from(err: docopt::Error) -> CliError {
        match err {
            docopt::Error::WithProgramUsage(kind, usage) => {
                let usage = util::colorize_help(&usage);

                match kind.as_ref() {
                    docopt::Error::Help => CliError::Help(usage, 0),
                    _ => CliError::Help(
                        format!(
                            "{}\n\n{} Use the {} flag for more information.",
                            util::colorize_help(&usage),
                            "Invalid command!".red(),
                            "-h,--help".cyan()
                        ),
                        1,
                    ),
                }
            }
            _ => CliError::Flag(err),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> CliError {
        CliError::Io(err)
    }
}

impl From<String> for CliError {
    fn from(err: String) -> CliError {
        CliError::Other(err)
    }
}

impl<'a> From<&'a str> for CliError {
    fn from(err: &'a str) -> CliError {
        CliError::Other(err.to_owned())
    }
}
