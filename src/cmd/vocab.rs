use std::io::{self, Write};

use crate::tokens::{TokenEvent, Tokens};
use crate::util;
use crate::vocab::UnigramTally;
use crate::CliResult;

const UNK: &[u8] = b"<unk>";

static USAGE: &str = "
Build a frequency-ranked vocabulary from a tokenized corpus.

The corpus is read from stdin as whitespace-delimited tokens and the
vocabulary is written to stdout as \"<word> <count>\" lines, most frequent
word first, equal counts broken by byte order. This is the vocabulary
format expected by \"cooccur count\".

Tokens may be multi-word phrases whose components are joined by an
underscore, e.g. \"new_york\": each component terminated by a separator
also receives the phrase's count, provided the component occurs somewhere
in the corpus on its own.

A literal \"<unk>\" token is a fatal error: rename such tokens before
counting, e.g.:

    $ sed -e 's/<unk>/<raw_unk>/g' corpus.txt | cooccur vocab > vocab.txt

Usage:
    cooccur vocab [options]
    cooccur vocab --help

vocab options:
    -c, --min-count <arg>  Discard words occurring fewer than <arg> times
                           [default: 1].
    -M, --max-vocab <arg>  Keep only the <arg> most frequent words, equal
                           counts around the boundary being sampled evenly
                           over the alphabet. 0 means no limit [default: 0].
    -V, --verbose <arg>    Verbosity level, from 0 to 2 [default: 2].

Common options:
    -h, --help             Display this message
    -o, --output <file>    Write output to <file> instead of stdout.
";

#[derive(Deserialize)]
struct Args {
    flag_min_count: u64,
    flag_max_vocab: usize,
    flag_verbose: usize,
    flag_output: Option<String>,
}

pub fn run(argv: &[&str]) -> CliResult<()> {
    let args: Args = util::get_args(USAGE, argv)?;
    let verbose = args.flag_verbose;

    let mut tally = UnigramTally::new();
    let mut token_count = 0u64;

    let bar = util::acquire_progress_bar(verbose > 1, "tokens");
    let stdin = io::stdin();

    for event in Tokens::new(stdin.lock()) {
        match event? {
            TokenEvent::LineBreak => continue,
            TokenEvent::Token(token) => {
                if token.as_slice() == UNK {
                    Err("<unk> token found in corpus! Please rename such tokens (e.g. to <raw_unk>) before counting.")?;
                }

                tally.add(token);
                token_count += 1;
                bar.inc(1);
            }
        }
    }

    bar.abandon();

    if verbose > 1 {
        eprintln!("Processed {} tokens.", util::format_number(token_count as f64));
        eprintln!(
            "Counted {} unique words.",
            util::format_number(tally.len() as f64)
        );
    }

    tally.boost_sub_tokens();

    let max_vocab = match args.flag_max_vocab {
        0 => None,
        limit => Some(limit),
    };
    let truncated = max_vocab.is_some_and(|limit| limit < tally.len());

    let entries = tally.into_ranked(max_vocab);

    let mut writer = util::io_writer(&args.flag_output)?;
    let mut kept = 0usize;

    for (word, count) in entries.iter() {
        if *count < args.flag_min_count {
            if verbose > 0 {
                eprintln!("Truncating vocabulary at min count {}.", args.flag_min_count);
            }
            break;
        }

        writer.write_all(word)?;
        writeln!(writer, " {}", count)?;
        kept += 1;
    }

    writer.flush()?;

    if verbose > 0 {
        if truncated && kept == entries.len() {
            eprintln!("Truncating vocabulary at size {}.", entries.len());
        }

        eprintln!(
            "Using vocabulary of size {}.",
            util::format_number(kept as f64)
        );
    }

    Ok(())
}
