use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::bigram::{BigramTable, MemoryPlan};
use crate::merge::merge_chunks;
use crate::overflow::{chunk_path, OverflowBuffer};
use crate::tokens::{TokenEvent, Tokens};
use crate::util;
use crate::vocab::VocabIndex;
use crate::window::ContextWindow;
use crate::CliResult;

static USAGE: &str = "
Accumulate word-word co-occurrence statistics over a tokenized corpus.

The corpus is read from stdin as whitespace-delimited tokens, newlines
acting as sentence boundaries that context windows never cross. Each
target word is counted against the words of a sliding window over the
current line, looked up in a frequency-ranked vocabulary (see
\"cooccur vocab\"). Out-of-vocabulary words are skipped but still consume
a window slot, and multi-word context tokens additionally contribute
their underscore-terminated components.

Pairs of frequent words accumulate in a dense in-memory table sized from
the memory budget, while rare pairs overflow to sorted temporary chunk
files named \"<head>_NNNN.bin\" in the working directory. Everything is
finally merged into a single stream of packed little-endian
(int32, int32, float64) records - the two vocabulary ranks and their
accumulated weight - sorted by rank pair and free of duplicates. Chunk
files are removed once the merge completes.

For example:

    $ cooccur count -f vocab.txt -w 10 -m 8.0 < corpus.txt > counts.bin

Usage:
    cooccur count [options]
    cooccur count --help

count options:
    -f, --vocab-file <path>  Vocabulary file: one \"<word> <count>\" line
                             per word, most frequent first, as produced by
                             \"cooccur vocab\" [default: vocab.txt].
    -w, --window-size <arg>  Number of context words to the left of each
                             target word, and to the right when symmetric
                             [default: 15].
    -A, --asymmetric         Only count context words to the left of each
                             target word, instead of both sides.
    --no-distance-weighting  Count each context word for 1 instead of the
                             inverse of its distance to the target word.
    -m, --memory <arg>       Soft memory budget in gigabytes, used to size
                             the dense table and the overflow buffer
                             [default: 4.0].
    --max-product <arg>      Override the derived cutoff on the product of
                             two words' frequency ranks under which their
                             co-occurrences live in the dense table.
    --overflow-length <arg>  Override the derived capacity, in records, of
                             the overflow buffer.
    --overflow-file <path>   Prefix used to name temporary chunk files
                             [default: overflow].
    -V, --verbose <arg>      Verbosity level, from 0 to 3 [default: 2].

Common options:
    -h, --help             Display this message
    -o, --output <file>    Write output to <file> instead of stdout.
";

#[derive(Deserialize)]
struct Args {
    flag_vocab_file: String,
    flag_window_size: usize,
    flag_asymmetric: bool,
    flag_no_distance_weighting: bool,
    flag_memory: f64,
    flag_max_product: Option<u64>,
    flag_overflow_length: Option<usize>,
    flag_overflow_file: String,
    flag_verbose: usize,
    flag_output: Option<String>,
}

pub fn run(argv: &[&str]) -> CliResult<()> {
    let args: Args = util::get_args(USAGE, argv)?;
    let verbose = args.flag_verbose;

    if args.flag_window_size < 1 {
        Err("-w/--window-size must be at least 1!")?;
    }

    let plan = MemoryPlan::from_gigabytes(args.flag_memory);
    let max_product = args.flag_max_product.unwrap_or(plan.max_product);
    let overflow_length = args.flag_overflow_length.unwrap_or(plan.overflow_length);

    let vocab = VocabIndex::from_path(&args.flag_vocab_file).map_err(|err| {
        format!(
            "could not read vocab file \"{}\": {}",
            args.flag_vocab_file, err
        )
    })?;

    if vocab.is_empty() {
        Err(format!(
            "vocab file \"{}\" is empty!",
            args.flag_vocab_file
        ))?;
    }

    if verbose > 0 {
        eprintln!("window size: {}", args.flag_window_size);
        eprintln!(
            "context: {}",
            if args.flag_asymmetric {
                "asymmetric"
            } else {
                "symmetric"
            }
        );
    }
    if verbose > 1 {
        eprintln!("max product: {}", util::format_number(max_product as f64));
        eprintln!(
            "overflow length: {}",
            util::format_number(overflow_length as f64)
        );
        eprintln!(
            "vocabulary of {} words read from \"{}\"",
            util::format_number(vocab.len() as f64),
            args.flag_vocab_file
        );
    }

    let mut table = BigramTable::new(vocab.len(), max_product);
    let mut overflow = OverflowBuffer::new(overflow_length, &args.flag_overflow_file);
    let mut window = ContextWindow::new(
        args.flag_window_size,
        !args.flag_asymmetric,
        !args.flag_no_distance_weighting,
    );
    let headroom = window.flush_headroom();

    let bar = util::acquire_progress_bar(verbose > 1, "tokens");
    let stdin = io::stdin();

    let mut token_count = 0u64;

    for event in Tokens::new(stdin.lock()) {
        match event? {
            TokenEvent::LineBreak => window.line_break(),
            TokenEvent::Token(token) => {
                if overflow.should_flush(headroom) {
                    overflow.flush()?;
                }

                window.advance(&vocab, token, |w1, w2, weight| {
                    if table.accepts(w1, w2) {
                        table.add(w1, w2, weight);
                    } else {
                        overflow.push(w1, w2, weight);
                    }
                });

                token_count += 1;
                bar.inc(1);
            }
        }
    }

    bar.abandon();

    if verbose > 0 {
        eprintln!(
            "Processed {} tokens.",
            util::format_number(token_count as f64)
        );
    }

    let overflow_chunks = overflow.finish()?;

    // Chunk 0 holds the dense table, sorted by construction.
    let dense_path = chunk_path(&args.flag_overflow_file, 0);
    let mut dense_writer = BufWriter::new(File::create(&dense_path)?);
    let dense_records = table.write_into(&mut dense_writer)?;
    dense_writer.flush()?;
    drop(dense_writer);

    // Release the dense table before merging.
    drop(table);

    if verbose > 1 {
        eprintln!(
            "{} chunk files to merge, {} records in the dense one.",
            overflow_chunks + 1,
            util::format_number(dense_records as f64)
        );
    }

    let mut writer = util::io_writer(&args.flag_output)?;

    let bar = util::acquire_progress_bar(verbose > 1, "records merged");
    let written = merge_chunks(
        &args.flag_overflow_file,
        overflow_chunks + 1,
        &mut writer,
        &bar,
    )?;
    bar.abandon();

    writer.flush()?;

    if verbose > 0 {
        eprintln!(
            "Merged {} cooccurrence records.",
            util::format_number(written as f64)
        );
    }

    Ok(())
}
