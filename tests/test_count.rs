use std::process::Command;

use crate::workdir::Workdir;

type Record = (i32, i32, f64);

const RECORD_BYTES: usize = 16;

fn decode_records(bytes: &[u8]) -> Vec<Record> {
    assert_eq!(
        bytes.len() % RECORD_BYTES,
        0,
        "output is not a whole number of records!"
    );

    bytes
        .chunks_exact(RECORD_BYTES)
        .map(|chunk| {
            (
                i32::from_le_bytes(chunk[0..4].try_into().unwrap()),
                i32::from_le_bytes(chunk[4..8].try_into().unwrap()),
                f64::from_le_bytes(chunk[8..16].try_into().unwrap()),
            )
        })
        .collect()
}

fn close(x: f64, y: f64) -> bool {
    (x - y).abs() <= 1e-9 * x.abs().max(y.abs()).max(1.0)
}

fn assert_records(got: &[Record], expected: &[Record]) {
    assert_eq!(
        got.len(),
        expected.len(),
        "expected {} records, got {:?}",
        expected.len(),
        got
    );

    for (g, e) in got.iter().zip(expected.iter()) {
        assert_eq!((g.0, g.1), (e.0, e.1), "got {:?}, expected {:?}", got, expected);
        assert!(close(g.2, e.2), "got {:?}, expected {:?}", got, expected);
    }
}

fn scenario_command(wrk: &Workdir) -> Command {
    wrk.create("vocab.txt", "a 3\nb 2\nc 1\n");

    let mut cmd = wrk.command("count");
    cmd.args(["--window-size", "2", "--memory", "0.1"]);
    cmd
}

#[test]
fn count_single_pair() {
    let wrk = Workdir::new("count_single_pair");
    let mut cmd = scenario_command(&wrk);

    let got = decode_records(&wrk.pipe(&mut cmd, "a b\n"));

    assert_records(&got, &[(1, 2, 1.0), (2, 1, 1.0)]);
}

#[test]
fn count_window_pairs() {
    let wrk = Workdir::new("count_window_pairs");
    let mut cmd = scenario_command(&wrk);

    let got = decode_records(&wrk.pipe(&mut cmd, "a b c\n"));

    assert_records(
        &got,
        &[
            (1, 2, 1.0),
            (1, 3, 0.5),
            (2, 1, 1.0),
            (2, 3, 1.0),
            (3, 1, 0.5),
            (3, 2, 1.0),
        ],
    );
}

#[test]
fn count_windows_never_cross_lines() {
    let wrk = Workdir::new("count_lines");
    let mut cmd = scenario_command(&wrk);

    let got = decode_records(&wrk.pipe(&mut cmd, "a b\na c\n"));

    // No cross-line (2, 3) pair.
    assert_records(
        &got,
        &[(1, 2, 1.0), (1, 3, 1.0), (2, 1, 1.0), (3, 1, 1.0)],
    );
}

#[test]
fn count_without_distance_weighting() {
    let wrk = Workdir::new("count_flat");
    let mut cmd = scenario_command(&wrk);
    cmd.arg("--no-distance-weighting");

    let got = decode_records(&wrk.pipe(&mut cmd, "a b c\n"));

    assert_records(
        &got,
        &[
            (1, 2, 1.0),
            (1, 3, 1.0),
            (2, 1, 1.0),
            (2, 3, 1.0),
            (3, 1, 1.0),
            (3, 2, 1.0),
        ],
    );
}

#[test]
fn count_asymmetric_context() {
    let wrk = Workdir::new("count_asymmetric");
    let mut cmd = scenario_command(&wrk);
    cmd.arg("--asymmetric");

    let got = decode_records(&wrk.pipe(&mut cmd, "a b c\n"));

    assert_records(&got, &[(2, 1, 1.0), (3, 1, 0.5), (3, 2, 1.0)]);
}

#[test]
fn count_overflow_only_routing_matches_dense() {
    let wrk = Workdir::new("count_overflow_only");

    // max product 1: no pair is dense, everything traverses chunk files.
    let mut cmd = scenario_command(&wrk);
    cmd.args(["--max-product", "1"]);
    let overflowed = decode_records(&wrk.pipe(&mut cmd, "a b c\n"));

    let mut cmd = scenario_command(&wrk);
    let dense = decode_records(&wrk.pipe(&mut cmd, "a b c\n"));

    assert_records(&overflowed, &dense);
    wrk.assert_no_file_matching(".bin");
}

#[test]
fn count_oov_tokens_consume_window_slots() {
    let wrk = Workdir::new("count_oov");
    let mut cmd = scenario_command(&wrk);

    // "x" is out of vocabulary, so "b" sees "a" at distance 2.
    let got = decode_records(&wrk.pipe(&mut cmd, "a x b\n"));

    assert_records(&got, &[(1, 2, 0.5), (2, 1, 0.5)]);
}

#[test]
fn count_phrase_context_resolves_components() {
    let wrk = Workdir::new("count_phrases");
    let mut cmd = scenario_command(&wrk);

    // "a_b_" is out of vocabulary as a whole but both its components
    // resolve; the target side is never split.
    let got = decode_records(&wrk.pipe(&mut cmd, "a_b_ c\n"));

    assert_records(
        &got,
        &[(1, 3, 1.0), (2, 3, 1.0), (3, 1, 1.0), (3, 2, 1.0)],
    );
}

#[test]
fn count_mass_is_conserved() {
    let wrk = Workdir::new("count_mass");
    let mut cmd = scenario_command(&wrk);

    let got = decode_records(&wrk.pipe(&mut cmd, "a b c\n"));

    // 2 pairs at distance 1 from position 1, 1 + 1 at distances 1 and 2
    // from position 2, each emitted both ways.
    let total: f64 = got.iter().map(|r| r.2).sum();
    assert!(close(total, 5.0));
}

fn cyclic_corpus() -> String {
    let words = ["a", "b", "c", "d", "e"];
    let mut corpus = String::new();

    for i in 0..40 {
        let line = (0..12)
            .map(|j| words[(i * 7 + j * 3) % 5])
            .collect::<Vec<_>>()
            .join(" ");

        corpus.push_str(&line);
        corpus.push('\n');
    }

    corpus
}

fn cyclic_command(wrk: &Workdir) -> Command {
    wrk.create("vocab.txt", "a 5\nb 4\nc 3\nd 2\ne 1\n");

    let mut cmd = wrk.command("count");
    cmd.args(["--window-size", "3", "--memory", "0.1"]);
    cmd
}

#[test]
fn count_output_is_sorted_unique_and_symmetric() {
    let wrk = Workdir::new("count_invariants");
    let mut cmd = cyclic_command(&wrk);

    let got = decode_records(&wrk.pipe(&mut cmd, &cyclic_corpus()));

    assert!(!got.is_empty());

    for pair in got.windows(2) {
        assert!(
            (pair[0].0, pair[0].1) < (pair[1].0, pair[1].1),
            "output is not strictly sorted: {:?}",
            pair
        );
    }

    for &(w1, w2, val) in got.iter() {
        let mirror = got
            .iter()
            .find(|r| (r.0, r.1) == (w2, w1))
            .unwrap_or_else(|| panic!("no mirror record for ({}, {})", w1, w2));

        assert!(close(val, mirror.2));
    }
}

#[test]
fn count_chunked_runs_match_in_memory_runs() {
    let wrk = Workdir::new("count_chunked");
    let corpus = cyclic_corpus();

    let mut cmd = cyclic_command(&wrk);
    let reference = decode_records(&wrk.pipe(&mut cmd, &corpus));

    // Tiny overflow buffer and no dense residency: many chunk files.
    let mut cmd = cyclic_command(&wrk);
    cmd.args(["--max-product", "1", "--overflow-length", "25"]);
    let chunked = decode_records(&wrk.pipe(&mut cmd, &corpus));

    assert_records(&chunked, &reference);
    wrk.assert_no_file_matching(".bin");
}

#[test]
fn count_runs_are_reproducible() {
    let wrk = Workdir::new("count_reproducible");
    let corpus = cyclic_corpus();

    let mut cmd = cyclic_command(&wrk);
    let first = wrk.pipe(&mut cmd, &corpus);

    let mut cmd = cyclic_command(&wrk);
    let second = wrk.pipe(&mut cmd, &corpus);

    assert_eq!(first, second);
}

#[test]
fn count_custom_overflow_file_head() {
    let wrk = Workdir::new("count_overflow_file");
    let mut cmd = scenario_command(&wrk);
    cmd.args([
        "--overflow-file",
        "scratch",
        "--max-product",
        "1",
        "--overflow-length",
        "8",
    ]);

    let got = decode_records(&wrk.pipe(&mut cmd, "a b c\na b\n"));

    assert!(!got.is_empty());
    wrk.assert_no_file_matching("scratch");
}

#[test]
fn count_empty_vocab_is_fatal() {
    let wrk = Workdir::new("count_empty_vocab");
    wrk.create("vocab.txt", "");

    let mut cmd = wrk.command("count");
    let stderr = wrk.pipe_err(&mut cmd, "a b\n");

    assert!(stderr.contains("empty"));
}

#[test]
fn count_missing_vocab_is_fatal() {
    let wrk = Workdir::new("count_missing_vocab");

    let mut cmd = wrk.command("count");
    let stderr = wrk.pipe_err(&mut cmd, "a b\n");

    assert!(stderr.contains("vocab"));
}

#[test]
fn count_zero_window_is_fatal() {
    let wrk = Workdir::new("count_zero_window");
    wrk.create("vocab.txt", "a 1\n");

    let mut cmd = wrk.command("count");
    cmd.args(["--window-size", "0"]);

    wrk.pipe_err(&mut cmd, "a a\n");
}

#[test]
fn count_empty_corpus_produces_no_records() {
    let wrk = Workdir::new("count_empty_corpus");
    let mut cmd = scenario_command(&wrk);

    let got = wrk.pipe(&mut cmd, "");

    assert!(got.is_empty());
    wrk.assert_no_file_matching(".bin");
}

#[test]
fn count_vocab_then_count_pipeline() {
    let wrk = Workdir::new("count_pipeline");
    let corpus = "the cat sat on the mat\nthe cat sat\n";

    let mut cmd = wrk.command("vocab");
    cmd.args(["--output", "vocab.txt"]);
    wrk.pipe(&mut cmd, corpus);

    assert_eq!(
        wrk.read_to_string("vocab.txt"),
        "the 3\ncat 2\nsat 2\nmat 1\non 1\n"
    );

    let mut cmd = wrk.command("count");
    cmd.args(["--window-size", "2", "--memory", "0.1"]);
    let got = decode_records(&wrk.pipe(&mut cmd, corpus));

    assert!(!got.is_empty());

    // Ranks stay within the vocabulary and the stream is sorted.
    for &(w1, w2, val) in got.iter() {
        assert!((1..=5).contains(&w1));
        assert!((1..=5).contains(&w2));
        assert!(val > 0.0);
    }

    for pair in got.windows(2) {
        assert!((pair[0].0, pair[0].1) < (pair[1].0, pair[1].1));
    }
}
