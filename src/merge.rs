use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fs::{self, File};
use std::io::{self, BufReader, Write};

use indicatif::ProgressBar;

use crate::overflow::chunk_path;
use crate::record::CoocRecord;

/// Record tagged with the chunk it came from, ordered by key so that
/// equal keys pop adjacently regardless of source.
struct SourcedRecord {
    record: CoocRecord,
    source: usize,
}

impl Ord for SourcedRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.record
            .cmp_key(&other.record)
            .then_with(|| self.source.cmp(&other.source))
    }
}

impl PartialOrd for SourcedRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SourcedRecord {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SourcedRecord {}

/// Merge the numbered chunk files into one sorted stream, folding equal
/// keys into a single accumulated record. Each chunk being sorted and
/// duplicate-free, a min-heap holding at most one record per chunk
/// suffices. Chunk files are deleted once the merge has succeeded.
/// Returns the number of records written.
pub fn merge_chunks<W: Write>(
    file_head: &str,
    chunks: usize,
    writer: &mut W,
    bar: &ProgressBar,
) -> io::Result<u64> {
    let mut readers = (0..chunks)
        .map(|index| File::open(chunk_path(file_head, index)).map(BufReader::new))
        .collect::<Result<Vec<_>, _>>()?;

    let mut heap: BinaryHeap<Reverse<SourcedRecord>> = BinaryHeap::with_capacity(chunks);

    for (source, reader) in readers.iter_mut().enumerate() {
        if let Some(record) = CoocRecord::read_from(reader)? {
            heap.push(Reverse(SourcedRecord { record, source }));
        }
    }

    let mut current: Option<CoocRecord> = None;
    let mut written = 0u64;

    while let Some(Reverse(SourcedRecord { record, source })) = heap.pop() {
        match current.as_mut() {
            Some(accumulated) if accumulated.key() == record.key() => {
                accumulated.val += record.val;
            }
            Some(accumulated) => {
                accumulated.write_into(writer)?;
                written += 1;
                bar.inc(1);
                *accumulated = record;
            }
            None => current = Some(record),
        }

        if let Some(next) = CoocRecord::read_from(&mut readers[source])? {
            heap.push(Reverse(SourcedRecord {
                record: next,
                source,
            }));
        }
    }

    if let Some(last) = current {
        last.write_into(writer)?;
        written += 1;
        bar.inc(1);
    }

    for index in 0..chunks {
        fs::remove_file(chunk_path(file_head, index))?;
    }

    Ok(written)
}
