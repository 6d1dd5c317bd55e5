use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::record::CoocRecord;

/// Path of a numbered chunk file holding one sorted run. Index 0 is
/// reserved for the serialized dense table.
pub fn chunk_path(file_head: &str, index: usize) -> String {
    format!("{}_{:04}.bin", file_head, index)
}

/// Sort records by key and write them with adjacent duplicate keys folded
/// into a single accumulated record. Returns the number of records
/// written.
pub fn write_chunk<W: Write>(records: &mut [CoocRecord], writer: &mut W) -> io::Result<u64> {
    if records.is_empty() {
        return Ok(0);
    }

    records.sort_unstable_by(|a, b| a.cmp_key(b));

    let mut written = 0u64;
    let mut current = records[0];

    for record in &records[1..] {
        if record.key() == current.key() {
            current.val += record.val;
            continue;
        }

        current.write_into(writer)?;
        written += 1;
        current = *record;
    }

    current.write_into(writer)?;

    Ok(written + 1)
}

/// In-memory buffer for sparse pairs. Filled during ingest and spilled as
/// sorted duplicate-free chunk files whenever headroom runs out. The
/// backing vector is allocated once; sub-token bursts may briefly push
/// past the soft capacity, in which case it grows and the next headroom
/// check flushes.
pub struct OverflowBuffer {
    records: Vec<CoocRecord>,
    capacity: usize,
    file_head: String,
    next_chunk: usize,
}

impl OverflowBuffer {
    pub fn new(capacity: usize, file_head: &str) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
            file_head: file_head.to_string(),
            next_chunk: 1,
        }
    }

    pub fn push(&mut self, w1: i32, w2: i32, val: f64) {
        self.records.push(CoocRecord::new(w1, w2, val));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the next window iteration could outgrow the buffer.
    pub fn should_flush(&self, headroom: usize) -> bool {
        self.records.len() >= self.capacity.saturating_sub(headroom)
    }

    /// Spill the buffered records as the next numbered chunk. An empty
    /// buffer produces no file.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.records.is_empty() {
            return Ok(());
        }

        let path = chunk_path(&self.file_head, self.next_chunk);
        let mut writer = BufWriter::new(File::create(&path)?);

        write_chunk(&mut self.records, &mut writer)?;
        writer.flush()?;

        self.next_chunk += 1;
        self.records.clear();

        Ok(())
    }

    /// Final flush. Returns the total number of chunk files written.
    pub fn finish(mut self) -> io::Result<usize> {
        self.flush()?;

        Ok(self.next_chunk - 1)
    }
}
