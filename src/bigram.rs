use std::io::{self, Write};

use crate::record::{CoocRecord, RECORD_BYTES};

/// Dense accumulator for pairs of frequent words. Row i spans the first
/// L(i) = min(max_product / i, V) context ranks, so the flat cell array
/// only spends memory where the product of frequency ranks keeps pairs
/// plausible. Rows are addressed through an offset table with off[0] = 1,
/// matching the 1-based cell formula off[i - 1] + j - 2.
pub struct BigramTable {
    offsets: Vec<u64>,
    cells: Vec<f64>,
    max_product: u64,
    vocab_size: usize,
}

impl BigramTable {
    pub fn new(vocab_size: usize, max_product: u64) -> Self {
        let mut offsets = vec![0u64; vocab_size + 1];
        offsets[0] = 1;

        for i in 1..=vocab_size {
            let row_length = (max_product / i as u64).min(vocab_size as u64);
            offsets[i] = offsets[i - 1] + row_length;
        }

        let cells = vec![0.0; offsets[vocab_size] as usize];

        Self {
            offsets,
            cells,
            max_product,
            vocab_size,
        }
    }

    pub fn cell_count(&self) -> u64 {
        self.offsets[self.vocab_size]
    }

    /// Strict residency bound: a pair stays dense iff the context rank is
    /// below max_product divided (integer division) by the target rank.
    pub fn accepts(&self, w1: i32, w2: i32) -> bool {
        (w2 as u64) < self.max_product / w1 as u64
    }

    pub fn add(&mut self, w1: i32, w2: i32, weight: f64) {
        let cell = self.offsets[w1 as usize - 1] + w2 as u64 - 2;
        self.cells[cell as usize] += weight;
    }

    /// Stream every non-zero cell in row-major order. The result is
    /// sorted by (w1, w2) and free of duplicates by construction. Returns
    /// the number of records written.
    pub fn write_into<W: Write>(&self, writer: &mut W) -> io::Result<u64> {
        let mut written = 0u64;

        for i in 1..=self.vocab_size {
            let row_length = (self.offsets[i] - self.offsets[i - 1]) as usize;
            let base = self.offsets[i - 1] as usize;

            for j in 1..=row_length {
                let val = self.cells[base + j - 2];

                if val != 0.0 {
                    CoocRecord::new(i as i32, j as i32, val).write_into(writer)?;
                    written += 1;
                }
            }
        }

        Ok(written)
    }
}

/// Sizing derived from a soft memory budget in gigabytes. The dense table
/// spans about max_product * (ln V + γ) cells, so the fixed point of
/// n * (ln n + γ) = 0.85 * budget / record size yields the cutoff, the
/// remaining sixth of the budget going to the overflow buffer.
#[derive(Debug, Clone, Copy)]
pub struct MemoryPlan {
    pub max_product: u64,
    pub overflow_length: usize,
}

const SIZING_GAMMA: f64 = 0.154_431_329_8;

impl MemoryPlan {
    pub fn from_gigabytes(memory: f64) -> Self {
        let rlimit = 0.85 * memory * 1_073_741_824.0 / RECORD_BYTES as f64;

        let mut n = 1e5f64;

        while (rlimit - n * (n.ln() + SIZING_GAMMA)).abs() > 1e-3 {
            n = rlimit / (n.ln() + SIZING_GAMMA);
        }

        Self {
            max_product: n as u64,
            overflow_length: (rlimit / 6.0) as usize,
        }
    }
}
