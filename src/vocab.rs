use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use ahash::RandomState;
use bstr::ByteSlice;

use crate::tokens::sub_tokens;

/// Frequency-ranked vocabulary. Ranks are 1-based and dense: the k-th
/// word of the source file gets rank k, lower ranks being more frequent.
pub struct VocabIndex {
    ranks: HashMap<Vec<u8>, i32, RandomState>,
}

impl VocabIndex {
    /// Load a vocabulary from a file of "<word> <count>" lines, most
    /// frequent word first. The count column is ignored: file order alone
    /// defines ranks.
    pub fn from_path(path: &str) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut ranks: HashMap<Vec<u8>, i32, RandomState> = HashMap::default();

        for line in reader.split(b'\n') {
            let line = line?;

            let word = match line.split(|byte| byte.is_ascii_whitespace()).next() {
                Some(word) if !word.is_empty() => word,
                _ => continue,
            };

            let rank = ranks.len() as i32 + 1;

            match ranks.entry(word.to_vec()) {
                Entry::Occupied(entry) => {
                    eprintln!("duplicate vocabulary entry: {}", entry.key().as_bstr());
                }
                Entry::Vacant(entry) => {
                    entry.insert(rank);
                }
            }
        }

        Ok(Self { ranks })
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Rank of a word, `None` when out of vocabulary. OOV lookups are the
    /// expected common case, not errors.
    pub fn rank(&self, word: &[u8]) -> Option<i32> {
        self.ranks.get(word).copied()
    }
}

/// Unigram tally used by the vocabulary builder.
#[derive(Default)]
pub struct UnigramTally {
    counts: HashMap<Vec<u8>, u64, RandomState>,
}

impl UnigramTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, token: Vec<u8>) {
        self.counts
            .entry(token)
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Fold each multi-word token's count into its separator-terminated
    /// components. Only components already tallied on their own are
    /// incremented, never inserted.
    pub fn boost_sub_tokens(&mut self) {
        let mut boosts: Vec<(Vec<u8>, u64)> = Vec::new();

        for (word, count) in self.counts.iter() {
            for component in sub_tokens(word) {
                boosts.push((component.to_vec(), *count));
            }
        }

        for (component, count) in boosts {
            if let Some(existing) = self.counts.get_mut(&component) {
                *existing += count;
            }
        }
    }

    /// Sort by decreasing count. When `max_vocab` is exceeded, a first
    /// pass without tie-break decides which equal-count words survive
    /// truncation, spreading them over the alphabet; survivors are then
    /// re-sorted with a byte-wise ascending tie-break.
    pub fn into_ranked(self, max_vocab: Option<usize>) -> Vec<(Vec<u8>, u64)> {
        let mut entries = self.counts.into_iter().collect::<Vec<_>>();

        if let Some(limit) = max_vocab {
            if limit < entries.len() {
                entries.sort_unstable_by(|a, b| a.1.cmp(&b.1).reverse());
                entries.truncate(limit);
            }
        }

        entries.sort_unstable_by(|a, b| a.1.cmp(&b.1).reverse().then_with(|| a.0.cmp(&b.0)));

        entries
    }
}
