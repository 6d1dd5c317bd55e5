use crate::tokens::sub_tokens;
use crate::vocab::VocabIndex;

/// Sliding-window enumerator over a token stream. For each in-vocabulary
/// target token it emits weighted (target, context) rank pairs against the
/// up-to-W preceding tokens of the current line, kept as owned copies in a
/// circular buffer.
pub struct ContextWindow {
    history: Vec<Vec<u8>>,
    window_size: usize,
    symmetric: bool,
    distance_weighting: bool,
    position: usize,
}

impl ContextWindow {
    pub fn new(window_size: usize, symmetric: bool, distance_weighting: bool) -> Self {
        Self {
            history: vec![Vec::new(); window_size],
            window_size,
            symmetric,
            distance_weighting,
            position: 0,
        }
    }

    /// Most records a single token can emit through plain context words,
    /// i.e. the headroom the overflow buffer must keep before each token.
    pub fn flush_headroom(&self) -> usize {
        if self.symmetric {
            2 * self.window_size
        } else {
            self.window_size
        }
    }

    /// A line break bounds the window: the position restarts at 0, which
    /// makes slots from the previous line unreachable before they are
    /// overwritten.
    pub fn line_break(&mut self) {
        self.position = 0;
    }

    /// Process the next token of the current line, emitting each weighted
    /// pair through the sink. Out-of-vocabulary targets emit nothing but
    /// still occupy a history slot: their separator-terminated components
    /// may resolve when they later serve as context.
    pub fn advance<F>(&mut self, vocab: &VocabIndex, token: Vec<u8>, mut emit: F)
    where
        F: FnMut(i32, i32, f64),
    {
        let j = self.position;

        if let Some(target) = vocab.rank(&token) {
            let start = j.saturating_sub(self.window_size);

            for k in (start..j).rev() {
                let weight = if self.distance_weighting {
                    1.0 / (j - k) as f64
                } else {
                    1.0
                };

                let context = &self.history[k % self.window_size];

                if let Some(rank) = vocab.rank(context) {
                    self.emit_pair(target, rank, weight, &mut emit);
                }

                for component in sub_tokens(context) {
                    if let Some(rank) = vocab.rank(component) {
                        self.emit_pair(target, rank, weight, &mut emit);
                    }
                }
            }
        }

        let slot = j % self.window_size;
        self.history[slot] = token;
        self.position = j + 1;
    }

    fn emit_pair<F>(&self, target: i32, context: i32, weight: f64, emit: &mut F)
    where
        F: FnMut(i32, i32, f64),
    {
        emit(target, context, weight);

        if self.symmetric {
            emit(context, target, weight);
        }
    }
}
