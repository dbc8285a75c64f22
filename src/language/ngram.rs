use crate::error::{ClozeError, Result};
use crate::language::tokenize::segment;
use itertools::Itertools;
use std::collections::HashMap;

/// Left padding marker for sentence starts
pub const START_MARKER: &str = "<s>";
/// Right padding marker for sentence ends
pub const END_MARKER: &str = "</s>";
/// Probability assigned to unseen contexts and unseen (context, word) pairs.
///
/// This is a flat floor, not a discounting scheme like Katz or Kneser-Ney:
/// probabilities of a context are not renormalized after flooring.
pub const SMOOTHING: f64 = 1e-6;

/// Word-level n-gram model of fixed order `n`.
///
/// Contexts are the `n-1` tokens preceding a word, padded with
/// [`START_MARKER`] on the left and closed by a single [`END_MARKER`], so
/// every token of a sentence is predicted by at least one window.
///
/// # Invariants
/// - every context key has exactly `n-1` entries
/// - `context_totals[c]` equals the sum of `next_counts[c]`
/// - counts only ever grow
#[derive(Debug, Clone)]
pub struct NgramModel {
    n: usize,
    next_counts: HashMap<Vec<String>, HashMap<String, u64>>,
    context_totals: HashMap<Vec<String>, u64>,
    /// How often each token was the predicted element of a window
    word_totals: HashMap<String, u64>,
}

impl NgramModel {
    /// Creates an empty model of order `n`.
    ///
    /// # Errors
    /// Returns `InvalidInput` if `n == 0`.
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(ClozeError::InvalidInput("n-gram order must be >= 1".into()));
        }
        Ok(Self {
            n,
            next_counts: HashMap::new(),
            context_totals: HashMap::new(),
            word_totals: HashMap::new(),
        })
    }

    pub fn order(&self) -> usize {
        self.n
    }

    /// Accumulates the windows of one tokenized sentence.
    ///
    /// Repeated calls add up; there is no removal. An empty sentence adds
    /// nothing.
    pub fn update<S: AsRef<str>>(&mut self, tokens: &[S]) {
        if tokens.is_empty() {
            return;
        }
        let padded = self.padded(tokens.iter().map(|t| t.as_ref()));
        for window in padded.windows(self.n) {
            let (context, word) = window.split_at(self.n - 1);
            let word = &word[0];
            *self
                .next_counts
                .entry(context.to_vec())
                .or_default()
                .entry(word.clone())
                .or_insert(0) += 1;
            *self.context_totals.entry(context.to_vec()).or_insert(0) += 1;
            *self.word_totals.entry(word.clone()).or_insert(0) += 1;
        }
    }

    /// `P(word | context)`, or [`SMOOTHING`] when the context or the pair is unseen
    pub fn conditional_probability<S: AsRef<str>>(&self, context: &[S], word: &str) -> f64 {
        let key: Vec<String> = context.iter().map(|c| c.as_ref().to_owned()).collect();
        self.probability_of(&key, word)
    }

    fn probability_of(&self, context: &[String], word: &str) -> f64 {
        let total = self.context_total(context);
        let count = self
            .next_counts
            .get(context)
            .and_then(|words| words.get(word))
            .copied()
            .unwrap_or(0);
        if total == 0 || count == 0 {
            return SMOOTHING;
        }
        count as f64 / total as f64
    }

    /// Sum of `ln P` over all padded windows of `tokens`
    pub fn log_probability_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> f64 {
        let padded = self.padded(tokens.iter().map(|t| t.as_ref()));
        padded
            .windows(self.n)
            .map(|window| {
                let (context, word) = window.split_at(self.n - 1);
                self.probability_of(context, &word[0]).ln()
            })
            .sum()
    }

    /// Sum of `ln P` over only the windows that predict or condition on the
    /// token at `position`. Windows away from that position are identical
    /// for every substitution, so this ranks substitutions like the full sum.
    pub fn log_probability_at<S: AsRef<str>>(&self, tokens: &[S], position: usize) -> f64 {
        let padded = self.padded(tokens.iter().map(|t| t.as_ref()));
        let last_window = padded.len() - self.n;
        // the token at `position` sits at `position + n - 1` in the padded sequence
        let first = position;
        let last = (position + self.n - 1).min(last_window);
        (first..=last)
            .map(|i| {
                let (context, word) = padded[i..i + self.n].split_at(self.n - 1);
                self.probability_of(context, &word[0]).ln()
            })
            .sum()
    }

    /// Product of the conditional probabilities of `sentence`.
    ///
    /// Accumulated in log space. The returned product can still underflow
    /// to 0.0 for long sentences; use [`NgramModel::perplexity`] for
    /// comparisons.
    pub fn sentence_probability(&self, sentence: &str) -> f64 {
        self.log_probability_tokens(&segment(sentence)).exp()
    }

    /// `pow(1 / P(sentence), 1 / word_count)`, computed from the log-sum.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the sentence has no alphanumeric tokens.
    pub fn perplexity(&self, sentence: &str) -> Result<f64> {
        self.perplexity_tokens(&segment(sentence))
    }

    pub fn perplexity_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Result<f64> {
        if tokens.is_empty() {
            return Err(ClozeError::InvalidInput(
                "cannot compute perplexity of an empty sentence".into(),
            ));
        }
        let log_prob = self.log_probability_tokens(tokens);
        Ok((-log_prob / tokens.len() as f64).exp())
    }

    /// Occurrences of `word` right after `context`
    pub fn count<S: AsRef<str>>(&self, context: &[S], word: &str) -> u64 {
        let key: Vec<String> = context.iter().map(|c| c.as_ref().to_owned()).collect();
        self.next_counts
            .get(&key)
            .and_then(|words| words.get(word))
            .copied()
            .unwrap_or(0)
    }

    pub fn context_total<S: AsRef<str>>(&self, context: &[S]) -> u64 {
        let key: Vec<String> = context.iter().map(|c| c.as_ref().to_owned()).collect();
        self.context_totals.get(&key).copied().unwrap_or(0)
    }

    pub fn contexts(&self) -> impl Iterator<Item = &[String]> {
        self.next_counts.keys().map(Vec::as_slice)
    }

    pub fn next_counts<S: AsRef<str>>(&self, context: &[S]) -> Option<&HashMap<String, u64>> {
        let key: Vec<String> = context.iter().map(|c| c.as_ref().to_owned()).collect();
        self.next_counts.get(&key)
    }

    /// Words observed after `context`, most frequent first, end marker excluded
    pub fn continuations<S: AsRef<str>>(&self, context: &[S]) -> Vec<(String, u64)> {
        self.next_counts(context)
            .map(|words| {
                words
                    .iter()
                    .filter(|(word, _)| word.as_str() != END_MARKER)
                    .map(|(word, count)| (word.clone(), *count))
                    .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Words observed immediately before `word`, most frequent first
    pub fn predecessors(&self, word: &str) -> Vec<(String, u64)> {
        let mut found: HashMap<&str, u64> = HashMap::new();
        for (context, words) in &self.next_counts {
            let Some(previous) = context.last() else {
                continue;
            };
            if previous == START_MARKER {
                continue;
            }
            if let Some(count) = words.get(word) {
                *found.entry(previous.as_str()).or_insert(0) += count;
            }
        }
        found
            .into_iter()
            .map(|(word, count)| (word.to_owned(), count))
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            .collect()
    }

    /// Whether `word` was ever seen as a predicted token
    pub fn knows(&self, word: &str) -> bool {
        word != END_MARKER && self.word_totals.contains_key(word)
    }

    /// Every token the model has predicted, sorted
    pub fn vocabulary(&self) -> Vec<&str> {
        self.word_totals
            .keys()
            .map(String::as_str)
            .filter(|word| *word != END_MARKER)
            .sorted()
            .collect()
    }

    /// The `k` tokens most often predicted, ties broken alphabetically
    pub fn most_frequent(&self, k: usize) -> Vec<&str> {
        self.word_totals
            .iter()
            .filter(|(word, _)| word.as_str() != END_MARKER)
            .sorted_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)))
            .take(k)
            .map(|(word, _)| word.as_str())
            .collect()
    }

    fn padded<'a>(&self, tokens: impl Iterator<Item = &'a str>) -> Vec<String> {
        let mut padded: Vec<String> = std::iter::repeat(START_MARKER.to_owned())
            .take(self.n - 1)
            .collect();
        padded.extend(tokens.map(str::to_owned));
        padded.push(END_MARKER.to_owned());
        padded
    }
}
