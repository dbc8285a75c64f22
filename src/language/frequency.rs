use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token occurrence counts for a corpus
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyIndex {
    counts: HashMap<String, u64>,
}

impl FrequencyIndex {
    /// Count every token occurrence. No smoothing is applied here.
    pub fn build<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts = HashMap::new();
        for token in tokens {
            *counts.entry(token.as_ref().to_owned()).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Occurrences of `token`, 0 when unseen
    pub fn count(&self, token: &str) -> u64 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of token occurrences
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// The `k` most frequent tokens, ties broken alphabetically
    pub fn most_common(&self, k: usize) -> Vec<(&str, u64)> {
        self.counts
            .iter()
            .map(|(token, count)| (token.as_str(), *count))
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
            .take(k)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(token, count)| (token.as_str(), *count))
    }
}
