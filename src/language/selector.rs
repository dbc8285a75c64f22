use super::difficulty::Difficulty;
use super::frequency::FrequencyIndex;
use super::masking::{mask_token_with, MaskedSentence};
use super::tokenize::Segmenter;
use crate::error::{ClozeError, Result};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::RngCore;

/// Trait for different masking strategies
pub trait WordSelector {
    /// Pick one word of `sentence`, as split by `segmenter`, and hide it
    fn select(
        &self,
        sentence: &str,
        segmenter: &dyn Segmenter,
        index: &FrequencyIndex,
        difficulty: Difficulty,
        rng: &mut dyn RngCore,
    ) -> Result<MaskedSentence>;
}

/// Uniform choice among the sentence's words, ignoring difficulty
pub struct RandomSelector;

impl WordSelector for RandomSelector {
    fn select(
        &self,
        sentence: &str,
        segmenter: &dyn Segmenter,
        _index: &FrequencyIndex,
        _difficulty: Difficulty,
        rng: &mut dyn RngCore,
    ) -> Result<MaskedSentence> {
        let tokens: Vec<String> = segmenter.segment(sentence).into_iter().unique().collect();
        let chosen = tokens.choose(rng).ok_or(ClozeError::NoCandidate)?;
        mask_token_with(segmenter, sentence, chosen)
    }
}

/// Frequency-aware selection: the difficulty tier picks a percentile band
/// of the sentence's words sorted by corpus frequency, and a word is drawn
/// uniformly from the distinct words of that band.
///
/// Easy masks come from the most frequent 40%, medium from the 40-70th
/// percentile and hard from the rarest 30%. A band that is empty for a short
/// sentence falls back to every word of the sentence.
pub struct FrequencyBandSelector;

impl WordSelector for FrequencyBandSelector {
    fn select(
        &self,
        sentence: &str,
        segmenter: &dyn Segmenter,
        index: &FrequencyIndex,
        difficulty: Difficulty,
        rng: &mut dyn RngCore,
    ) -> Result<MaskedSentence> {
        let tokens = segmenter.segment(sentence);
        if tokens.is_empty() {
            return Err(ClozeError::NoCandidate);
        }

        // Stable sort keeps sentence order among equally frequent words
        let ranked: Vec<&str> = tokens
            .iter()
            .map(|token| (token.as_str(), index.count(token)))
            .sorted_by(|a, b| b.1.cmp(&a.1))
            .map(|(token, _)| token)
            .collect();

        let mut pool: Vec<&str> = ranked[difficulty.band(ranked.len())]
            .iter()
            .copied()
            .unique()
            .collect();
        if pool.is_empty() {
            pool = tokens.iter().map(String::as_str).unique().collect();
        }

        let chosen = pool.choose(rng).ok_or(ClozeError::NoCandidate)?;
        log::debug!(
            "masking '{chosen}' ({difficulty}, {} candidates, frequency {})",
            pool.len(),
            index.count(chosen)
        );
        mask_token_with(segmenter, sentence, chosen)
    }
}
