//! Candidate fitness for a masked word.
//!
//! Two scoring conventions exist and they are not interchangeable:
//! - [`Convention::Ratio`]: `baseline_perplexity / candidate_perplexity`,
//!   unbounded, > 1 when the candidate makes the sentence less surprising
//!   than a neutral placeholder.
//! - [`Convention::Normalized`]: a candidate's logit at the mask scaled by
//!   the min and max logits of the vocabulary, in `[0, 1]`.
//!
//! Every [`Fitness`] carries its convention, and banding refuses to mix them.

use crate::error::{ClozeError, Result};
use crate::language::{
    segment, MaskedSentence, NgramModel, Segmenter, WordSegmenter, END_MARKER, START_MARKER,
};
use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// Stand-in for the hidden word when computing the baseline perplexity.
/// It is not alphanumeric, so the default segmenter never produces it.
pub const PLACEHOLDER: &str = "<mask>";

/// Ratio fitness at or above this share of the original's counts as good
pub const GOOD_RATIO_FACTOR: f64 = 0.8;
pub const EXCELLENT_NORMALIZED: f64 = 0.8;
pub const GOOD_NORMALIZED: f64 = 0.5;

/// Upper bound on proposals drawn from each side of the mask
const PROPOSAL_POOL: usize = 50;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Convention {
    Ratio,
    Normalized,
}

/// A fitness value tagged with the convention that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fitness {
    Ratio(f64),
    Normalized(f64),
}

impl Fitness {
    pub fn value(&self) -> f64 {
        match self {
            Fitness::Ratio(v) | Fitness::Normalized(v) => *v,
        }
    }

    pub fn convention(&self) -> Convention {
        match self {
            Fitness::Ratio(_) => Convention::Ratio,
            Fitness::Normalized(_) => Convention::Normalized,
        }
    }

    /// Orders two fitness values of the same convention
    pub fn compare(&self, other: &Fitness) -> Result<Ordering> {
        if self.convention() != other.convention() {
            return Err(ClozeError::MixedConventions {
                left: self.convention(),
                right: other.convention(),
            });
        }
        Ok(self.value().total_cmp(&other.value()))
    }
}

/// Coarse quality of a guess
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FitnessBand {
    /// The guess is the hidden word
    Exact,
    Excellent,
    Good,
    Poor,
}

/// Band a guess against the original word's fitness.
///
/// Ratio scores are banded relative to the original (the ratio is unbounded,
/// so only relative thresholds mean anything). Normalized scores are banded
/// on fixed thresholds. Never returns `Exact`; that is decided by comparing
/// the words themselves.
pub fn classify(guess: Fitness, original: Fitness) -> Result<FitnessBand> {
    let band = match (guess, original) {
        (Fitness::Ratio(g), Fitness::Ratio(o)) => {
            if g >= o {
                FitnessBand::Excellent
            } else if g >= GOOD_RATIO_FACTOR * o {
                FitnessBand::Good
            } else {
                FitnessBand::Poor
            }
        }
        (Fitness::Normalized(g), Fitness::Normalized(_)) => {
            if g >= EXCELLENT_NORMALIZED {
                FitnessBand::Excellent
            } else if g >= GOOD_NORMALIZED {
                FitnessBand::Good
            } else {
                FitnessBand::Poor
            }
        }
        (g, o) => {
            return Err(ClozeError::MixedConventions {
                left: g.convention(),
                right: o.convention(),
            })
        }
    };
    Ok(band)
}

/// A word proposed for the mask, with its derived scores
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub word: String,
    /// Perplexity of the filled sentence, for scorers that have one
    pub perplexity: Option<f64>,
    pub fitness: Fitness,
}

/// Anything that can judge how well a word fits a masked sentence
pub trait ContextScorer {
    fn convention(&self) -> Convention;

    /// Score `candidate` at the mask. Unknown words still get a (poor) score.
    fn evaluate(&self, masked: &MaskedSentence, candidate: &str) -> Result<Candidate>;

    /// The scorer's own top predictions for the mask, best first
    fn propose(&self, masked: &MaskedSentence, k: usize) -> Result<Vec<String>>;

    fn score(&self, masked: &MaskedSentence, candidate: &str) -> Result<Fitness> {
        Ok(self.evaluate(masked, candidate)?.fitness)
    }

    /// Normalized tokens of `text`, split the way the scorer's model was trained
    fn tokenize(&self, text: &str) -> Vec<String> {
        segment(text)
    }

    /// Whether the underlying vocabulary contains `word`
    fn knows(&self, _word: &str) -> bool {
        true
    }

    /// Top `k` proposals sorted by descending fitness
    fn rank(&self, masked: &MaskedSentence, k: usize) -> Result<Vec<Candidate>> {
        let proposals = self.propose(masked, k)?;
        let mut ranked = rank_candidates(self, masked, &proposals)?;
        ranked.truncate(k);
        Ok(ranked)
    }
}

impl<S: ContextScorer + ?Sized> ContextScorer for Box<S> {
    fn convention(&self) -> Convention {
        (**self).convention()
    }

    fn evaluate(&self, masked: &MaskedSentence, candidate: &str) -> Result<Candidate> {
        (**self).evaluate(masked, candidate)
    }

    fn propose(&self, masked: &MaskedSentence, k: usize) -> Result<Vec<String>> {
        (**self).propose(masked, k)
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        (**self).tokenize(text)
    }

    fn knows(&self, word: &str) -> bool {
        (**self).knows(word)
    }

    fn rank(&self, masked: &MaskedSentence, k: usize) -> Result<Vec<Candidate>> {
        (**self).rank(masked, k)
    }
}

/// Score every word in `words` and sort by descending fitness
pub fn rank_candidates<S, W>(
    scorer: &S,
    masked: &MaskedSentence,
    words: &[W],
) -> Result<Vec<Candidate>>
where
    S: ContextScorer + ?Sized,
    W: AsRef<str>,
{
    let candidates = words
        .iter()
        .map(|word| scorer.evaluate(masked, word.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    Ok(candidates
        .into_iter()
        .sorted_by(|a, b| {
            b.fitness
                .value()
                .total_cmp(&a.fitness.value())
                .then_with(|| a.word.cmp(&b.word))
        })
        .collect())
}

/// Ratio-convention scorer backed by an n-gram model
#[derive(Debug, Clone)]
pub struct PerplexityScorer {
    model: NgramModel,
    segmenter: Arc<dyn Segmenter>,
}

impl PerplexityScorer {
    pub fn new(model: NgramModel) -> Self {
        Self {
            model,
            segmenter: Arc::new(WordSegmenter),
        }
    }

    /// Split guesses with `segmenter`; it should be the one the model was
    /// trained with
    pub fn with_segmenter(mut self, segmenter: Arc<dyn Segmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn model(&self) -> &NgramModel {
        &self.model
    }

    /// Perplexity of the sentence with a neutral placeholder at the mask
    pub fn baseline_perplexity(&self, masked: &MaskedSentence) -> Result<f64> {
        self.model.perplexity_tokens(&masked.tokens_with(&[PLACEHOLDER]))
    }

    fn left_context(&self, masked: &MaskedSentence) -> Vec<String> {
        left_context(self.model.order(), masked)
    }
}

impl ContextScorer for PerplexityScorer {
    fn convention(&self) -> Convention {
        Convention::Ratio
    }

    fn evaluate(&self, masked: &MaskedSentence, candidate: &str) -> Result<Candidate> {
        let baseline = self.baseline_perplexity(masked)?;
        let fill = self.tokenize(candidate);
        let tokens = if fill.is_empty() {
            // nothing scorable in the guess: it fits no better than the placeholder
            masked.tokens_with(&[PLACEHOLDER])
        } else {
            masked.tokens_with(&fill)
        };
        let perplexity = self.model.perplexity_tokens(&tokens)?;

        Ok(Candidate {
            word: candidate.to_owned(),
            perplexity: Some(perplexity),
            fitness: Fitness::Ratio(baseline / perplexity),
        })
    }

    /// Observed continuations of the left context, then observed
    /// predecessors of the right neighbour, then the most frequent words
    fn propose(&self, masked: &MaskedSentence, k: usize) -> Result<Vec<String>> {
        let left = self.left_context(masked);
        let right = masked
            .after
            .first()
            .map(String::as_str)
            .unwrap_or(END_MARKER);

        let mut proposals: Vec<String> = self
            .model
            .continuations(&left)
            .into_iter()
            .take(PROPOSAL_POOL)
            .chain(self.model.predecessors(right).into_iter().take(PROPOSAL_POOL))
            .map(|(word, _)| word)
            .unique()
            .collect();

        if proposals.len() < k {
            for word in self.model.most_frequent(k) {
                if !proposals.iter().any(|p| p == word) {
                    proposals.push(word.to_owned());
                }
            }
        }
        Ok(proposals)
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        self.segmenter.segment(text)
    }

    fn knows(&self, word: &str) -> bool {
        let tokens = self.tokenize(word);
        !tokens.is_empty() && tokens.iter().all(|t| self.model.knows(t))
    }
}

/// Last `n-1` tokens before the mask, start-padded
fn left_context(order: usize, masked: &MaskedSentence) -> Vec<String> {
    let width = order - 1;
    let mut context: Vec<String> = std::iter::repeat(START_MARKER.to_owned())
        .take(width)
        .chain(masked.before.iter().cloned())
        .collect();
    context.split_off(context.len() - width)
}

/// Source of per-word logits at the mask position, such as a masked
/// language model
pub trait LogitModel {
    /// Logit of every vocabulary word at the mask
    fn mask_logits(&self, masked: &MaskedSentence) -> Result<Vec<(String, f64)>>;

    /// Whether `token` is in the vocabulary
    fn knows(&self, token: &str) -> bool;
}

/// Log-probability of the windows touching the mask, for every word the
/// model has seen
impl LogitModel for NgramModel {
    fn mask_logits(&self, masked: &MaskedSentence) -> Result<Vec<(String, f64)>> {
        let position = masked.position();
        let mut tokens = masked.tokens_with(&[PLACEHOLDER]);
        Ok(self
            .vocabulary()
            .into_iter()
            .map(|word| {
                tokens[position] = word.to_owned();
                (word.to_owned(), self.log_probability_at(&tokens, position))
            })
            .collect())
    }

    fn knows(&self, token: &str) -> bool {
        NgramModel::knows(self, token)
    }
}

/// Scale `logit` into `[0, 1]` by the min and max of `logits`.
///
/// Missing logits and a degenerate range (max == min) score 0.0.
pub fn min_max_normalize(logit: Option<f64>, logits: &[(String, f64)]) -> f64 {
    let Some(logit) = logit else {
        return 0.0;
    };
    let (min, max) = logits
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), (_, l)| {
            (min.min(*l), max.max(*l))
        });
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return 0.0;
    }
    ((logit - min) / range).clamp(0.0, 1.0)
}

/// Best `k` logits, ties broken alphabetically
fn top_logits(logits: Vec<(String, f64)>, k: usize) -> Vec<(String, f64)> {
    logits
        .into_iter()
        .sorted_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .take(k)
        .collect()
}

/// Normalized-convention scorer over any [`LogitModel`]
#[derive(Debug, Clone)]
pub struct LogitScorer<M: LogitModel> {
    model: M,
    segmenter: Arc<dyn Segmenter>,
}

impl<M: LogitModel> LogitScorer<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            segmenter: Arc::new(WordSegmenter),
        }
    }

    pub fn with_segmenter(mut self, segmenter: Arc<dyn Segmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Score `candidate` against logits already computed for the mask
    fn candidate_from_logits(&self, candidate: &str, logits: &[(String, f64)]) -> Candidate {
        let tokens = self.tokenize(candidate);
        let logit = match tokens.as_slice() {
            [token] => logits
                .iter()
                .find(|(word, _)| word == token)
                .map(|(_, l)| *l),
            _ => None,
        };

        Candidate {
            word: candidate.to_owned(),
            perplexity: None,
            fitness: Fitness::Normalized(min_max_normalize(logit, logits)),
        }
    }
}

impl<M: LogitModel> ContextScorer for LogitScorer<M> {
    fn convention(&self) -> Convention {
        Convention::Normalized
    }

    /// Only single-token candidates have a logit; anything else scores 0.0
    fn evaluate(&self, masked: &MaskedSentence, candidate: &str) -> Result<Candidate> {
        let logits = self.model.mask_logits(masked)?;
        Ok(self.candidate_from_logits(candidate, &logits))
    }

    fn propose(&self, masked: &MaskedSentence, k: usize) -> Result<Vec<String>> {
        let logits = self.model.mask_logits(masked)?;
        Ok(top_logits(logits, k)
            .into_iter()
            .map(|(word, _)| word)
            .collect())
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        self.segmenter.segment(text)
    }

    fn knows(&self, word: &str) -> bool {
        match self.tokenize(word).as_slice() {
            [token] => self.model.knows(token),
            _ => false,
        }
    }

    /// One pass over the vocabulary: normalization is monotonic in the
    /// logit, so the top logits are the top candidates
    fn rank(&self, masked: &MaskedSentence, k: usize) -> Result<Vec<Candidate>> {
        let logits = self.model.mask_logits(masked)?;
        Ok(top_logits(logits.clone(), k)
            .into_iter()
            .map(|(word, logit)| Candidate {
                fitness: Fitness::Normalized(min_max_normalize(Some(logit), &logits)),
                word,
                perplexity: None,
            })
            .collect())
    }
}
