use crate::error::Result;
use crate::fitness::{classify, Candidate, ContextScorer, FitnessBand};
use crate::language::MaskedSentence;

/// Everything the host needs to report on one answered question
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub original: Candidate,
    pub guess: Candidate,
    /// Case-insensitive match of the guess against the hidden word
    pub is_correct: bool,
    /// 1-based rank of the guess among the original, the guess and the alternatives
    pub guess_rank: usize,
    /// Whether the scorer's vocabulary contains the guess
    pub guess_known: bool,
    /// Best alternatives, excluding the original and the guess
    pub alternatives: Vec<Candidate>,
    pub band: FitnessBand,
}

impl Feedback {
    /// Contribution of this answer to the rolling performance window
    pub fn performance_score(&self) -> f64 {
        match self.band {
            FitnessBand::Exact => 1.0,
            FitnessBand::Excellent => 0.75,
            FitnessBand::Good => 0.5,
            FitnessBand::Poor => 0.0,
        }
    }
}

/// Score `guess` against the hidden word and the scorer's top alternatives
pub fn provide_feedback<S: ContextScorer + ?Sized>(
    scorer: &S,
    masked: &MaskedSentence,
    guess: &str,
    top_n: usize,
) -> Result<Feedback> {
    let guess = guess.trim();
    let original = scorer.evaluate(masked, &masked.original)?;
    let guess_candidate = scorer.evaluate(masked, guess)?;
    let guess_tokens = scorer.tokenize(guess);
    let is_correct = guess_tokens == scorer.tokenize(&masked.original);

    let original_token = masked.token();
    let guess_tokens = guess_tokens.join(" ");
    let mut alternatives = scorer.rank(masked, top_n + 2)?;
    alternatives.retain(|c| {
        let token = scorer.tokenize(&c.word).join(" ");
        token != original_token && token != guess_tokens
    });
    alternatives.truncate(top_n);

    let guess_rank = if is_correct {
        1
    } else {
        let guess_fitness = guess_candidate.fitness.value();
        1 + std::iter::once(&original)
            .chain(alternatives.iter())
            .filter(|c| c.fitness.value() > guess_fitness)
            .count()
    };

    let band = if is_correct {
        FitnessBand::Exact
    } else {
        classify(guess_candidate.fitness, original.fitness)?
    };

    log::debug!(
        "guess '{guess}' for '{}': {band}, rank {guess_rank}",
        masked.original
    );

    Ok(Feedback {
        original,
        guess_known: scorer.knows(guess),
        guess: guess_candidate,
        is_correct,
        guess_rank,
        alternatives,
        band,
    })
}
