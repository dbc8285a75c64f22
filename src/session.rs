use crate::corpus::Corpus;
use crate::error::{ClozeError, Result};
use crate::feedback::{provide_feedback, Feedback};
use crate::fitness::ContextScorer;
use crate::language::{
    mask_token_with, Difficulty, FrequencyBandSelector, MaskedSentence, WordSelector,
};
use crate::profile::{adjust_difficulty, schedule_review, UserProfile};
use rand::seq::SliceRandom;
use rand::RngCore;

/// One masked sentence put to the learner
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub masked: MaskedSentence,
    /// Tier the word was chosen at
    pub difficulty: Difficulty,
    /// Whether this question re-presents a previously missed word
    pub is_review: bool,
}

/// Drives a cloze quiz over a corpus: picks questions, judges answers and
/// keeps the learner profile up to date
pub struct QuizSession<S: ContextScorer, R: RngCore> {
    corpus: Corpus,
    scorer: S,
    profile: UserProfile,
    rng: R,
    selector: Box<dyn WordSelector>,
    top_k: usize,
    order: Vec<usize>,
    cursor: usize,
    asked: usize,
    correct: usize,
}

impl<S: ContextScorer, R: RngCore> QuizSession<S, R> {
    pub fn new(corpus: Corpus, scorer: S, profile: UserProfile, mut rng: R, top_k: usize) -> Self {
        let mut order: Vec<usize> = (0..corpus.len()).collect();
        order.shuffle(&mut rng);
        Self {
            corpus,
            scorer,
            profile,
            rng,
            selector: Box::new(FrequencyBandSelector),
            top_k,
            order,
            cursor: 0,
            asked: 0,
            correct: 0,
        }
    }

    pub fn with_selector(mut self, selector: Box<dyn WordSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Next question, or `None` once every sentence has been used.
    ///
    /// Advances review countdowns by one, then serves a due review word
    /// before drawing a fresh sentence.
    pub fn next_question(&mut self) -> Option<Question> {
        self.profile.update_review_times();

        if let Some(question) = self.next_review() {
            return Some(question);
        }

        let difficulty = self.profile.get_current_difficulty();
        while let Some(&idx) = self.order.get(self.cursor) {
            self.cursor += 1;
            let sentence = &self.corpus.sentences[idx];
            match self.selector.select(
                sentence,
                self.corpus.segmenter(),
                &self.corpus.index,
                difficulty,
                &mut self.rng,
            ) {
                Ok(masked) => {
                    return Some(Question {
                        masked,
                        difficulty,
                        is_review: false,
                    })
                }
                Err(ClozeError::NoCandidate) => continue,
                Err(e) => {
                    log::warn!("skipping sentence {idx}: {e}");
                    continue;
                }
            }
        }

        None
    }

    /// A served review word stays queued until its answer is submitted
    fn next_review(&mut self) -> Option<Question> {
        for word in self.profile.get_words_to_review() {
            let masked = self
                .corpus
                .find_sentence(&word)
                .map(|sentence| mask_token_with(self.corpus.segmenter(), sentence, &word));
            match masked {
                Some(Ok(masked)) => {
                    log::debug!("reviewing '{word}'");
                    return Some(Question {
                        masked,
                        difficulty: self.profile.get_current_difficulty(),
                        is_review: true,
                    });
                }
                _ => {
                    log::debug!("no sentence left to review '{word}'");
                    self.profile.clear_review(&word);
                }
            }
        }
        None
    }

    /// Judge `guess` for `question` and update the profile.
    ///
    /// Answering a review takes its word off the queue; a miss queues the
    /// hidden word again.
    pub fn submit(&mut self, question: &Question, guess: &str) -> Result<Feedback> {
        let feedback = provide_feedback(&self.scorer, &question.masked, guess, self.top_k)?;
        if question.is_review {
            self.profile.clear_review(&question.masked.token());
        }

        self.asked += 1;
        if feedback.is_correct {
            self.correct += 1;
        }

        self.profile.update_performance(feedback.performance_score());
        let current = self.profile.get_current_difficulty();
        let next = adjust_difficulty(&self.profile);
        if next != current {
            log::info!(
                "difficulty {current} -> {next} (average {:.2})",
                self.profile.get_average_score()
            );
            self.profile.set_difficulty(next);
        }

        if !feedback.is_correct {
            schedule_review(&mut self.profile, &question.masked.token(), &mut self.rng);
        }

        Ok(feedback)
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn asked(&self) -> usize {
        self.asked
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    /// Share of correct answers, 0 before the first answer
    pub fn accuracy(&self) -> f64 {
        if self.asked == 0 {
            0.0
        } else {
            self.correct as f64 / self.asked as f64
        }
    }

    /// Fresh sentences not yet used
    pub fn remaining(&self) -> usize {
        self.order.len() - self.cursor
    }
}
