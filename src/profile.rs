use crate::language::Difficulty;
use crate::util::{mean, unit_interval};
use rand::Rng;
use std::collections::{BTreeMap, VecDeque};

/// Number of recent scores kept in the rolling window
pub const PERFORMANCE_WINDOW: usize = 20;
/// Review countdown bounds, in questions, inclusive
pub const REVIEW_MIN: i32 = 5;
pub const REVIEW_MAX: i32 = 15;

/// Session-scoped learner state: difficulty tier, rolling performance and
/// pending word reviews
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    difficulty: Difficulty,
    performance_window: VecDeque<f64>,
    words_to_review: BTreeMap<String, i32>,
}

impl UserProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// Push a score into the window, evicting the oldest beyond capacity.
    /// Scores are clamped to `[0, 1]`; NaN counts as 0.
    pub fn update_performance(&mut self, score: f64) {
        self.performance_window.push_back(unit_interval(score));
        while self.performance_window.len() > PERFORMANCE_WINDOW {
            self.performance_window.pop_front();
        }
    }

    /// Mean of the window, 0 when empty
    pub fn get_average_score(&self) -> f64 {
        let (front, back) = self.performance_window.as_slices();
        if back.is_empty() {
            return mean(front).unwrap_or(0.0);
        }
        let scores: Vec<f64> = self.performance_window.iter().copied().collect();
        mean(&scores).unwrap_or(0.0)
    }

    pub fn get_current_difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    pub fn performance_window(&self) -> &VecDeque<f64> {
        &self.performance_window
    }

    /// Schedule (or reschedule) `word` to come back after `countdown` questions
    pub fn add_word_to_review(&mut self, word: &str, countdown: i32) {
        self.words_to_review.insert(word.to_lowercase(), countdown);
    }

    /// Words whose countdown has run out, in alphabetical order.
    ///
    /// Due words stay queued until [`UserProfile::clear_review`] or a new
    /// [`UserProfile::add_word_to_review`]; calling this twice returns them twice.
    pub fn get_words_to_review(&self) -> Vec<String> {
        self.words_to_review
            .iter()
            .filter(|(_, countdown)| **countdown <= 0)
            .map(|(word, _)| word.clone())
            .collect()
    }

    /// Advance every pending countdown by one question
    pub fn update_review_times(&mut self) {
        for countdown in self.words_to_review.values_mut() {
            *countdown -= 1;
        }
    }

    /// Drop `word` from the review queue, returning whether it was queued
    pub fn clear_review(&mut self, word: &str) -> bool {
        self.words_to_review.remove(&word.to_lowercase()).is_some()
    }

    pub fn pending_reviews(&self) -> &BTreeMap<String, i32> {
        &self.words_to_review
    }
}

/// Queue `word` for review after a random 5 to 15 questions and return the countdown
pub fn schedule_review<R: Rng + ?Sized>(profile: &mut UserProfile, word: &str, rng: &mut R) -> i32 {
    let countdown = rng.gen_range(REVIEW_MIN..=REVIEW_MAX);
    profile.add_word_to_review(word, countdown);
    log::debug!("'{word}' scheduled for review in {countdown} questions");
    countdown
}

/// Difficulty implied by the rolling average.
///
/// Rules are checked in order: above 0.8 is hard, 0.6 to 0.8 inclusive is
/// medium, below 0.6 is easy. Anything else (a NaN average) keeps the
/// current tier.
pub fn adjust_difficulty(profile: &UserProfile) -> Difficulty {
    let average = profile.get_average_score();
    difficulty_for(average).unwrap_or(profile.get_current_difficulty())
}

fn difficulty_for(average: f64) -> Option<Difficulty> {
    if average > 0.8 {
        Some(Difficulty::Hard)
    } else if (0.6..=0.8).contains(&average) {
        Some(Difficulty::Medium)
    } else if average < 0.6 {
        Some(Difficulty::Easy)
    } else {
        None
    }
}
