use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Difficulty tier, controlling which frequency band is eligible for masking
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Percentile bounds in tenths: easy is the top 40%, hard the rarest 30%
    fn tenths(&self) -> (usize, usize) {
        match self {
            Difficulty::Easy => (0, 4),
            Difficulty::Medium => (4, 7),
            Difficulty::Hard => (7, 10),
        }
    }

    /// Index range of this tier's band in a frequency-sorted list of `len` tokens
    pub fn band(&self, len: usize) -> Range<usize> {
        let (start, end) = self.tenths();
        (len * start / 10)..(len * end / 10)
    }
}
