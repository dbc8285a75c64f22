pub mod difficulty;
pub mod frequency;
pub mod masking;
pub mod ngram;
pub mod selector;
pub mod tokenize;

// Re-export the main types for convenience
pub use difficulty::Difficulty;
pub use frequency::FrequencyIndex;
pub use masking::{mask_token, mask_token_with, MaskedSentence, MASK_MARKER};
pub use ngram::{NgramModel, END_MARKER, SMOOTHING, START_MARKER};
pub use selector::{FrequencyBandSelector, RandomSelector, WordSelector};
pub use tokenize::{
    segment, spans_by, split_sentences, word_spans, Segmenter, WordSegmenter, WordSpan,
};
