use crate::error::{ClozeError, Result};
use crate::language::tokenize::{Segmenter, WordSegmenter};
use std::ops::Range;

/// Marker that replaces the hidden word in the displayed sentence
pub const MASK_MARKER: &str = "[MASK]";

/// A sentence with exactly one word hidden
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedSentence {
    /// The sentence as it appeared in the corpus
    pub source: String,
    /// `source` with the hidden word replaced by [`MASK_MARKER`]
    pub text: String,
    /// The hidden word in source casing
    pub original: String,
    /// Byte range of the hidden word inside `source`
    pub span: Range<usize>,
    /// Normalized tokens left of the mask
    pub before: Vec<String>,
    /// Normalized tokens right of the mask
    pub after: Vec<String>,
}

impl MaskedSentence {
    /// Normalized form of the hidden word
    pub fn token(&self) -> String {
        self.original.to_lowercase()
    }

    /// Token index of the mask
    pub fn position(&self) -> usize {
        self.before.len()
    }

    /// Source sentence with `word` written in place of the hidden word
    pub fn fill(&self, word: &str) -> String {
        format!(
            "{}{}{}",
            &self.source[..self.span.start],
            word,
            &self.source[self.span.end..]
        )
    }

    /// Token sequence with `fill` tokens at the mask position
    pub fn tokens_with<S: AsRef<str>>(&self, fill: &[S]) -> Vec<String> {
        let mut tokens = Vec::with_capacity(self.before.len() + fill.len() + self.after.len());
        tokens.extend(self.before.iter().cloned());
        tokens.extend(fill.iter().map(|t| t.as_ref().to_owned()));
        tokens.extend(self.after.iter().cloned());
        tokens
    }
}

/// Hide the first case-insensitive whole-word occurrence of `token` in
/// `sentence`, splitting words with the default [`WordSegmenter`].
///
/// # Errors
/// Returns `NoCandidate` if `token` does not occur as a whole word.
pub fn mask_token(sentence: &str, token: &str) -> Result<MaskedSentence> {
    mask_token_with(&WordSegmenter, sentence, token)
}

/// Like [`mask_token`], with words and context tokens taken from `segmenter`
pub fn mask_token_with(
    segmenter: &dyn Segmenter,
    sentence: &str,
    token: &str,
) -> Result<MaskedSentence> {
    let token = token.to_lowercase();
    let spans = segmenter.spans(sentence);
    let idx = spans
        .iter()
        .position(|span| span.token() == token)
        .ok_or(ClozeError::NoCandidate)?;

    let span = spans[idx].range.clone();
    let text = format!(
        "{}{}{}",
        &sentence[..span.start],
        MASK_MARKER,
        &sentence[span.end..]
    );

    Ok(MaskedSentence {
        source: sentence.to_owned(),
        text,
        original: spans[idx].text.to_owned(),
        span,
        before: spans[..idx].iter().map(|s| s.token()).collect(),
        after: spans[idx + 1..].iter().map(|s| s.token()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::tokenize::{segment, ApostropheSegmenter};
    use assert_matches::assert_matches;

    #[test]
    fn test_mask_first_occurrence_preserving_casing() {
        let masked = mask_token("The cat saw the dog.", "the").unwrap();
        assert_eq!(masked.text, "[MASK] cat saw the dog.");
        assert_eq!(masked.original, "The");
        assert_eq!(masked.token(), "the");
        assert!(masked.before.is_empty());
        assert_eq!(masked.after, vec!["cat", "saw", "the", "dog"]);
    }

    #[test]
    fn test_mask_matches_whole_words_only() {
        let masked = mask_token("Catalog the cat, please", "CAT").unwrap();
        assert_eq!(masked.text, "Catalog the [MASK], please");
        assert_eq!(masked.original, "cat");
        assert_eq!(masked.position(), 2);
    }

    #[test]
    fn test_mask_missing_token() {
        assert_matches!(mask_token("a b c", "d"), Err(ClozeError::NoCandidate));
        assert_matches!(mask_token("", "d"), Err(ClozeError::NoCandidate));
    }

    #[test]
    fn test_fill_and_tokens() {
        let masked = mask_token("Dogs chase Cats!", "chase").unwrap();
        assert_eq!(masked.fill("love"), "Dogs love Cats!");
        assert_eq!(masked.tokens_with(&segment("Love")), vec!["dogs", "love", "cats"]);
        assert_eq!(masked.tokens_with(&segment("?!")), vec!["dogs", "cats"]);
        assert_eq!(masked.fill(&masked.original), masked.source);
    }


    #[test]
    fn test_mask_with_custom_segmenter() {
        let sentence = "I don't like rain.";
        let masked = mask_token_with(&ApostropheSegmenter, sentence, "like").unwrap();
        assert_eq!(masked.before, vec!["i", "don't"]);
        assert_eq!(masked.after, vec!["rain"]);

        let masked = mask_token_with(&ApostropheSegmenter, sentence, "DON'T").unwrap();
        assert_eq!(masked.text, "I [MASK] like rain.");
        assert_eq!(masked.token(), "don't");
        // the default segmenter has no such word
        assert_matches!(mask_token(sentence, "don't"), Err(ClozeError::NoCandidate));
    }
}
