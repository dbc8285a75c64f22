use std::fmt;
use std::ops::Range;

/// Splits raw text into words.
///
/// Corpus training, word selection, masking and scoring all go through the
/// same segmenter, so a word is one token everywhere or nowhere.
pub trait Segmenter: fmt::Debug {
    /// Every word of `text`, in order, with its byte range
    fn spans<'a>(&self, text: &'a str) -> Vec<WordSpan<'a>>;

    /// Normalized tokens of `text`
    fn segment(&self, text: &str) -> Vec<String> {
        self.spans(text).iter().map(WordSpan::token).collect()
    }
}

/// Default segmenter: lowercased maximal runs of alphanumeric characters
#[derive(Debug, Clone, Copy, Default)]
pub struct WordSegmenter;

impl Segmenter for WordSegmenter {
    fn spans<'a>(&self, text: &'a str) -> Vec<WordSpan<'a>> {
        word_spans(text)
    }
}

/// A word as it appears in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSpan<'a> {
    /// Byte range of the word inside the source text
    pub range: Range<usize>,
    pub text: &'a str,
}

impl WordSpan<'_> {
    pub fn token(&self) -> String {
        self.text.to_lowercase()
    }
}

/// Lowercase `text` and keep only alphanumeric tokens
pub fn segment(text: &str) -> Vec<String> {
    word_spans(text).iter().map(WordSpan::token).collect()
}

/// Locate every maximal alphanumeric run in `text`, keeping source casing
pub fn word_spans(text: &str) -> Vec<WordSpan<'_>> {
    spans_by(text, char::is_alphanumeric)
}

/// Locate every maximal run of characters accepted by `is_word_char`
pub fn spans_by<F>(text: &str, is_word_char: F) -> Vec<WordSpan<'_>>
where
    F: Fn(char) -> bool,
{
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        match (is_word_char(ch), start) {
            (true, None) => start = Some(idx),
            (false, Some(s)) => {
                spans.push(WordSpan {
                    range: s..idx,
                    text: &text[s..idx],
                });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push(WordSpan {
            range: s..text.len(),
            text: &text[s..],
        });
    }

    spans
}

/// Keeps apostrophes inside words, so contractions stay whole
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ApostropheSegmenter;

#[cfg(test)]
impl Segmenter for ApostropheSegmenter {
    fn spans<'a>(&self, text: &'a str) -> Vec<WordSpan<'a>> {
        spans_by(text, |c| c.is_alphanumeric() || c == '\'')
    }
}

/// Split running text into sentences.
///
/// A sentence ends after `.`, `!` or `?` when followed by whitespace or the
/// end of the text. Line breaks inside a sentence become single spaces.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(if ch == '\n' || ch == '\r' { ' ' } else { ch });

        let terminal = matches!(ch, '.' | '!' | '?');
        let boundary = chars.peek().map_or(true, |next| next.is_whitespace());
        if terminal && boundary {
            push_sentence(&mut sentences, &current);
            current.clear();
        }
    }
    push_sentence(&mut sentences, &current);

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let sentence = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_lowercases_and_drops_punctuation() {
        assert_eq!(
            segment("The Cat, sat -- on the MAT!"),
            vec!["the", "cat", "sat", "on", "the", "mat"]
        );
    }

    #[test]
    fn test_segment_empty_and_symbols_only() {
        assert!(segment("").is_empty());
        assert!(segment("... --- !!!").is_empty());
    }

    #[test]
    fn test_segment_keeps_digits_and_unicode_letters() {
        assert_eq!(segment("Café 42 naïve"), vec!["café", "42", "naïve"]);
    }

    #[test]
    fn test_word_spans_ranges_point_into_source() {
        let text = "Hello, World";
        let spans = word_spans(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(&text[spans[0].range.clone()], "Hello");
        assert_eq!(&text[spans[1].range.clone()], "World");
        assert_eq!(spans[1].token(), "world");
    }

    #[test]
    fn test_word_segmenter_trait() {
        let segmenter = WordSegmenter;
        assert_eq!(segmenter.segment("A b"), vec!["a", "b"]);
        assert_eq!(segmenter.spans("A b"), word_spans("A b"));
    }

    #[test]
    fn test_spans_by_custom_word_chars() {
        let text = "I don't know.";
        let spans = ApostropheSegmenter.spans(text);
        assert_eq!(ApostropheSegmenter.segment(text), vec!["i", "don't", "know"]);
        assert_eq!(&text[spans[1].range.clone()], "don't");
        assert_eq!(segment(text), vec!["i", "don", "t", "know"]);
    }

    #[test]
    fn test_split_sentences() {
        let text = "The cat sat.\nIt was\nhappy! Was it? yes";
        assert_eq!(
            split_sentences(text),
            vec!["The cat sat.", "It was happy!", "Was it?", "yes"]
        );
    }

    #[test]
    fn test_split_sentences_keeps_inner_periods() {
        assert_eq!(split_sentences("Pi is 3.14 roughly."), vec!["Pi is 3.14 roughly."]);
        assert!(split_sentences("   \n ").is_empty());
    }
}
