use crate::error::{ClozeError, Result};
use crate::language::{split_sentences, FrequencyIndex, NgramModel, Segmenter, WordSegmenter};
use include_dir::{include_dir, Dir};
use std::fs;
use std::path::Path;
use std::sync::Arc;

static DATA_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/data");

const SAMPLE_FILE: &str = "sample.txt";

/// Read a UTF-8 text file
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    log::debug!("loaded {} bytes from {}", text.len(), path.display());
    Ok(text)
}

/// Training text split into sentences, with its frequency index, the
/// n-gram model trained on it and the segmenter that produced both
#[derive(Debug, Clone)]
pub struct Corpus {
    pub sentences: Vec<String>,
    pub index: FrequencyIndex,
    pub model: NgramModel,
    segmenter: Arc<dyn Segmenter>,
}

impl Corpus {
    /// Split `text` into sentences and train an order-`order` model on them,
    /// one `update` per sentence.
    ///
    /// # Errors
    /// `InvalidInput` for a zero order or a text without any word.
    pub fn build<S: Segmenter + 'static>(text: &str, order: usize, segmenter: S) -> Result<Self> {
        let segmenter: Arc<dyn Segmenter> = Arc::new(segmenter);
        let mut model = NgramModel::new(order)?;

        let tokenized: Vec<(String, Vec<String>)> = split_sentences(text)
            .into_iter()
            .map(|sentence| {
                let tokens = segmenter.segment(&sentence);
                (sentence, tokens)
            })
            .filter(|(_, tokens)| !tokens.is_empty())
            .collect();
        if tokenized.is_empty() {
            return Err(ClozeError::InvalidInput("corpus contains no words".into()));
        }

        for (_, tokens) in &tokenized {
            model.update(tokens);
        }
        let index = FrequencyIndex::build(tokenized.iter().flat_map(|(_, tokens)| tokens.iter()));
        let sentences: Vec<String> = tokenized.into_iter().map(|(sentence, _)| sentence).collect();

        log::debug!(
            "trained order-{order} model on {} sentences, {} distinct words",
            sentences.len(),
            index.len()
        );

        Ok(Self {
            sentences,
            index,
            model,
            segmenter,
        })
    }

    /// The corpus bundled with the binary
    pub fn sample(order: usize) -> Result<Self> {
        let text = DATA_DIR
            .get_file(SAMPLE_FILE)
            .and_then(|file| file.contents_utf8())
            .ok_or_else(|| ClozeError::InvalidInput(format!("missing bundled {SAMPLE_FILE}")))?;
        Self::build(text, order, WordSegmenter)
    }

    pub fn from_path<P: AsRef<Path>>(path: P, order: usize) -> Result<Self> {
        Self::build(&load_corpus(path)?, order, WordSegmenter)
    }

    pub fn segmenter(&self) -> &dyn Segmenter {
        self.segmenter.as_ref()
    }

    /// Shared handle to the segmenter, for scorers that must agree with it
    pub fn shared_segmenter(&self) -> Arc<dyn Segmenter> {
        Arc::clone(&self.segmenter)
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// First sentence containing `word` as a whole word
    pub fn find_sentence(&self, word: &str) -> Option<&str> {
        let word = word.to_lowercase();
        self.sentences
            .iter()
            .find(|sentence| self.segmenter.segment(sentence).contains(&word))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::tokenize::ApostropheSegmenter;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_build_counts_every_token() {
        let corpus = Corpus::build("The cat sat. The dog sat!", 2, WordSegmenter).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.index.count("the"), 2);
        assert_eq!(corpus.index.count("sat"), 2);
        assert_eq!(corpus.index.total(), 6);
        assert_eq!(corpus.model.count(&["the"], "cat"), 1);
        assert_eq!(corpus.model.context_total(&["sat"]), 2);
    }

    #[test]
    fn test_build_skips_wordless_sentences() {
        let corpus = Corpus::build("... Hello there. !!", 3, WordSegmenter).unwrap();
        assert_eq!(corpus.sentences, vec!["Hello there."]);
    }

    #[test]
    fn test_build_rejects_empty_text() {
        assert_matches!(
            Corpus::build("  \n ", 3, WordSegmenter),
            Err(ClozeError::InvalidInput(_))
        );
    }

    #[test]
    fn test_build_rejects_zero_order() {
        assert_matches!(
            Corpus::build("A b c.", 0, WordSegmenter),
            Err(ClozeError::InvalidInput(_))
        );
    }

    #[test]
    fn test_sample_corpus_is_bundled() {
        let corpus = Corpus::sample(3).unwrap();
        assert!(corpus.len() >= 30);
        assert_eq!(corpus.model.order(), 3);
        assert!(corpus.index.count("the") > 10);
    }

    #[test]
    fn test_load_corpus_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "One line.\nAnother line here.").unwrap();

        let corpus = Corpus::from_path(file.path(), 2).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.find_sentence("ANOTHER"), Some("Another line here."));
        assert_eq!(corpus.find_sentence("missing"), None);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        assert_matches!(
            load_corpus("/definitely/not/here.txt"),
            Err(ClozeError::Io(_))
        );
    }


    #[test]
    fn test_corpus_keeps_its_segmenter() {
        let corpus = Corpus::build("I don't like rain. Rain is wet.", 2, ApostropheSegmenter)
            .unwrap();
        assert_eq!(corpus.index.count("don't"), 1);
        assert_eq!(corpus.index.count("don"), 0);
        assert_eq!(corpus.segmenter().segment("Won't"), vec!["won't"]);
        assert_eq!(corpus.find_sentence("DON'T"), Some("I don't like rain."));
        assert_eq!(corpus.find_sentence("t"), None);
    }
}
