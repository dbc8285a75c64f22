use crate::config::Config;
use crate::corpus::Corpus;
use crate::error::Result;
use crate::feedback::Feedback;
use crate::fitness::{ContextScorer, Convention, LogitScorer, PerplexityScorer};
use crate::language::Difficulty;
use crate::profile::UserProfile;
use crate::session::QuizSession;
use crate::stats::{HistoryDb, QuestionRecord};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Typed answer that ends the session
pub const QUIT_COMMAND: &str = ":q";

/// Effective settings after merging the stored config with CLI flags
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub order: usize,
    pub top_k: usize,
    pub difficulty: Difficulty,
    pub scorer: Convention,
    pub corpus_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub history: bool,
    /// Stop after this many questions
    pub questions: Option<usize>,
}

impl From<&Config> for RuntimeSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            order: cfg.order,
            top_k: cfg.top_k,
            difficulty: cfg.difficulty,
            scorer: cfg.scorer,
            corpus_path: cfg.corpus_path.clone(),
            seed: cfg.seed,
            history: cfg.history,
            questions: None,
        }
    }
}

impl From<&RuntimeSettings> for Config {
    fn from(rs: &RuntimeSettings) -> Self {
        Self {
            order: rs.order,
            top_k: rs.top_k,
            difficulty: rs.difficulty,
            scorer: rs.scorer,
            corpus_path: rs.corpus_path.clone(),
            seed: rs.seed,
            history: rs.history,
        }
    }
}

pub type DynSession = QuizSession<Box<dyn ContextScorer>, StdRng>;

/// Scorer of the given convention over the corpus model, splitting words
/// the way the corpus does
pub fn scorer_for(convention: Convention, corpus: &Corpus) -> Box<dyn ContextScorer> {
    let model = corpus.model.clone();
    let segmenter = corpus.shared_segmenter();
    match convention {
        Convention::Ratio => Box::new(PerplexityScorer::new(model).with_segmenter(segmenter)),
        Convention::Normalized => Box::new(LogitScorer::new(model).with_segmenter(segmenter)),
    }
}

/// Load the corpus, train the model and wire up a session for `settings`
pub fn build_session(settings: &RuntimeSettings) -> Result<DynSession> {
    let corpus = match &settings.corpus_path {
        Some(path) => Corpus::from_path(path, settings.order)?,
        None => Corpus::sample(settings.order)?,
    };

    let scorer = scorer_for(settings.scorer, &corpus);

    let rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    log::info!(
        "{} sentences, order {}, {} scorer, starting at {}",
        corpus.len(),
        settings.order,
        settings.scorer,
        settings.difficulty
    );

    Ok(QuizSession::new(
        corpus,
        scorer,
        UserProfile::with_difficulty(settings.difficulty),
        rng,
        settings.top_k,
    ))
}

/// Source of typed answers
pub trait AnswerSource {
    /// Next answer line without its line ending, `None` at end of input
    fn next_answer(&mut self) -> io::Result<Option<String>>;
}

/// Answers read line by line from any buffered reader, usually stdin
pub struct LineSource<B: BufRead> {
    reader: B,
}

impl<B: BufRead> LineSource<B> {
    pub fn new(reader: B) -> Self {
        Self { reader }
    }
}

impl<B: BufRead> AnswerSource for LineSource<B> {
    fn next_answer(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}

/// Fixed answers for tests and scripted runs
#[derive(Debug, Default)]
pub struct ScriptedSource {
    answers: VecDeque<String>,
}

impl ScriptedSource {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }
}

impl AnswerSource for ScriptedSource {
    fn next_answer(&mut self) -> io::Result<Option<String>> {
        Ok(self.answers.pop_front())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Guess(String),
    Quit,
}

/// End of input, a blank line or [`QUIT_COMMAND`] quit; anything else is a guess
pub fn parse_answer(line: Option<&str>) -> Answer {
    match line.map(str::trim) {
        None | Some("") | Some(QUIT_COMMAND) => Answer::Quit,
        Some(guess) => Answer::Guess(guess.to_string()),
    }
}

/// Totals for a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct QuizOutcome {
    pub asked: usize,
    pub correct: usize,
    pub final_difficulty: Difficulty,
}

/// Runs the question/answer loop against a text terminal
pub struct Runner<A: AnswerSource, W: Write> {
    source: A,
    out: W,
    history: Option<HistoryDb>,
    limit: Option<usize>,
}

impl<A: AnswerSource, W: Write> Runner<A, W> {
    pub fn new(source: A, out: W) -> Self {
        Self {
            source,
            out,
            history: None,
            limit: None,
        }
    }

    pub fn with_history(mut self, history: HistoryDb) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Ask questions until the learner quits, the limit is hit or the
    /// corpus runs out
    pub fn run<S: ContextScorer, R: RngCore>(
        &mut self,
        session: &mut QuizSession<S, R>,
    ) -> Result<QuizOutcome> {
        loop {
            if self.limit.is_some_and(|limit| session.asked() >= limit) {
                break;
            }
            let Some(question) = session.next_question() else {
                writeln!(self.out, "No more sentences.")?;
                break;
            };

            let tag = if question.is_review { " review" } else { "" };
            writeln!(self.out)?;
            writeln!(self.out, "[{}{tag}] {}", question.difficulty, question.masked.text)?;
            write!(self.out, "> ")?;
            self.out.flush()?;

            let line = self.source.next_answer()?;
            let guess = match parse_answer(line.as_deref()) {
                Answer::Quit => break,
                Answer::Guess(guess) => guess,
            };

            let feedback = session.submit(&question, &guess)?;
            write!(self.out, "{}", render_feedback(&feedback))?;
            writeln!(
                self.out,
                "score {}/{} ({:.0}%)",
                session.correct(),
                session.asked(),
                session.accuracy() * 100.0
            )?;

            if let Some(db) = &self.history {
                if let Err(e) = db.record(&QuestionRecord::new(&question, &feedback)) {
                    log::warn!("could not record question: {e}");
                }
            }
        }

        let outcome = QuizOutcome {
            asked: session.asked(),
            correct: session.correct(),
            final_difficulty: session.profile().get_current_difficulty(),
        };
        log::info!(
            "session over: {}/{} correct, ending at {}",
            outcome.correct,
            outcome.asked,
            outcome.final_difficulty
        );
        writeln!(
            self.out,
            "\nFinished: {}/{} correct, difficulty {}.",
            outcome.correct, outcome.asked, outcome.final_difficulty
        )?;
        Ok(outcome)
    }
}

/// Human-readable report for one answer
pub fn render_feedback(feedback: &Feedback) -> String {
    let mut report = String::new();
    if feedback.is_correct {
        report.push_str(&format!("Correct! '{}'\n", feedback.original.word));
    } else {
        report.push_str(&format!(
            "'{}' is {}; the answer was '{}'\n",
            feedback.guess.word, feedback.band, feedback.original.word
        ));
        if !feedback.guess_known {
            report.push_str("  (that word never appears in the corpus)\n");
        }
        report.push_str(&format!(
            "  your guess ranks #{} (fitness {:.3} vs {:.3})\n",
            feedback.guess_rank,
            feedback.guess.fitness.value(),
            feedback.original.fitness.value()
        ));
    }

    if !feedback.alternatives.is_empty() {
        let alternatives = feedback
            .alternatives
            .iter()
            .map(|c| format!("{} ({:.3})", c.word, c.fitness.value()))
            .collect::<Vec<_>>()
            .join(", ");
        report.push_str(&format!("  other fits: {alternatives}\n"));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::WordSegmenter;
    use std::io::Cursor;

    const TEXT: &str = "The cat sat on the mat. The dog sat on the rug. A bird sat on the fence.";

    fn session(scorer: Convention) -> DynSession {
        let corpus = Corpus::build(TEXT, 3, WordSegmenter).unwrap();
        let scorer = scorer_for(scorer, &corpus);
        QuizSession::new(
            corpus,
            scorer,
            UserProfile::new(),
            StdRng::seed_from_u64(4),
            3,
        )
    }

    #[test]
    fn parse_answer_quits() {
        assert_eq!(parse_answer(None), Answer::Quit);
        assert_eq!(parse_answer(Some("")), Answer::Quit);
        assert_eq!(parse_answer(Some("   ")), Answer::Quit);
        assert_eq!(parse_answer(Some(":q")), Answer::Quit);
        assert_eq!(parse_answer(Some(" dog ")), Answer::Guess("dog".into()));
    }

    #[test]
    fn line_source_strips_line_endings() {
        let mut source = LineSource::new(Cursor::new("cat\r\ndog\n\nlast"));
        assert_eq!(source.next_answer().unwrap().as_deref(), Some("cat"));
        assert_eq!(source.next_answer().unwrap().as_deref(), Some("dog"));
        assert_eq!(source.next_answer().unwrap().as_deref(), Some(""));
        assert_eq!(source.next_answer().unwrap().as_deref(), Some("last"));
        assert_eq!(source.next_answer().unwrap(), None);
    }

    #[test]
    fn settings_roundtrip_through_config() {
        let cfg = Config {
            seed: Some(9),
            ..Config::default()
        };
        let settings = RuntimeSettings::from(&cfg);
        assert_eq!(settings.questions, None);
        assert_eq!(Config::from(&settings), cfg);
    }

    #[test]
    fn runner_stops_on_quit() {
        let mut session = session(Convention::Ratio);
        let mut runner = Runner::new(ScriptedSource::new(["zzz", ":q"]), Vec::new());
        let outcome = runner.run(&mut session).unwrap();

        assert_eq!(outcome.asked, 1);
        assert_eq!(outcome.correct, 0);
        let out = String::from_utf8(runner.into_output()).unwrap();
        assert!(out.contains("[MASK]"));
        assert!(out.contains("'zzz' is poor"));
        assert!(out.contains("never appears"));
        assert!(out.contains("Finished: 0/1 correct"));
    }

    #[test]
    fn runner_respects_question_limit() {
        let mut session = session(Convention::Normalized);
        let mut runner =
            Runner::new(ScriptedSource::new(["a", "b", "c", "d"]), Vec::new()).with_limit(Some(2));
        let outcome = runner.run(&mut session).unwrap();
        assert_eq!(outcome.asked, 2);
    }

    #[test]
    fn runner_reports_exhausted_corpus() {
        let mut session = session(Convention::Ratio);
        let answers: Vec<String> = (0..10).map(|i| format!("guess{i}")).collect();
        let mut runner = Runner::new(ScriptedSource::new(answers), Vec::new());
        let outcome = runner.run(&mut session).unwrap();

        // review countdowns start at 5, so no miss comes back within three questions
        assert_eq!(outcome.asked, 3);
        let out = String::from_utf8(runner.into_output()).unwrap();
        assert!(out.contains("No more sentences."));
    }

    #[test]
    fn runner_records_history() {
        let mut session = session(Convention::Ratio);
        let db = HistoryDb::in_memory().unwrap();
        let mut runner = Runner::new(ScriptedSource::new(["zzz", "yyy"]), Vec::new())
            .with_history(db);
        runner.run(&mut session).unwrap();

        let db = runner.history.take().unwrap();
        assert_eq!(db.count().unwrap(), 2);
    }

    #[test]
    fn render_correct_feedback() {
        let mut session = session(Convention::Ratio);
        let question = session.next_question().unwrap();
        let answer = question.masked.original.clone();
        let feedback = session.submit(&question, &answer).unwrap();
        let report = render_feedback(&feedback);
        assert!(report.starts_with("Correct!"));
        assert!(!report.contains("ranks"));
    }
}
