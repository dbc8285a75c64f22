use clap::Parser;
use cloze::config::{Config, ConfigStore, FileConfigStore};
use cloze::fitness::Convention;
use cloze::language::Difficulty;
use cloze::runtime::{build_session, LineSource, Runner, RuntimeSettings};
use cloze::stats::HistoryDb;
use std::error::Error;
use std::io::{self, BufWriter};
use std::path::PathBuf;

/// fill-in-the-blank vocabulary quiz driven by an n-gram language model
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A cloze quiz: one word of a corpus sentence is hidden, you type your guess, and an n-gram model judges how well it fits. Difficulty follows your recent scores and missed words come back for review."
)]
pub struct Cli {
    /// text file to train on and draw sentences from (defaults to the bundled sample)
    #[clap(short = 'c', long)]
    corpus: Option<PathBuf>,

    /// n-gram order
    #[clap(short = 'n', long)]
    order: Option<usize>,

    /// number of alternative words shown after each answer
    #[clap(short = 'k', long)]
    top_k: Option<usize>,

    /// starting difficulty
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// fitness convention used to judge guesses
    #[clap(long, value_enum)]
    scorer: Option<Convention>,

    /// seed for reproducible question order
    #[clap(long)]
    seed: Option<u64>,

    /// record answers in the history database
    #[clap(long)]
    history: bool,

    /// print the recorded history summary and exit
    #[clap(long)]
    stats: bool,

    /// stop after this many questions
    #[clap(short = 'q', long)]
    questions: Option<usize>,

    /// persist the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Overlay the flags that were given on top of the stored config
    fn to_runtime_settings(&self, cfg: &Config) -> RuntimeSettings {
        let mut settings = RuntimeSettings::from(cfg);
        if let Some(path) = &self.corpus {
            settings.corpus_path = Some(path.clone());
        }
        if let Some(order) = self.order {
            settings.order = order;
        }
        if let Some(top_k) = self.top_k {
            settings.top_k = top_k;
        }
        if let Some(difficulty) = self.difficulty {
            settings.difficulty = difficulty;
        }
        if let Some(scorer) = self.scorer {
            settings.scorer = scorer;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
        settings.history |= self.history;
        settings.questions = self.questions;
        settings
    }
}

fn print_stats(db: &HistoryDb) -> Result<(), Box<dyn Error>> {
    let summary = db.summary()?;
    if summary.is_empty() {
        println!("No history recorded yet.");
        return Ok(());
    }

    println!("{:<8} {:>6} {:>8} {:>9}", "tier", "asked", "correct", "accuracy");
    for row in &summary {
        println!(
            "{:<8} {:>6} {:>8} {:>8.0}%",
            row.difficulty.to_string(),
            row.asked,
            row.correct,
            row.accuracy() * 100.0
        );
    }

    let missed = db.most_missed(10)?;
    if !missed.is_empty() {
        println!("\nMost missed:");
        for (word, misses) in missed {
            println!("  {word} ({misses})");
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.stats {
        return print_stats(&HistoryDb::new()?);
    }

    let store = FileConfigStore::new();
    let settings = cli.to_runtime_settings(&store.load());
    if cli.save_config {
        store.save(&Config::from(&settings))?;
        log::info!("saved settings to {}", store.path().display());
    }

    let mut session = build_session(&settings)?;

    let stdin = io::stdin();
    let mut runner = Runner::new(LineSource::new(stdin.lock()), BufWriter::new(io::stdout()))
        .with_limit(settings.questions);
    if settings.history {
        match HistoryDb::new() {
            Ok(db) => runner = runner.with_history(db),
            Err(e) => log::warn!("history disabled: {e}"),
        }
    }

    runner.run(&mut session)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["cloze"]);

        assert_eq!(cli.corpus, None);
        assert_eq!(cli.order, None);
        assert_eq!(cli.difficulty, None);
        assert_eq!(cli.questions, None);
        assert!(!cli.history);
        assert!(!cli.stats);
    }

    #[test]
    fn test_cli_defaults_follow_config() {
        let cli = Cli::parse_from(["cloze"]);
        let settings = cli.to_runtime_settings(&Config::default());

        assert_eq!(settings.order, 3);
        assert_eq!(settings.top_k, 5);
        assert_eq!(settings.difficulty, Difficulty::Easy);
        assert_eq!(settings.scorer, Convention::Ratio);
        assert_eq!(settings.seed, None);
        assert!(!settings.history);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cfg = Config {
            order: 4,
            top_k: 2,
            history: true,
            seed: Some(1),
            ..Config::default()
        };
        let cli = Cli::parse_from([
            "cloze",
            "-n",
            "2",
            "--difficulty",
            "hard",
            "--scorer",
            "normalized",
            "--seed",
            "7",
            "-q",
            "3",
        ]);
        let settings = cli.to_runtime_settings(&cfg);

        assert_eq!(settings.order, 2);
        assert_eq!(settings.top_k, 2);
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.scorer, Convention::Normalized);
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.questions, Some(3));
        assert!(settings.history);
    }

    #[test]
    fn test_cli_corpus_path() {
        let cli = Cli::parse_from(["cloze", "--corpus", "/tmp/book.txt"]);
        let settings = cli.to_runtime_settings(&Config::default());
        assert_eq!(settings.corpus_path, Some(PathBuf::from("/tmp/book.txt")));
    }

    #[test]
    fn test_cli_rejects_unknown_difficulty() {
        assert!(Cli::try_parse_from(["cloze", "--difficulty", "extreme"]).is_err());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["cloze", "--history", "--stats", "--save-config", "-k", "9"]);
        assert!(cli.history);
        assert!(cli.stats);
        assert!(cli.save_config);
        assert_eq!(cli.top_k, Some(9));
    }
}
