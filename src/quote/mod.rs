use crate::api::QuoteClient;
use crate::config::Config;
use crate::error::Result;
use chrono::Local;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Themes rotated across fetch attempts for variety.
const THEMES: [&str; 8] = [
    "classic horror",
    "modern horror",
    "psychological horror",
    "slasher films",
    "supernatural horror",
    "zombie films",
    "vampire movies",
    "ghost stories",
];

/// A raw quote line split into its text and movie title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuote {
    pub text: String,
    pub title: String,
}

/// Equality key for dedup: lower-cased, quote marks stripped, trimmed.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase()
        .replace('"', "")
        .replace('\'', "")
        .trim()
        .to_string()
}

fn enumeration_re() -> &'static Regex {
    static ENUMERATION: OnceLock<Regex> = OnceLock::new();
    ENUMERATION.get_or_init(|| Regex::new(r"^\d+[.)]\s*").expect("valid enumeration pattern"))
}

/// Split a raw line on `" - "` into quote text and title. Quotes without
/// a title part get `"Unknown"`; a leading enumeration marker such as
/// `1. ` or `2) ` is stripped from the text.
pub fn parse(raw: &str) -> ParsedQuote {
    let mut parts = raw.split(" - ");
    let text = parts.next().unwrap_or("").trim();
    let title = parts.next().map(str::trim).unwrap_or("Unknown");
    let text = enumeration_re().replace(text, "").into_owned();

    ParsedQuote {
        text,
        title: title.to_string(),
    }
}

/// The persisted set of every quote ever emitted, keyed by normalized
/// form. The backing file is append-only.
pub struct QuoteHistory {
    path: PathBuf,
    seen: HashSet<String>,
}

impl QuoteHistory {
    /// Load the history file; a missing file is an empty history.
    pub fn load(path: &Path) -> Result<Self> {
        let mut seen = HashSet::new();
        if path.exists() {
            for line in fs::read_to_string(path)?.lines() {
                let line = line.trim();
                if !line.is_empty() {
                    seen.insert(normalize(line));
                }
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            seen,
        })
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.seen.contains(&normalize(raw))
    }

    /// Record a quote in the in-memory set. Returns false if its
    /// normalized form was already present.
    pub fn insert(&mut self, raw: &str) -> bool {
        self.seen.insert(normalize(raw))
    }

    /// Append raw quote lines to the history file.
    pub fn append(&self, quotes: &[String]) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        for quote in quotes {
            writeln!(file, "{}", quote)?;
        }
        Ok(())
    }
}

/// Fetches quotes from the generation API, deduplicating against the
/// history and retrying to make up shortfalls.
pub struct QuoteSource<'a> {
    client: &'a QuoteClient,
    cfg: &'a Config,
}

impl<'a> QuoteSource<'a> {
    pub fn new(client: &'a QuoteClient, cfg: &'a Config) -> Self {
        Self { client, cfg }
    }

    /// Fetch up to `count` unique quotes. A shortfall after all attempts
    /// is a warning, never an error; per-attempt API failures are logged
    /// and the next attempt proceeds.
    pub fn fetch(&self, count: usize, history: &mut QuoteHistory) -> Result<Vec<String>> {
        info!("Requesting {} horror movie quotes...", count);
        info!("Found {} previously used quotes", history.len());

        let mut rng = rand::thread_rng();
        let mut accepted: Vec<String> = Vec::new();

        for attempt in 0..self.cfg.fetch_attempts {
            if accepted.len() >= count {
                break;
            }
            info!("Attempt {} to get unique quotes...", attempt + 1);

            let theme = THEMES.choose(&mut rng).unwrap_or(&THEMES[0]);
            let seed: u32 = rng.gen_range(1..=100_000);
            let timestamp = Local::now().format("%Y%m%d%H%M%S%f").to_string();

            match self
                .client
                .request_quotes(count - accepted.len(), theme, seed, &timestamp)
            {
                Ok(candidates) => accept_unique(candidates, history, &mut accepted, count),
                Err(e) => {
                    warn!("Error in attempt {}: {}", attempt + 1, e);
                    continue;
                }
            }
        }

        if accepted.len() < count {
            warn!(
                "Only got {} unique quotes out of {} requested",
                accepted.len(),
                count
            );
        }

        for (i, quote) in accepted.iter().enumerate() {
            fs::write(
                self.cfg.quotes_dir.join(format!("quote_{}.txt", i + 1)),
                quote,
            )?;
        }
        if !accepted.is_empty() {
            history.append(&accepted)?;
        }

        info!("Generated {} unique horror movie quotes", accepted.len());
        Ok(accepted)
    }
}

/// Move unique candidates into `accepted` (and the history set) until
/// `want` is reached; normalized duplicates are discarded.
fn accept_unique(
    candidates: Vec<String>,
    history: &mut QuoteHistory,
    accepted: &mut Vec<String>,
    want: usize,
) {
    for quote in candidates {
        if accepted.len() >= want {
            break;
        }
        if history.insert(&quote) {
            info!("Added unique quote: {}", quote);
            accepted.push(quote);
        } else {
            info!("Skipped duplicate: {}", quote);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn normalize_lowercases_and_strips_quote_marks() {
        assert_eq!(
            normalize("\"I see dead people.\" - The Sixth Sense (1999)"),
            "i see dead people. - the sixth sense (1999)"
        );
        assert_eq!(normalize("  'Heeere's Johnny!'  "), "heeeres johnny!");
    }

    #[test]
    fn parse_splits_text_and_title() {
        let parsed = parse("\"They're here.\" - Poltergeist (1982)");
        assert_eq!(parsed.text, "\"They're here.\"");
        assert_eq!(parsed.title, "Poltergeist (1982)");
    }

    #[test]
    fn parse_defaults_missing_title_to_unknown() {
        let parsed = parse("\"Whatever you do, don't fall asleep.\"");
        assert_eq!(parsed.title, "Unknown");
    }

    #[test]
    fn parse_strips_leading_enumeration() {
        assert_eq!(parse("1. \"Do you like scary movies?\" - Scream (1996)").text, "\"Do you like scary movies?\"");
        assert_eq!(parse("12) \"Be afraid.\" - The Fly (1986)").text, "\"Be afraid.\"");
        assert_eq!(parse("1989 was a good year - Title").text, "1989 was a good year");
    }

    #[test]
    fn parse_takes_second_segment_as_title() {
        let parsed = parse("\"A\" - B (2000) - leftover");
        assert_eq!(parsed.title, "B (2000)");
    }

    #[test]
    fn history_deduplicates_normalized_variants() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("history.txt");
        fs::write(&path, "\"I see dead people\" - The Sixth Sense (1999)\n").unwrap();

        let mut history = QuoteHistory::load(&path).unwrap();
        assert_eq!(history.len(), 1);
        assert!(history.contains("'I SEE DEAD PEOPLE' - The Sixth Sense (1999)"));
        assert!(!history.insert("\"i see dead people\" - the sixth sense (1999)"));
        assert!(history.insert("\"They're coming to get you, Barbara!\" - Night of the Living Dead (1968)"));
    }

    #[test]
    fn history_survives_append_and_reload() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("history.txt");

        let history = QuoteHistory::load(&path).unwrap();
        assert!(history.is_empty());
        history
            .append(&["\"It's alive!\" - Frankenstein (1931)".to_string()])
            .unwrap();

        let reloaded = QuoteHistory::load(&path).unwrap();
        assert!(reloaded.contains("\"It's alive!\" - Frankenstein (1931)"));
    }

    #[test]
    fn accept_unique_filters_duplicates_and_caps_at_want() {
        let tmp = tempdir().unwrap();
        let mut history = QuoteHistory::load(&tmp.path().join("history.txt")).unwrap();
        history.insert("\"old quote\" - Old Movie (1950)");

        let candidates = vec![
            "\"old quote\" - Old Movie (1950)".to_string(),
            "\"fresh one\" - New Movie (2001)".to_string(),
            "\"fresh one\" - New Movie (2001)".to_string(),
            "\"second fresh\" - Other Movie (2002)".to_string(),
            "\"third fresh\" - Third Movie (2003)".to_string(),
        ];

        let mut accepted = Vec::new();
        accept_unique(candidates, &mut history, &mut accepted, 2);

        assert_eq!(
            accepted,
            vec![
                "\"fresh one\" - New Movie (2001)".to_string(),
                "\"second fresh\" - Other Movie (2002)".to_string(),
            ]
        );
    }
}
