//! Sentence segmentation for review text.
//!
//! Splits free-form review text into sentences at `.`, `!`, and `?` boundaries
//! while keeping domain abbreviations (`ул.`, `т.д.`, `см.`) and numeric dates
//! (`01.02.2024`) inside the sentence they belong to. Segmentation is pure and
//! never fails: empty input yields an empty list.

use regex::Regex;
use std::sync::LazyLock;

/// Closed list of abbreviations that never end a sentence.
///
/// An entry matches only as a whole token, case-insensitively: the character
/// before it must not be a letter, a digit or `-`, so "См." matches but the
/// "д." at the end of "вперед." does not.
pub const ABBREVIATIONS: &[&str] = &[
    "ул.", "г.", "д.", "т.д.", "т.п.", "т.е.", "и т.д.", "и т.п.", "см.", "мин.", "руб.", "коп.",
    "рис.", "стр.", "обл.", "р-н", "просп.", "пер.", "бул.", "реф.", "тех.", "эл.", "смс", "др.",
    "т.к.",
];

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?'];

static SPACE_BEFORE_PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[expect(clippy::expect_used, reason = "pattern is constant and valid")]
    Regex::new(r"\s+([,.!?;:])").expect("valid regex")
});
static REPEATED_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[expect(clippy::expect_used, reason = "pattern is constant and valid")]
    Regex::new(r"\s{2,}").expect("valid regex")
});
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[expect(clippy::expect_used, reason = "pattern is constant and valid")]
    Regex::new(r"\b\d{1,2}\.\d{1,2}\.\d{2,4}\b").expect("valid regex")
});

/// Splits review text into an ordered list of trimmed, non-empty sentences.
///
/// # Examples
///
/// ```
/// use review_topics::SentenceSegmenter;
///
/// let segmenter = SentenceSegmenter::new();
/// let sentences = segmenter.split("Встреча 01.02.2024. Продолжение завтра.");
/// assert_eq!(sentences, vec!["Встреча 01.02.2024.", "Продолжение завтра."]);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct SentenceSegmenter;

impl SentenceSegmenter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Split `text` into sentences.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        let cleaned = normalise_whitespace(text);
        if cleaned.is_empty() {
            return Vec::new();
        }
        let protected = DateGuard::protect(&cleaned);

        let mut sentences: Vec<String> = Vec::new();
        for fragment in split_after_terminators(&protected.text) {
            match sentences.last_mut() {
                Some(previous) if continues_sentence(previous, fragment) => {
                    previous.push(' ');
                    previous.push_str(fragment);
                }
                _ => sentences.push(fragment.to_owned()),
            }
        }

        sentences
            .into_iter()
            .map(|sentence| protected.restore(&sentence).trim().to_owned())
            .filter(|sentence| !sentence.is_empty())
            .collect()
    }
}

/// Remove whitespace before punctuation and collapse runs of whitespace.
///
/// # Examples
///
/// ```
/// use review_topics::segmenter::normalise_whitespace;
///
/// assert_eq!(normalise_whitespace("  Плохо ,  очень  плохо !"), "Плохо, очень плохо!");
/// ```
#[must_use]
pub fn normalise_whitespace(text: &str) -> String {
    let tightened = SPACE_BEFORE_PUNCT_RE.replace_all(text, "$1");
    REPEATED_SPACE_RE
        .replace_all(&tightened, " ")
        .trim()
        .to_owned()
}

/// Dates replaced by placeholders, remembered in order of appearance.
struct DateGuard {
    text: String,
    dates: Vec<String>,
}

impl DateGuard {
    fn protect(text: &str) -> Self {
        let mut dates = Vec::new();
        let protected = DATE_RE.replace_all(text, |caps: &regex::Captures<'_>| {
            let placeholder = placeholder(dates.len());
            dates.push(caps[0].to_owned());
            placeholder
        });
        Self {
            text: protected.into_owned(),
            dates,
        }
    }

    fn restore(&self, sentence: &str) -> String {
        self.dates
            .iter()
            .enumerate()
            .fold(sentence.to_owned(), |acc, (index, date)| {
                acc.replacen(&placeholder(index), date, 1)
            })
    }
}

fn placeholder(index: usize) -> String {
    format!("§DATE{index}§")
}

/// Split on whitespace runs that immediately follow a sentence terminator.
fn split_after_terminators(text: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut start = 0;
    let mut previous: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        if ch.is_whitespace() && previous.is_some_and(|p| SENTENCE_TERMINATORS.contains(&p)) {
            let mut end = index + ch.len_utf8();
            while let Some(&(next_index, next)) = chars.peek() {
                if !next.is_whitespace() {
                    break;
                }
                end = next_index + next.len_utf8();
                chars.next();
            }
            fragments.push(&text[start..index]);
            start = end;
            previous = None;
            continue;
        }
        previous = Some(ch);
    }
    fragments.push(&text[start..]);
    fragments.retain(|fragment| !fragment.is_empty());
    fragments
}

fn continues_sentence(previous: &str, fragment: &str) -> bool {
    let starts_lowercase = fragment.chars().next().is_some_and(char::is_lowercase);
    ends_with_abbreviation(previous)
        || (previous.ends_with('.') && starts_lowercase)
        || (previous.ends_with(')') && starts_lowercase)
}

/// Whether `text` ends with a whole-token abbreviation, ignoring case.
fn ends_with_abbreviation(text: &str) -> bool {
    let lower = text.to_lowercase();
    ABBREVIATIONS.iter().any(|abbreviation| {
        lower.strip_suffix(abbreviation).is_some_and(|head| {
            head.chars()
                .next_back()
                .is_none_or(|c| !c.is_alphanumeric() && c != '-')
        })
    })
}
