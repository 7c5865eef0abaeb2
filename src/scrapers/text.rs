//! Free-text normalization for review narrative fields.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static CONTRACTIONS: &[(&str, &str)] = &[
    ("ain't", "am not"),
    ("aren't", "are not"),
    ("can't", "cannot"),
    ("can't've", "cannot have"),
    ("'cause", "because"),
    ("could've", "could have"),
    ("couldn't", "could not"),
    ("couldn't've", "could not have"),
    ("didn't", "did not"),
    ("doesn't", "does not"),
    ("don't", "do not"),
    ("hadn't", "had not"),
    ("hadn't've", "had not have"),
    ("hasn't", "has not"),
    ("haven't", "have not"),
    ("he'd", "he would"),
    ("he'd've", "he would have"),
    ("he'll", "he will"),
    ("he'll've", "he will have"),
    ("he's", "he is"),
    ("how'd", "how did"),
    ("how'd'y", "how do you"),
    ("how'll", "how will"),
    ("how's", "how is"),
    ("i'd", "i would"),
    ("i'd've", "i would have"),
    ("i'll", "i will"),
    ("i'll've", "i will have"),
    ("i'm", "i am"),
    ("i've", "i have"),
    ("isn't", "is not"),
    ("it'd", "it had"),
    ("it'd've", "it would have"),
    ("it'll", "it will"),
    ("it'll've", "it will have"),
    ("it's", "it is"),
    ("let's", "let us"),
    ("ma'am", "madam"),
    ("mayn't", "may not"),
    ("might've", "might have"),
    ("mightn't", "might not"),
    ("mightn't've", "might not have"),
    ("must've", "must have"),
    ("mustn't", "must not"),
    ("mustn't've", "must not have"),
    ("needn't", "need not"),
    ("needn't've", "need not have"),
    ("o'clock", "of the clock"),
    ("oughtn't", "ought not"),
    ("oughtn't've", "ought not have"),
    ("shan't", "shall not"),
    ("sha'n't", "shall not"),
    ("shan't've", "shall not have"),
    ("she'd", "she would"),
    ("she'd've", "she would have"),
    ("she'll", "she will"),
    ("she'll've", "she will have"),
    ("she's", "she is"),
    ("should've", "should have"),
    ("shouldn't", "should not"),
    ("shouldn't've", "should not have"),
    ("so've", "so have"),
    ("so's", "so is"),
    ("that'd", "that would"),
    ("that'd've", "that would have"),
    ("that's", "that is"),
    ("there'd", "there had"),
    ("there'd've", "there would have"),
    ("there's", "there is"),
    ("they'd", "they would"),
    ("they'd've", "they would have"),
    ("they'll", "they will"),
    ("they'll've", "they will have"),
    ("they're", "they are"),
    ("they've", "they have"),
    ("to've", "to have"),
    ("wasn't", "was not"),
    ("we'd", "we had"),
    ("we'd've", "we would have"),
    ("we'll", "we will"),
    ("we'll've", "we will have"),
    ("we're", "we are"),
    ("we've", "we have"),
    ("weren't", "were not"),
    ("what'll", "what will"),
    ("what'll've", "what will have"),
    ("what're", "what are"),
    ("what's", "what is"),
    ("what've", "what have"),
    ("when's", "when is"),
    ("when've", "when have"),
    ("where'd", "where did"),
    ("where's", "where is"),
    ("where've", "where have"),
    ("who'll", "who will"),
    ("who'll've", "who will have"),
    ("who's", "who is"),
    ("who've", "who have"),
    ("why's", "why is"),
    ("why've", "why have"),
    ("will've", "will have"),
    ("won't", "will not"),
    ("won't've", "will not have"),
    ("would've", "would have"),
    ("wouldn't", "would not"),
    ("wouldn't've", "would not have"),
    ("y'all", "you all"),
    ("y'alls", "you alls"),
    ("y'all'd", "you all would"),
    ("y'all'd've", "you all would have"),
    ("y'all're", "you all are"),
    ("y'all've", "you all have"),
    ("you'd", "you had"),
    ("you'd've", "you would have"),
    ("you'll", "you will"),
    ("you'll've", "you will have"),
    ("you're", "you are"),
    ("you've", "you have"),
];

static CONTRACTION_MAP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| CONTRACTIONS.iter().copied().collect());

// Word characters joined by straight or typographic apostrophes.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\w'’]+").unwrap());
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

fn expansion(token: &str) -> Option<&'static str> {
    let lowered = token.to_lowercase().replace('’', "'");
    if let Some(expanded) = CONTRACTION_MAP.get(lowered.as_str()) {
        return Some(expanded);
    }
    // Quoted tokens such as 'don't' still carry the contraction inside.
    let trimmed = lowered.trim_matches('\'');
    CONTRACTION_MAP
        .get(trimmed)
        .or_else(|| CONTRACTION_MAP.get(format!("'{}", trimmed).as_str()))
        .copied()
}

/// Expand known contractions without touching anything else.
pub fn expand_contractions(text: &str) -> String {
    TOKEN
        .replace_all(text, |caps: &Captures| {
            let token = &caps[0];
            match expansion(token) {
                Some(expanded) => expanded.to_string(),
                None => token.to_string(),
            }
        })
        .into_owned()
}

/// Normalize review text: expand contractions, replace punctuation with
/// spaces, collapse whitespace, and lowercase.
pub fn clean_text(text: Option<&str>) -> Option<String> {
    let text = text?;
    let expanded = expand_contractions(text);
    let spaced = WHITESPACE_RUN.replace_all(&expanded, " ");
    let stripped = NON_WORD.replace_all(&spaced, " ");
    let collapsed = WHITESPACE_RUN.replace_all(&stripped, " ");
    Some(collapsed.trim().to_lowercase())
}
