//! Utterance classification for the persona fast path.
//!
//! Phrases match on word boundaries, so "hi" matches "hi there" but not
//! "history". Greetings win over farewells.

/// Phrases that open a conversation.
const GREETINGS: &[&str] = &[
    "oi",
    "olá",
    "bom dia",
    "boa tarde",
    "boa noite",
    "hey",
    "hi",
    "hello",
    "good morning",
    "good afternoon",
    "good evening",
];

/// Phrases that close a conversation.
const FAREWELLS: &[&str] = &[
    "tchau",
    "até logo",
    "até mais",
    "até a próxima",
    "bye",
    "goodbye",
    "see you",
    "see you later",
    "take care",
];

/// A greeting found anywhere counts only in messages shorter than this
/// (in characters); longer messages must start with it.
const SHORT_MESSAGE_CHARS: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Utterance {
    Greeting,
    Farewell,
    Other,
}

pub fn classify_utterance(message: &str) -> Utterance {
    let text = message.trim().to_lowercase();
    if text.is_empty() {
        return Utterance::Other;
    }

    let short = text.chars().count() < SHORT_MESSAGE_CHARS;
    if GREETINGS
        .iter()
        .any(|g| starts_with_phrase(&text, g) || (short && contains_phrase(&text, g)))
    {
        return Utterance::Greeting;
    }

    if FAREWELLS.iter().any(|f| contains_phrase(&text, f)) {
        return Utterance::Farewell;
    }

    Utterance::Other
}

fn is_boundary(c: Option<char>) -> bool {
    c.map_or(true, |c| !c.is_alphanumeric())
}

fn starts_with_phrase(text: &str, phrase: &str) -> bool {
    text.strip_prefix(phrase)
        .is_some_and(|rest| is_boundary(rest.chars().next()))
}

fn contains_phrase(text: &str, phrase: &str) -> bool {
    text.match_indices(phrase).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + phrase.len()..].chars().next();
        is_boundary(before) && is_boundary(after)
    })
}
