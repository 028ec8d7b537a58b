//! Language detection — Brazilian Portuguese vs English, used as a routing
//! hint when `llm.routeByLanguage` is on.

use std::sync::OnceLock;

use regex::Regex;

/// Portuguese phrase patterns (case-insensitive, word-bounded).
const PORTUGUESE_PATTERNS: &[&str] = &[
    r"\b(olá|oi|bom dia|boa tarde|boa noite)\b",
    r"\b(obrigado|obrigada|valeu|valeu mesmo)\b",
    r"\b(como vai|tudo bem|tudo bom)\b",
    r"\b(por favor|favor|pfv)\b",
    r"\b(que legal|muito legal|massa|daora)\b",
    r"\b(cara|mano|brother|parceiro)\b",
    r"\b(beleza|tranquilo|suave)\b",
];

/// Common Portuguese words and short phrases.
const PORTUGUESE_WORDS: &[&str] = &[
    "não",
    "sim",
    "talvez",
    "claro",
    "certo",
    "entendi",
    "pode ser",
    "com certeza",
    "sem dúvida",
    "absolutamente",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Language {
    PtBr,
    En,
}

impl Language {
    pub fn tag(&self) -> &'static str {
        match self {
            Language::PtBr => "pt-BR",
            Language::En => "en",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

pub struct LanguageDetector {
    /// Compiled once at construction.
    patterns: Vec<Regex>,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector {
    pub fn new() -> Self {
        let mut all: Vec<String> = PORTUGUESE_PATTERNS.iter().map(|p| format!("(?i){p}")).collect();
        all.extend(
            PORTUGUESE_WORDS
                .iter()
                .map(|w| format!(r"(?i)\b{}\b", regex::escape(w))),
        );
        let patterns = all.iter().filter_map(|p| Regex::new(p).ok()).collect();
        Self { patterns }
    }

    /// Portuguese if any pattern matches, English otherwise.
    pub fn detect(&self, text: &str) -> Language {
        if self.patterns.iter().any(|re| re.is_match(text)) {
            Language::PtBr
        } else {
            Language::En
        }
    }
}

/// Detect with a process-wide detector.
pub fn detect_language(text: &str) -> Language {
    static DETECTOR: OnceLock<LanguageDetector> = OnceLock::new();
    DETECTOR.get_or_init(LanguageDetector::new).detect(text)
}
