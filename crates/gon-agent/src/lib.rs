//! Gon persona layer.
//!
//! - [`persona::Persona`] — who Gon is and the system prompt
//! - [`intent`] — greeting / farewell classification
//! - [`history::ConversationHistory`] — bounded per-session turn buffer
//! - [`language`] — Portuguese vs English detection for routing hints
//! - [`overlay::PersonaOverlay`] — canned fast path, otherwise prompt + history → router

pub mod history;
pub mod intent;
pub mod language;
pub mod overlay;
pub mod persona;

pub use history::{ConversationHistory, HistoryEntry, HISTORY_CAPACITY};
pub use intent::{classify_utterance, Utterance};
pub use language::{detect_language, Language, LanguageDetector};
pub use overlay::PersonaOverlay;
pub use persona::Persona;
