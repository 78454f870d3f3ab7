//! Host-supplied configuration. Grounded in `wezterm-term`'s
//! `config.rs` `TerminalConfiguration` trait: a host implements this
//! (or uses `Config`, a ready-made implementation) to control
//! scrollback sizing and a couple of small interaction policies the
//! core itself doesn't dictate.

use crate::history::HistoryConfig;

pub trait TerminalConfiguration: std::fmt::Debug {
    /// Which `HistoryStore` variant and capacity the primary screen
    /// should use. Mirrors Konsole's `HistoryType` selection
    /// (`original_source/lib/History.h`).
    fn history_config(&self) -> HistoryConfig {
        HistoryConfig::default()
    }

    fn is_double_click_word(&self, s: &str) -> bool {
        if s.len() > 1 {
            true
        } else if s.len() == 1 {
            !matches!(
                s.chars().next().unwrap(),
                ' ' | '\t' | '\n' | '{' | '[' | '}' | ']' | '(' | ')' | '"' | '\''
            )
        } else {
            false
        }
    }

    fn scroll_to_bottom_on_key_input(&self) -> bool {
        true
    }
}

/// A plain-data `TerminalConfiguration` for hosts that just want to
/// pick a history variant without implementing the trait themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    pub history: HistoryConfig,
}

impl TerminalConfiguration for Config {
    fn history_config(&self) -> HistoryConfig {
        self.history
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config_uses_default_history() {
        let config = Config::default();
        assert!(matches!(config.history_config(), HistoryConfig::Bounded { max_lines: 3500 }));
    }

    #[test]
    fn double_click_word_excludes_punctuation_and_whitespace() {
        let config = Config::default();
        assert!(!config.is_double_click_word(" "));
        assert!(!config.is_double_click_word("("));
        assert!(config.is_double_click_word("a"));
        assert!(config.is_double_click_word("ab"));
    }
}
