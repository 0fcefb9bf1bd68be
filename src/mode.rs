//! Canned personas the chat client can switch between
use std::fmt;

const NORMAL_PROMPT: &str = "You are a professional AI assistant. \
Help users with polite, clear answers. \
NEVER roast or insult the user.";

const ROAST_PROMPT: &str = "You are an AI comedian who ONLY gives funny and sarcastic roasts. \
You MUST NEVER answer questions or provide helpful information. \
Every response must be an insult, but lighthearted and playful.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    Roast,
}

impl Mode {
    pub fn system_prompt(self) -> &'static str {
        match self {
            Mode::Normal => NORMAL_PROMPT,
            Mode::Roast => ROAST_PROMPT,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Mode::Normal => Mode::Roast,
            Mode::Roast => Mode::Normal,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Normal => f.write_str("normal"),
            Mode::Roast => f.write_str("roast"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_is_identity() {
        assert_eq!(Mode::Normal.toggled(), Mode::Roast);
        assert_eq!(Mode::Roast.toggled().toggled(), Mode::Roast);
    }

    #[test]
    fn prompts_are_distinct_and_non_empty() {
        assert!(!Mode::Normal.system_prompt().is_empty());
        assert!(!Mode::Roast.system_prompt().is_empty());
        assert_ne!(Mode::Normal.system_prompt(), Mode::Roast.system_prompt());
        assert!(Mode::Roast.system_prompt().contains("roasts"));
    }
}
