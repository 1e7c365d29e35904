//! ZTE CLI prompt patterns.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// The terminal states of the ZTE command hierarchy, in match order.
///
/// The patterns are anchored at the end of the buffer; whichever matches
/// first terminates the read loop. The generic `[>#]` pattern subsumes
/// the mode-specific ones, but the full set is kept so the matched mode
/// is observable in logs and so an entry can be tightened independently
/// if a firmware revision changes one prompt.
const PROMPT_PATTERNS: [&str; 4] = [
    r"[>#]\s*$",          // Standard prompt
    r"\(config\)#\s*$",   // Config mode
    r"\(gpon-olt\)#\s*$", // GPON OLT mode
    r"\(gpon-onu\)#\s*$", // GPON ONU mode
];

static COMPILED: Lazy<Vec<Regex>> = Lazy::new(|| {
    PROMPT_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("builtin prompt pattern"))
        .collect()
});

/// Fixed ordered set of prompt patterns for the device family.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptSet;

impl PromptSet {
    /// Index of the first pattern matching the buffer tail, if any.
    pub fn first_match(&self, tail: &[u8]) -> Option<usize> {
        COMPILED.iter().position(|p| p.is_match(tail))
    }

    /// The compiled patterns, in match order.
    pub fn patterns(&self) -> &'static [Regex] {
        &COMPILED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_prompt() {
        let prompts = PromptSet;
        assert_eq!(prompts.first_match(b"ZXAN#"), Some(0));
        assert_eq!(prompts.first_match(b"ZXAN# "), Some(0));
        assert_eq!(prompts.first_match(b"ZXAN>"), Some(0));
        assert_eq!(prompts.first_match(b"some output\r\nZXAN#"), Some(0));
    }

    #[test]
    fn test_mode_prompts_match() {
        let prompts = PromptSet;
        // The generic pattern wins by order, which is all the read loop
        // needs; the mode patterns still match on their own.
        assert!(prompts.first_match(b"ZXAN(config)#").is_some());
        assert!(prompts.patterns()[1].is_match(b"ZXAN(config)#"));
        assert!(prompts.patterns()[2].is_match(b"ZXAN(gpon-olt)#"));
        assert!(prompts.patterns()[3].is_match(b"ZXAN(gpon-onu)#"));
    }

    #[test]
    fn test_incomplete_output_no_match() {
        let prompts = PromptSet;
        assert_eq!(prompts.first_match(b"OnuIndex        Sn"), None);
        assert_eq!(prompts.first_match(b"loading...\r\n"), None);
    }
}
