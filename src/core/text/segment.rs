//! Segmentation
//!
//! The segmenter is an injected leaf dependency: it splits native text into candidate
//! word runs and supplies kana readings. The built-in [`ScriptRunSegmenter`] needs no
//! dictionary; it splits on script boundaries and can only read text that is already
//! kana. A morphological analyzer can be plugged in behind the same trait.

use super::script::{is_kana_only, romanize, to_hiragana, ScriptClass};

/// Word segmentation and reading lookup.
pub trait Segmenter: Send + Sync {
    /// Split `text` into candidate word runs, in order of appearance.
    fn segment(&self, text: &str) -> Vec<String>;

    /// Hiragana reading for `text`, if one can be determined.
    fn reading(&self, text: &str) -> Option<String>;

    /// Romanized transliteration for `text`, derived from its reading.
    fn transliterate(&self, text: &str) -> Option<String> {
        self.reading(text)
            .and_then(|r| romanize(&r))
            .filter(|r| !r.trim().is_empty())
    }
}

/// Hiragana that usually start a particle rather than continue okurigana.
const PARTICLES: &[char] = &['を', 'は', 'が', 'に', 'で', 'と', 'も', 'の', 'へ', 'や', 'か', 'ね', 'よ'];

/// Maximum okurigana absorbed after a kanji run.
const MAX_OKURIGANA: usize = 4;

/// Dictionary-free segmenter based on script runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptRunSegmenter;

impl ScriptRunSegmenter {
    pub fn new() -> Self {
        Self
    }
}

impl Segmenter for ScriptRunSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut runs = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let class = ScriptClass::of(chars[i]);
            let start = i;

            match class {
                ScriptClass::Kanji => {
                    while i < chars.len() && ScriptClass::of(chars[i]) == ScriptClass::Kanji {
                        i += 1;
                    }
                    let mut okurigana = 0;
                    while i < chars.len()
                        && okurigana < MAX_OKURIGANA
                        && ScriptClass::of(chars[i]) == ScriptClass::Hiragana
                        && !(okurigana == 0 && PARTICLES.contains(&chars[i]))
                    {
                        i += 1;
                        okurigana += 1;
                    }
                    runs.push(chars[start..i].iter().collect());
                }
                ScriptClass::Katakana => {
                    while i < chars.len() && ScriptClass::of(chars[i]) == ScriptClass::Katakana {
                        i += 1;
                    }
                    runs.push(chars[start..i].iter().collect());
                }
                ScriptClass::Hiragana => {
                    while i < chars.len() && ScriptClass::of(chars[i]) == ScriptClass::Hiragana {
                        i += 1;
                    }
                    if i - start >= 2 {
                        runs.push(chars[start..i].iter().collect());
                    }
                }
                ScriptClass::Other => i += 1,
            }
        }

        runs
    }

    fn reading(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() || !is_kana_only(text) {
            return None;
        }
        Some(to_hiragana(text))
    }
}
