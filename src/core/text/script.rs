//! Script Classification and Kana Utilities
//!
//! Character-level helpers for Japanese text:
//! - Native-script detection (hiragana, katakana, CJK ideographs)
//! - Hiragana ⇄ katakana conversion
//! - Hepburn romanization of kana

use unicode_normalization::UnicodeNormalization;

// ============================================================================
// Classification
// ============================================================================

/// Script class of a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptClass {
    Hiragana,
    Katakana,
    Kanji,
    /// Anything else (Latin, digits, punctuation, whitespace)
    Other,
}

impl ScriptClass {
    pub fn of(c: char) -> Self {
        match c {
            '\u{3041}'..='\u{309F}' => ScriptClass::Hiragana,
            // Prolonged sound mark belongs with katakana runs
            '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' | '\u{FF66}'..='\u{FF9F}' => {
                ScriptClass::Katakana
            }
            '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}' => {
                ScriptClass::Kanji
            }
            // 々 and 〆 behave like ideographs
            '\u{3005}' | '\u{3006}' => ScriptClass::Kanji,
            _ => ScriptClass::Other,
        }
    }

    pub fn is_native(self) -> bool {
        !matches!(self, ScriptClass::Other)
    }
}

/// Whether `c` is a native-script character (kana or kanji).
pub fn is_native_char(c: char) -> bool {
    ScriptClass::of(c).is_native()
}

/// Whether `text` contains at least one native-script character.
pub fn contains_native(text: &str) -> bool {
    text.chars().any(is_native_char)
}

/// Whether every native character of `text` is kana (no kanji).
pub fn is_kana_only(text: &str) -> bool {
    text.chars()
        .all(|c| !matches!(ScriptClass::of(c), ScriptClass::Kanji))
}

// ============================================================================
// Kana Conversion
// ============================================================================

const KATAKANA_OFFSET: u32 = 0x60;

/// NFKC-normalize `text` (full-width ASCII and half-width kana folded).
pub fn normalize(text: &str) -> String {
    text.nfkc().collect()
}

/// Convert katakana to hiragana, leaving everything else unchanged.
///
/// Half-width katakana is folded to full-width first (NFKC).
pub fn to_hiragana(text: &str) -> String {
    text.nfkc()
        .map(|c| match c {
            '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - KATAKANA_OFFSET).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Convert hiragana to katakana, leaving everything else unchanged.
pub fn to_katakana(text: &str) -> String {
    text.nfkc()
        .map(|c| match c {
            '\u{3041}'..='\u{3096}' => char::from_u32(c as u32 + KATAKANA_OFFSET).unwrap_or(c),
            _ => c,
        })
        .collect()
}

// ============================================================================
// Romanization
// ============================================================================

/// Two-character combinations (yōon) checked before single kana.
const DIGRAPHS: &[(&str, &str)] = &[
    ("きゃ", "kya"), ("きゅ", "kyu"), ("きょ", "kyo"),
    ("しゃ", "sha"), ("しゅ", "shu"), ("しょ", "sho"), ("しぇ", "she"),
    ("ちゃ", "cha"), ("ちゅ", "chu"), ("ちょ", "cho"), ("ちぇ", "che"),
    ("にゃ", "nya"), ("にゅ", "nyu"), ("にょ", "nyo"),
    ("ひゃ", "hya"), ("ひゅ", "hyu"), ("ひょ", "hyo"),
    ("みゃ", "mya"), ("みゅ", "myu"), ("みょ", "myo"),
    ("りゃ", "rya"), ("りゅ", "ryu"), ("りょ", "ryo"),
    ("ぎゃ", "gya"), ("ぎゅ", "gyu"), ("ぎょ", "gyo"),
    ("じゃ", "ja"), ("じゅ", "ju"), ("じょ", "jo"), ("じぇ", "je"),
    ("ぢゃ", "ja"), ("ぢゅ", "ju"), ("ぢょ", "jo"),
    ("びゃ", "bya"), ("びゅ", "byu"), ("びょ", "byo"),
    ("ぴゃ", "pya"), ("ぴゅ", "pyu"), ("ぴょ", "pyo"),
    ("ふぁ", "fa"), ("ふぃ", "fi"), ("ふぇ", "fe"), ("ふぉ", "fo"),
    ("てぃ", "ti"), ("でぃ", "di"), ("うぃ", "wi"), ("うぇ", "we"),
];

fn monograph(c: char) -> Option<&'static str> {
    let romaji = match c {
        'あ' => "a", 'い' => "i", 'う' => "u", 'え' => "e", 'お' => "o",
        'か' => "ka", 'き' => "ki", 'く' => "ku", 'け' => "ke", 'こ' => "ko",
        'さ' => "sa", 'し' => "shi", 'す' => "su", 'せ' => "se", 'そ' => "so",
        'た' => "ta", 'ち' => "chi", 'つ' => "tsu", 'て' => "te", 'と' => "to",
        'な' => "na", 'に' => "ni", 'ぬ' => "nu", 'ね' => "ne", 'の' => "no",
        'は' => "ha", 'ひ' => "hi", 'ふ' => "fu", 'へ' => "he", 'ほ' => "ho",
        'ま' => "ma", 'み' => "mi", 'む' => "mu", 'め' => "me", 'も' => "mo",
        'や' => "ya", 'ゆ' => "yu", 'よ' => "yo",
        'ら' => "ra", 'り' => "ri", 'る' => "ru", 'れ' => "re", 'ろ' => "ro",
        'わ' => "wa", 'ゐ' => "i", 'ゑ' => "e", 'を' => "o", 'ん' => "n",
        'が' => "ga", 'ぎ' => "gi", 'ぐ' => "gu", 'げ' => "ge", 'ご' => "go",
        'ざ' => "za", 'じ' => "ji", 'ず' => "zu", 'ぜ' => "ze", 'ぞ' => "zo",
        'だ' => "da", 'ぢ' => "ji", 'づ' => "zu", 'で' => "de", 'ど' => "do",
        'ば' => "ba", 'び' => "bi", 'ぶ' => "bu", 'べ' => "be", 'ぼ' => "bo",
        'ぱ' => "pa", 'ぴ' => "pi", 'ぷ' => "pu", 'ぺ' => "pe", 'ぽ' => "po",
        'ゔ' => "vu",
        'ぁ' => "a", 'ぃ' => "i", 'ぅ' => "u", 'ぇ' => "e", 'ぉ' => "o",
        'ゃ' => "ya", 'ゅ' => "yu", 'ょ' => "yo", 'ゎ' => "wa",
        '。' => ".", '、' => ",", '「' => "\"", '」' => "\"", '？' => "?", '！' => "!",
        '　' => " ", '・' => " ",
        _ => return None,
    };
    Some(romaji)
}

/// Romanize kana text using modified Hepburn.
///
/// Returns `None` when the text contains kanji or any other native character without
/// a known romanization; callers needing kanji readings go through a
/// [`Segmenter`](super::segment::Segmenter) first.
pub fn romanize(text: &str) -> Option<String> {
    let hira: Vec<char> = to_hiragana(text).chars().collect();
    let mut out = String::with_capacity(hira.len() * 2);
    let mut geminate = false;
    let mut i = 0;

    while i < hira.len() {
        let c = hira[i];

        if c == 'っ' {
            geminate = true;
            i += 1;
            continue;
        }

        if c == 'ー' {
            if let Some(last) = out.chars().last().filter(|l| "aeiou".contains(*l)) {
                out.push(last);
            }
            i += 1;
            continue;
        }

        let (syllable, width) = if i + 1 < hira.len() {
            let pair: String = hira[i..i + 2].iter().collect();
            match DIGRAPHS.iter().find(|(k, _)| *k == pair) {
                Some((_, r)) => (Some(*r), 2),
                None => (monograph(c), 1),
            }
        } else {
            (monograph(c), 1)
        };

        match syllable {
            Some(r) => {
                if geminate {
                    // っち → tchi, otherwise double the first consonant
                    if r.starts_with("ch") {
                        out.push('t');
                    } else if let Some(first) = r.chars().next().filter(|f| !"aeiou".contains(*f)) {
                        out.push(first);
                    }
                    geminate = false;
                }
                // ん before a vowel or y is written n'
                if c != 'ん' && out.ends_with('n') && hira[..i].last() == Some(&'ん')
                    && r.starts_with(|f: char| "aeiouy".contains(f))
                {
                    out.push('\'');
                }
                out.push_str(r);
            }
            None if is_native_char(c) => return None,
            None => out.push(c),
        }
        i += width;
    }

    Some(out)
}
