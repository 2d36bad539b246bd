//! Text Module
//!
//! Multilingual text value plus the script-level utilities it depends on.

pub mod script;
pub mod segment;
pub mod trilingual;

pub use script::{contains_native, is_native_char, normalize, romanize, to_hiragana, to_katakana, ScriptClass};
pub use segment::{ScriptRunSegmenter, Segmenter};
pub use trilingual::TrilingualText;
