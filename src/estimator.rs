/*!
 * Fallback duration estimation.
 *
 * When the synthesizer cannot report how long a chunk's audio plays, the
 * chunk's duration is estimated from its text alone. The estimate counts
 * phonetic units (kana are one mora each, kanji usually read as two, latin
 * letters as a fraction of one), divides by a speaking rate and adds a pause
 * for each sentence and clause boundary.
 *
 * The estimator is pure: the same text always yields the same estimate.
 */

use crate::app_config::EstimatorConfig;
use crate::chunker::{CLAUSE_MARKS, SENTENCE_TERMINATORS};

// @const: Smallest estimate ever returned, keeps estimates above zero milliseconds
const FLOOR_SECONDS: f64 = 0.001;

// Small kana merge into the preceding mora
const SMALL_KANA: &[char] = &[
    'ぁ', 'ぃ', 'ぅ', 'ぇ', 'ぉ', 'ゃ', 'ゅ', 'ょ', 'ゎ', 'ァ', 'ィ', 'ゥ', 'ェ', 'ォ', 'ャ', 'ュ', 'ョ',
    'ヮ',
];

/// Text-length based duration estimator
#[derive(Debug, Clone, PartialEq)]
pub struct DurationEstimator {
    units_per_second: f64,
    kanji_units: f64,
    latin_units: f64,
    sentence_pause_secs: f64,
    clause_pause_secs: f64,
    min_seconds: f64,
}

impl Default for DurationEstimator {
    fn default() -> Self {
        Self::from_config(&EstimatorConfig::default())
    }
}

impl DurationEstimator {
    pub fn from_config(config: &EstimatorConfig) -> Self {
        Self {
            units_per_second: config.units_per_second,
            kanji_units: config.kanji_units,
            latin_units: config.latin_units,
            sentence_pause_secs: config.sentence_pause_secs,
            clause_pause_secs: config.clause_pause_secs,
            min_seconds: config.min_seconds.max(FLOOR_SECONDS),
        }
    }

    /// Estimated spoken duration of `text`, in seconds. Always strictly positive.
    pub fn estimate(&self, text: &str) -> f64 {
        let units = self.phonetic_units(text);
        let (sentences, clauses) = count_pauses(text);

        let mut seconds = if self.units_per_second > 0.0 {
            units / self.units_per_second
        } else {
            0.0
        };
        seconds += sentences as f64 * self.sentence_pause_secs;
        seconds += clauses as f64 * self.clause_pause_secs;

        if seconds.is_finite() {
            seconds.max(self.min_seconds)
        } else {
            self.min_seconds
        }
    }

    /// Phonetic unit count of `text`
    pub fn phonetic_units(&self, text: &str) -> f64 {
        text.chars().map(|c| self.char_units(c)).sum()
    }

    fn char_units(&self, c: char) -> f64 {
        if SMALL_KANA.contains(&c) {
            0.0
        } else if is_kana(c) {
            1.0
        } else if is_kanji(c) {
            self.kanji_units
        } else if c.is_alphanumeric() {
            self.latin_units
        } else {
            0.0
        }
    }
}

fn is_kana(c: char) -> bool {
    // Hiragana, katakana and the prolonged sound mark
    matches!(c, '\u{3041}'..='\u{3096}' | '\u{30A1}'..='\u{30FA}' | 'ー')
}

fn is_kanji(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '々')
}

/// Count (sentence, clause) pauses. A run of terminators such as `！？` is one pause,
/// and a `.` inside a number is not a pause at all.
fn count_pauses(text: &str) -> (usize, usize) {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = 0;
    let mut clauses = 0;

    for (i, &c) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();
        if SENTENCE_TERMINATORS.contains(&c) {
            if next.is_some_and(|n| SENTENCE_TERMINATORS.contains(&n)) {
                continue;
            }
            if c == '.' && next.is_some_and(char::is_alphanumeric) {
                continue;
            }
            sentences += 1;
        } else if CLAUSE_MARKS.contains(&c) {
            if matches!(c, ',' | ':') && next.is_some_and(|n| n.is_ascii_digit()) {
                continue;
            }
            clauses += 1;
        }
    }

    (sentences, clauses)
}
