/*!
 * Narration chunking.
 *
 * Each script part is cut into chunks that are short enough to show as one
 * subtitle window and to send as one speech-synthesis call. Cuts prefer
 * sentence ends, then clause marks, then whitespace, and only fall back to a
 * hard character cut for unbroken runs of text.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::ChunkingConfig;
use crate::errors::TimelineError;
use crate::script::{ScriptDocument, ScriptPart};

// @const: Runs of whitespace, collapsed to a single space before chunking
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub(crate) const SENTENCE_TERMINATORS: &[char] = &['。', '！', '？', '!', '?', '．', '.', '…'];
pub(crate) const CLAUSE_MARKS: &[char] = &['、', '，', ',', ';', '；', ':', '：'];
const CLOSING_MARKS: &[char] = &['」', '』', '）', ')', '】', '"', '\'', '”', '’'];

/// A bounded slice of one part's narration, synthesized on its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub part_index: usize,
    pub chunk_index: usize,
    pub text: String,
}

/// All chunks of one part, in chunk order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedPart {
    pub part_index: usize,
    pub chunks: Vec<Chunk>,
}

/// Chunked parts of a whole script, in part order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedScript {
    parts: Vec<ChunkedPart>,
}

impl ChunkedScript {
    pub fn parts(&self) -> &[ChunkedPart] {
        &self.parts
    }

    pub fn part(&self, part_index: usize) -> Option<&ChunkedPart> {
        self.parts
            .binary_search_by_key(&part_index, |p| p.part_index)
            .ok()
            .map(|i| &self.parts[i])
    }

    pub fn chunk(&self, part_index: usize, chunk_index: usize) -> Option<&Chunk> {
        self.part(part_index)
            .and_then(|part| part.chunks.get(chunk_index))
    }

    /// Every chunk, in narration order
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.parts.iter().flat_map(|p| p.chunks.iter())
    }

    pub fn total_chunks(&self) -> usize {
        self.parts.iter().map(|p| p.chunks.len()).sum()
    }

    /// `(part_index, chunk_count)` for every part
    pub fn expected_counts(&self) -> Vec<(usize, usize)> {
        self.parts
            .iter()
            .map(|p| (p.part_index, p.chunks.len()))
            .collect()
    }
}

/// Splits narration text into bounded-length chunks
#[derive(Debug, Clone)]
pub struct Chunker {
    max_chars: usize,
    min_merge_chars: usize,
}

impl Chunker {
    /// Create a chunker. `max_chars` is clamped to at least one character.
    pub fn new(max_chars: usize, min_merge_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
            min_merge_chars,
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.max_chars, config.min_merge_chars)
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Chunk every part of a script
    pub fn chunk_script(&self, script: &ScriptDocument) -> Result<ChunkedScript, TimelineError> {
        let mut parts = script
            .parts
            .iter()
            .map(|part| self.chunk_part(part))
            .collect::<Result<Vec<_>, _>>()?;
        parts.sort_by_key(|p| p.part_index);

        Ok(ChunkedScript { parts })
    }

    /// Chunk a single part
    pub fn chunk_part(&self, part: &ScriptPart) -> Result<ChunkedPart, TimelineError> {
        let chunks: Vec<Chunk> = self
            .split_text(part.part_index, &part.text)?
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| Chunk {
                part_index: part.part_index,
                chunk_index,
                text,
            })
            .collect();

        debug!(
            "Part {} ({}): {} chars -> {} chunks",
            part.part_index,
            part.name,
            char_len(&part.text),
            chunks.len()
        );

        Ok(ChunkedPart {
            part_index: part.part_index,
            chunks,
        })
    }

    /// Split one part's text into ordered, non-empty chunk texts
    pub fn split_text(&self, part_index: usize, text: &str) -> Result<Vec<String>, TimelineError> {
        let normalized = WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned();
        if normalized.is_empty() {
            return Err(TimelineError::InvalidInput {
                part_index,
                message: "narration text is empty".to_string(),
            });
        }

        if char_len(&normalized) <= self.max_chars {
            return Ok(vec![normalized]);
        }

        let sentences = split_sentences(&normalized);

        // Short sentences ride along with the next one while they fit
        let mut merged = Vec::with_capacity(sentences.len());
        let mut i = 0;
        while i < sentences.len() {
            let mut current = sentences[i].clone();
            while char_len(&current) < self.min_merge_chars && i + 1 < sentences.len() {
                let combined = join_pieces(&current, &sentences[i + 1]);
                if char_len(&combined) > self.max_chars {
                    break;
                }
                current = combined;
                i += 1;
            }
            merged.push(current);
            i += 1;
        }

        let mut chunks = Vec::with_capacity(merged.len());
        for sentence in merged {
            if char_len(&sentence) <= self.max_chars {
                chunks.push(sentence);
            } else {
                chunks.extend(self.break_long(&sentence));
            }
        }

        chunks.retain(|c| !c.is_empty());
        Ok(chunks)
    }

    /// Break a piece that is longer than `max_chars` at the coarsest boundary available
    fn break_long(&self, text: &str) -> Vec<String> {
        if char_len(text) <= self.max_chars {
            return vec![text.to_string()];
        }

        let clauses = split_after(text, CLAUSE_MARKS);
        if clauses.len() > 1 {
            return self.pack(clauses.iter().flat_map(|c| self.break_long(c)));
        }

        let words: Vec<String> = text.split(' ').filter(|w| !w.is_empty()).map(str::to_string).collect();
        if words.len() > 1 {
            return self.pack(words.iter().flat_map(|w| self.break_long(w)));
        }

        hard_cut(text, self.max_chars)
    }

    /// Greedily join pieces (each already within the limit) into chunks
    fn pack(&self, pieces: impl Iterator<Item = String>) -> Vec<String> {
        let mut packed = Vec::new();
        let mut current = String::new();

        for piece in pieces {
            if current.is_empty() {
                current = piece;
                continue;
            }
            let candidate = join_pieces(&current, &piece);
            if char_len(&candidate) <= self.max_chars {
                current = candidate;
            } else {
                packed.push(std::mem::replace(&mut current, piece));
            }
        }

        if !current.is_empty() {
            packed.push(current);
        }
        packed
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn is_sentence_end(chars: &[char], i: usize) -> bool {
    let c = chars[i];
    if c == '.' {
        // "3.5" and "e.g.x" are not sentence ends
        return chars.get(i + 1).is_none_or(|next| next.is_whitespace());
    }
    SENTENCE_TERMINATORS.contains(&c)
}

/// Split after sentence terminators, keeping terminators and closing quotes with their sentence
fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();

    let mut i = 0;
    while i < chars.len() {
        current.push(chars[i]);
        if is_sentence_end(&chars, i) {
            while i + 1 < chars.len()
                && (SENTENCE_TERMINATORS.contains(&chars[i + 1]) || CLOSING_MARKS.contains(&chars[i + 1]))
            {
                i += 1;
                current.push(chars[i]);
            }
            push_trimmed(&mut sentences, &mut current);
        }
        i += 1;
    }
    push_trimmed(&mut sentences, &mut current);

    sentences
}

/// Split after any of `marks`, keeping each mark with the text before it
fn split_after(text: &str, marks: &[char]) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        current.push(c);
        if marks.contains(&c) {
            push_trimmed(&mut pieces, &mut current);
        }
    }
    push_trimmed(&mut pieces, &mut current);

    pieces
}

fn push_trimmed(pieces: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        pieces.push(trimmed.to_string());
    }
    current.clear();
}

fn hard_cut(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|slice| slice.iter().collect::<String>())
        .collect()
}

/// Join two pieces, restoring a space only between two non-CJK neighbours
fn join_pieces(left: &str, right: &str) -> String {
    let needs_space = matches!(
        (left.chars().last(), right.chars().next()),
        (Some(l), Some(r)) if l.is_ascii() && r.is_ascii()
    );

    if needs_space {
        format!("{} {}", left, right)
    } else {
        format!("{}{}", left, right)
    }
}
