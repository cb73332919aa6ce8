/*!
 * Script document loading.
 *
 * A script arrives as the JSON document written by the script-writing stage:
 *
 * ```json
 * {
 *   "title": "...",
 *   "content": {
 *     "script_parts": [
 *       { "part": "article_1", "text": "...", "speaker_id": 1 }
 *     ]
 *   }
 * }
 * ```
 *
 * Loading turns it into an ordered list of [`ScriptPart`]s. Part indices follow
 * document order (after the optional title part) and are kept even when blank
 * parts are dropped, so downstream indices always point back at the document.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::path::Path;

use crate::app_config::ScriptConfig;
use crate::file_utils::FileManager;

/// Name given to the narrated title part
pub const TITLE_PART_NAME: &str = "title";

/// One ordered unit of narration
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptPart {
    /// Narration order, unique within a script
    pub part_index: usize,
    /// Part label from the document (`title`, `article_1`, `reaction`, ...)
    pub name: String,
    /// Full narration text
    pub text: String,
    /// Speaker requested by the document, if any
    pub speaker_id: Option<u32>,
}

impl ScriptPart {
    pub fn new(part_index: usize, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            part_index,
            name: name.into(),
            text: text.into(),
            speaker_id: None,
        }
    }

    pub fn with_speaker(mut self, speaker_id: u32) -> Self {
        self.speaker_id = Some(speaker_id);
        self
    }

    /// Speaker to synthesize this part with.
    ///
    /// Article narration always uses the narrator voice; other parts use
    /// their own speaker when the document names one.
    pub fn resolve_speaker(&self, default_speaker: u32) -> u32 {
        if self.name.starts_with("article_") {
            return default_speaker;
        }
        self.speaker_id.unwrap_or(default_speaker)
    }
}

/// A loaded, read-only script
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptDocument {
    pub title: Option<String>,
    pub parts: Vec<ScriptPart>,
}

#[derive(Debug, Deserialize)]
struct RawScript {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: RawContent,
}

#[derive(Debug, Default, Deserialize)]
struct RawContent {
    #[serde(default)]
    script_parts: Vec<RawPart>,
}

#[derive(Debug, Deserialize)]
struct RawPart {
    #[serde(default)]
    part: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    speaker_id: Option<u32>,
}

impl ScriptDocument {
    /// Build a document directly from parts, ordering them by part index
    pub fn from_parts(title: Option<String>, mut parts: Vec<ScriptPart>) -> Result<Self> {
        parts.sort_by_key(|p| p.part_index);
        if parts.windows(2).any(|w| w[0].part_index == w[1].part_index) {
            return Err(anyhow!("Script parts must have unique part indices"));
        }
        Ok(Self { title, parts })
    }

    /// Parse a script JSON string
    pub fn from_json_str(content: &str, options: &ScriptConfig) -> Result<Self> {
        let raw: RawScript = serde_json::from_str(content).context("Failed to parse script JSON")?;

        if raw.content.script_parts.is_empty() {
            return Err(anyhow!("Script has no script_parts"));
        }

        let mut raw_parts = Vec::with_capacity(raw.content.script_parts.len() + 1);
        if options.narrate_title {
            if let Some(title) = raw.title.as_ref().filter(|t| !t.trim().is_empty()) {
                raw_parts.push(RawPart {
                    part: TITLE_PART_NAME.to_string(),
                    text: title.clone(),
                    speaker_id: None,
                });
            }
        }
        raw_parts.extend(raw.content.script_parts);

        if let Some(max_parts) = options.max_parts {
            if raw_parts.len() > max_parts {
                debug!("Limiting script to the first {} of {} parts", max_parts, raw_parts.len());
                raw_parts.truncate(max_parts);
            }
        }

        let mut parts = Vec::with_capacity(raw_parts.len());
        for (part_index, raw_part) in raw_parts.into_iter().enumerate() {
            if raw_part.text.trim().is_empty() && options.skip_empty_parts {
                warn!("Skipping part {} ({}): empty text", part_index, raw_part.part);
                continue;
            }
            parts.push(ScriptPart {
                part_index,
                name: raw_part.part,
                text: raw_part.text,
                speaker_id: raw_part.speaker_id,
            });
        }

        if parts.is_empty() {
            return Err(anyhow!("Script has no narratable parts"));
        }

        Ok(Self { title: raw.title, parts })
    }

    /// Load a script JSON file
    pub fn load<P: AsRef<Path>>(path: P, options: &ScriptConfig) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        Self::from_json_str(&content, options)
            .with_context(|| format!("Invalid script file: {}", path.display()))
    }

    pub fn part(&self, part_index: usize) -> Option<&ScriptPart> {
        self.parts
            .binary_search_by_key(&part_index, |p| p.part_index)
            .ok()
            .map(|i| &self.parts[i])
    }
}
