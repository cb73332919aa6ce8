use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::errors::SynthesisError;
use crate::synthesis::wav::measure_wav_duration;
use crate::synthesis::{SynthesisOutcome, SynthesisRequest, Synthesizer};

/// VOICEVOX engine client
///
/// Each chunk takes two calls: `audio_query` turns text into a synthesis
/// query, `synthesis` renders the query to WAV. No retries are attempted.
#[derive(Debug)]
pub struct Voicevox {
    /// Engine base URL, always ending with `/`
    base_url: Url,
    /// HTTP client for making requests
    client: Client,
    /// Where WAV files are written
    audio_dir: PathBuf,
}

impl Voicevox {
    /// Create a new VOICEVOX client
    pub fn new(endpoint: &str, audio_dir: impl AsRef<Path>, timeout_secs: u64) -> Result<Self> {
        let mut base_url =
            Url::parse(endpoint).with_context(|| format!("Invalid VOICEVOX endpoint: {}", endpoint))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("VOICEVOX endpoint cannot be used as a base URL: {}", endpoint));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url,
            client,
            audio_dir: audio_dir.as_ref().to_path_buf(),
        })
    }

    /// File name of the audio for one chunk
    pub fn audio_file_name(part_index: usize, chunk_index: usize) -> String {
        format!("part_{:03}_chunk_{:03}.wav", part_index, chunk_index)
    }

    fn endpoint(&self, name: &str) -> Result<Url, SynthesisError> {
        self.base_url
            .join(name)
            .map_err(|e| SynthesisError::RequestFailed(format!("Invalid URL for {}: {}", name, e)))
    }

    /// Turn text into a synthesis query
    pub async fn audio_query(&self, text: &str, speaker_id: u32) -> Result<serde_json::Value, SynthesisError> {
        let speaker = speaker_id.to_string();
        let response = self
            .client
            .post(self.endpoint("audio_query")?)
            .query(&[("text", text), ("speaker", speaker.as_str())])
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response, "audio_query").await?;
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| SynthesisError::ParseError(format!("audio_query response: {}", e)))
    }

    /// Render a synthesis query to WAV bytes
    pub async fn synthesis(&self, query: &serde_json::Value, speaker_id: u32) -> Result<Vec<u8>, SynthesisError> {
        let speaker = speaker_id.to_string();
        let response = self
            .client
            .post(self.endpoint("synthesis")?)
            .query(&[("speaker", speaker.as_str())])
            .json(query)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response, "synthesis").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::RequestFailed(format!("synthesis body: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Synthesizer for Voicevox {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisOutcome, SynthesisError> {
        let query = self.audio_query(&request.text, request.speaker_id).await?;
        let audio = self.synthesis(&query, request.speaker_id).await?;

        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let audio_path = self
            .audio_dir
            .join(Self::audio_file_name(request.part_index, request.chunk_index));
        tokio::fs::write(&audio_path, &audio).await?;

        match measure_wav_duration(&audio) {
            Some(seconds) => {
                debug!(
                    "Part {}, chunk {}: {} bytes, {:.3}s -> {}",
                    request.part_index,
                    request.chunk_index,
                    audio.len(),
                    seconds,
                    audio_path.display()
                );
                Ok(SynthesisOutcome::measured(Some(audio_path), seconds))
            }
            None => {
                warn!(
                    "Could not read the duration of {} ({} bytes)",
                    audio_path.display(),
                    audio.len()
                );
                Ok(SynthesisOutcome::unmeasured(Some(audio_path)))
            }
        }
    }

    async fn test_connection(&self) -> Result<(), SynthesisError> {
        let response = self
            .client
            .get(self.endpoint("version")?)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = check_status(response, "version").await?;
        let version = response.text().await.unwrap_or_default();
        debug!("VOICEVOX engine version {}", version.trim().trim_matches('"'));
        Ok(())
    }

    fn name(&self) -> &str {
        "VOICEVOX"
    }
}

fn map_send_error(e: reqwest::Error) -> SynthesisError {
    if e.is_connect() {
        SynthesisError::ConnectionError(e.to_string())
    } else {
        SynthesisError::RequestFailed(e.to_string())
    }
}

async fn check_status(response: reqwest::Response, call: &str) -> Result<reqwest::Response, SynthesisError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());
    error!("VOICEVOX {} error ({}): {}", call, status, message);
    Err(SynthesisError::ApiError {
        status_code: status.as_u16(),
        message,
    })
}
