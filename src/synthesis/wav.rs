/*!
 * Playback duration of RIFF/WAVE audio.
 *
 * Only the header is inspected: the `fmt ` chunk gives the byte rate and the
 * `data` chunk gives the payload size. Anything unparseable is reported as
 * "no measurement" rather than as a zero duration.
 */

const RIFF_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
// Size field written by streaming encoders that did not know the final length
const UNKNOWN_SIZE: u32 = u32::MAX;

/// Audio format fields read from the `fmt ` chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub bits_per_sample: u16,
}

/// Parse the `fmt ` chunk and the payload length of a WAV file
pub fn parse_wav_header(bytes: &[u8]) -> Option<(WavFormat, usize)> {
    if bytes.len() < RIFF_HEADER_LEN || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return None;
    }

    let mut format = None;
    let mut offset = RIFF_HEADER_LEN;

    while offset + CHUNK_HEADER_LEN <= bytes.len() {
        let id = &bytes[offset..offset + 4];
        let declared = read_u32(bytes, offset + 4)?;
        let body = offset + CHUNK_HEADER_LEN;
        let remaining = bytes.len() - body;

        match id {
            b"fmt " => {
                if (declared as usize) < 16 || remaining < 16 {
                    return None;
                }
                format = Some(WavFormat {
                    channels: read_u16(bytes, body + 2)?,
                    sample_rate: read_u32(bytes, body + 4)?,
                    byte_rate: read_u32(bytes, body + 8)?,
                    bits_per_sample: read_u16(bytes, body + 14)?,
                });
            }
            b"data" => {
                let data_len = if declared == UNKNOWN_SIZE {
                    remaining
                } else {
                    (declared as usize).min(remaining)
                };
                return format.map(|f| (f, data_len));
            }
            _ => {}
        }

        // Chunks are word aligned
        let padded = declared as usize + (declared as usize & 1);
        offset = body.checked_add(padded)?;
    }

    None
}

/// Playback duration of a WAV file in seconds, or `None` when it cannot be
/// determined or would be zero
pub fn measure_wav_duration(bytes: &[u8]) -> Option<f64> {
    let (format, data_len) = parse_wav_header(bytes)?;
    if format.byte_rate == 0 || data_len == 0 {
        return None;
    }

    let seconds = data_len as f64 / format.byte_rate as f64;
    (seconds.is_finite() && seconds > 0.0).then_some(seconds)
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    bytes
        .get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Silent 16-bit PCM WAV of the given length, used by tests and stub servers
pub fn silent_pcm_wav(sample_rate: u32, channels: u16, millis: u64) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let block_align = channels as u32 * (bits_per_sample as u32 / 8);
    let byte_rate = sample_rate * block_align;
    let frames = (sample_rate as u64 * millis / 1000) as u32;
    let data_len = frames * block_align;

    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&(block_align as u16).to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);
    wav
}
