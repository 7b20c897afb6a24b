use anyhow::{Context, Result};
use std::io::Cursor;
use std::path::Path;
use tracing::{info, warn};

/// Ordered encoded audio chunks captured during one recording
#[derive(Debug, Default)]
pub struct RecordingBuffer {
    chunks: Vec<Vec<u8>>,
    total_bytes: usize,
}

impl RecordingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk in arrival order. Empty chunks are ignored.
    pub fn push(&mut self, chunk: Vec<u8>) -> bool {
        if chunk.is_empty() {
            return false;
        }
        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
        true
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Concatenate every chunk into one artifact and clear the buffer.
    /// Returns `None` when nothing was captured.
    pub fn take_artifact(&mut self, mime_type: &str) -> Option<AudioArtifact> {
        if self.chunks.is_empty() {
            return None;
        }

        let chunk_count = self.chunks.len();
        let mut data = Vec::with_capacity(self.total_bytes);
        for chunk in self.chunks.drain(..) {
            data.extend_from_slice(&chunk);
        }
        self.total_bytes = 0;

        Some(AudioArtifact::new(data, mime_type, chunk_count))
    }
}

/// Finalized recording: concatenated chunks with a declared mime type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    data: Vec<u8>,
    mime_type: String,
    chunk_count: usize,
}

/// Bytes, mime type and file name as sent to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl AudioArtifact {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, chunk_count: usize) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            chunk_count,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample rate and channel count for raw PCM (`audio/L16`) artifacts
    pub fn pcm_format(&self) -> Option<(u32, u16)> {
        let mut parts = self.mime_type.split(';').map(str::trim);
        if !parts.next()?.eq_ignore_ascii_case("audio/L16") {
            return None;
        }

        let mut rate = 16000;
        let mut channels = 1;
        for param in parts {
            match param.split_once('=') {
                Some(("rate", value)) => rate = value.parse().ok()?,
                Some(("channels", value)) => channels = value.parse().ok()?,
                _ => {}
            }
        }
        Some((rate, channels))
    }

    /// File extension matching the container
    pub fn file_extension(&self) -> &'static str {
        let essence = self
            .mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "audio/webm" => "webm",
            "audio/ogg" => "ogg",
            "audio/mp4" | "audio/aac" => "m4a",
            "audio/mpeg" => "mp3",
            _ => "wav",
        }
    }

    /// Wrap raw PCM (big-endian `audio/L16`) into a WAV container
    pub fn to_wav(&self) -> Result<Vec<u8>> {
        let (sample_rate, channels) = self
            .pcm_format()
            .with_context(|| format!("not a raw PCM artifact: {}", self.mime_type))?;

        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        if self.data.len() % 2 != 0 {
            warn!(
                "PCM artifact has an odd length ({} bytes), dropping the trailing byte",
                self.data.len()
            );
        }

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .context("Failed to create WAV writer")?;
            for pair in self.data.chunks_exact(2) {
                writer
                    .write_sample(i16::from_be_bytes([pair[0], pair[1]]))
                    .context("Failed to write sample to WAV")?;
            }
            writer.finalize().context("Failed to finalize WAV")?;
        }

        Ok(cursor.into_inner())
    }

    /// Payload for the backend upload. Raw PCM is sent as WAV.
    pub fn upload_payload(&self) -> Result<UploadPayload> {
        if self.pcm_format().is_some() {
            return Ok(UploadPayload {
                data: self.to_wav()?,
                mime_type: "audio/wav".to_string(),
                file_name: "recording.wav".to_string(),
            });
        }

        Ok(UploadPayload {
            data: self.data.clone(),
            mime_type: self.mime_type.clone(),
            file_name: format!("recording.{}", self.file_extension()),
        })
    }

    /// Write the artifact to disk (raw PCM as WAV)
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = if self.pcm_format().is_some() {
            self.to_wav()?
        } else {
            self.data.clone()
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        std::fs::write(path, &bytes)
            .with_context(|| format!("Failed to write audio file: {:?}", path))?;

        info!(
            "Saved audio artifact: {:?} ({} bytes, {} chunks)",
            path,
            bytes.len(),
            self.chunk_count
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_artifact_clears_buffer() {
        let mut buffer = RecordingBuffer::new();
        assert!(buffer.push(vec![1, 2]));
        assert!(!buffer.push(Vec::new()));
        assert!(buffer.push(vec![3]));

        let artifact = buffer.take_artifact("audio/webm").unwrap();
        assert_eq!(artifact.data(), &[1, 2, 3]);
        assert_eq!(artifact.chunk_count(), 2);
        assert!(buffer.is_empty());
        assert_eq!(buffer.total_bytes(), 0);
        assert!(buffer.take_artifact("audio/webm").is_none());
    }

    #[test]
    fn test_pcm_format_parsing() {
        let pcm = AudioArtifact::new(vec![0; 4], "audio/L16;rate=44100;channels=2", 1);
        assert_eq!(pcm.pcm_format(), Some((44100, 2)));

        let webm = AudioArtifact::new(vec![0; 4], "audio/webm;codecs=opus", 1);
        assert_eq!(webm.pcm_format(), None);
        assert_eq!(webm.file_extension(), "webm");
    }

    #[test]
    fn test_pcm_is_read_big_endian() {
        let pcm = AudioArtifact::new(
            vec![0x01, 0x00, 0xff, 0xfe, 0x7f],
            "audio/L16;rate=16000;channels=1",
            1,
        );
        let wav = pcm.to_wav().unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();

        // Trailing odd byte is dropped
        assert_eq!(samples, vec![256, -2]);
    }

    #[test]
    fn test_pcm_upload_is_wav() {
        let pcm = AudioArtifact::new(vec![0; 3200], "audio/L16;rate=16000;channels=1", 1);
        let upload = pcm.upload_payload().unwrap();

        assert_eq!(upload.mime_type, "audio/wav");
        assert_eq!(upload.file_name, "recording.wav");
        assert_eq!(&upload.data[..4], b"RIFF");
        assert!(upload.data.len() > 3200);
    }
}
