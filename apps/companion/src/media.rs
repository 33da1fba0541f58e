//! Generated diagrams and speech for the sections of the current guide.

use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Shown in place of a diagram whose generation failed.
pub const DIAGRAM_ERROR_MESSAGE: &str = "Failed to generate image.";

/// Sample rate of generated speech.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Per-section diagram cache for the loaded guide.
///
/// At most one generation runs at a time. Results that land after the gallery
/// was cleared are dropped.
#[derive(Debug, Default)]
pub struct DiagramGallery {
    images: HashMap<String, Vec<u8>>,
    errors: HashMap<String, String>,
    hidden: HashSet<String>,
    generating: Option<String>,
}

/// What the diagram slot of one section shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramView {
    pub section: String,
    /// PNG data, base64-encoded.
    pub image: Option<String>,
    pub hidden: bool,
    pub generating: bool,
    pub error: Option<String>,
}

impl DiagramGallery {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn image(&self, section: &str) -> Option<&[u8]> {
        self.images.get(section).map(Vec::as_slice)
    }

    pub fn generating(&self) -> Option<&str> {
        self.generating.as_deref()
    }

    /// Claim the generation slot for `section`. Returns false if it is taken.
    pub fn begin(&mut self, section: &str) -> bool {
        if self.generating.is_some() {
            return false;
        }
        self.errors.remove(section);
        self.generating = Some(section.to_string());
        true
    }

    /// Store the outcome of the generation started by [`begin`](Self::begin).
    ///
    /// Returns false when the slot no longer belongs to `section`.
    pub fn finish(&mut self, section: &str, result: Option<Vec<u8>>) -> bool {
        if self.generating.as_deref() != Some(section) {
            return false;
        }
        self.generating = None;

        match result {
            Some(bytes) => {
                self.images.insert(section.to_string(), bytes);
            }
            None => {
                self.errors
                    .insert(section.to_string(), DIAGRAM_ERROR_MESSAGE.to_string());
            }
        }
        true
    }

    /// Flip "hide to test memory" for a section. Returns the new hidden flag.
    pub fn toggle_hidden(&mut self, section: &str) -> bool {
        if self.hidden.remove(section) {
            false
        } else {
            self.hidden.insert(section.to_string());
            true
        }
    }

    pub fn view(&self, section: &str) -> DiagramView {
        DiagramView {
            section: section.to_string(),
            image: self
                .image(section)
                .map(|bytes| general_purpose::STANDARD.encode(bytes)),
            hidden: self.hidden.contains(section),
            generating: self.generating.as_deref() == Some(section),
            error: self.errors.get(section).cloned(),
        }
    }
}

/// Spoken audio for a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechClip {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Little-endian 16-bit PCM, base64-encoded.
    pub pcm: String,
}

impl SpeechClip {
    pub fn from_pcm(pcm: &[u8]) -> Self {
        Self {
            sample_rate: SPEECH_SAMPLE_RATE,
            channels: 1,
            bits_per_sample: 16,
            pcm: general_purpose::STANDARD.encode(pcm),
        }
    }

    /// Playback length in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        let bytes = general_purpose::STANDARD
            .decode(&self.pcm)
            .map(|b| b.len())
            .unwrap_or(0) as u64;
        let bytes_per_second =
            u64::from(self.sample_rate) * u64::from(self.channels) * u64::from(self.bits_per_sample / 8);
        bytes * 1000 / bytes_per_second.max(1)
    }
}
