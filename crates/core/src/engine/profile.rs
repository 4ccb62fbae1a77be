//! Fixed encoding profile applied to every file of a batch.

use serde::{Deserialize, Serialize};

/// Encoder settings turned into the engine argument list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeProfile {
    /// Video encoder.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,
    /// Encoder speed preset.
    #[serde(default = "default_preset")]
    pub preset: String,
    /// Constant rate factor (0-51, lower is better quality).
    #[serde(default = "default_crf")]
    pub crf: u8,
    /// Audio encoder.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
    /// Audio bitrate in kbps.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,
    /// Media type attached to produced blobs.
    #[serde(default = "default_media_type")]
    pub media_type: String,
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_preset() -> String {
    "fast".to_string()
}

fn default_crf() -> u8 {
    23
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> u32 {
    128
}

fn default_media_type() -> String {
    "video/mp4".to_string()
}

impl Default for EncodeProfile {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            preset: default_preset(),
            crf: default_crf(),
            audio_codec: default_audio_codec(),
            audio_bitrate_kbps: default_audio_bitrate(),
            media_type: default_media_type(),
        }
    }
}

impl EncodeProfile {
    /// Builds the engine arguments converting `input` into `output`.
    pub fn to_args(&self, input: &str, output: &str) -> Vec<String> {
        vec![
            "-i".to_string(),
            input.to_string(),
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            format!("{}k", self.audio_bitrate_kbps),
            output.to_string(),
        ]
    }
}
