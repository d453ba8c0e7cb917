//! Session parameters.
//!
//! The constants describe the fixed voice session every encoder and decoder
//! defaults to: 48 kHz stereo, 20 ms frames of 16-bit PCM.
//! [`SessionConfig`] carries the same values at runtime and lets a host
//! override them.

use std::os::raw::c_int;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ffi;

/// Sample rate in Hz.
pub const SAMPLING_RATE: i32 = 48000;

/// Number of interleaved channels.
pub const CHANNELS: i32 = 2;

/// Duration of one frame.
pub const FRAME_DURATION: Duration = Duration::from_millis(20);

/// Duration of one frame in seconds.
pub const FRAME_DURATION_SECS: f64 = 0.02;

/// Bytes per sample across all channels (16-bit samples).
pub const SAMPLE_SIZE: usize = CHANNELS as usize * 2;

/// Samples per channel in one frame.
pub const SAMPLES_PER_FRAME: i32 = SAMPLING_RATE / 50;

/// Bytes in one frame of PCM.
pub const FRAME_SIZE: usize = SAMPLE_SIZE * SAMPLES_PER_FRAME as usize;

/// Largest frame a decoder accepts, in samples per channel (120 ms).
pub const MAX_FRAME_SIZE: i32 = SAMPLES_PER_FRAME * 6;

/// Application profile sessions are tuned for.
pub const APPLICATION: Application = Application::Voip;

/// Opus application type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Application {
    /// Best quality for voice signals.
    Voip,
    /// Best quality for non-voice signals.
    Audio,
    /// Minimum possible coding delay.
    RestrictedLowdelay,
}

impl Application {
    pub(crate) fn to_ffi(self) -> c_int {
        match self {
            Self::Voip => ffi::OPUS_APPLICATION_VOIP,
            Self::Audio => ffi::OPUS_APPLICATION_AUDIO,
            Self::RestrictedLowdelay => ffi::OPUS_APPLICATION_RESTRICTED_LOWDELAY,
        }
    }
}

impl Default for Application {
    fn default() -> Self {
        APPLICATION
    }
}

/// Session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sample rate in Hz (8000, 12000, 16000, 24000 or 48000).
    pub sample_rate: i32,
    /// Number of channels (1 or 2).
    pub channels: i32,
    /// Encoder application profile. Decoders ignore it.
    pub application: Application,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLING_RATE,
            channels: CHANNELS,
            application: APPLICATION,
        }
    }
}

impl SessionConfig {
    /// Set the sample rate.
    pub fn with_sample_rate(mut self, sample_rate: i32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the channel count.
    pub fn with_channels(mut self, channels: i32) -> Self {
        self.channels = channels;
        self
    }

    /// Set the application profile.
    pub fn with_application(mut self, application: Application) -> Self {
        self.application = application;
        self
    }

    /// Samples per channel in one 20 ms frame.
    pub fn frame_samples(&self) -> i32 {
        self.sample_rate * FRAME_DURATION.as_millis() as i32 / 1000
    }

    /// Bytes of PCM in one 20 ms frame.
    pub fn frame_bytes(&self) -> usize {
        self.frame_samples() as usize * self.channels as usize * 2
    }

    /// Largest frame a decoder accepts, in samples per channel.
    pub fn max_frame_samples(&self) -> i32 {
        self.frame_samples() * 6
    }
}
