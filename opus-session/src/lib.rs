//! Opus encoder/decoder sessions over libopus.
//!
//! This crate provides:
//!
//! - [`EncoderSession`]: owns one native encoder, encodes PCM frames to packets
//! - [`DecoderSession`]: owns one native decoder and a reusable scratch
//!   buffer, decodes packets to PCM frames
//! - [`packet`]: stateless queries over raw packet bytes
//! - [`params`]: the fixed 48 kHz stereo 20 ms voice session parameters
//!
//! Every libopus failure is translated into a [`CodecError`].
//!
//! Sessions are `Send` but not `Sync`: all calls that touch native state take
//! `&mut self`, so one owner drives a session at a time.
//!
//! # Example
//!
//! ```ignore
//! use opus_session::{DecoderSession, EncoderSession, packet, params};
//!
//! let mut encoder = EncoderSession::voice()?;
//! let mut decoder = DecoderSession::stereo()?;
//!
//! // 20ms of stereo silence at 48kHz
//! let pcm = vec![0u8; params::FRAME_SIZE];
//! let frame = encoder.encode(&pcm, params::SAMPLES_PER_FRAME)?;
//!
//! assert_eq!(packet::frame_count(&frame)?, 1);
//!
//! let decoded = decoder.decode(&frame, params::SAMPLES_PER_FRAME, params::CHANNELS, false)?;
//! assert_eq!(decoded.len(), params::FRAME_SIZE);
//! ```

mod decoder;
mod encoder;
mod error;
mod ffi;
pub mod packet;
pub mod params;

pub use decoder::DecoderSession;
pub use encoder::EncoderSession;
pub use error::{CodecError, ErrorCategory, Result};
pub use packet::Bandwidth;
pub use params::{Application, SessionConfig};
