//! Opus decoder session.

use std::os::raw::c_int;
use std::ptr::{self, NonNull};

use tracing::{debug, trace};

use crate::error::{CodecError, Result, check};
use crate::ffi;
use crate::params::{MAX_FRAME_SIZE, SAMPLE_SIZE, SessionConfig};

/// Scratch buffer length in 16-bit samples: one maximum-size stereo frame.
const SCRATCH_SAMPLES: usize = MAX_FRAME_SIZE as usize * SAMPLE_SIZE / 2;

/// Owned libopus decoder state, destroyed exactly once on drop.
struct DecoderHandle(NonNull<ffi::OpusDecoder>);

// Safety: the state is only reached through `&mut DecoderSession`.
unsafe impl Send for DecoderHandle {}

impl DecoderHandle {
    fn create(sample_rate: i32, channels: i32) -> Result<Self> {
        let mut error: c_int = ffi::OPUS_OK;
        let raw = unsafe { ffi::opus_decoder_create(sample_rate, channels, &mut error) };
        let handle = NonNull::new(raw).map(Self);
        check(error)?;
        handle.ok_or(CodecError::OutOfMemory)
    }

    fn as_ptr(&self) -> *mut ffi::OpusDecoder {
        self.0.as_ptr()
    }
}

impl Drop for DecoderHandle {
    fn drop(&mut self) {
        unsafe { ffi::opus_decoder_destroy(self.0.as_ptr()) };
    }
}

/// Opus decoder session.
///
/// Owns one native decoder and a scratch buffer large enough for a 120 ms
/// stereo frame at 48 kHz. The buffer is allocated once and reused by every
/// decode; each call copies out only the samples it produced.
pub struct DecoderSession {
    sample_rate: i32,
    channels: i32,
    // Fields drop in declaration order: scratch buffer, then native state.
    scratch: Vec<i16>,
    handle: DecoderHandle,
}

impl DecoderSession {
    /// Creates a new decoder session.
    ///
    /// # Parameters
    /// - `sample_rate`: Sample rate to decode at (8000, 12000, 16000, 24000, or 48000)
    /// - `channels`: Number of channels (1 or 2)
    pub fn new(sample_rate: i32, channels: i32) -> Result<Self> {
        let mut scratch: Vec<i16> = Vec::new();
        scratch
            .try_reserve_exact(SCRATCH_SAMPLES)
            .map_err(|_| CodecError::OutOfMemory)?;
        scratch.resize(SCRATCH_SAMPLES, 0);

        // On failure `scratch` is released before the error reaches the caller.
        let handle = DecoderHandle::create(sample_rate, channels)?;
        debug!(sample_rate, channels, "opus decoder created");

        Ok(Self {
            sample_rate,
            channels,
            scratch,
            handle,
        })
    }

    /// Creates a decoder session from a [`SessionConfig`].
    pub fn with_config(config: &SessionConfig) -> Result<Self> {
        Self::new(config.sample_rate, config.channels)
    }

    /// Creates a 48 kHz stereo decoder.
    pub fn stereo() -> Result<Self> {
        Self::with_config(&SessionConfig::default())
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> i32 {
        self.sample_rate
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> i32 {
        self.channels
    }

    /// Returns the largest `frame_size` a decode call accepts.
    pub fn capacity(&self) -> i32 {
        (self.scratch.len() / self.channels as usize) as i32
    }

    /// Decodes one Opus packet to interleaved little-endian 16-bit PCM.
    ///
    /// Returns `M * channels * 2` bytes, where `M` is the number of samples
    /// per channel libopus produced (at most `frame_size`). `channels` may be
    /// lower than the session's channel count; the result is then a prefix of
    /// the decoded interleaved samples.
    ///
    /// With `use_fec` set, decodes the forward error correction data carried
    /// in `packet` for the frame preceding it.
    pub fn decode(
        &mut self,
        packet: &[u8],
        frame_size: i32,
        channels: i32,
        use_fec: bool,
    ) -> Result<Vec<u8>> {
        if packet.is_empty() {
            return Err(CodecError::InvalidPacket);
        }
        self.decode_packet(Some(packet), frame_size, channels, use_fec)
    }

    /// Performs packet loss concealment (PLC) to generate samples when a
    /// packet is lost.
    pub fn decode_lost(&mut self, frame_size: i32, channels: i32) -> Result<Vec<u8>> {
        self.decode_packet(None, frame_size, channels, false)
    }

    fn decode_packet(
        &mut self,
        packet: Option<&[u8]>,
        frame_size: i32,
        channels: i32,
        use_fec: bool,
    ) -> Result<Vec<u8>> {
        if channels < 1 || channels > self.channels {
            return Err(CodecError::InvalidArgument);
        }
        if frame_size > self.capacity() {
            return Err(CodecError::BufferTooSmall);
        }

        let (data_ptr, data_len) = match packet {
            Some(p) => (
                p.as_ptr(),
                i32::try_from(p.len()).map_err(|_| CodecError::InvalidPacket)?,
            ),
            None => (ptr::null(), 0),
        };

        let n = unsafe {
            ffi::opus_decode(
                self.handle.as_ptr(),
                data_ptr,
                data_len,
                self.scratch.as_mut_ptr(),
                frame_size,
                use_fec as c_int,
            )
        };
        let n = check(n)? as usize;

        // n <= frame_size and channels <= self.channels, so this stays within
        // the samples libopus just wrote.
        let valid = &self.scratch[..n * channels as usize];
        let mut out = Vec::with_capacity(valid.len() * 2);
        for sample in valid {
            out.extend_from_slice(&sample.to_le_bytes());
        }

        trace!(frame_size, samples = n, bytes = out.len(), "opus packet decoded");
        Ok(out)
    }

    /// Returns the duration, in samples per channel, of the last packet
    /// successfully decoded or concealed.
    pub fn last_packet_duration(&mut self) -> Result<u32> {
        let mut duration: i32 = 0;
        let ret = unsafe {
            ffi::opus_decoder_ctl(
                self.handle.as_ptr(),
                ffi::OPUS_GET_LAST_PACKET_DURATION_REQUEST,
                &mut duration as *mut i32,
            )
        };
        check(ret)?;
        Ok(u32::try_from(duration).unwrap_or(0))
    }

    /// Resets the decoder to a freshly initialized state.
    pub fn reset(&mut self) -> Result<()> {
        let ret = unsafe { ffi::opus_decoder_ctl(self.handle.as_ptr(), ffi::OPUS_RESET_STATE) };
        check(ret).map(|_| ())
    }
}

impl Drop for DecoderSession {
    fn drop(&mut self) {
        debug!(
            sample_rate = self.sample_rate,
            channels = self.channels,
            "opus decoder destroyed"
        );
    }
}
