//! Opus encoder session.

use std::os::raw::c_int;
use std::ptr::NonNull;

use tracing::{debug, trace};

use crate::error::{CodecError, Result, check};
use crate::ffi;
use crate::params::{Application, SessionConfig};

/// Owned libopus encoder state, destroyed exactly once on drop.
struct EncoderHandle(NonNull<ffi::OpusEncoder>);

// Safety: the state is only reached through `&mut EncoderSession`.
unsafe impl Send for EncoderHandle {}

impl EncoderHandle {
    fn create(sample_rate: i32, channels: i32, application: Application) -> Result<Self> {
        let mut error: c_int = ffi::OPUS_OK;
        let raw = unsafe {
            ffi::opus_encoder_create(sample_rate, channels, application.to_ffi(), &mut error)
        };
        // Take ownership before checking `error` so a non-null state is
        // still destroyed when creation reports failure.
        let handle = NonNull::new(raw).map(Self);
        check(error)?;
        handle.ok_or(CodecError::OutOfMemory)
    }

    fn as_ptr(&self) -> *mut ffi::OpusEncoder {
        self.0.as_ptr()
    }
}

impl Drop for EncoderHandle {
    fn drop(&mut self) {
        unsafe { ffi::opus_encoder_destroy(self.0.as_ptr()) };
    }
}

/// Opus encoder session.
///
/// Wraps one native encoder. Each [`encode`](Self::encode) call allocates its
/// own output buffer; the session holds no buffers between calls.
pub struct EncoderSession {
    sample_rate: i32,
    channels: i32,
    application: Application,
    handle: EncoderHandle,
}

impl EncoderSession {
    /// Creates a new encoder session.
    ///
    /// # Parameters
    /// - `sample_rate`: Sample rate (8000, 12000, 16000, 24000, or 48000)
    /// - `channels`: Number of channels (1 or 2)
    /// - `application`: Intended application type
    pub fn new(sample_rate: i32, channels: i32, application: Application) -> Result<Self> {
        let handle = EncoderHandle::create(sample_rate, channels, application)?;
        debug!(sample_rate, channels, ?application, "opus encoder created");
        Ok(Self {
            sample_rate,
            channels,
            application,
            handle,
        })
    }

    /// Creates an encoder session from a [`SessionConfig`].
    pub fn with_config(config: &SessionConfig) -> Result<Self> {
        Self::new(config.sample_rate, config.channels, config.application)
    }

    /// Creates a 48 kHz stereo voice encoder.
    pub fn voice() -> Result<Self> {
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

    /// Returns the application profile.
    pub fn application(&self) -> Application {
        self.application
    }

    /// Encodes interleaved little-endian 16-bit PCM into one Opus packet.
    ///
    /// The packet is at most `pcm.len()` bytes long.
    ///
    /// # Parameters
    /// - `pcm`: Input PCM bytes (`frame_size * channels` samples)
    /// - `frame_size`: Number of samples per channel
    pub fn encode(&mut self, pcm: &[u8], frame_size: i32) -> Result<Vec<u8>> {
        let samples: Vec<i16> = pcm
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        self.encode_with_limit(&samples, frame_size, pcm.len())
    }

    /// Encodes PCM samples into one Opus packet.
    pub fn encode_samples(&mut self, pcm: &[i16], frame_size: i32) -> Result<Vec<u8>> {
        self.encode_with_limit(pcm, frame_size, pcm.len() * 2)
    }

    fn encode_with_limit(&mut self, pcm: &[i16], frame_size: i32, max_bytes: usize) -> Result<Vec<u8>> {
        // libopus reads frame_size * channels samples regardless of the
        // slice length.
        let needed = usize::try_from(frame_size).map_err(|_| CodecError::InvalidArgument)?
            * self.channels as usize;
        if pcm.len() < needed {
            return Err(CodecError::InvalidArgument);
        }

        let max_bytes = max_bytes.min(i32::MAX as usize);
        let mut buf = vec![0u8; max_bytes];
        let n = unsafe {
            ffi::opus_encode(
                self.handle.as_ptr(),
                pcm.as_ptr(),
                frame_size,
                buf.as_mut_ptr(),
                max_bytes as i32,
            )
        };
        let n = check(n)? as usize;

        buf.truncate(n);
        trace!(frame_size, bytes = n, "opus frame encoded");
        Ok(buf)
    }

    /// Sets the target bitrate in bits per second.
    pub fn set_bitrate(&mut self, bitrate: i32) -> Result<()> {
        self.ctl(ffi::OPUS_SET_BITRATE_REQUEST, bitrate)
    }

    /// Sets the encoder complexity (0-10).
    pub fn set_complexity(&mut self, complexity: i32) -> Result<()> {
        self.ctl(ffi::OPUS_SET_COMPLEXITY_REQUEST, complexity)
    }

    /// Enables or disables in-band forward error correction.
    pub fn set_inband_fec(&mut self, enabled: bool) -> Result<()> {
        self.ctl(ffi::OPUS_SET_INBAND_FEC_REQUEST, enabled as i32)
    }

    /// Sets the expected packet loss percentage (0-100).
    pub fn set_packet_loss_perc(&mut self, percent: i32) -> Result<()> {
        self.ctl(ffi::OPUS_SET_PACKET_LOSS_PERC_REQUEST, percent)
    }

    /// Resets the encoder to a freshly initialized state.
    pub fn reset(&mut self) -> Result<()> {
        let ret = unsafe { ffi::opus_encoder_ctl(self.handle.as_ptr(), ffi::OPUS_RESET_STATE) };
        check(ret).map(|_| ())
    }

    fn ctl(&mut self, request: c_int, value: i32) -> Result<()> {
        let ret = unsafe { ffi::opus_encoder_ctl(self.handle.as_ptr(), request, value) };
        check(ret).map(|_| ())
    }
}

impl Drop for EncoderSession {
    fn drop(&mut self) {
        debug!(
            sample_rate = self.sample_rate,
            channels = self.channels,
            "opus encoder destroyed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{FRAME_SIZE, SAMPLES_PER_FRAME};

    #[test]
    fn test_encoder_create() {
        let enc = EncoderSession::voice().unwrap();
        assert_eq!(enc.sample_rate(), 48000);
        assert_eq!(enc.channels(), 2);
        assert_eq!(enc.application(), Application::Voip);
    }

    #[test]
    fn test_encoder_create_with_application() {
        assert!(EncoderSession::new(16000, 1, Application::Voip).is_ok());
        assert!(EncoderSession::new(48000, 2, Application::Audio).is_ok());
        assert!(EncoderSession::new(48000, 1, Application::RestrictedLowdelay).is_ok());
    }

    #[test]
    fn test_encoder_create_bad_sample_rate() {
        let err = EncoderSession::new(44100, 2, Application::Voip).err();
        assert_eq!(err, Some(CodecError::InvalidArgument));
    }

    #[test]
    fn test_encoder_create_bad_channels() {
        let err = EncoderSession::new(48000, 3, Application::Voip).err();
        assert_eq!(err, Some(CodecError::InvalidArgument));
    }

    #[test]
    fn test_encode_silence() {
        let mut enc = EncoderSession::voice().unwrap();
        let pcm = vec![0u8; FRAME_SIZE];
        let packet = enc.encode(&pcm, SAMPLES_PER_FRAME).unwrap();
        assert!(!packet.is_empty());
        assert!(packet.len() <= pcm.len());
    }

    #[test]
    fn test_encode_samples_sine() {
        let mut enc = EncoderSession::new(16000, 1, Application::Voip).unwrap();
        let pcm: Vec<i16> = (0..320)
            .map(|i| ((i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 16000.0).sin() * 10000.0) as i16)
            .collect();
        let packet = enc.encode_samples(&pcm, 320).unwrap();
        assert!(!packet.is_empty());
        assert!(packet.len() <= pcm.len() * 2);
    }

    #[test]
    fn test_encode_short_input() {
        let mut enc = EncoderSession::voice().unwrap();
        let pcm = vec![0u8; FRAME_SIZE / 2];
        let err = enc.encode(&pcm, SAMPLES_PER_FRAME).err();
        assert_eq!(err, Some(CodecError::InvalidArgument));
    }

    #[test]
    fn test_encode_negative_frame_size() {
        let mut enc = EncoderSession::voice().unwrap();
        let pcm = vec![0u8; FRAME_SIZE];
        assert_eq!(enc.encode(&pcm, -1).err(), Some(CodecError::InvalidArgument));
    }

    #[test]
    fn test_encode_illegal_frame_size() {
        // 900 samples is not a legal Opus frame duration at 48 kHz.
        let mut enc = EncoderSession::voice().unwrap();
        let pcm = vec![0u8; FRAME_SIZE];
        assert_eq!(enc.encode(&pcm, 900).err(), Some(CodecError::InvalidArgument));
    }

    #[test]
    fn test_encode_multiple_frames() {
        let mut enc = EncoderSession::voice().unwrap();
        let pcm = vec![0u8; FRAME_SIZE];
        for _ in 0..10 {
            assert!(enc.encode(&pcm, SAMPLES_PER_FRAME).is_ok());
        }
    }

    #[test]
    fn test_encoder_ctl() {
        let mut enc = EncoderSession::voice().unwrap();
        assert!(enc.set_bitrate(32000).is_ok());
        assert!(enc.set_complexity(5).is_ok());
        assert!(enc.set_inband_fec(true).is_ok());
        assert!(enc.set_packet_loss_perc(10).is_ok());
        assert!(enc.reset().is_ok());
    }

    #[test]
    fn test_encoder_ctl_out_of_range() {
        let mut enc = EncoderSession::voice().unwrap();
        assert_eq!(enc.set_complexity(11).err(), Some(CodecError::InvalidArgument));
        assert_eq!(enc.set_packet_loss_perc(101).err(), Some(CodecError::InvalidArgument));
    }

    #[test]
    fn test_encoder_is_send() {
        let mut enc = EncoderSession::voice().unwrap();
        let handle = std::thread::spawn(move || {
            let pcm = vec![0u8; FRAME_SIZE];
            enc.encode(&pcm, SAMPLES_PER_FRAME).map(|p| p.len())
        });
        assert!(handle.join().unwrap().unwrap() > 0);
    }
}
