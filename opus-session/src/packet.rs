//! Opus packet introspection.
//!
//! Stateless queries over raw packet bytes. None of these need a session;
//! they may be called on any packet, typically before routing it to a
//! [`DecoderSession`](crate::DecoderSession).

use std::os::raw::c_int;

use crate::error::{CodecError, Result, check};
use crate::ffi;
use crate::params::SAMPLING_RATE;

/// Audio bandwidth signalled in a packet's TOC byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bandwidth {
    /// Narrowband (4 kHz).
    NB,
    /// Mediumband (6 kHz).
    MB,
    /// Wideband (8 kHz).
    WB,
    /// Super-wideband (12 kHz).
    SWB,
    /// Fullband (20 kHz).
    FB,
}

impl Bandwidth {
    fn from_ffi(value: c_int) -> Result<Self> {
        match value {
            ffi::OPUS_BANDWIDTH_NARROWBAND => Ok(Self::NB),
            ffi::OPUS_BANDWIDTH_MEDIUMBAND => Ok(Self::MB),
            ffi::OPUS_BANDWIDTH_WIDEBAND => Ok(Self::WB),
            ffi::OPUS_BANDWIDTH_SUPERWIDEBAND => Ok(Self::SWB),
            ffi::OPUS_BANDWIDTH_FULLBAND => Ok(Self::FB),
            other => Err(CodecError::from_code(other).unwrap_or(CodecError::InvalidPacket)),
        }
    }
}

impl std::fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NB => write!(f, "NB"),
            Self::MB => write!(f, "MB"),
            Self::WB => write!(f, "WB"),
            Self::SWB => write!(f, "SWB"),
            Self::FB => write!(f, "FB"),
        }
    }
}

/// Returns the packet pointer and length, rejecting empty packets.
///
/// The header-only queries read the TOC byte unconditionally.
fn raw(packet: &[u8]) -> Result<(*const u8, i32)> {
    if packet.is_empty() {
        return Err(CodecError::InvalidPacket);
    }
    let len = i32::try_from(packet.len()).map_err(|_| CodecError::InvalidPacket)?;
    Ok((packet.as_ptr(), len))
}

/// Returns the number of frames in the packet.
pub fn frame_count(packet: &[u8]) -> Result<u32> {
    let (data, len) = raw(packet)?;
    let n = check(unsafe { ffi::opus_packet_get_nb_frames(data, len) })?;
    Ok(n as u32)
}

/// Returns the number of channels signalled in the packet header.
pub fn channel_count(packet: &[u8]) -> Result<u32> {
    let (data, _) = raw(packet)?;
    let n = check(unsafe { ffi::opus_packet_get_nb_channels(data) })?;
    Ok(n as u32)
}

/// Returns the samples per frame, per channel, at 48 kHz.
pub fn samples_per_frame(packet: &[u8]) -> Result<u32> {
    let (data, _) = raw(packet)?;
    let n = check(unsafe { ffi::opus_packet_get_samples_per_frame(data, SAMPLING_RATE) })?;
    Ok(n as u32)
}

/// Returns the total samples per channel in the packet at 48 kHz.
pub fn sample_count(packet: &[u8]) -> Result<u32> {
    let (data, len) = raw(packet)?;
    let n = check(unsafe { ffi::opus_packet_get_nb_samples(data, len, SAMPLING_RATE) })?;
    Ok(n as u32)
}

/// Returns the audio bandwidth of the packet.
pub fn bandwidth(packet: &[u8]) -> Result<Bandwidth> {
    let (data, _) = raw(packet)?;
    Bandwidth::from_ffi(unsafe { ffi::opus_packet_get_bandwidth(data) })
}
