use std::fs::File;
use std::io::{BufWriter, Write};
use std::mem::size_of;
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};
use pulsetone_core::synth::{AudioSink, AudioTrack, LoopPoints, PcmFormat};
use pulsetone_core::SinkError;
use tracing::{debug, info};

const WAVE_FORMAT_PCM: u16 = 1;

/// Canonical 44-byte RIFF/WAVE header. Multi-byte fields are stored
/// little-endian regardless of host order.
#[derive(Copy, Clone, Debug)]
#[repr(C, packed)]
struct WavHeader {
    riff: [u8; 4],
    riff_length: u32,
    wave: [u8; 4],
    fmt: [u8; 4],
    fmt_length: u32,
    audio_format: u16,
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
    data: [u8; 4],
    data_length: u32,
}

const WAV_HEADER_LENGTH: usize = size_of::<WavHeader>();

unsafe impl Zeroable for WavHeader {}
unsafe impl Pod for WavHeader {}

impl WavHeader {
    fn new(format: &PcmFormat, data_length: u32) -> Result<Self, SinkError> {
        let block_align = u16::try_from(format.bytes_per_frame())
            .map_err(|_| SinkError::Rejected(format!("frame size of {format:?} exceeds WAV limit")))?;
        let byte_rate = format.sample_rate
            .checked_mul(block_align as u32)
            .ok_or_else(|| SinkError::Rejected(format!("byte rate of {format:?} exceeds WAV limit")))?;
        let riff_length = (WAV_HEADER_LENGTH as u32 - 8)
            .checked_add(data_length)
            .ok_or_else(|| SinkError::Rejected(format!("{data_length} data bytes exceed WAV size limit")))?;

        Ok(Self {
            riff: *b"RIFF",
            riff_length: riff_length.to_le(),
            wave: *b"WAVE",
            fmt: *b"fmt ",
            fmt_length: 16u32.to_le(),
            audio_format: WAVE_FORMAT_PCM.to_le(),
            channels: format.channels.to_le(),
            sample_rate: format.sample_rate.to_le(),
            byte_rate: byte_rate.to_le(),
            block_align: block_align.to_le(),
            bits_per_sample: format.bits_per_sample.to_le(),
            data: *b"data",
            data_length: data_length.to_le(),
        })
    }
}

/// Audio sink that renders each played track into a WAV file.
///
/// A real device loops forever; here a looped track is written out as
/// `loops` repetitions of its loop range.
pub struct WavFileSink {
    path: PathBuf,
    loops: usize,
}

impl WavFileSink {
    pub fn new<P: AsRef<Path>>(path: P, loops: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            loops,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AudioSink for WavFileSink {
    type Track = WavTrack;

    fn configure(&mut self, format: PcmFormat, buffer_bytes: usize) -> Result<Self::Track, SinkError> {
        if format.channels != 1 || format.bits_per_sample != 16 {
            return Err(SinkError::Rejected(format!("unsupported format {format:?}")));
        }

        Ok(WavTrack {
            path: self.path.clone(),
            format,
            data: Vec::with_capacity(buffer_bytes),
            capacity: buffer_bytes,
            loops: self.loops,
        })
    }
}

pub struct WavTrack {
    path: PathBuf,
    format: PcmFormat,
    data: Vec<u8>,
    capacity: usize,
    loops: usize,
}

impl WavTrack {
    fn rendered(&self, loop_points: Option<LoopPoints>) -> Result<Vec<u8>, SinkError> {
        let loop_points = match loop_points {
            None => return Ok(self.data.clone()),
            Some(loop_points) => loop_points,
        };

        let frame = self.format.bytes_per_frame();
        let (start, end) = (loop_points.start * frame, loop_points.end * frame);
        if start > end || end > self.data.len() {
            return Err(SinkError::Rejected(format!("loop points {loop_points:?} outside buffer")));
        }

        let range = &self.data[start..end];
        let mut rendered = Vec::with_capacity(start + range.len() * self.loops);
        rendered.extend_from_slice(&self.data[..start]);
        for _ in 0..self.loops {
            rendered.extend_from_slice(range);
        }
        Ok(rendered)
    }
}

impl AudioTrack for WavTrack {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        if self.data.len() + bytes.len() > self.capacity {
            return Err(SinkError::Rejected(format!("write of {} bytes overflows {} byte track", bytes.len(), self.capacity)));
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    fn play(&mut self, loop_points: Option<LoopPoints>) -> Result<(), SinkError> {
        let rendered = self.rendered(loop_points)?;
        let data_length = u32::try_from(rendered.len())
            .map_err(|_| SinkError::Rejected(format!("{} bytes exceeds WAV size limit", rendered.len())))?;

        let header = WavHeader::new(&self.format, data_length)?;

        let mut file_out = BufWriter::new(File::create(&self.path)?);
        file_out.write_all(bytemuck::bytes_of(&header))?;
        file_out.write_all(&rendered)?;
        file_out.flush()?;

        info!(path = %self.path.display(), bytes = rendered.len(), looped = loop_points.is_some(), "wav written");
        Ok(())
    }

    fn release(self) -> Result<(), SinkError> {
        debug!(path = %self.path.display(), "wav track released");
        Ok(())
    }
}
