//! Audio outputs: raw PCM and WAV files

use std::io::{self, Seek, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use hound::{SampleFormat, WavSpec, WavWriter};

/// A destination for recovered audio
///
/// Samples are mono, signed 16-bit.
pub trait AudioOut {
    /// Write samples
    fn write_samples(&mut self, samples: &[i16]) -> io::Result<()>;

    /// Complete the output
    ///
    /// No further samples may be written.
    fn finish(&mut self) -> io::Result<()>;
}

/// Raw little-endian PCM, with no header
#[derive(Debug)]
pub struct RawPcm<W: Write> {
    out: W,
}

impl<W: Write> RawPcm<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> AudioOut for RawPcm<W> {
    fn write_samples(&mut self, samples: &[i16]) -> io::Result<()> {
        for sa in samples {
            self.out.write_i16::<LittleEndian>(*sa)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// WAV file: PCM, mono, 16 bits per sample
///
/// The lengths in the header are filled in by
/// [`finish()`](AudioOut::finish). Writing after `finish()`
/// is an error.
pub struct WavFile<W: Write + Seek> {
    writer: Option<WavWriter<W>>,
}

impl<W: Write + Seek> WavFile<W> {
    /// Start a WAV file at the given sampling `rate` (Hz)
    pub fn new(out: W, rate: u32) -> io::Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::new(out, spec).map_err(wav_error)?;
        Ok(Self {
            writer: Some(writer),
        })
    }
}

impl<W: Write + Seek> AudioOut for WavFile<W> {
    fn write_samples(&mut self, samples: &[i16]) -> io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "WAV file already finished"))?;
        for sa in samples {
            writer.write_sample(*sa).map_err(wav_error)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(writer) => writer.finalize().map_err(wav_error),
            None => Ok(()),
        }
    }
}

// hound wraps I/O errors; unwrap those, box the rest
fn wav_error(err: hound::Error) -> io::Error {
    match err {
        hound::Error::IoError(e) => e,
        other => io::Error::new(io::ErrorKind::Other, other),
    }
}

// fan out to every output
impl AudioOut for Vec<Box<dyn AudioOut>> {
    fn write_samples(&mut self, samples: &[i16]) -> io::Result<()> {
        for out in self.iter_mut() {
            out.write_samples(samples)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        for out in self.iter_mut() {
            out.finish()?;
        }
        Ok(())
    }
}
