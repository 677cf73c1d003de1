//! Run-length coding of quantized samples.
//!
//! Every record is a single byte:
//!
//! ```text
//!  7  6  5  4  3  2  1  0
//! [tone][  run length - 1 ]
//! ```
//!
//! Records are concatenated with no header, so width and height have to be
//! carried next to the stream. Samples are scanned in row-major order and runs
//! continue across row boundaries.

use alloc::vec::Vec;
use log::{debug, trace};

use crate::format::{Format, LENGTH_BITS, LENGTH_MASK, MAX_RUN, Tone};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RleError {
    /// The sample lies outside every quantization band.
    InvalidSample(u8),
    /// `samples` is not `width * height` long.
    DimensionMismatch {
        width: usize,
        height: usize,
        samples: usize,
    },
    /// The expanded stream can't be split into rows of `width`.
    ShapeMismatch { samples: usize, width: usize },
}

impl core::fmt::Display for RleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RleError::InvalidSample(sample) => {
                write!(f, "Sample {} is not covered by any quantization band", sample)
            }
            RleError::DimensionMismatch {
                width,
                height,
                samples,
            } => write!(
                f,
                "Expected {}x{} samples but got {}",
                width, height, samples
            ),
            RleError::ShapeMismatch { samples, width } => write!(
                f,
                "Decoded {} samples, which is not a whole number of rows of width {}: \
                 the stream is truncated or corrupted, or the width is wrong",
                samples, width
            ),
        }
    }
}

impl core::error::Error for RleError {}

type Result<T> = core::result::Result<T, RleError>;

/// A tone repeated `1..=MAX_RUN` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    tone: Tone,
    length: u8,
}

impl Run {
    pub fn new(tone: Tone, length: usize) -> Option<Self> {
        if length == 0 || length > MAX_RUN {
            return None;
        }
        Some(Self {
            tone,
            length: length as u8,
        })
    }

    pub const fn from_byte(byte: u8) -> Self {
        Self {
            tone: Tone::from_bits(byte >> LENGTH_BITS),
            length: (byte & LENGTH_MASK) + 1,
        }
    }

    pub const fn to_byte(self) -> u8 {
        (self.tone.bits() << LENGTH_BITS) | (self.length - 1)
    }

    pub const fn tone(&self) -> Tone {
        self.tone
    }

    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        self.length as usize
    }
}

/// Iterates the runs of an encoded stream.
pub fn records(data: &[u8]) -> impl Iterator<Item = Run> + '_ {
    data.iter().copied().map(Run::from_byte)
}

/// Number of samples the stream expands to.
pub fn expanded_len(data: &[u8]) -> usize {
    records(data).map(|run| run.len()).sum()
}

/// Quantizes `samples` (row-major, `width * height` long) and packs them into
/// run records.
pub fn encode(format: &Format, samples: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    if width.checked_mul(height) != Some(samples.len()) {
        return Err(RleError::DimensionMismatch {
            width,
            height,
            samples: samples.len(),
        });
    }
    let Some((&first, rest)) = samples.split_first() else {
        return Ok(Vec::new());
    };

    let max_run = format.max_run();
    let mut data = Vec::new();
    let mut run = Run {
        tone: format.classify(first)?,
        length: 1,
    };
    for &sample in rest {
        let tone = format.classify(sample)?;
        if tone == run.tone && run.len() < max_run {
            run.length += 1;
        } else {
            trace!("Run of {} x {:?}", run.len(), run.tone);
            data.push(run.to_byte());
            run = Run { tone, length: 1 };
        }
    }
    data.push(run.to_byte());

    debug!(
        "Encoded {}x{} samples into {} records",
        width,
        height,
        data.len()
    );
    Ok(data)
}

/// Expands the stream to one tone per sample.
pub fn decode_tones(data: &[u8]) -> Vec<Tone> {
    let mut tones = Vec::with_capacity(expanded_len(data));
    for run in records(data) {
        tones.resize(tones.len() + run.len(), run.tone);
    }
    tones
}

/// Expands the stream through the tone table and reshapes it into rows of
/// `width`.
pub fn decode(format: &Format, data: &[u8], width: usize) -> Result<Raster> {
    let mut samples = Vec::with_capacity(expanded_len(data));
    for run in records(data) {
        samples.resize(samples.len() + run.len(), format.sample_for(run.tone));
    }
    let raster = Raster::from_flat(samples, width)?;
    debug!(
        "Decoded {} records into {}x{} samples",
        data.len(),
        raster.width,
        raster.height
    );
    Ok(raster)
}

/// Row-major grid of 8-bit samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    samples: Vec<u8>,
}

impl Raster {
    pub fn new(width: usize, height: usize, samples: Vec<u8>) -> Result<Self> {
        if width.checked_mul(height) != Some(samples.len()) {
            return Err(RleError::DimensionMismatch {
                width,
                height,
                samples: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    fn from_flat(samples: Vec<u8>, width: usize) -> Result<Self> {
        if width == 0 || samples.len() % width != 0 {
            return Err(RleError::ShapeMismatch {
                samples: samples.len(),
                width,
            });
        }
        Ok(Self {
            width,
            height: samples.len() / width,
            samples,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        // width is only 0 for an empty raster
        self.samples.chunks_exact(self.width.max(1))
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.samples.get(y * self.width + x).copied()
    }

    pub fn encode(&self, format: &Format) -> Result<Vec<u8>> {
        encode(format, &self.samples, self.width, self.height)
    }
}

#[cfg(test)]
#[rustfmt::skip]
mod tests {
    extern crate std;

    use super::*;
    use alloc::vec;
    use strum::IntoEnumIterator;

    fn lengths(data: &[u8]) -> Vec<usize> {
        records(data).map(|run| run.len()).collect()
    }

    #[test]
    fn test_flattening_order() {
        let samples = [0, 0, 255, 255, 122, 122];
        let data = encode(&Format::DEFAULT, &samples, 2, 3).unwrap();
        assert_eq!(data, vec![0b00_000001, 0b11_000001, 0b01_000001]);
        let runs: Vec<Run> = records(&data).collect();
        assert_eq!(
            runs,
            vec![
                Run::new(Tone::Black, 2).unwrap(),
                Run::new(Tone::White, 2).unwrap(),
                Run::new(Tone::Dark, 2).unwrap(),
            ]
        );
    }

    #[test]
    fn test_single_pixel() {
        for sample in [0u8, 37, 200, 255] {
            let data = encode(&Format::DEFAULT, &[sample], 1, 1).unwrap();
            assert_eq!(data.len(), 1);
            assert_eq!(lengths(&data), vec![1]);
        }
    }

    #[test]
    fn test_run_cap() {
        let samples = [195u8; 70];
        let data = encode(&Format::DEFAULT, &samples, 70, 1).unwrap();
        assert_eq!(data, vec![0b10_111111, 0b10_000101]);
        assert_eq!(lengths(&data), vec![64, 6]);

        let data = encode(&Format::DEFAULT, &[0u8; 128], 16, 8).unwrap();
        assert_eq!(lengths(&data), vec![64, 64]);
    }

    #[test]
    fn test_lower_run_cap() {
        let format = Format::DEFAULT.with_max_run(16).unwrap();
        let data = encode(&format, &[255u8; 40], 8, 5).unwrap();
        assert_eq!(lengths(&data), vec![16, 16, 8]);
        assert!(records(&data).all(|run| run.tone() == Tone::White));
    }

    #[test]
    fn test_runs_span_rows() {
        let samples = [
            0, 0, 0,
            0, 255, 255,
        ];
        let data = encode(&Format::DEFAULT, &samples, 3, 2).unwrap();
        assert_eq!(lengths(&data), vec![4, 2]);
    }

    #[test]
    fn test_last_run_is_flushed() {
        let samples = [0, 0, 0, 255];
        let data = encode(&Format::DEFAULT, &samples, 4, 1).unwrap();
        assert_eq!(records(&data).last(), Run::new(Tone::White, 1));
        assert_eq!(expanded_len(&data), 4);
    }

    #[test]
    fn test_dimension_mismatch() {
        assert_eq!(
            encode(&Format::DEFAULT, &[0; 5], 2, 3),
            Err(RleError::DimensionMismatch { width: 2, height: 3, samples: 5 })
        );
        assert_eq!(
            encode(&Format::DEFAULT, &[0; 4], usize::MAX, 2),
            Err(RleError::DimensionMismatch { width: usize::MAX, height: 2, samples: 4 })
        );
        assert_eq!(encode(&Format::DEFAULT, &[], 0, 4), Ok(Vec::new()));
    }

    #[test]
    fn test_invalid_sample_aborts() {
        let format = Format::new(
            [
                crate::format::Band::new(0, 10),
                crate::format::Band::new(121, 123),
                crate::format::Band::new(194, 196),
                crate::format::Band::new(253, 255),
            ],
            [0, 122, 195, 255],
            MAX_RUN,
        )
        .unwrap();
        assert_eq!(encode(&format, &[0, 122, 50, 255], 2, 2), Err(RleError::InvalidSample(50)));
        assert_eq!(encode(&format, &[60], 1, 1), Err(RleError::InvalidSample(60)));
    }

    #[test]
    fn test_shape_mismatch() {
        // 4 + 3 = 7 samples
        let data = [0b00_000011, 0b11_000010];
        let err = decode(&Format::DEFAULT, &data, 3).unwrap_err();
        assert_eq!(err, RleError::ShapeMismatch { samples: 7, width: 3 });
        let message = std::format!("{}", err);
        assert!(message.contains("truncated"));
        assert!(message.contains("width"));

        assert_eq!(
            decode(&Format::DEFAULT, &data, 0),
            Err(RleError::ShapeMismatch { samples: 7, width: 0 })
        );
        assert!(decode(&Format::DEFAULT, &data, 7).is_ok());
    }

    #[test]
    fn test_decode_reshapes() {
        let data = [0b00_000001, 0b11_000001, 0b01_000001];
        let raster = decode(&Format::DEFAULT, &data, 2).unwrap();
        assert_eq!(raster.width(), 2);
        assert_eq!(raster.height(), 3);
        let rows: Vec<&[u8]> = raster.rows().collect();
        assert_eq!(rows, vec![&[0u8, 0][..], &[255, 255][..], &[122, 122][..]]);
        assert_eq!(raster.get(1, 2), Some(122));
        assert_eq!(raster.get(2, 0), None);
    }

    #[test]
    fn test_round_trip_is_quantized() {
        let format = Format::DEFAULT;
        let samples: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).collect();
        let data = encode(&format, &samples, 32, 16).unwrap();
        let raster = decode(&format, &data, 32).unwrap();
        assert_eq!(raster.height(), 16);
        for (original, decoded) in samples.iter().zip(raster.samples()) {
            let tone = format.classify(*original).unwrap();
            assert_eq!(*decoded, format.sample_for(tone));
        }
    }

    #[test]
    fn test_quantized_image_is_idempotent() {
        let format = Format::DEFAULT;
        let table = format.tone_table();
        let samples: Vec<u8> = (0..240usize)
            .map(|i| table[(i / 7 + i / 50) % table.len()])
            .collect();
        let raster = Raster::new(20, 12, samples.clone()).unwrap();
        let data = raster.encode(&format).unwrap();
        let decoded = decode(&format, &data, 20).unwrap();
        assert_eq!(decoded, raster);
        assert_eq!(decoded.into_samples(), samples);
    }

    #[test]
    fn test_record_packing() {
        for tone in Tone::iter() {
            for length in [1, 2, 63, 64] {
                let run = Run::new(tone, length).unwrap();
                assert_eq!(run.to_byte(), (tone.bits() << 6) | (length as u8 - 1));
                assert_eq!(Run::from_byte(run.to_byte()), run);
            }
        }
        assert_eq!(Run::new(Tone::Black, 0), None);
        assert_eq!(Run::new(Tone::Black, 65), None);
        for byte in 0..=255u8 {
            let run = Run::from_byte(byte);
            assert!((1..=MAX_RUN).contains(&run.len()));
        }
    }

    #[test]
    fn test_decode_tones() {
        let data = [0b10_000010, 0b01_000000];
        assert_eq!(decode_tones(&data), vec![Tone::Light, Tone::Light, Tone::Light, Tone::Dark]);
        assert!(decode_tones(&[]).is_empty());
    }
}
