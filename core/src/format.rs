use embedded_graphics::pixelcolor::Gray8;
use strum::{EnumCount, IntoEnumIterator};

use crate::rle::RleError;

/// Bits of a record holding the tone.
pub const TONE_BITS: u32 = 2;
/// Bits of a record holding `run length - 1`.
pub const LENGTH_BITS: u32 = 8 - TONE_BITS;
pub const LENGTH_MASK: u8 = (1 << LENGTH_BITS) - 1;
/// Longest run a single record can describe.
pub const MAX_RUN: usize = 1 << LENGTH_BITS;

/// One of the four levels a sample is quantized to, darkest first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum_macros::EnumIter,
    strum_macros::EnumCount,
)]
#[repr(u8)]
pub enum Tone {
    Black = 0,
    Dark = 1,
    Light = 2,
    White = 3,
}

impl Tone {
    /// Reads the tone from the two low bits of `bits`.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Tone::Black,
            1 => Tone::Dark,
            2 => Tone::Light,
            _ => Tone::White,
        }
    }

    pub const fn bits(self) -> u8 {
        self as u8
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Inclusive intensity range mapped to one tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub low: u8,
    pub high: u8,
}

impl Band {
    pub const fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }

    pub const fn contains(&self, sample: u8) -> bool {
        self.low <= sample && sample <= self.high
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    /// A band whose lower edge lies above its upper edge.
    EmptyBand(Tone),
    /// Bands must be ascending and must not share any value.
    OverlappingBands(Tone, Tone),
    MaxRunOutOfRange(usize),
    /// The representative sample of this tone classifies to another tone.
    UnstableToneTable(Tone),
}

impl core::fmt::Display for FormatError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FormatError::EmptyBand(tone) => write!(f, "Band for {:?} is empty", tone),
            FormatError::OverlappingBands(a, b) => {
                write!(f, "Bands for {:?} and {:?} overlap or are out of order", a, b)
            }
            FormatError::MaxRunOutOfRange(max_run) => {
                write!(f, "Maximum run {} is outside 1..={}", max_run, MAX_RUN)
            }
            FormatError::UnstableToneTable(tone) => write!(
                f,
                "Representative sample for {:?} does not classify back to {:?}",
                tone, tone
            ),
        }
    }
}

impl core::error::Error for FormatError {}

/// Quantization bands, tone table and run cap shared by encoder and decoder.
///
/// Only the tone table has to match on both sides of the stream; the bands
/// are consulted by the encoder alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    bands: [Band; Tone::COUNT],
    tone_table: [u8; Tone::COUNT],
    max_run: usize,
}

impl Default for Format {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Format {
    /// Visually tuned for the 4-tone TFT logo: the outer edges keep dark and
    /// light detail crisp, the middle edge sits between the two grey levels.
    pub const DEFAULT: Format = Format {
        bands: [
            Band::new(0, 36),
            Band::new(37, 158),
            Band::new(159, 219),
            Band::new(220, 255),
        ],
        tone_table: [0, 122, 195, 255],
        max_run: MAX_RUN,
    };

    pub fn new(
        bands: [Band; Tone::COUNT],
        tone_table: [u8; Tone::COUNT],
        max_run: usize,
    ) -> Result<Self, FormatError> {
        if max_run == 0 || max_run > MAX_RUN {
            return Err(FormatError::MaxRunOutOfRange(max_run));
        }
        for tone in Tone::iter() {
            let band = bands[tone.index()];
            if band.low > band.high {
                return Err(FormatError::EmptyBand(tone));
            }
        }
        for (lower, upper) in Tone::iter().zip(Tone::iter().skip(1)) {
            if bands[lower.index()].high >= bands[upper.index()].low {
                return Err(FormatError::OverlappingBands(lower, upper));
            }
        }

        let format = Self {
            bands,
            tone_table,
            max_run,
        };
        for tone in Tone::iter() {
            if format.classify(format.sample_for(tone)) != Ok(tone) {
                return Err(FormatError::UnstableToneTable(tone));
            }
        }
        Ok(format)
    }

    /// Same bands and tone table with a lower run cap.
    pub fn with_max_run(self, max_run: usize) -> Result<Self, FormatError> {
        Self::new(self.bands, self.tone_table, max_run)
    }

    pub fn bands(&self) -> &[Band; Tone::COUNT] {
        &self.bands
    }

    pub fn tone_table(&self) -> &[u8; Tone::COUNT] {
        &self.tone_table
    }

    pub fn max_run(&self) -> usize {
        self.max_run
    }

    /// Whether every intensity falls into some band.
    pub fn is_total(&self) -> bool {
        let mut next = 0u16;
        for band in &self.bands {
            if u16::from(band.low) != next {
                return false;
            }
            next = u16::from(band.high) + 1;
        }
        next == 256
    }

    pub fn classify(&self, sample: u8) -> Result<Tone, RleError> {
        Tone::iter()
            .find(|tone| self.bands[tone.index()].contains(sample))
            .ok_or(RleError::InvalidSample(sample))
    }

    pub fn sample_for(&self, tone: Tone) -> u8 {
        self.tone_table[tone.index()]
    }

    /// Tone table as grey levels, indexed by tone.
    pub fn palette(&self) -> [Gray8; Tone::COUNT] {
        self.tone_table.map(Gray8::new)
    }
}
