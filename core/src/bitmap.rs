use embedded_graphics::{
    pixelcolor::Gray2,
    prelude::{DrawTarget, OriginDimensions, Point, Size},
    primitives::Rectangle,
};
use log::trace;
use strum::EnumCount;

use crate::{
    format::Tone,
    rle::{self, RleError},
};

/// An encoded stream with its dimensions, as stored in firmware flash.
///
/// ```
/// use logopack_core::bitmap::CompressedBitmap;
///
/// static LOGO_DATA: [u8; 2] = [0xC7, 0x47];
/// static LOGO: CompressedBitmap = CompressedBitmap::new(4, 4, &LOGO_DATA);
/// assert_eq!(LOGO.width(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressedBitmap<'a> {
    width: u16,
    height: u16,
    data: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapError<E> {
    Stream(RleError),
    Target(E),
}

impl<E: core::fmt::Debug> core::fmt::Display for BitmapError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BitmapError::Stream(err) => write!(f, "Invalid bitmap stream: {}", err),
            BitmapError::Target(err) => write!(f, "Draw target error: {:?}", err),
        }
    }
}

impl<'a> CompressedBitmap<'a> {
    pub const fn new(width: u16, height: u16, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Expands the whole stream, checking it covers exactly `width * height`.
    pub fn tones(&self) -> Result<alloc::vec::Vec<Tone>, RleError> {
        let width = self.width as usize;
        let height = self.height as usize;
        let tones = rle::decode_tones(self.data);
        if tones.len() != width * height {
            return Err(RleError::DimensionMismatch {
                width,
                height,
                samples: tones.len(),
            });
        }
        Ok(tones)
    }

    /// Fills the bitmap's window at `top_left`, mapping each tone through
    /// `palette`.
    pub fn draw_with_palette<D>(
        &self,
        target: &mut D,
        top_left: Point,
        palette: &[D::Color; Tone::COUNT],
    ) -> Result<(), BitmapError<D::Error>>
    where
        D: DrawTarget,
    {
        let tones = self.tones().map_err(BitmapError::Stream)?;
        trace!(
            "Drawing {}x{} bitmap at ({}, {})",
            self.width, self.height, top_left.x, top_left.y
        );
        let area = Rectangle::new(top_left, self.size());
        target
            .fill_contiguous(&area, tones.iter().map(|tone| palette[tone.index()]))
            .map_err(BitmapError::Target)
    }

    /// Draws onto a 4-level grey target, tone `n` becoming `Gray2::new(n)`.
    pub fn draw<D>(&self, target: &mut D, top_left: Point) -> Result<(), BitmapError<D::Error>>
    where
        D: DrawTarget<Color = Gray2>,
    {
        let palette = [Tone::Black, Tone::Dark, Tone::Light, Tone::White]
            .map(|tone| Gray2::new(tone.bits()));
        self.draw_with_palette(target, top_left, &palette)
    }
}

impl OriginDimensions for CompressedBitmap<'_> {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

#[cfg(test)]
#[rustfmt::skip]
mod tests {
    extern crate std;

    use super::*;
    use crate::format::Format;
    use embedded_graphics::{mock_display::MockDisplay, pixelcolor::{Gray8, GrayColor}};

    // 2 rows of 3: black black white / white dark dark
    static DATA: [u8; 3] = [0b00_000001, 0b11_000001, 0b01_000001];
    static BITMAP: CompressedBitmap = CompressedBitmap::new(3, 2, &DATA);

    #[test]
    fn test_draw_gray2() {
        let mut display = MockDisplay::<Gray2>::new();
        BITMAP.draw(&mut display, Point::new(4, 5)).unwrap();

        let expected = [[0u8, 0, 3], [3, 1, 1]];
        for (y, row) in expected.iter().enumerate() {
            for (x, luma) in row.iter().enumerate() {
                let pixel = display.get_pixel(Point::new(4 + x as i32, 5 + y as i32));
                assert_eq!(pixel.map(|color| color.luma()), Some(*luma));
            }
        }
        assert_eq!(display.get_pixel(Point::new(3, 5)), None);
        assert_eq!(display.get_pixel(Point::new(7, 5)), None);
        assert_eq!(display.get_pixel(Point::new(4, 7)), None);
    }

    #[test]
    fn test_draw_with_tone_table() {
        let format = Format::DEFAULT;
        let mut display = MockDisplay::<Gray8>::new();
        BITMAP.draw_with_palette(&mut display, Point::zero(), &format.palette()).unwrap();
        assert_eq!(display.get_pixel(Point::new(0, 0)), Some(Gray8::new(0)));
        assert_eq!(display.get_pixel(Point::new(2, 0)), Some(Gray8::new(255)));
        assert_eq!(display.get_pixel(Point::new(1, 1)), Some(Gray8::new(122)));
    }

    #[test]
    fn test_rejects_short_stream() {
        let bitmap = CompressedBitmap::new(4, 2, &DATA);
        assert_eq!(bitmap.size(), Size::new(4, 2));
        let mut display = MockDisplay::<Gray2>::new();
        assert_eq!(
            bitmap.draw(&mut display, Point::zero()),
            Err(BitmapError::Stream(RleError::DimensionMismatch { width: 4, height: 2, samples: 6 }))
        );
        assert_eq!(display.get_pixel(Point::zero()), None);
    }
}
