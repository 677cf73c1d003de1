#![no_std]

pub mod bitmap;
pub mod csource;
pub mod format;
pub mod rle;

extern crate alloc;

pub use bitmap::CompressedBitmap;
pub use format::{Format, Tone};
pub use rle::{Raster, RleError, decode, encode};
