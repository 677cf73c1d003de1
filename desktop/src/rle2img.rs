use std::{error::Error, process::ExitCode};

use argh::FromArgs;
use image::GrayImage;
use log::{error, info, warn};
use logopack_core::{csource::parse_c_source, format::Format, rle};

#[derive(FromArgs)]
/// Reconstruct an image from a run-length encoded C array
struct Args {
    /// input C source (or raw records with --raw)
    #[argh(option, short = 'i')]
    input_path: String,

    /// output image path, the extension picks the format
    #[argh(option, short = 'o')]
    output_path: String,

    /// image width, defaults to the *_WIDTH define of the input
    #[argh(option, short = 'w')]
    width: Option<usize>,

    /// read bare records instead of C source
    #[argh(switch)]
    raw: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let (data, width, height) = if args.raw {
        (std::fs::read(&args.input_path)?, None, None)
    } else {
        let source = parse_c_source(&std::fs::read_to_string(&args.input_path)?)?;
        (source.data, source.width, source.height)
    };
    let width = args
        .width
        .or(width)
        .ok_or("No width given and the input has no width define")?;

    let raster = rle::decode(&Format::DEFAULT, &data, width)?;
    if let Some(height) = height
        && height != raster.height()
    {
        warn!(
            "Input declares a height of {} but decoded {} rows",
            height,
            raster.height()
        );
    }
    info!(
        "Decoded {} bytes into a {}x{} image",
        data.len(),
        raster.width(),
        raster.height()
    );

    let image = GrayImage::from_raw(
        raster.width() as u32,
        raster.height() as u32,
        raster.into_samples(),
    )
    .ok_or("Decoded image does not fit its dimensions")?;
    image.save(&args.output_path)?;
    info!("Image saved to {}", args.output_path);
    Ok(())
}
