use std::{error::Error, process::ExitCode};

use argh::FromArgs;
use log::{error, info};
use logopack_core::{
    csource::CSource,
    format::{Format, MAX_RUN},
    rle,
};

#[derive(FromArgs)]
/// Convert an image into a 4-tone run-length encoded C array
struct Args {
    /// input image path
    #[argh(option, short = 'i')]
    input_path: String,

    /// output path
    #[argh(option, short = 'o')]
    output_path: String,

    /// name of the generated array
    #[argh(option, default = "String::from(\"Logo\")")]
    symbol: String,

    /// prefix of the generated width/height defines
    #[argh(option, default = "String::from(\"LOGO\")")]
    prefix: String,

    /// longest run a single record may hold (1-64)
    #[argh(option, default = "MAX_RUN")]
    max_run: usize,

    /// write the bare records instead of C source
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
    let format = Format::DEFAULT.with_max_run(args.max_run)?;
    let image = image::open(&args.input_path)?.into_luma8();
    let width = image.width() as usize;
    let height = image.height() as usize;

    let data = rle::encode(&format, image.as_raw(), width, height)?;
    info!(
        "Compressed {}x{} image ({} samples) to {} bytes",
        width,
        height,
        width * height,
        data.len()
    );

    if args.raw {
        std::fs::write(&args.output_path, &data)?;
    } else {
        let source = CSource {
            symbol: &args.symbol,
            prefix: &args.prefix,
            width,
            height,
            data: &data,
        };
        std::fs::write(&args.output_path, source.to_string())?;
    }
    info!("Conversion complete, data saved to {}", args.output_path);
    Ok(())
}
