use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use array2im_core::colormap::array_to_image;
use array2im_core::config::RenderConfig;
use array2im_core::io::image_io::{
    encode_image, format_from_name, format_from_path, ImageFormat, JpegQuality,
};
use array2im_core::io::npy::{read_input_record, RealArray};
use clap::Args;

use crate::overwrite::{check_destination, OverwritePolicy};
use crate::summary::print_render_summary;
use crate::terminal::{stdin_is_terminal, stdout_is_terminal, Messages};

const STD_STREAM: &str = "-";

#[derive(Args)]
pub struct ConvertArgs {
    /// Input file. Default: <stdin>.
    #[arg(short = 'i', long = "in", value_name = "PATH", default_value = STD_STREAM)]
    pub input: PathBuf,

    /// Output file. Default: <stdout>.
    #[arg(short, long = "out", value_name = "PATH", default_value = STD_STREAM)]
    pub output: PathBuf,

    /// Adjust brightness. Default: 1.
    #[arg(short, long, value_parser = parse_brightness, allow_hyphen_values = true)]
    pub brightness: Option<f64>,

    /// Adjust contrast. Default: 1.
    #[arg(short, long, value_parser = parse_contrast, allow_hyphen_values = true)]
    pub contrast: Option<f64>,

    /// JPEG quality, between 1 and 100. Only valid when saving image as a JPEG. Default: 95.
    #[arg(short, long, value_parser = parse_quality, allow_hyphen_values = true)]
    pub quality: Option<JpegQuality>,

    /// Save progressive JPEG. Only valid when saving image as a JPEG.
    #[arg(short, long)]
    pub progressive: bool,

    /// Overwrite output file, if it exists.
    #[arg(short = 'y', long, conflicts_with = "no_overwrite")]
    pub overwrite: bool,

    /// Do not overwrite output file, if it exists.
    #[arg(short = 'n', long)]
    pub no_overwrite: bool,

    /// Image format (png, jpeg, tiff, bmp, ...). Default: from the output
    /// file extension, or PNG for <stdout>.
    #[arg(short, long, value_parser = parse_format)]
    pub format: Option<ImageFormat>,

    /// Render settings file (TOML). Command-line flags take precedence.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

fn parse_number(name: &str, expected: &str, s: &str) -> std::result::Result<f64, String> {
    s.trim().parse::<f64>().map_err(|_| {
        format!("Bad parameter for {name}. Expected {expected}, got '{s}' instead.")
    })
}

fn parse_brightness(s: &str) -> std::result::Result<f64, String> {
    parse_number("brightness", "floating point or integer", s)
}

fn parse_contrast(s: &str) -> std::result::Result<f64, String> {
    parse_number("contrast", "floating point or integer", s)
}

fn parse_quality(s: &str) -> std::result::Result<JpegQuality, String> {
    let bad = || format!("Bad parameter for quality. Expected integer between 1 and 100, got '{s}' instead.");
    let value = s.trim().parse::<i64>().map_err(|_| bad())?;
    JpegQuality::new(value).map_err(|e| e.to_string())
}

fn parse_format(s: &str) -> std::result::Result<ImageFormat, String> {
    format_from_name(s).ok_or_else(|| format!("Unknown image format '{s}'."))
}

fn is_std_stream(path: &Path) -> bool {
    path.as_os_str() == STD_STREAM
}

/// Merge the optional config file with command-line overrides.
fn resolve_config(args: &ConvertArgs) -> Result<RenderConfig> {
    let mut config: RenderConfig = if let Some(ref path) = args.config {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid render config {}", path.display()))?
    } else {
        RenderConfig::default()
    };

    if let Some(brightness) = args.brightness {
        config.colormap.brightness = brightness;
    }
    if let Some(contrast) = args.contrast {
        config.colormap.contrast = contrast;
    }
    if let Some(quality) = args.quality {
        config.jpeg.quality = quality;
    }
    if args.progressive {
        config.jpeg.progressive = true;
    }

    config.validate()?;
    tracing::debug!(?config, "Resolved render config");
    Ok(config)
}

fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if is_std_stream(path) {
        if stdin_is_terminal() {
            bail!(
                "Surely you are not typing the raw data into the terminal. \
                 Please specify input file, or pipe input from another program."
            );
        }
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn load_array(input: Box<dyn Read>, path: &Path) -> Result<RealArray> {
    let raw = read_input_record(input)
        .with_context(|| format!("Failed to read array from {}", display_name(path, "<stdin>")))?;
    Ok(raw.into_real_2d()?)
}

fn display_name(path: &Path, std_name: &str) -> String {
    if is_std_stream(path) {
        std_name.to_string()
    } else {
        path.display().to_string()
    }
}

pub fn run(args: &ConvertArgs, verbose: bool) -> Result<()> {
    let mut messages = Messages::detect();
    let config = resolve_config(args)?;
    let input = open_input(&args.input)?;

    let to_stdout = is_std_stream(&args.output);
    let format = if to_stdout {
        if stdout_is_terminal() {
            bail!(
                "Cowardly refusing to write binary data to terminal. \
                 Please specify output file, or redirect output to a pipe."
            );
        }
        eprintln!("Writing data to <stdout>.");
        args.format.unwrap_or(ImageFormat::Png)
    } else {
        let format = match args.format {
            Some(format) => format,
            None => format_from_path(&args.output).with_context(|| {
                format!(
                    "Cannot determine image format of '{}'; use --format",
                    args.output.display()
                )
            })?,
        };
        let policy = OverwritePolicy::from_flags(args.overwrite, args.no_overwrite);
        let interactive = stdin_is_terminal() && stdout_is_terminal();
        check_destination(&args.output, policy, interactive, &mut messages)?;
        format
    };

    let input_name = display_name(&args.input, "<stdin>");
    let output_name = display_name(&args.output, "<stdout>");

    if verbose {
        print_render_summary(&messages, &input_name, &output_name, format, &config)?;
    }

    let array = load_array(input, &args.input)?;
    if array.discarded_imaginary {
        messages.warn(&format!("Discarding imaginary part of '{}' array.", array.kind))?;
    }
    if config.colormap.brightness <= 0.0 {
        messages.warn(&format!(
            "Brightness should be positive, got {}.",
            config.colormap.brightness
        ))?;
    }

    let start = Instant::now();
    messages.partial(&format!(
        "Saving {}\u{d7}{} image to '{}'... ",
        array.width(),
        array.height(),
        output_name
    ))?;

    let img = array_to_image(&array.data, &config.colormap);
    let options = config.encode_options();
    if to_stdout {
        encode_image(&img, format, &options, BufWriter::new(io::stdout().lock()))?;
    } else {
        let file = File::create(&args.output)
            .with_context(|| format!("Failed to create {}", args.output.display()))?;
        encode_image(&img, format, &options, BufWriter::new(file))?;
    }

    messages.line(&format!("{:.2} seconds", start.elapsed().as_secs_f64()))?;
    Ok(())
}
