use clap::{ArgGroup, Parser, Subcommand};
use convert_me::config::{self, ConverterConfig};
use convert_me::imaging::Dimensions;
use convert_me::{ConversionOptions, ConversionResult, ImageFormat, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

fn version_string() -> &'static str {
    if env!("CONVERT_ME_RELEASE_TAG") == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    match env!("CONVERT_ME_GIT_HASH") {
        "" => "dev@unknown",
        // Leaked once at startup
        hash => Box::leak(format!("dev@{hash}").into_boxed_str()),
    }
}

#[derive(Parser)]
#[command(name = "convert-me")]
#[command(about = "Convert images between formats, with resizing and size targets")]
#[command(long_about = "\
Convert images between formats, with resizing and size targets

Targets: JPEG, PNG, WebP, GIF, BMP, TIFF, ICO.
Inputs:  .jpg .jpeg .png .gif .bmp .webp .tiff .tif .ico

Outputs land next to each source with the new extension. Existing files
are never replaced unless --overwrite is given; instead a numbered name
is chosen: photo.png → photo (1).png → photo (2).png.

With --target-size-kb, JPEG and WebP quality is searched (up to 10 trial
encodes, in memory) for the best result under the budget. The budget is
best-effort: if even the lowest quality is too large, that is what gets
written.

Defaults can be set in convert-me.toml; run 'convert-me gen-config'.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./convert-me.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log search iterations and pipeline steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one or more images
    Convert(ConvertArgs),
    /// Show format, dimensions and size of images
    Info {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List conversion target formats
    Formats,
    /// Print a stock convert-me.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
#[command(group(ArgGroup::new("resize").args(["exact", "max_width", "max_height", "percent"])))]
struct ConvertArgs {
    /// Files or directories to convert
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Target format (jpg, png, webp, gif, bmp, tiff, ico)
    #[arg(long = "to", value_parser = parse_target_format)]
    format: Option<ImageFormat>,

    /// JPEG/WebP quality, 1-100
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,

    /// Size budget in KiB (JPEG/WebP only)
    #[arg(long)]
    target_size_kb: Option<u64>,

    /// Resize to exactly WIDTHxHEIGHT (0 keeps that axis)
    #[arg(long, value_name = "WxH", value_parser = parse_dimensions)]
    exact: Option<Dimensions>,

    /// Shrink to at most this width
    #[arg(long)]
    max_width: Option<u32>,

    /// Shrink to at most this height
    #[arg(long)]
    max_height: Option<u32>,

    /// Scale both axes by this percentage
    #[arg(long)]
    percent: Option<u32>,

    /// Do not keep the aspect ratio with --max-width / --max-height
    #[arg(long)]
    stretch: bool,

    /// Output file (single input only)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replace existing output files
    #[arg(long)]
    overwrite: bool,

    /// Descend into subdirectories of directory inputs
    #[arg(short, long)]
    recursive: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

fn parse_target_format(s: &str) -> Result<ImageFormat, String> {
    match ImageFormat::from_name(s) {
        Some(f) if f.is_valid_conversion_target() => Ok(f),
        Some(f) => Err(format!("{f} cannot be a conversion target")),
        None => Err(format!("unknown format '{s}'")),
    }
}

fn parse_dimensions(s: &str) -> Result<Dimensions, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let parse = |v: &str| v.trim().parse::<u32>().map_err(|e| format!("'{v}': {e}"));
    Ok(Dimensions::new(parse(w)?, parse(h)?))
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "convert_me=debug"
    } else {
        "convert_me=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Convert(args) => {
            let cwd = std::env::current_dir()?;
            let cfg = config::load_config(cli.config.as_deref(), &cwd)?;
            run_convert(args, &cfg)?;
        }
        Command::Info { inputs, json } => {
            let mut infos = Vec::new();
            for input in &inputs {
                infos.push(convert_me::get_image_info(input)?);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&infos)?);
            } else {
                for info in &infos {
                    output::print_image_info(info);
                }
            }
        }
        Command::Formats => output::print_formats(),
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }

    Ok(())
}

fn run_convert(args: ConvertArgs, cfg: &ConverterConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sources = expand_inputs(&args.inputs, args.recursive);
    if sources.is_empty() {
        return Err("no supported images found in the given inputs".into());
    }
    if args.output.is_some() && sources.len() > 1 {
        return Err("--output can only be used with a single input file".into());
    }

    let options = build_options(&args, cfg);
    init_thread_pool(&cfg.processing);

    let converted = convert_me::convert_batch(&sources, &options);
    let results: Vec<(PathBuf, ConversionResult)> = sources.into_iter().zip(converted).collect();

    if args.json {
        let json: Vec<_> = results
            .iter()
            .map(|(source, result)| serde_json::json!({ "source": source, "result": result }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        let outcomes: Vec<(&Path, &ConversionResult)> =
            results.iter().map(|(s, r)| (s.as_path(), r)).collect();
        output::print_batch(&outcomes);
    }

    let failed = results.iter().filter(|(_, r)| !r.success).count();
    if failed > 0 {
        return Err(format!("{failed} conversion(s) failed").into());
    }
    Ok(())
}

/// Merge flags over config defaults.
fn build_options(args: &ConvertArgs, cfg: &ConverterConfig) -> ConversionOptions {
    let defaults = &cfg.defaults;
    let format = args.format.unwrap_or_else(|| defaults.target_format());

    let mut options = ConversionOptions::for_format(format)
        .with_quality(args.quality.unwrap_or(defaults.quality))
        .with_target_size_kb(args.target_size_kb.unwrap_or(defaults.target_size_kb))
        .with_aspect_ratio(defaults.maintain_aspect_ratio && !args.stretch)
        .with_overwrite(args.overwrite || defaults.overwrite);

    if let Some(d) = args.exact {
        options = options.with_exact_size(d.width, d.height);
    } else if let Some(w) = args.max_width {
        options = options.with_max_width(w);
    } else if let Some(h) = args.max_height {
        options = options.with_max_height(h);
    } else if let Some(p) = args.percent {
        options = options.with_percentage(p);
    }
    if let Some(out) = &args.output {
        options = options.with_output_path(out);
    }
    options
}

/// Directories expand to the supported images inside them; files pass
/// through untouched so missing or odd inputs still get a result line.
fn expand_inputs(inputs: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            sources.push(input.clone());
            continue;
        }
        let walker = WalkDir::new(input)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .sort_by_file_name();
        sources.extend(
            walker
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| convert_me::is_supported_extension(p)),
        );
    }
    sources
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
