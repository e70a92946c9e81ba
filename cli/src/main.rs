//! pdf2data CLI - extract text, images and tables from PDF documents

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdf2data::{
    DocumentResult, ExtractOptions, NativeExtractor, PageExtractor, Pipeline, TableDetectorConfig,
};

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "pdf2data")]
#[command(version)]
#[command(about = "Extract text, images and tables from PDF documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Zero-shot region detection on rendered pages, OCR on text regions
    Detect {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        raster: RasterArgs,

        #[command(flatten)]
        args: DetectArgs,
    },

    /// Layout analysis on rendered pages, OCR on text and table regions
    Layout {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        raster: RasterArgs,

        #[command(flatten)]
        args: LayoutArgs,
    },

    /// Embedded text, images and tables read from the PDF itself
    Native {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        args: NativeArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Input PDF file
    #[arg(long = "pdf_file", value_name = "FILE")]
    pdf_file: PathBuf,

    /// Save extracted images to the output directory
    #[arg(long = "save_images", requires = "output_path")]
    save_images: bool,

    /// Directory for saved images
    #[arg(long = "output_path", value_name = "DIR")]
    output_path: Option<PathBuf>,

    /// Fail on the first page error instead of skipping the page
    #[arg(long)]
    strict: bool,

    /// Also write the full result as JSON
    #[arg(long = "json_output", value_name = "FILE")]
    json_output: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Args)]
struct RasterArgs {
    /// Rendering resolution in dots per inch
    #[arg(long, default_value_t = pdf2data::DEFAULT_DPI)]
    dpi: u32,

    /// OCR language (tesseract language code)
    #[arg(long, default_value = "eng")]
    lang: String,

    /// Tesseract page segmentation mode
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=13))]
    psm: Option<u8>,
}

#[derive(Args)]
struct DetectArgs {
    /// Grounding DINO ONNX model
    #[arg(long = "detector_model", env = "PDF2DATA_DETECTOR_MODEL", value_name = "FILE")]
    detector_model: Option<PathBuf>,

    /// tokenizer.json matching the detector model
    #[arg(long, env = "PDF2DATA_TOKENIZER", value_name = "FILE")]
    tokenizer: Option<PathBuf>,

    /// Minimum box score
    #[arg(long = "box_threshold", default_value_t = 0.35)]
    box_threshold: f32,

    /// Minimum prompt score
    #[arg(long = "text_threshold", default_value_t = 0.25)]
    text_threshold: f32,

    /// Detection prompt as "prompt=label" (repeatable, replaces the defaults)
    #[arg(long = "label", value_name = "PROMPT=LABEL")]
    labels: Vec<String>,

    /// Label whose regions are OCR'd for page text
    #[arg(long = "text_label", default_value = "text")]
    text_label: String,

    /// Run the model on CUDA when available
    #[arg(long = "use_gpu")]
    use_gpu: bool,
}

#[derive(Args)]
struct LayoutArgs {
    /// PaddleDetection layout ONNX model
    #[arg(long = "layout_model", env = "PDF2DATA_LAYOUT_MODEL", value_name = "FILE")]
    layout_model: Option<PathBuf>,

    /// Class labels in model output order
    #[arg(
        long = "layout_labels",
        value_delimiter = ',',
        default_value = "text,title,list,table,figure"
    )]
    layout_labels: Vec<String>,

    /// Minimum region score
    #[arg(long = "score_threshold", default_value_t = 0.5)]
    score_threshold: f32,

    /// Text inserted between consecutive text regions
    #[arg(long = "region_separator", default_value = "")]
    region_separator: String,

    /// Run the model on CUDA when available
    #[arg(long = "use_gpu")]
    use_gpu: bool,
}

#[derive(Args)]
struct NativeArgs {
    /// Minimum rows for a table
    #[arg(long = "min_rows")]
    min_rows: Option<usize>,

    /// Minimum columns for a table
    #[arg(long = "min_columns")]
    min_columns: Option<usize>,

    /// Maximum columns for a table
    #[arg(long = "max_columns")]
    max_columns: Option<usize>,

    /// Minimum horizontal gap between columns, in points
    #[arg(long = "min_column_gap")]
    min_column_gap: Option<f32>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Detect {
            common,
            raster,
            args,
        } => cmd_detect(&common, &raster, args),
        Commands::Layout {
            common,
            raster,
            args,
        } => cmd_layout(&common, &raster, args),
        Commands::Native { common, args } => cmd_native(&common, args),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        let mut cause = e.source();
        while let Some(inner) = cause {
            eprintln!("  {} {}", "caused by:".dimmed(), inner);
            cause = inner.source();
        }
        std::process::exit(1);
    }
}

#[cfg(feature = "onnx")]
fn cmd_detect(common: &CommonArgs, raster: &RasterArgs, args: DetectArgs) -> CliResult {
    use pdf2data::{
        DetectionExtractor, DetectionOptions, DetectionThresholds, GroundingDino,
        GroundingDinoConfig, Ontology, Pdftoppm, SessionOptions,
    };

    let model = args
        .detector_model
        .ok_or("--detector_model (or PDF2DATA_DETECTOR_MODEL) is required")?;
    let tokenizer = args
        .tokenizer
        .ok_or("--tokenizer (or PDF2DATA_TOKENIZER) is required")?;

    let ontology = if args.labels.is_empty() {
        Ontology::default()
    } else {
        Ontology::parse(args.labels.as_slice())?
    };
    let options = DetectionOptions::new()
        .with_ontology(ontology)
        .with_thresholds(DetectionThresholds {
            box_threshold: args.box_threshold,
            text_threshold: args.text_threshold,
        })
        .with_text_label(args.text_label);

    let config = GroundingDinoConfig {
        session: SessionOptions::default().with_gpu(args.use_gpu),
        ..Default::default()
    };
    let detector = GroundingDino::new(model, tokenizer, config)?;

    let mut extractor = DetectionExtractor::with_options(
        Box::new(Pdftoppm::new()),
        Box::new(detector),
        Box::new(tesseract(raster)),
        options,
    );
    run(&mut extractor, common, raster.dpi)
}

#[cfg(feature = "onnx")]
fn cmd_layout(common: &CommonArgs, raster: &RasterArgs, args: LayoutArgs) -> CliResult {
    use pdf2data::{
        LayoutExtractor, LayoutOptions, PaddleLayout, PaddleLayoutConfig, Pdftoppm,
        RegionRecognizerConfig, SessionOptions,
    };

    let model = args
        .layout_model
        .ok_or("--layout_model (or PDF2DATA_LAYOUT_MODEL) is required")?;

    let config = PaddleLayoutConfig {
        session: SessionOptions::default().with_gpu(args.use_gpu),
        labels: args.layout_labels,
        score_threshold: args.score_threshold,
        recognizer: RegionRecognizerConfig::for_dpi(raster.dpi),
        ..Default::default()
    };
    let engine = PaddleLayout::new(model, Box::new(tesseract(raster)), config)?;

    let mut extractor = LayoutExtractor::with_options(
        Box::new(Pdftoppm::new()),
        Box::new(engine),
        LayoutOptions::new().with_region_separator(args.region_separator),
    );
    run(&mut extractor, common, raster.dpi)
}

#[cfg(not(feature = "onnx"))]
fn cmd_detect(_: &CommonArgs, _: &RasterArgs, _: DetectArgs) -> CliResult {
    Err("the detect strategy needs a build with the `onnx` feature".into())
}

#[cfg(not(feature = "onnx"))]
fn cmd_layout(_: &CommonArgs, _: &RasterArgs, _: LayoutArgs) -> CliResult {
    Err("the layout strategy needs a build with the `onnx` feature".into())
}

fn cmd_native(common: &CommonArgs, args: NativeArgs) -> CliResult {
    let mut config = TableDetectorConfig::new();
    if let Some(rows) = args.min_rows {
        config = config.with_min_rows(rows);
    }
    if let Some(columns) = args.min_columns {
        config = config.with_min_columns(columns);
    }
    if let Some(columns) = args.max_columns {
        config = config.with_max_columns(columns);
    }
    if let Some(gap) = args.min_column_gap {
        config = config.with_min_column_gap(gap);
    }

    let mut extractor = NativeExtractor::with_table_config(config);
    run(&mut extractor, common, pdf2data::DEFAULT_DPI)
}

#[cfg(feature = "onnx")]
fn tesseract(raster: &RasterArgs) -> pdf2data::Tesseract {
    let mut config = pdf2data::TesseractConfig::new().with_language(raster.lang.as_str());
    if let Some(psm) = raster.psm {
        config = config.with_psm(psm);
    }
    pdf2data::Tesseract::with_config(config)
}

fn run(extractor: &mut dyn PageExtractor, common: &CommonArgs, dpi: u32) -> CliResult {
    let mut options = ExtractOptions::new()
        .with_dpi(dpi)
        .with_save_images(common.save_images);
    if let Some(dir) = &common.output_path {
        options = options.with_output_dir(dir);
    }
    if common.strict {
        options = options.strict();
    }
    log::debug!("Running {} with {:?}", extractor.name(), options);

    let pb = progress_bar(common.quiet);
    let result = Pipeline::new(options).run_with_progress(extractor, &common.pdf_file, |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    });
    pb.finish_and_clear();
    let result = result?;

    print_pages(&result);

    if let Some(path) = &common.json_output {
        fs::write(path, result.to_json()?)?;
        eprintln!("{} {}", "Saved to".green(), path.display());
    }
    if common.save_images {
        if let Some(dir) = &common.output_path {
            eprintln!(
                "{} {} images to {}",
                "Saved".green(),
                result.image_count(),
                dir.display()
            );
        }
    }

    Ok(())
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] page {pos}/{len}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

fn print_pages(result: &DocumentResult) {
    for (index, text) in result.texts() {
        println!("Page {}: {}", index, text);
    }
}
