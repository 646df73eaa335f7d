//! SVG Grid PDF CLI tool
//!
//! A command-line front end that batches SVG files onto grid-laid-out PDF pages.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use svg_grid_pdf::constants::{MAX_IMAGES_PER_PAGE, MIN_IMAGES_PER_PAGE};
use svg_grid_pdf::convert::{spawn_conversion, ConversionEvent, ConversionRequest};
use svg_grid_pdf::inputs::collect_inputs;
use svg_grid_pdf::layout::{GridLayout, Length, PageSize};
use svg_grid_pdf::output::OutputTarget;
use svg_grid_pdf::pdf::inspect_document;
use svg_grid_pdf::settings::ConversionSettings;

/// SVG Grid PDF - Batch SVG images into a paginated grid PDF
#[derive(Parser)]
#[command(name = "svg-grid-pdf")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Convert every SVG in a folder, 9 per A4 page
    svg-grid-pdf convert drawings/

    # Four per Letter page in standard quality
    svg-grid-pdf convert --per-page 4 --page-size letter --standard \"icons/*.svg\"

    # Preview the grid without rendering
    svg-grid-pdf layout --count 25 --per-page 6

    # Inspect a generated PDF
    svg-grid-pdf info converted_svgs.pdf")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place images onto grid pages and write one PDF
    Convert {
        /// Input images, folders or glob patterns like "*.svg" (in order)
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Directory for the output PDF
        #[arg(short = 'd', long, default_value = ".")]
        output_dir: PathBuf,

        /// Output file name without extension [default: converted_svgs]
        #[arg(short, long)]
        name: Option<String>,

        /// Output file path (overrides --output-dir and --name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Page size: A4, A3, A2, A1, A0, Letter or Legal [default: A4]
        #[arg(short, long)]
        page_size: Option<PageSize>,

        /// Images per page, 1 to 12 [default: 9]
        #[arg(long, value_parser = clap::value_parser!(u8).range(MIN_IMAGES_PER_PAGE as i64..=MAX_IMAGES_PER_PAGE as i64))]
        per_page: Option<u8>,

        /// Standard quality: 150 DPI, no enlargement
        #[arg(long)]
        standard: bool,

        /// Load settings from a JSON file (flags still take precedence)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Save the effective settings to a JSON file
        #[arg(long)]
        save_config: Option<PathBuf>,
    },

    /// Show the grid and page count for a number of images
    Layout {
        /// Number of images
        #[arg(short, long)]
        count: usize,

        /// Images per page, 1 to 12
        #[arg(long, default_value_t = 9, value_parser = clap::value_parser!(u8).range(MIN_IMAGES_PER_PAGE as i64..=MAX_IMAGES_PER_PAGE as i64))]
        per_page: u8,

        /// Page size
        #[arg(short, long, default_value = "A4")]
        page_size: PageSize,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            inputs,
            output_dir,
            name,
            output,
            page_size,
            per_page,
            standard,
            config,
            save_config,
        } => cmd_convert(
            inputs,
            output_dir,
            name,
            output,
            page_size,
            per_page,
            standard,
            config,
            save_config,
        ),
        Commands::Layout {
            count,
            per_page,
            page_size,
        } => cmd_layout(count, per_page as usize, page_size),
        Commands::Info { input } => cmd_info(input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Convert images into a grid PDF on a worker thread, printing progress
#[allow(clippy::too_many_arguments)]
fn cmd_convert(
    inputs: Vec<String>,
    output_dir: PathBuf,
    name: Option<String>,
    output: Option<PathBuf>,
    page_size: Option<PageSize>,
    per_page: Option<u8>,
    standard: bool,
    config: Option<PathBuf>,
    save_config: Option<PathBuf>,
) -> Result<()> {
    let mut settings = match &config {
        Some(path) => ConversionSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => ConversionSettings::default(),
    };
    if let Some(size) = page_size {
        settings.page_size = size;
    }
    if let Some(n) = per_page {
        settings.images_per_page = n as usize;
    }
    if standard {
        settings.high_quality = false;
    }
    if let Some(name) = name {
        settings.output_base_name = name;
    }

    if let Some(path) = &save_config {
        settings
            .save(path)
            .with_context(|| format!("saving settings to {}", path.display()))?;
        eprintln!("Saved settings to {}", path.display());
    }

    let inputs = collect_inputs(&inputs)?;
    let target = match output {
        Some(path) => OutputTarget::from_path(&path),
        None => OutputTarget::new(output_dir, settings.output_base_name.clone()),
    };

    let request = ConversionRequest {
        inputs,
        config: settings.grid_config()?,
        output: target,
    };

    let mut handle = spawn_conversion(request)?;
    while let Some(event) = handle.next_event_blocking() {
        if let ConversionEvent::Progress { current, total } = event {
            let percent = event.percent().unwrap_or(0);
            eprintln!("[{}/{}] {}%", current, total, percent);
        }
    }

    let summary = handle.join()?;
    println!("{}", summary);
    for failure in &summary.failed {
        println!("  failed: {} ({})", failure.path.display(), failure.reason);
    }

    Ok(())
}

/// Print the grid geometry and page assignment for `count` images
fn cmd_layout(count: usize, per_page: usize, page_size: PageSize) -> Result<()> {
    let grid = GridLayout::new(page_size, per_page);
    let (cell_width, cell_height) = grid.cell_size();

    println!("Page size: {} ({:.1} × {:.1} pt)", page_size, grid.page_width, grid.page_height);
    println!(
        "Grid: {} rows × {} columns ({} images per page)",
        grid.dimensions.rows, grid.dimensions.cols, per_page
    );
    println!(
        "Cell: {:.1} × {:.1} pt ({:.1} × {:.1} mm)",
        cell_width,
        cell_height,
        Length::from_pt(cell_width).mm(),
        Length::from_pt(cell_height).mm()
    );
    println!("Margin: {:.1} pt, spacing: {:.1} pt", grid.margin, grid.spacing);

    let pages = grid.pages(count);
    println!("Pages: {}", pages.len());
    for page in &pages {
        println!("  page {}: {} images", page.index + 1, page.filled_cells().count());
    }

    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: PathBuf) -> Result<()> {
    let info = inspect_document(&input)
        .with_context(|| format!("reading {}", input.display()))?;

    println!("File: {}", input.display());
    println!("Pages: {}", info.page_count);
    println!("Images: {}", info.image_count());
    for (i, count) in info.images_per_page.iter().enumerate() {
        println!("  page {}: {} images", i + 1, count);
    }

    if let Some(title) = info.title {
        println!("Title: {}", title);
    }
    if let Some(producer) = info.producer {
        println!("Producer: {}", producer);
    }

    Ok(())
}
