use clap::{Parser, Subcommand};
use imgpress::{Category, config, output, pipeline};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imgpress")]
#[command(about = "Image derivative pipeline for storefront uploads")]
#[command(long_about = "\
Image derivative pipeline for storefront uploads

For each uploaded raster image, imgpress produces three renditions next to
the source file and retires the original once the primary rendition is
confirmed on disk:

  photo.jpg  →  photo.webp            1920x1920 inside-fit, storefront
                photo_dashboard.webp  800x800 inside-fit, admin dashboard
                photo_thumb.jpg       300x300 center-cropped thumbnail

A failed run never loses the upload: the original stays in place and the
result reports processed = false.

Run 'imgpress gen-config' to generate a documented imgpress.toml.")]
#[command(version)]
struct Cli {
    /// Config file (built-in defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the three derivatives for one uploaded file
    Process {
        /// Path to the uploaded image
        file: PathBuf,
        /// Category label for the public URL prefix
        #[arg(long, value_enum, default_value_t = Category::General)]
        category: Category,
        /// Print the result contract as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
    /// Run the pipeline over every raster file in a directory
    Batch {
        /// Directory of uploaded images
        dir: PathBuf,
        /// Category label for the public URL prefix
        #[arg(long, value_enum, default_value_t = Category::General)]
        category: Category,
        /// Recurse into subdirectories
        #[arg(long)]
        recursive: bool,
        /// Print the result contracts as JSON instead of reports
        #[arg(long)]
        json: bool,
    },
    /// Print a file's intrinsic geometry and planned derivative targets
    Probe {
        /// Path to the image
        file: PathBuf,
    },
    /// Print a stock imgpress.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    let config = config::PipelineConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Process {
            file,
            category,
            json,
        } => {
            let outcome = pipeline::process_upload(&file, category, &config);
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                output::print_outcome(&file, &outcome);
            }
        }
        Command::Batch {
            dir,
            category,
            recursive,
            json,
        } => {
            init_thread_pool(&config.processing);
            let items = pipeline::process_batch(&dir, category, &config, recursive)?;
            if json {
                let outcomes: Vec<_> = items.iter().map(|item| &item.outcome).collect();
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                output::print_batch(&items);
            }
        }
        Command::Probe { file } => {
            let dims = imgpress::imaging::probe(&file)?;
            let plans = pipeline::plan_stock_derivatives(dims)?;
            output::print_probe_report(&file, dims, &plans);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool for batch runs.
///
/// Caps at the number of available CPU cores; config can constrain down,
/// not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
