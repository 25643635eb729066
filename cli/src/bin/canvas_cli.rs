use clap::{Parser, Subcommand};
use cli::{CanvasFile, EditJob, mime_from_path, resolve_api_key};
use color_eyre::eyre::Result;
use gemini_client::GeminiClient;
use magic_canvas::{CanvasConfig, EditResult, MagicCanvas, plan_region};
use mask::MaskMeta;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (.toml or .json); defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit one image, optionally confined to a painted mask
    Edit {
        /// Base image to edit
        #[arg(short, long)]
        image: PathBuf,
        /// Edit instruction
        #[arg(short = 'p', long)]
        instruction: String,
        /// Painted mask (white = editable)
        #[arg(short, long)]
        mask: Option<PathBuf>,
        /// Treat the painted region as protected instead
        #[arg(long)]
        invert: bool,
        /// Feather radius for the mask edge, in pixels
        #[arg(long, default_value = "0.0")]
        feather: f32,
        /// Where to write the PNG result
        #[arg(short, long)]
        output: PathBuf,
        /// Gemini API key (or set GEMINI_API_KEY environment variable)
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Run every job listed in the settings file
    Run {
        /// Gemini API key (or set GEMINI_API_KEY environment variable)
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Print the region and crop a mask would produce, without editing
    Regions {
        #[arg(short, long)]
        image: PathBuf,
        #[arg(short, long)]
        mask: PathBuf,
        #[arg(long)]
        invert: bool,
        #[arg(long, default_value = "0.0")]
        feather: f32,
    },
    /// Write a settings file filled with defaults
    Init {
        #[arg(short, long, default_value = "canvas.toml")]
        output: PathBuf,
    },
    /// Print the JSON schema of the settings file
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();
    let file = match &cli.config {
        Some(path) => CanvasFile::from_file(path)?,
        None => CanvasFile::default(),
    };

    match &cli.command {
        Commands::Edit { image, instruction, mask, invert, feather, output, api_key } => {
            let job = EditJob {
                name: "edit".to_string(),
                image: image.to_string_lossy().to_string(),
                mask: mask.as_ref().map(|m| m.to_string_lossy().to_string()),
                instruction: instruction.clone(),
                invert: *invert,
                feather: *feather,
                output: output.to_string_lossy().to_string(),
            };
            let canvas = connect(&file.canvas, api_key.as_deref())?;
            let result = run_job(&canvas, &job).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Run { api_key } => {
            if file.jobs.is_empty() {
                warn!("No jobs found in settings file");
                return Ok(());
            }
            let canvas = connect(&file.canvas, api_key.as_deref())?;
            let mut failed = 0;
            for job in &file.jobs {
                if let Err(e) = run_job(&canvas, job).await {
                    error!("Job '{}' failed: {e}", job.name);
                    failed += 1;
                }
            }
            info!("Finished {} jobs, {} failed", file.jobs.len(), failed);
        }
        Commands::Regions { image, mask, invert, feather } => {
            print_regions(&file.canvas, image, mask, MaskMeta::new(*invert, *feather)?)?;
        }
        Commands::Init { output } => {
            CanvasFile::default().to_file(output)?;
            info!("Default settings written to {:?}", output);
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(CanvasFile);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

fn connect(config: &CanvasConfig, api_key: Option<&str>) -> Result<MagicCanvas<GeminiClient>> {
    let client = GeminiClient::new(resolve_api_key(api_key)?, config.remote.clone())?;
    info!("Using model {}", client.config().model);
    Ok(MagicCanvas::new(client, config))
}

async fn run_job(canvas: &MagicCanvas<GeminiClient>, job: &EditJob) -> Result<EditResult> {
    info!("Editing '{}': {} -> {}", job.name, job.image, job.output);
    let request = job.to_request()?;

    let result = match canvas.edit(request).await {
        Ok(result) => result,
        Err(e) => {
            error!(kind = %e.kind(), status = e.kind().status_code(), "{}", e.user_message());
            return Err(e.into());
        }
    };

    if let Some(parent) = Path::new(&job.output).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&job.output, &result.png)?;
    info!("Wrote {}x{} {} to {}", result.width, result.height, result.mime_type, job.output);
    Ok(result)
}

fn print_regions(config: &CanvasConfig, image: &Path, mask: &Path, meta: MaskMeta) -> Result<()> {
    let base = std::fs::read(image)?;
    let mask = std::fs::read(mask)?;
    let (region, crop) = plan_region(config, &base, mime_from_path(image), &mask, meta)?;
    let report = serde_json::json!({ "region": region, "crop": crop });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
