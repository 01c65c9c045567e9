use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use pipeline::{Client, Download, EffectModel, MediaKind, ServiceConfig, Session};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "chroma-cli")]
#[command(about = "Chroma Studio effects client - upload, generate, poll, download")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,

    /// Effect model (image-effects, video-effects)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Effect identifier applied by the generation job
    #[arg(long, global = true)]
    effect: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload an image and run a generation end to end
    Generate {
        /// Image file to process
        image: PathBuf,

        /// Directory for the downloaded result
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Print the result URL instead of downloading it
        #[arg(long)]
        no_download: bool,
    },

    /// Upload an image and print its public URL
    Upload {
        /// Image file to upload
        image: PathBuf,
    },

    /// Check the status of a job once
    Status {
        /// Job identifier returned by a submission
        job_id: String,
    },

    /// Download a result URL through the fallback tiers
    Download {
        /// Result URL to fetch
        url: String,

        /// Directory for the downloaded file
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    let mut config = ServiceConfig::default();
    if let Some(model) = cli.model.as_deref() {
        let model = EffectModel::parse(model)
            .ok_or_else(|| anyhow::anyhow!("unknown model '{model}', expected image-effects or video-effects"))?;
        config = config.with_model(model);
    }
    if let Some(effect) = cli.effect.as_deref() {
        config = config.with_effect_id(effect);
    }
    let client = Client::new(config)?;

    match cli.command {
        Commands::Generate {
            image,
            output,
            no_download,
        } => generate_command(client, image, output, no_download).await,
        Commands::Upload { image } => upload_command(client, image).await,
        Commands::Status { job_id } => status_command(client, job_id).await,
        Commands::Download { url, output } => download_command(client, url, output).await,
    }
}

async fn generate_command(
    client: Client,
    image: PathBuf,
    output: PathBuf,
    no_download: bool,
) -> Result<()> {
    let mut session = Session::new(client);

    // Ctrl-C aborts the poll loop between iterations
    let cancel = session.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    info!("Selected {:?}", image);
    let asset = session.select_file(&image).await?;
    info!("Uploaded to {}", asset.url);

    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(120));
    let outcome = session
        .generate(|phase| {
            if let Some(token) = phase.token() {
                spinner.set_message(token);
            }
        })
        .await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    match outcome.kind {
        MediaKind::Video => info!("Result video: {}", outcome.result_url),
        MediaKind::Image => info!("Result image: {}", outcome.result_url),
    }

    if no_download {
        println!("{}", outcome.result_url);
        return Ok(());
    }

    match session.download(&outcome.result_url, &output).await? {
        Download::File { path } => println!("{}", path.display()),
        Download::BrowserLink { url } => {
            warn!("All fetch tiers failed, handing the result to the browser");
            if webbrowser::open(&url).is_err() {
                println!("{url}");
            }
        }
    }

    Ok(())
}

async fn upload_command(client: Client, image: PathBuf) -> Result<()> {
    let asset = client.upload_file(&image).await?;
    println!("{}", asset.url);
    Ok(())
}

async fn status_command(client: Client, job_id: String) -> Result<()> {
    let payload = client.job_status(&job_id).await?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

async fn download_command(client: Client, url: String, output: PathBuf) -> Result<()> {
    match client.download_result(&url, &output).await? {
        Download::File { path } => println!("{}", path.display()),
        Download::BrowserLink { url } => {
            warn!("All fetch tiers failed, handing the result to the browser");
            if webbrowser::open(&url).is_err() {
                println!("{url}");
            }
        }
    }
    Ok(())
}
