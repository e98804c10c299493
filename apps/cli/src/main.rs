use std::{
    num::NonZeroU32,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;
use walkthrough_core::{
    ChatCompletionsClient, ExplanationGenerator, MetadataClient, Provider, ReasoningError,
    ReasoningService, TranscriptCascade, extract_video_id, format_explanations_readable,
    generate_explanations_with_progress, reasoning::DEFAULT_REQUEST_TIMEOUT,
};

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Openai,
    Grok,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Parser)]
#[command(name = "walkthrough")]
#[command(about = "Explain a YouTube coding tutorial, one interval at a time")]
struct Cli {
    /// Video URL or 11-character video id
    url: String,

    /// Seconds of video covered by each explanation
    #[arg(short, long, default_value = "15")]
    interval: NonZeroU32,

    /// AI provider for explanations
    #[arg(short, long, default_value = "openai")]
    provider: CliProvider,

    /// Override the provider's default model
    #[arg(short, long)]
    model: Option<String>,

    /// Print explanations as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .expect("valid spinner template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid progress template")
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Logs go to stderr and stay quiet unless `RUST_LOG` asks otherwise.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_generator(provider: Provider, model: Option<String>) -> Result<ExplanationGenerator> {
    match ChatCompletionsClient::for_provider(provider, model, DEFAULT_REQUEST_TIMEOUT) {
        Ok(client) => {
            let reasoner: Arc<dyn ReasoningService> = Arc::new(client);
            Ok(ExplanationGenerator::new(reasoner))
        }
        Err(ReasoningError::Provider(e)) => {
            eprintln!(
                "{} {} (continuing with placeholder explanations)",
                style("Warning:").yellow().bold(),
                e
            );
            Ok(ExplanationGenerator::disabled())
        }
        Err(e) => Err(e).context("failed to build reasoning client"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();
    let provider: Provider = cli.provider.into();

    let Some(video_id) = extract_video_id(&cli.url) else {
        eprintln!("{} Not a YouTube URL: {}", style("Error:").red().bold(), cli.url);
        std::process::exit(1);
    };

    let generator = build_generator(provider, cli.model)?;
    let client = reqwest::Client::builder()
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()?;
    let metadata_client =
        MetadataClient::new(client.clone(), std::env::var("YOUTUBE_API_KEY").ok());
    let transcripts = TranscriptCascade::youtube(client);

    let quiet = cli.json;
    if !quiet {
        println!(
            "\n{}  {}\n",
            style("walkthrough").cyan().bold(),
            style("Tutorial Explainer").dim()
        );
        println!("{}", style("─".repeat(60)).dim());
    }

    let total_start = Instant::now();

    // Step 1: Metadata
    let metadata = metadata_client.fetch(&video_id).await;
    if !quiet {
        println!(
            "{} {} {}",
            style("✓").green().bold(),
            metadata.title,
            style(format!("({}, {})", metadata.channel, metadata.duration)).dim()
        );
    }

    // Step 2: Transcript
    let step_start = Instant::now();
    let spinner = (!quiet).then(|| create_spinner("Fetching transcript..."));
    let fetched = transcripts.fetch(&video_id).await;
    let (segments, is_sample) = match fetched {
        Some(fetched) => {
            let is_sample = fetched.is_sample();
            (fetched.segments, is_sample)
        }
        None => (Vec::new(), false),
    };
    if let Some(spinner) = spinner {
        spinner.finish_with_message(format!(
            "{} Transcript: {} segments {} {}",
            style("✓").green().bold(),
            segments.len(),
            if is_sample {
                style("(sample)").yellow()
            } else {
                style("").dim()
            },
            style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
        ));
    }

    // Step 3: Explanations
    let step_start = Instant::now();
    let progress = (!quiet).then(create_progress_bar);
    let explanations =
        generate_explanations_with_progress(&generator, &segments, cli.interval, |done, total, record| {
            if let Some(pb) = &progress {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
                pb.set_message(record.title.clone());
            }
        })
        .await;

    if quiet {
        let output = serde_json::json!({
            "videoId": video_id,
            "metadata": metadata,
            "isSample": is_sample,
            "explanations": explanations,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(pb) = progress {
        pb.finish_with_message(format!(
            "{} Explained {} intervals with {} {}",
            style("✓").green().bold(),
            explanations.len(),
            if generator.is_enabled() {
                provider.name()
            } else {
                "fallback"
            },
            style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
        ));
    }

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    println!("{}", style("─".repeat(60)).dim());

    // Human-readable output
    println!("{}", format_explanations_readable(&explanations));

    Ok(())
}
