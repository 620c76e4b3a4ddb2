use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use linkpage::capture::{CaptureConfig, PageSource};
use linkpage::page::ColorScheme;
use linkpage::site::{self, SiteConfig};
use linkpage::theme::{average_color, derive_theme, rgb_to_hsl};
use linkpage::Viewport;
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Capture options when no subcommand is given
    #[command(flatten)]
    capture: CaptureArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the page into a preview image (the default)
    Capture(CaptureArgs),
    /// Render index.html from the site config
    Build(BuildArgs),
    /// Print the theme derived from an image as JSON
    Theme { image: PathBuf },
}

#[derive(Args, Clone)]
struct CaptureArgs {
    /// Page file or URL to capture
    #[arg(long, default_value = "index.html")]
    page: String,
    /// Where to write the PNG
    #[arg(short, long, default_value = "preview.png")]
    output: PathBuf,
    /// Background image to inject instead of the page's own
    #[arg(long)]
    background: Option<PathBuf>,
    #[arg(long, default_value_t = 1200)]
    width: u32,
    #[arg(long, default_value_t = 630)]
    height: u32,
    /// Upper bound on waiting for the page to settle
    #[arg(long, default_value_t = 10000)]
    settle_timeout_ms: u64,
    /// Capture in light mode
    #[arg(long)]
    light: bool,
    /// Browser executable (auto-detected by default)
    #[arg(long)]
    browser: Option<PathBuf>,
}

#[derive(Args)]
struct BuildArgs {
    /// Site config file (defaults are used if it does not exist)
    #[arg(short, long, default_value = site::CONFIG_FILE)]
    config: PathBuf,
    /// Where to write the page
    #[arg(short, long, default_value = "index.html")]
    output: PathBuf,
}

impl CaptureArgs {
    fn into_config(self) -> CaptureConfig {
        let mut cfg = CaptureConfig {
            page: PageSource::parse(&self.page),
            output: self.output,
            viewport: Viewport {
                width: self.width,
                height: self.height,
            },
            background: self.background,
            color_scheme: if self.light { ColorScheme::Light } else { ColorScheme::Dark },
            settle_timeout_ms: self.settle_timeout_ms,
            ..Default::default()
        };
        cfg.engine.browser_path = self.browser;
        cfg
    }
}

fn capture(args: CaptureArgs) -> anyhow::Result<()> {
    let cfg = args.into_config();
    let report = linkpage::capture::capture_preview(&cfg)
        .with_context(|| format!("capturing {:?}", cfg.page))?;
    println!("Preview image generated: {}", report.output.display());
    Ok(())
}

fn build(args: BuildArgs) -> anyhow::Result<()> {
    let cfg = SiteConfig::load(&args.config)?;
    let base_dir = args
        .output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let built = site::build(&cfg, &base_dir)?;
    std::fs::write(&args.output, &built.html)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!(
        "Rendered {} cards, themed: {}",
        cfg.cards.len(),
        built.controller.style().is_themed()
    );
    println!("Page written: {}", args.output.display());
    Ok(())
}

fn theme(path: PathBuf) -> anyhow::Result<()> {
    let image = image::open(&path).with_context(|| format!("decoding {}", path.display()))?;
    let average = average_color(&image);
    let theme = derive_theme(average);
    let out = serde_json::json!({
        "average": average.to_hex(),
        "hsl": rgb_to_hsl(average.r, average.g, average.b),
        "primary": theme.primary.css(),
        "accent": theme.accent.css(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Capture(args)) => capture(args),
        Some(Commands::Build(args)) => build(args),
        Some(Commands::Theme { image }) => theme(image),
        None => capture(cli.capture),
    }
}
