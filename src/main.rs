use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use elemshot::{Delivery, Document, ExportConfig, Exporter, ImageFormat, PdfPageFit, Viewport};

#[derive(Parser)]
#[command(name = "elemshot", version, about = "Capture an HTML element as an image, PDF or clipboard picture")]
struct Cli {
    /// Layout viewport width in CSS pixels
    #[arg(long, global = true, default_value_t = 1280)]
    viewport_width: u32,

    /// Layout viewport height in CSS pixels
    #[arg(long, global = true, default_value_t = 720)]
    viewport_height: u32,

    /// Device pixel ratio
    #[arg(long, global = true, default_value_t = 1.0)]
    scale: f32,

    /// Directory to save files in (defaults to the current directory)
    #[arg(long, global = true)]
    download_dir: Option<PathBuf>,

    /// Print each result as a JSON line
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy an element to the clipboard as a PNG image
    Copy {
        /// HTML file, `-` for stdin, or an http(s) URL
        input: String,
        selector: String,
        /// Which match of the selector to use
        #[arg(long, default_value_t = 0)]
        index: usize,
    },
    /// Save one or more elements as PNG or JPEG files
    Image {
        input: String,
        #[arg(required = true)]
        selectors: Vec<String>,
        /// File name without extension
        #[arg(long)]
        filename: Option<String>,
        /// png or jpg
        #[arg(long, value_parser = parse_format)]
        format: Option<ImageFormat>,
        #[arg(long)]
        quality: Option<u8>,
    },
    /// Save an element as a single-page PDF
    Pdf {
        input: String,
        selector: String,
        #[arg(long)]
        filename: Option<String>,
        /// Keep the standard page height instead of fitting the image
        #[arg(long)]
        standard_page: bool,
        #[arg(long, default_value_t = 0)]
        index: usize,
    },
}

fn parse_format(s: &str) -> Result<ImageFormat, String> {
    s.parse::<ImageFormat>().map_err(|e| e.to_string())
}

fn load_document(input: &str) -> anyhow::Result<Document> {
    if input == "-" {
        return Ok(Document::from_reader(std::io::stdin().lock())?);
    }
    if input.starts_with("http://") || input.starts_with("https://") {
        #[cfg(feature = "fetch")]
        {
            return Ok(Document::fetch(input, concat!("elemshot/", env!("CARGO_PKG_VERSION")))?);
        }
        #[cfg(not(feature = "fetch"))]
        bail!("loading URLs requires the `fetch` feature");
    }
    Document::from_path(input).with_context(|| format!("reading {}", input))
}

fn report(delivery: &Delivery, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(delivery)?);
        return Ok(());
    }
    match delivery {
        Delivery::Clipboard { width, height } => println!("copied {}x{} image to the clipboard", width, height),
        Delivery::Saved { path } => println!("saved {}", path.display()),
        Delivery::Opened { path } => println!("opened {}", path.display()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut config = ExportConfig {
        viewport: Viewport { width: cli.viewport_width, height: cli.viewport_height },
        scale: cli.scale,
        ..Default::default()
    };
    if let Some(dir) = cli.download_dir.clone() {
        config.download_dir = Some(dir);
    }

    match cli.command {
        Command::Copy { input, selector, index } => {
            let doc = load_document(&input)?;
            let element = doc.nth_element(&selector, index)?;
            let exporter = Exporter::desktop(config)?;
            let delivery = exporter.copy_to_clipboard(&element).await?;
            report(&delivery, cli.json)?;
        }
        Command::Image { input, selectors, filename, format, quality } => {
            if let Some(q) = quality {
                config.jpeg_quality = q;
            }
            let doc = load_document(&input)?;
            let elements = selectors
                .iter()
                .map(|s| doc.element(s))
                .collect::<elemshot::Result<Vec<_>>>()?;
            let exporter = Exporter::desktop(config)?;

            let names: Vec<Option<String>> = (0..elements.len())
                .map(|i| match (&filename, elements.len()) {
                    (name, 1) => name.clone(),
                    (Some(name), _) => Some(format!("{}-{}", name, i + 1)),
                    (None, _) => Some(format!("{}-{}", exporter.config().default_filename, i + 1)),
                })
                .collect();

            let exports = elements
                .iter()
                .zip(&names)
                .map(|(el, name)| exporter.download_as_image(el, name.as_deref(), format));
            let results = futures::future::join_all(exports).await;

            let mut failed = 0;
            for (selector, result) in selectors.iter().zip(results) {
                match result {
                    Ok(delivery) => report(&delivery, cli.json)?,
                    Err(e) => {
                        failed += 1;
                        log::error!("{}: {}", selector, e);
                    }
                }
            }
            if failed > 0 {
                bail!("{} of {} exports failed", failed, selectors.len());
            }
        }
        Command::Pdf { input, selector, filename, standard_page, index } => {
            if standard_page {
                config.pdf_page_fit = PdfPageFit::StandardPage;
            }
            let doc = load_document(&input)?;
            let element = doc.nth_element(&selector, index)?;
            let exporter = Exporter::desktop(config)?;
            let delivery = exporter.download_as_pdf(&element, filename.as_deref()).await?;
            report(&delivery, cli.json)?;
        }
    }
    Ok(())
}
