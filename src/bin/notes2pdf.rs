//! CLI binary for notes2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `TranslationConfig`, shows progress, and writes the results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use notes2pdf::{translate, TranslationConfig, DEFAULT_MODEL};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI definition ───────────────────────────────────────────────────────────

/// Translate a PDF of handwritten notes into a clean, styled English PDF.
#[derive(Parser, Debug)]
#[command(name = "notes2pdf", version, about, long_about = None)]
struct Cli {
    /// Path to the handwritten-notes PDF
    input: PathBuf,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Model identifier
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Override the built-in translation prompt with the contents of a file
    #[arg(long, value_name = "FILE")]
    prompt_file: Option<PathBuf>,

    /// Output PDF path
    #[arg(short, long, default_value = "Translated_Notes.pdf")]
    output: PathBuf,

    /// Also write the intermediate markdown translation to this path
    #[arg(long, value_name = "FILE")]
    markdown_out: Option<PathBuf>,

    /// Print the markdown translation to stdout before rendering
    #[arg(long)]
    preview: bool,

    /// Verbose logging (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "notes2pdf=info",
        _ => "notes2pdf=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Atomic write: temp file in the target directory, then rename.
fn write_atomic(path: &PathBuf, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let tmp = path.with_extension("tmp");
    let mut file =
        std::fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("writing {}", tmp.display()))?;
    file.flush()?;
    std::fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let payload = std::fs::read(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let display_name = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "notes.pdf".to_string());

    let mut builder = TranslationConfig::builder().model(&cli.model);
    if let Some(ref prompt_file) = cli.prompt_file {
        let prompt = std::fs::read_to_string(prompt_file)
            .with_context(|| format!("reading prompt file {}", prompt_file.display()))?;
        builder = builder.prompt(prompt);
    }
    let config = builder.build()?;

    eprintln!(
        "{} {} {}",
        bold("notes2pdf"),
        dim("·"),
        dim(&format!("model {}", config.model))
    );

    let bar = spinner("Translating handwritten notes…");
    let output = translate(&payload, &display_name, &cli.api_key, &config).await;
    bar.finish_and_clear();

    let output = match output {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{} {e}", red("✗"));
            std::process::exit(1);
        }
    };

    if cli.preview {
        println!("{}", output.markdown);
    }

    if let Some(ref md_path) = cli.markdown_out {
        write_atomic(md_path, output.markdown.as_bytes())?;
        eprintln!("{} markdown written to {}", green("✓"), md_path.display());
    }

    match (output.document, output.render_error) {
        (Some(doc), _) => {
            write_atomic(&cli.output, doc.bytes())?;
            eprintln!(
                "{} {} {}",
                green("✓"),
                bold(&cli.output.display().to_string()),
                dim(&format!(
                    "({} bytes, {}ms total)",
                    doc.bytes().len(),
                    output.stats.total_ms
                ))
            );
            Ok(())
        }
        (None, Some(e)) => {
            // The translation itself succeeded; keep it visible.
            if !cli.preview && cli.markdown_out.is_none() {
                println!("{}", output.markdown);
            }
            eprintln!("{} {e}", red("✗"));
            bail!("failed to generate the PDF layout");
        }
        (None, None) => bail!("pipeline returned neither a document nor an error"),
    }
}
