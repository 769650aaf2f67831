//! glyphdocx CLI - positioned-glyph stream to .docx converter

use std::fs;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use glyphdocx::{
    docx_from_template, document_to_docx_content, layout, read_file_with_stats, to_json,
    ContentOptions, ExtractionStats, IngestOptions, JsonFormat, Template,
};

#[derive(Parser, Debug)]
#[command(name = "glyphdocx")]
#[command(version)]
#[command(about = "Rebuild paragraphs from a positioned-glyph stream and write .docx", long_about = None)]
struct Cli {
    /// Intermediate file with page/span/char/image tags
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// .docx file to create
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Write the raw content fragment
    #[arg(long = "o-content", value_name = "PATH")]
    o_content: Option<PathBuf>,

    /// Write the reconstructed structure as JSON
    #[arg(long = "o-json", value_name = "PATH")]
    o_json: Option<PathBuf>,

    /// Template .docx to splice the content into
    #[arg(short, long, value_name = "PATH", env = "GLYPHDOCX_TEMPLATE")]
    template: Option<PathBuf>,

    /// Also leave the package unpacked in <OUTPUT>.dir/
    #[arg(short, long)]
    preserve_dir: bool,

    /// Empty paragraphs between paragraphs
    #[arg(short, long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    spacing: bool,

    /// Rotated text boxes for rotated paragraphs
    #[arg(short, long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    rotation: bool,

    /// Keep images: inline drawings plus their media parts
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    images: bool,

    /// Start a new span at every vertical character offset (stress test)
    #[arg(long)]
    autosplit: bool,

    /// More logging; repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Print extraction statistics
    #[arg(long)]
    stats: bool,
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level(cli.verbose)),
    )
    .init();

    match run(&cli) {
        Ok(stats) => {
            if cli.stats {
                println!("{}", "Statistics".cyan().bold());
                println!("{}", "─".repeat(40).dimmed());
                println!("{}", stats);
            }
            println!("{}", "Finished.".green().bold());
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<ExtractionStats, Box<dyn std::error::Error>> {
    let pb = if cli.verbose == 0 {
        ProgressBar::new(4)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    let mut stats = ExtractionStats::new();

    pb.set_message("Reading glyph stream...");
    let ingest = IngestOptions::new()
        .with_autosplit(cli.autosplit)
        .with_images(cli.images);
    let mut doc = read_file_with_stats(&cli.input, &ingest, &mut stats)?;
    pb.inc(1);

    pb.set_message("Reconstructing lines and paragraphs...");
    layout::join_document(&mut doc, &mut stats)?;
    pb.inc(1);

    if let Some(path) = &cli.o_json {
        fs::write(path, to_json(&doc, JsonFormat::Pretty)?)?;
        log::info!("wrote {}", path.display());
    }

    pb.set_message("Emitting content...");
    let options = ContentOptions::new()
        .with_spacing(cli.spacing)
        .with_rotation(cli.rotation)
        .with_images(cli.images);
    let content = document_to_docx_content(&doc, &options)?;
    pb.inc(1);

    if let Some(path) = &cli.o_content {
        fs::write(path, &content)?;
        log::info!("wrote {}", path.display());
    }

    if let Some(path) = &cli.output {
        pb.set_message("Writing package...");
        let template = match &cli.template {
            Some(template) => Template::from_docx(template)?,
            None => Template::builtin(),
        };
        docx_from_template(&content, &doc, &template, path, cli.preserve_dir)?;
    }
    pb.inc(1);
    pb.finish_and_clear();

    Ok(stats)
}
