use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use docshift_core::{Config, ConvertOptions, ImageOptions, LineEnding, TextEncoding};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "docshift")]
#[command(about = "Convert documents between DOCX, Markdown and plain text, and images between raster formats")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a file to another format
    Convert {
        /// Input file (.md, .docx, .txt or an image)
        input: PathBuf,

        /// Target extension: md, docx, txt, jpg, png, webp, gif or bmp
        #[arg(long)]
        to: String,

        /// Output file (defaults to input name with the target extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML file overriding the default styling
        #[arg(long)]
        config: Option<PathBuf>,

        /// Target text encoding: utf-8, utf-16le or utf-16be
        #[arg(long)]
        encoding: Option<String>,

        /// Target line endings: lf, crlf or cr
        #[arg(long)]
        line_endings: Option<String>,

        /// Scale images down to at most this width
        #[arg(long)]
        max_width: Option<u32>,

        /// Scale images down to at most this height
        #[arg(long)]
        max_height: Option<u32>,

        /// JPEG quality in percent
        #[arg(long, default_value_t = 92, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,
    },

    /// List the formats a file can be converted to
    Formats {
        input: PathBuf,
    },

    /// Print text statistics for a file
    Stats {
        input: PathBuf,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docshift=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Convert {
            input,
            to,
            output,
            config,
            encoding,
            line_endings,
            max_width,
            max_height,
            quality,
        } => convert(
            &input,
            &to,
            output,
            config.as_deref(),
            encoding.as_deref(),
            line_endings.as_deref(),
            ImageOptions {
                max_width,
                max_height,
                quality,
            },
        ),
        Command::Formats { input } => formats(&input),
        Command::Stats { input } => stats(&input),
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn read_input(input: &Path) -> Vec<u8> {
    match fs::read(input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {}", input.display(), e);
            std::process::exit(1);
        }
    }
}

fn convert(
    input: &Path,
    target: &str,
    output: Option<PathBuf>,
    config_path: Option<&Path>,
    encoding: Option<&str>,
    line_endings: Option<&str>,
    image: ImageOptions,
) {
    let config = match config_path {
        Some(path) => Config::load(path).unwrap_or_else(|e| fail(e)),
        None => Config::compiled_default(),
    };

    let options = ConvertOptions {
        encoding: encoding.map(|e| e.parse::<TextEncoding>().unwrap_or_else(|e| fail(e))),
        line_endings: line_endings.map(|l| l.parse::<LineEnding>().unwrap_or_else(|e| fail(e))),
        image,
    };

    let bytes = read_input(input);
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let converted = docshift_core::convert_file(&file_name, &bytes, target, &options, &config)
        .unwrap_or_else(|e| fail(e));
    debug!(mime_type = converted.mime_type, "conversion finished");

    // Determine output path
    let output = output.unwrap_or_else(|| input.with_extension(converted.extension));

    if let Err(e) = fs::write(&output, &converted.bytes) {
        eprintln!("Error writing {}: {}", output.display(), e);
        std::process::exit(1);
    }

    println!(
        "Created {} ({})",
        output.display(),
        docshift_core::format_file_size(converted.bytes.len() as u64)
    );
}

fn formats(input: &Path) {
    let name = input.to_string_lossy();
    let targets = docshift_core::supported_conversions(&name);
    if targets.is_empty() {
        fail(format!(
            "{} files are not supported",
            docshift_core::file_extension(&name)
        ));
    }
    for target in targets {
        println!("{target}");
    }
}

fn stats(input: &Path) {
    let bytes = read_input(input);
    let stats = docshift_core::text::analyze_text(&bytes);
    println!("Characters:              {}", stats.characters);
    println!("Characters (no spaces):  {}", stats.characters_no_spaces);
    println!("Words:                   {}", stats.words);
    println!("Lines:                   {}", stats.lines);
    println!("Paragraphs:              {}", stats.paragraphs);
    println!("Encoding:                {}", stats.encoding);
    println!("Size:                    {} KB", stats.size_kb());
}
