//! Process command - extract fields from a single report image.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::{debug, info};

use rtvue_core::extraction::{DirCropSink, Pipeline, ProcessedFile, is_two_eye, partition};
use rtvue_core::models::record::{EyeRecord, FieldMap};

use super::{create_engine, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Report image
    #[arg(required = true)]
    input: PathBuf,

    /// Folder (patient) name; defaults to the image's parent directory
    #[arg(long)]
    folder: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Split two-eye reports into OS and OD records
    #[arg(long)]
    by_eye: bool,

    /// Write prepared region crops to this directory
    #[arg(long)]
    crops_dir: Option<PathBuf>,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain `name: value` listing
    Text,
}

/// JSON shape of a split two-eye result.
#[derive(Serialize)]
struct SplitOutput<'a> {
    #[serde(flatten)]
    file: &'a ProcessedFile,
    eyes: [EyeRecord; 2],
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let folder = args
        .folder
        .clone()
        .or_else(|| parent_name(&args.input))
        .unwrap_or_default();

    info!("Processing file: {}", args.input.display());

    let engine = create_engine(&config.ocr, args.model_dir.clone())?;
    let mut pipeline = Pipeline::new(engine, config.extraction.clone());
    if let Some(dir) = &args.crops_dir {
        pipeline = pipeline.with_crop_sink(Box::new(DirCropSink::new(dir)?));
    }

    let processed = pipeline.process_file(&args.input, &folder);
    if let Some(error) = &processed.error {
        anyhow::bail!("Failed to process {}: {}", args.input.display(), error);
    }

    let eyes = if args.by_eye && is_two_eye(&processed.fields) {
        let (os, od) = partition(&processed.fields);
        Some([os, od])
    } else {
        None
    };

    let output = match args.format {
        OutputFormat::Json => match eyes {
            Some(eyes) => serde_json::to_string_pretty(&SplitOutput {
                file: &processed,
                eyes,
            })?,
            None => serde_json::to_string_pretty(&processed)?,
        },
        OutputFormat::Text => format_text(&processed, eyes.as_ref()),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {}ms", processed.processing_time_ms);

    Ok(())
}

fn parent_name(path: &Path) -> Option<String> {
    path.canonicalize()
        .ok()?
        .parent()?
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
}

fn format_text(processed: &ProcessedFile, eyes: Option<&[EyeRecord; 2]>) -> String {
    let mut output = String::new();

    output.push_str(&format!("File: {}\n", processed.path.display()));
    output.push_str(&format!("Folder: {}\n", processed.folder));
    if let Some(template) = processed.template {
        output.push_str(&format!("Template: {}\n", template));
    }
    output.push_str(&format!("Time: {}ms\n", processed.processing_time_ms));

    match eyes {
        Some(eyes) => {
            for record in eyes {
                output.push_str(&format!("\n[{}]\n", record.eye_side));
                push_fields(&mut output, &record.fields);
            }
        }
        None => {
            output.push('\n');
            push_fields(&mut output, &processed.fields);
        }
    }

    output
}

fn push_fields(output: &mut String, fields: &FieldMap) {
    for (name, field) in fields.iter() {
        match field.confidence {
            Some(confidence) => {
                output.push_str(&format!("{}: {} ({:.2})\n", name, field.value, confidence))
            }
            None => output.push_str(&format!("{}: {}\n", name, field.value)),
        }
    }
}
