//! Batch command - process every report under a folder-per-patient input root.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::{MatchOptions, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use rtvue_core::catalog::TemplateId;
use rtvue_core::extraction::{DirCropSink, Pipeline, RecordAggregator};
use rtvue_core::models::config::DatasetFormat;
use rtvue_core::models::record::SourceRecord;

use super::{create_engine, load_config};
use crate::export::Exporter;

/// Image extensions picked up by the walker.
const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input root containing one sub-folder per patient
    #[arg(required = true)]
    input_root: PathBuf,

    /// Output directory for the aggregated datasets
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Dataset format
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Directory for the prepared region crops
    #[arg(long)]
    crops_dir: Option<PathBuf>,

    /// Do not write region crops
    #[arg(long)]
    no_crops: bool,

    /// Also write a per-file run summary CSV
    #[arg(long)]
    summary: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for DatasetFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => DatasetFormat::Csv,
            FormatArg::Json => DatasetFormat::Json,
        }
    }
}

/// Per-file line of the run summary.
struct FileOutcome {
    path: PathBuf,
    folder: String,
    template: Option<TemplateId>,
    error: Option<String>,
    processing_time_ms: u64,
}

/// Per-folder export result.
struct FolderOutcome {
    folder: String,
    files: Vec<PathBuf>,
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(dir) = args.output_dir.clone() {
        config.output.output_dir = dir;
    }
    if let Some(format) = args.format {
        config.output.format = format.into();
    }
    if let Some(dir) = args.crops_dir.clone() {
        config.output.crops_dir = dir;
    }
    if args.no_crops {
        config.output.save_crops = false;
    }

    if !args.input_root.is_dir() {
        anyhow::bail!("Input root not found: {}", args.input_root.display());
    }

    let files = find_reports(&args.input_root)?;
    if files.is_empty() {
        anyhow::bail!(
            "No report images found under {}",
            args.input_root.display()
        );
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let engine = create_engine(&config.ocr, args.model_dir.clone())?;
    let mut pipeline = Pipeline::new(engine, config.extraction.clone());
    if config.output.save_crops {
        let sink = DirCropSink::new(&config.output.crops_dir)?;
        info!("Writing region crops to {}", sink.dir().display());
        pipeline = pipeline.with_crop_sink(Box::new(sink));
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("=>-"),
    );

    // Images are processed one at a time, in walker order
    let mut aggregator = RecordAggregator::new();
    let mut outcomes = Vec::with_capacity(files.len());

    for (path, folder) in files {
        pb.set_message(folder.clone());
        let processed = pipeline.process_file(&path, &folder);

        outcomes.push(FileOutcome {
            path: processed.path.clone(),
            folder: processed.folder.clone(),
            template: processed.template,
            error: processed.error.clone(),
            processing_time_ms: processed.processing_time_ms,
        });
        aggregator.push(SourceRecord::new(processed.folder, processed.fields));

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    // Export per folder; one folder failing does not stop the others
    let exporter = Exporter::new(
        &config.output.output_dir,
        config.output.file_suffix.clone(),
        config.output.format,
        chrono::Local::now().naive_local(),
    );

    let mut exports = Vec::new();
    for folder in aggregator.aggregate() {
        match exporter.export_folder(&folder) {
            Ok(files) => exports.push(FolderOutcome {
                folder: folder.folder,
                files,
                error: None,
            }),
            Err(e) => {
                error!("Export of folder {} failed: {}", folder.folder, e);
                exports.push(FolderOutcome {
                    folder: folder.folder,
                    files: Vec::new(),
                    error: Some(e.to_string()),
                });
            }
        }
    }

    if args.summary {
        fs::create_dir_all(&config.output.output_dir)?;
        let summary_path = config.output.output_dir.join("run_summary.csv");
        write_summary(&summary_path, &outcomes)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    print_summary(&outcomes, &exports, start);

    Ok(())
}

/// Every image at `<root>/<folder>/<file>`, paired with its folder name.
/// Names that are not valid UTF-8 are kept, with the folder name converted
/// lossily.
fn find_reports(root: &Path) -> anyhow::Result<Vec<(PathBuf, String)>> {
    let patterns = IMAGE_EXTENSIONS
        .iter()
        .map(|ext| Pattern::new(&format!("*.{}", ext)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut files = Vec::new();
    for entry in fs::read_dir(root)? {
        let dir = entry?.path();
        if !dir.is_dir() {
            continue;
        }
        let Some(folder) = dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping unreadable folder {}: {}", dir.display(), e);
                continue;
            }
        };
        for entry in entries.filter_map(|r| r.ok()) {
            let path = entry.path();
            if path.is_file() && is_image(&path, &patterns) {
                files.push((path, folder.clone()));
            }
        }
    }

    files.sort();
    Ok(files)
}

fn is_image(path: &Path, patterns: &[Pattern]) -> bool {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    patterns.iter().any(|p| p.matches_with(&name, options))
}

fn write_summary(path: &Path, outcomes: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "folder",
        "status",
        "template",
        "processing_time_ms",
        "error",
    ])?;

    for outcome in outcomes {
        let filename = outcome
            .path
            .file_name()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();

        wtr.write_record([
            &*filename,
            &outcome.folder,
            if outcome.error.is_none() { "success" } else { "error" },
            &outcome
                .template
                .map(|t| t.to_string())
                .unwrap_or_default(),
            &outcome.processing_time_ms.to_string(),
            outcome.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn print_summary(outcomes: &[FileOutcome], exports: &[FolderOutcome], start: Instant) {
    let failed: Vec<_> = outcomes.iter().filter(|o| o.error.is_some()).collect();
    let failed_exports: Vec<_> = exports.iter().filter(|e| e.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(outcomes.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    for export in exports.iter().filter(|e| e.error.is_none()) {
        for file in &export.files {
            println!("   {} {}", style(&export.folder).cyan(), file.display());
        }
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            println!(
                "  - {}: {}",
                outcome.path.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if !failed_exports.is_empty() {
        println!();
        println!("{}", style("Failed exports:").red());
        for export in &failed_exports {
            println!(
                "  - {}: {}",
                export.folder,
                export.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_find_reports() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("DOE")).unwrap();
        fs::create_dir_all(root.join("ROE")).unwrap();
        fs::write(root.join("DOE").join("b.jpg"), b"").unwrap();
        fs::write(root.join("DOE").join("a.PNG"), b"").unwrap();
        fs::write(root.join("DOE").join("notes.txt"), b"").unwrap();
        fs::write(root.join("ROE").join("c.jpeg"), b"").unwrap();
        fs::write(root.join("top.jpg"), b"").unwrap();

        let found = find_reports(root).unwrap();
        let found: Vec<(String, String)> = found
            .into_iter()
            .map(|(p, folder)| (p.file_name().unwrap().to_string_lossy().into_owned(), folder))
            .collect();

        assert_eq!(
            found,
            vec![
                ("a.PNG".to_string(), "DOE".to_string()),
                ("b.jpg".to_string(), "DOE".to_string()),
                ("c.jpeg".to_string(), "ROE".to_string()),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_find_reports_non_utf8_folder() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join(OsStr::from_bytes(b"JO\xC3O"));
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("a.jpg"), b"").unwrap();
        fs::write(folder.join(OsStr::from_bytes(b"\xFF.png")), b"").unwrap();

        let found = find_reports(dir.path()).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|(_, name)| name == "JO\u{FFFD}O"));
        assert!(found.iter().any(|(path, _)| path == &folder.join("a.jpg")));
    }
}
