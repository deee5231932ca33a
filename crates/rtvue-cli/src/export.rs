//! Writing aggregated datasets to disk.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::debug;

use rtvue_core::error::ExportError;
use rtvue_core::extraction::{Dataset, FolderDatasets};
use rtvue_core::models::config::DatasetFormat;

/// Where and how datasets are written.
///
/// Never overwrites a file, whether it predates the run or was written
/// earlier by the same exporter.
pub struct Exporter {
    dir: PathBuf,
    suffix: String,
    format: DatasetFormat,
    timestamp: NaiveDateTime,
    written: RefCell<HashSet<PathBuf>>,
}

impl Exporter {
    pub fn new(
        dir: impl Into<PathBuf>,
        suffix: impl Into<String>,
        format: DatasetFormat,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
            format,
            timestamp,
            written: RefCell::new(HashSet::new()),
        }
    }

    /// Output path of a dataset.
    pub fn path_for(&self, dataset: &Dataset) -> PathBuf {
        self.dir.join(format!(
            "{}.{}",
            dataset.file_stem(&self.suffix, &self.timestamp),
            self.format.extension()
        ))
    }

    /// Write every table of a folder. A clash with an existing output fails
    /// the folder before anything is written; otherwise stops at the first
    /// write failure.
    pub fn export_folder(&self, folder: &FolderDatasets) -> Result<Vec<PathBuf>, ExportError> {
        fs::create_dir_all(&self.dir).map_err(|e| write_error(&self.dir, e))?;

        let paths: Vec<PathBuf> = folder.datasets.iter().map(|d| self.path_for(d)).collect();
        if let Some(path) = paths.iter().find(|p| self.is_taken(p)) {
            return Err(ExportError::Exists {
                path: path.display().to_string(),
            });
        }

        for (dataset, path) in folder.datasets.iter().zip(&paths) {
            self.write(dataset, path)?;
        }
        Ok(paths)
    }

    fn is_taken(&self, path: &Path) -> bool {
        self.written.borrow().contains(path) || path.exists()
    }

    fn write(&self, dataset: &Dataset, path: &Path) -> Result<(), ExportError> {
        match self.format {
            DatasetFormat::Csv => write_csv(dataset, path)?,
            DatasetFormat::Json => write_json(dataset, path)?,
        }
        self.written.borrow_mut().insert(path.to_path_buf());
        debug!("Wrote {} rows to {}", dataset.len(), path.display());
        Ok(())
    }
}

fn write_csv(dataset: &Dataset, path: &Path) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| write_error(path, e))?;

    wtr.write_record(dataset.header())
        .map_err(|e| write_error(path, e))?;
    for row in 0..dataset.len() {
        wtr.write_record(dataset.record(row))
            .map_err(|e| write_error(path, e))?;
    }

    wtr.flush().map_err(|e| write_error(path, e))
}

fn write_json(dataset: &Dataset, path: &Path) -> Result<(), ExportError> {
    let content = serde_json::to_string_pretty(&dataset.to_json_rows()).map_err(|e| {
        ExportError::Serialize {
            dataset: dataset.folder.clone(),
            reason: e.to_string(),
        }
    })?;
    fs::write(path, content).map_err(|e| write_error(path, e))
}

fn write_error(path: &Path, e: impl std::fmt::Display) -> ExportError {
    ExportError::Write {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rtvue_core::extraction::aggregate;
    use rtvue_core::models::{ExtractedField, FieldMap, SourceRecord};

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 5, 13)
            .unwrap()
            .and_hms_opt(10, 42, 7)
            .unwrap()
    }

    fn two_eye_folder() -> FolderDatasets {
        let mut fields = FieldMap::new();
        fields.insert("Eye", ExtractedField::text("D"));
        fields.insert("Eye_2", ExtractedField::text("S"));
        fields.insert("CO_POD", ExtractedField::scored("512", 1.0));
        fields.insert("CO_POS", ExtractedField::scored("", 0.0));

        aggregate(vec![SourceRecord::new("DOE", fields)])
            .pop()
            .unwrap()
    }

    #[test]
    fn test_csv_export() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path(), "RTVue", DatasetFormat::Csv, timestamp());

        let paths = exporter.export_folder(&two_eye_folder()).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "DOE_OS_RTVue_20210513-104207.csv".to_string(),
                "DOE_OD_RTVue_20210513-104207.csv".to_string(),
            ]
        );

        let od = fs::read_to_string(&paths[1]).unwrap();
        assert_eq!(od, "Eye,CO_POD,CO_POD_conf\nD,512,1\n");
    }

    #[test]
    fn test_json_export() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("out"), "RTVue", DatasetFormat::Json, timestamp());

        let paths = exporter.export_folder(&two_eye_folder()).unwrap();
        let os: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&paths[0]).unwrap()).unwrap();
        assert_eq!(
            os,
            serde_json::json!([{"Eye_2": "S", "CO_POS": null, "CO_POS_conf": 0}])
        );
    }

    #[test]
    fn test_mixed_folder_export() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path(), "RTVue", DatasetFormat::Csv, timestamp());

        let mut single = FieldMap::new();
        single.insert("Eye", ExtractedField::text("S"));
        single.insert("SSI_OS", ExtractedField::text("70"));
        let mut both = FieldMap::new();
        both.insert("Eye", ExtractedField::text("D"));
        both.insert("Eye_2", ExtractedField::text("S"));
        both.insert("SSI_OD", ExtractedField::text("98"));
        both.insert("SSI_OS", ExtractedField::text("97"));
        let folder = aggregate(vec![
            SourceRecord::new("DOE", single),
            SourceRecord::new("DOE", both),
        ])
        .pop()
        .unwrap();

        let paths = exporter.export_folder(&folder).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "DOE_RTVue_20210513-104207.csv".to_string(),
                "DOE_OS_RTVue_20210513-104207.csv".to_string(),
                "DOE_OD_RTVue_20210513-104207.csv".to_string(),
            ]
        );
        assert_eq!(fs::read_to_string(&paths[0]).unwrap(), "Eye,SSI_OS\nS,70\n");
        assert_eq!(fs::read_to_string(&paths[2]).unwrap(), "Eye,SSI_OD\nD,98\n");
    }

    #[test]
    fn test_clashing_folder_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path(), "RTVue", DatasetFormat::Csv, timestamp());

        // Single-eye folder "DOE_OD" and two-eye folder "DOE" share an OD stem
        let mut fields = FieldMap::new();
        fields.insert("Eye", ExtractedField::text("D"));
        fields.insert("SSI_OD", ExtractedField::text("88"));
        let single = aggregate(vec![SourceRecord::new("DOE_OD", fields)])
            .pop()
            .unwrap();

        let first = exporter.export_folder(&single).unwrap();
        assert_eq!(
            first[0].file_name().unwrap().to_string_lossy(),
            "DOE_OD_RTVue_20210513-104207.csv"
        );
        let before = fs::read_to_string(&first[0]).unwrap();

        let err = exporter.export_folder(&two_eye_folder()).unwrap_err();
        match err {
            ExportError::Exists { path } => {
                assert!(path.ends_with("DOE_OD_RTVue_20210513-104207.csv"))
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(fs::read_to_string(&first[0]).unwrap(), before);
        assert!(!dir.path().join("DOE_OS_RTVue_20210513-104207.csv").exists());
    }

    #[test]
    fn test_existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("DOE_OS_RTVue_20210513-104207.csv");
        fs::write(&existing, "keep\n").unwrap();

        let exporter = Exporter::new(dir.path(), "RTVue", DatasetFormat::Csv, timestamp());
        let err = exporter.export_folder(&two_eye_folder()).unwrap_err();
        assert!(matches!(err, ExportError::Exists { .. }));
        assert_eq!(fs::read_to_string(&existing).unwrap(), "keep\n");
    }

    #[test]
    fn test_output_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("out");
        fs::write(&blocker, b"").unwrap();

        let exporter = Exporter::new(&blocker, "RTVue", DatasetFormat::Csv, timestamp());
        let err = exporter.export_folder(&two_eye_folder()).unwrap_err();
        match err {
            ExportError::Write { path, .. } => assert_eq!(path, blocker.display().to_string()),
            other => panic!("unexpected error: {}", other),
        }
    }
}
