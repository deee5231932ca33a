//! Folder-level aggregation of per-image records into typed tables.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::debug;

use super::partition::{is_two_eye, partition};
use super::patterns::NUMBER;
use crate::models::record::{EyeSide, FieldMap, SourceRecord};

/// Timestamp format used in dataset file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// One table cell after type inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Number(Decimal),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl Cell {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Cell::Empty => serde_json::Value::Null,
            Cell::Number(n) if n.scale() == 0 => n
                .to_i64()
                .map(serde_json::Value::from)
                .unwrap_or_else(|| serde_json::Value::from(n.to_f64())),
            Cell::Number(n) => serde_json::Value::from(n.to_f64()),
            Cell::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Inferred type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Every non-empty cell is a decimal number.
    Numeric,
    /// At least one non-empty cell is not a number.
    Text,
    /// No cell has a value.
    Empty,
}

impl ColumnType {
    fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> Self {
        let mut kind = ColumnType::Empty;
        for cell in cells.filter(|c| !c.trim().is_empty()) {
            if parse_decimal(cell).is_none() {
                return ColumnType::Text;
            }
            kind = ColumnType::Numeric;
        }
        kind
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

/// A typed table of records from one folder, optionally for one eye.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub folder: String,
    /// `None` for a table of single-eye records.
    pub eye: Option<EyeSide>,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// Build a table from records. Columns appear in first-seen order; a record
    /// missing a column gets an empty cell.
    pub fn from_rows(folder: impl Into<String>, eye: Option<EyeSide>, records: &[FieldMap]) -> Self {
        let mut names: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut raw_rows: Vec<Vec<(usize, String)>> = Vec::with_capacity(records.len());

        for record in records {
            let mut row = Vec::new();
            for (name, value) in record.columns() {
                let i = *index.entry(name.clone()).or_insert_with(|| {
                    names.push(name);
                    names.len() - 1
                });
                row.push((i, value));
            }
            raw_rows.push(row);
        }

        let mut grid: Vec<Vec<String>> = raw_rows
            .into_iter()
            .map(|row| {
                let mut cells = vec![String::new(); names.len()];
                for (i, value) in row {
                    cells[i] = value;
                }
                cells
            })
            .collect();

        let columns: Vec<Column> = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column {
                kind: ColumnType::infer(grid.iter().map(|row| row[i].as_str())),
                name,
            })
            .collect();

        let rows = grid
            .iter_mut()
            .map(|row| {
                row.iter_mut()
                    .zip(&columns)
                    .map(|(value, column)| to_cell(std::mem::take(value), column.kind))
                    .collect()
            })
            .collect();

        Self {
            folder: folder.into(),
            eye,
            columns,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Cell of `row` under column `name`.
    pub fn cell(&self, row: usize, name: &str) -> Option<&Cell> {
        let i = self.columns.iter().position(|c| c.name == name)?;
        self.rows.get(row).and_then(|r| r.get(i))
    }

    /// A row rendered as strings, for delimited output.
    pub fn record(&self, row: usize) -> Vec<String> {
        self.rows
            .get(row)
            .map(|cells| cells.iter().map(|c| c.to_string()).collect())
            .unwrap_or_default()
    }

    /// Rows as JSON objects, numbers emitted as JSON numbers.
    pub fn to_json_rows(&self) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .map(|cells| {
                let object = self
                    .columns
                    .iter()
                    .zip(cells)
                    .map(|(column, cell)| (column.name.clone(), cell.to_json()))
                    .collect::<serde_json::Map<_, _>>();
                serde_json::Value::Object(object)
            })
            .collect()
    }

    /// `<folder>[_OD|_OS]_<suffix>_<timestamp>`
    pub fn file_stem(&self, suffix: &str, timestamp: &NaiveDateTime) -> String {
        let eye = self.eye.map(|e| format!("_{}", e)).unwrap_or_default();
        format!(
            "{}{}_{}_{}",
            self.folder,
            eye,
            suffix,
            timestamp.format(TIMESTAMP_FORMAT)
        )
    }
}

/// All tables produced for one folder: the single-eye table first, then OS,
/// then OD.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderDatasets {
    pub folder: String,
    pub datasets: Vec<Dataset>,
}

/// Buffers records per folder, in encounter order, until aggregation.
#[derive(Debug, Default)]
pub struct RecordAggregator {
    folders: Vec<(String, Vec<FieldMap>)>,
    index: HashMap<String, usize>,
}

impl RecordAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: SourceRecord) {
        let i = match self.index.get(&record.folder) {
            Some(&i) => i,
            None => {
                self.folders.push((record.folder.clone(), Vec::new()));
                self.index.insert(record.folder, self.folders.len() - 1);
                self.folders.len() - 1
            }
        };
        self.folders[i].1.push(record.fields);
    }

    /// Number of buffered records.
    pub fn len(&self) -> usize {
        self.folders.iter().map(|(_, records)| records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    pub fn aggregate(self) -> Vec<FolderDatasets> {
        self.folders
            .into_iter()
            .map(|(folder, records)| aggregate_folder(folder, records))
            .collect()
    }
}

impl Extend<SourceRecord> for RecordAggregator {
    fn extend<I: IntoIterator<Item = SourceRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

/// Group records by folder and build each folder's tables.
pub fn aggregate(records: impl IntoIterator<Item = SourceRecord>) -> Vec<FolderDatasets> {
    let mut aggregator = RecordAggregator::new();
    aggregator.extend(records);
    aggregator.aggregate()
}

fn aggregate_folder(folder: String, records: Vec<FieldMap>) -> FolderDatasets {
    let mut single = Vec::new();
    let mut os = Vec::new();
    let mut od = Vec::new();

    for record in records {
        if is_two_eye(&record) {
            let (left, right) = partition(&record);
            os.push(left.fields);
            od.push(right.fields);
        } else {
            single.push(record);
        }
    }

    debug!(
        "Folder {}: {} single-eye, {} two-eye records",
        folder,
        single.len(),
        os.len()
    );

    let mut datasets = Vec::new();
    if !single.is_empty() {
        datasets.push(Dataset::from_rows(folder.clone(), None, &single));
    }
    if !os.is_empty() {
        datasets.push(Dataset::from_rows(folder.clone(), Some(EyeSide::OS), &os));
        datasets.push(Dataset::from_rows(folder.clone(), Some(EyeSide::OD), &od));
    }

    FolderDatasets { folder, datasets }
}

/// Parse a cell as a decimal, accepting scientific notation.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    if !NUMBER.is_match(s) {
        return None;
    }

    let s = s.strip_prefix('+').unwrap_or(s);
    if s.contains(['e', 'E']) {
        return Decimal::from_scientific(s).ok();
    }

    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let digits = digits.strip_suffix('.').unwrap_or(digits);
    let digits = if digits.starts_with('.') {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };

    let value = Decimal::from_str(&digits).ok()?;
    Some(if negative { -value } else { value })
}

fn to_cell(raw: String, kind: ColumnType) -> Cell {
    if raw.trim().is_empty() {
        return Cell::Empty;
    }
    match kind {
        ColumnType::Numeric => parse_decimal(&raw).map(Cell::Number).unwrap_or(Cell::Text(raw)),
        ColumnType::Text | ColumnType::Empty => Cell::Text(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::ExtractedField;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn map(entries: &[(&str, &str)]) -> FieldMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), ExtractedField::text(*v)))
            .collect()
    }

    fn dec(s: &str) -> Cell {
        Cell::Number(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_mixed_folder_yields_three_tables() {
        let records = vec![
            SourceRecord::new("DOE", map(&[("Eye", "S"), ("SSI_OS", "70")])),
            SourceRecord::new(
                "DOE",
                map(&[("Eye", "D"), ("Eye_2", "S"), ("SSI_OD", "98"), ("SSI_OS", "97")]),
            ),
        ];

        let folders = aggregate(records);
        assert_eq!(folders.len(), 1);

        let eyes: Vec<Option<EyeSide>> = folders[0].datasets.iter().map(|d| d.eye).collect();
        assert_eq!(eyes, vec![None, Some(EyeSide::OS), Some(EyeSide::OD)]);

        let os = &folders[0].datasets[1];
        assert_eq!(os.header(), vec!["Eye_2", "SSI_OS"]);
        assert_eq!(os.cell(0, "SSI_OS"), Some(&dec("97")));

        let od = &folders[0].datasets[2];
        assert_eq!(od.header(), vec!["Eye", "SSI_OD"]);
    }

    #[test]
    fn test_single_eye_folder_yields_one_table() {
        let folders = aggregate(vec![
            SourceRecord::new("A", map(&[("Eye", "D")])),
            SourceRecord::new("A", map(&[("Eye", "S")])),
        ]);
        assert_eq!(folders[0].datasets.len(), 1);
        assert_eq!(folders[0].datasets[0].eye, None);
        assert_eq!(folders[0].datasets[0].len(), 2);
    }

    #[test]
    fn test_folders_in_encounter_order() {
        let mut aggregator = RecordAggregator::new();
        aggregator.push(SourceRecord::new("B", map(&[("K", "1")])));
        aggregator.push(SourceRecord::new("A", map(&[("K", "2")])));
        aggregator.push(SourceRecord::new("B", map(&[("K", "3")])));
        assert_eq!(aggregator.len(), 3);
        assert_eq!(aggregator.folder_count(), 2);

        let folders = aggregator.aggregate();
        let names: Vec<&str> = folders.iter().map(|f| f.folder.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);

        let b = &folders[0].datasets[0];
        assert_eq!(b.cell(0, "K"), Some(&dec("1")));
        assert_eq!(b.cell(1, "K"), Some(&dec("3")));
    }

    #[test]
    fn test_column_type_inference() {
        let rows = vec![
            map(&[("CCT", "512"), ("Patient", "Doe"), ("MRR", ""), ("Blank", "")]),
            map(&[("CCT", ""), ("Patient", "12"), ("MRR", "3.1"), ("Blank", "")]),
            map(&[("CCT", "-0.5"), ("Patient", "Roe"), ("MRR", "1e-1")]),
        ];
        let ds = Dataset::from_rows("F", None, &rows);

        let kinds: Vec<ColumnType> = ds.columns.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnType::Numeric,
                ColumnType::Text,
                ColumnType::Numeric,
                ColumnType::Empty
            ]
        );

        assert_eq!(ds.cell(1, "CCT"), Some(&Cell::Empty));
        assert_eq!(ds.cell(1, "Patient"), Some(&Cell::Text("12".to_string())));
        assert_eq!(ds.cell(2, "MRR"), Some(&dec("0.1")));
        // Missing trailing column
        assert_eq!(ds.cell(2, "Blank"), Some(&Cell::Empty));
    }

    #[test]
    fn test_confidence_columns() {
        let mut record = FieldMap::new();
        record.insert("SSI_OD", ExtractedField::scored("98", 0.5));
        let ds = Dataset::from_rows("F", Some(EyeSide::OD), &[record]);

        assert_eq!(ds.header(), vec!["SSI_OD", "SSI_OD_conf"]);
        assert_eq!(ds.record(0), vec!["98".to_string(), "0.5".to_string()]);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("98."), Decimal::from_str("98").ok());
        assert_eq!(parse_decimal(".75"), Decimal::from_str("0.75").ok());
        assert_eq!(parse_decimal("-.5"), Decimal::from_str("-0.5").ok());
        assert_eq!(parse_decimal("+3"), Decimal::from_str("3").ok());
        assert_eq!(parse_decimal("12/03/1960"), None);
    }

    #[test]
    fn test_json_rows() {
        let ds = Dataset::from_rows(
            "F",
            None,
            &[map(&[("CCT", "512"), ("K", "43.25"), ("Patient", "Doe"), ("X", "")])],
        );
        assert_eq!(
            ds.to_json_rows(),
            vec![serde_json::json!({"CCT": 512, "K": 43.25, "Patient": "Doe", "X": null})]
        );
    }

    #[test]
    fn test_file_stem() {
        let ts = NaiveDate::from_ymd_opt(2021, 5, 13)
            .unwrap()
            .and_hms_opt(10, 42, 7)
            .unwrap();
        let single = Dataset::from_rows("DOE", None, &[]);
        let od = Dataset::from_rows("DOE", Some(EyeSide::OD), &[]);

        assert_eq!(single.file_stem("RTVue", &ts), "DOE_RTVue_20210513-104207");
        assert_eq!(od.file_stem("RTVue", &ts), "DOE_OD_RTVue_20210513-104207");
    }
}
