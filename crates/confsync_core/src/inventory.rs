use std::collections::HashMap;
use std::path::Path;

use calamine::{Data, DataType as _, Reader, Xlsx, open_workbook};
use chrono::NaiveDate;

use crate::error::{Result, SyncError};

/// Fixed column layout of the inventory spreadsheet: header on row 1, data
/// from row 2, columns addressed by index.
pub const COL_FILE_NAME: usize = 0;
pub const COL_FILE_TYPE: usize = 1;
pub const COL_DATE_CREATED: usize = 3;
pub const COL_DATE_MODIFIED: usize = 4;
pub const COL_LOCATION: usize = 5;

/// One data row of the inventory spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub folder_key: String,
    pub file_name: String,
    pub file_type: String,
    pub date_created: NaiveDate,
    pub date_modified: NaiveDate,
    pub location: String,
}

/// All records sharing one normalized folder key, in spreadsheet row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderGroup {
    pub key: String,
    pub records: Vec<FileRecord>,
}

impl FolderGroup {
    /// The record whose folder/date/location values represent the group in
    /// the rendered table. Groups are never constructed empty.
    pub fn first(&self) -> &FileRecord {
        &self.records[0]
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|record| record.file_name.as_str())
            .collect()
    }
}

/// Normalize an absolute location path into a grouping key: drop everything
/// up to and including the first occurrence of the master-folder marker,
/// then remove all path separators from what is left.
///
/// A path without the marker is not an error; the untrimmed path goes
/// through the same separator removal and becomes the key as-is.
pub fn folder_key(location: &str, marker: &str) -> String {
    let remainder = match location.find(marker) {
        Some(index) => &location[index + marker.len()..],
        None => location,
    };
    remainder.replace(['\\', '/'], "")
}

/// Partition records by folder key, preserving first-seen key order and
/// row order within each group. Every record lands in exactly one group.
pub fn group_records(records: Vec<FileRecord>) -> Vec<FolderGroup> {
    let mut groups: Vec<FolderGroup> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for record in records {
        match index_by_key.get(&record.folder_key) {
            Some(&index) => groups[index].records.push(record),
            None => {
                index_by_key.insert(record.folder_key.clone(), groups.len());
                groups.push(FolderGroup {
                    key: record.folder_key.clone(),
                    records: vec![record],
                });
            }
        }
    }
    groups
}

/// Read every data row of the first worksheet into records. Rows that are
/// entirely empty are skipped; a partially filled row is a data error.
pub fn load_inventory(path: &Path, marker: &str) -> Result<Vec<FileRecord>> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|error| {
        SyncError::source_data(format!("failed to open {}: {error}", path.display()))
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            SyncError::source_data(format!("{} has no worksheets", path.display()))
        })?
        .map_err(|error| {
            SyncError::source_data(format!("failed to read {}: {error}", path.display()))
        })?;

    let mut records = Vec::new();
    for (index, row) in range.rows().enumerate() {
        if index == 0 {
            continue; // header row
        }
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        records.push(decode_row(index + 1, row, marker)?);
    }
    Ok(records)
}

/// Decode one spreadsheet row. `row_number` is the 1-based sheet row, used
/// only in error messages.
pub fn decode_row(row_number: usize, cells: &[Data], marker: &str) -> Result<FileRecord> {
    let location = text_cell(row_number, cells, COL_LOCATION, "location path")?;
    Ok(FileRecord {
        folder_key: folder_key(&location, marker),
        file_name: text_cell(row_number, cells, COL_FILE_NAME, "file name")?,
        file_type: text_cell(row_number, cells, COL_FILE_TYPE, "file type")?,
        date_created: date_cell(row_number, cells, COL_DATE_CREATED, "date created")?,
        date_modified: date_cell(row_number, cells, COL_DATE_MODIFIED, "date modified")?,
        location,
    })
}

fn text_cell(row_number: usize, cells: &[Data], column: usize, label: &str) -> Result<String> {
    let value = cells
        .get(column)
        .and_then(|cell| cell.as_string())
        .unwrap_or_default();
    if value.trim().is_empty() {
        return Err(SyncError::source_data(format!(
            "row {row_number}: {label} (column {column}) is empty"
        )));
    }
    Ok(value)
}

fn date_cell(row_number: usize, cells: &[Data], column: usize, label: &str) -> Result<NaiveDate> {
    let cell = cells.get(column).unwrap_or(&Data::Empty);
    cell.as_datetime().map(|value| value.date()).ok_or_else(|| {
        SyncError::source_data(format!(
            "row {row_number}: {label} (column {column}) is not a native date cell"
        ))
    })
}
