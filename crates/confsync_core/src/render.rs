use chrono::Local;

use crate::inventory::FolderGroup;

/// The fixed column set of the inventory table, in render order.
pub const COLUMN_HEADERS: [&str; 7] = [
    "Folder",
    "Files",
    "Date Created",
    "Date of Last Modification",
    "Local Location (Path)",
    "Time of Upload",
    "Date of Upload",
];

const DATE_FORMAT: &str = "%m/%d/%Y";

/// Wall-clock stamp shared by every group rendered in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadStamp {
    pub time: String,
    pub date: String,
}

impl UploadStamp {
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            time: now
                .format("%I:%M %p")
                .to_string()
                .trim_start_matches('0')
                .to_string(),
            date: now.format(DATE_FORMAT).to_string(),
        }
    }
}

/// The shared `<table>` opening plus header row that every rendered group
/// repeats and that the assembled page carries exactly once.
pub fn header_prefix() -> String {
    let mut html = String::from("<table><tr>");
    for header in COLUMN_HEADERS {
        html.push_str(&format!("<th style=\"width:auto\">{header}</th>"));
    }
    html.push_str("</tr>");
    html
}

/// Render one folder group as a complete table: header row plus exactly one
/// data row.
///
/// Folder, both dates, and the location come from the group's *first*
/// record only; the Files cell joins every file name in the group. Any
/// divergence in dates or paths across the group's other records is
/// dropped, matching the folder-level summarization the page has always
/// shown.
pub fn render_group_table(group: &FolderGroup, stamp: &UploadStamp) -> String {
    let first = group.first();
    let files = group.file_names().join(", ");
    let created = first.date_created.format(DATE_FORMAT).to_string();
    let modified = first.date_modified.format(DATE_FORMAT).to_string();
    let cells = [
        first.folder_key.as_str(),
        files.as_str(),
        created.as_str(),
        modified.as_str(),
        first.location.as_str(),
        stamp.time.as_str(),
        stamp.date.as_str(),
    ];

    let mut html = header_prefix();
    html.push_str("<tr>");
    for cell in cells {
        html.push_str(&format!("<td>{cell}</td>"));
    }
    html.push_str("</tr></table>");
    html
}

/// Reduce a rendered group table to the fragment that joins the shared
/// header: drop the group's own header and closing tag, then escape
/// ampersands for storage format.
pub fn group_fragment(group_table: &str) -> String {
    let header = header_prefix();
    let fragment = group_table
        .strip_prefix(header.as_str())
        .unwrap_or(group_table);
    let fragment = fragment.strip_suffix("</table>").unwrap_or(fragment);
    fragment.replace('&', "&amp;")
}

/// Assemble the full page body: one header, one data row per group, one
/// closing tag.
pub fn assemble_body(groups: &[FolderGroup], stamp: &UploadStamp) -> String {
    let mut body = header_prefix();
    for group in groups {
        body.push_str(&group_fragment(&render_group_table(group, stamp)));
    }
    body.push_str("</table>");
    body
}
