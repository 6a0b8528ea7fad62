use crate::config::RunSettings;
use crate::confluence::{ConfluenceClient, PageStore, next_version_number};
use crate::credentials::load_credentials;
use crate::error::Result;
use crate::inventory::{FileRecord, group_records, load_inventory};
use crate::prompt::{ChangePrompt, TerminalPrompt, confirmed_description};
use crate::refresh;
use crate::render::{UploadStamp, assemble_body};

/// Refreshes the local data source and reports which of its file names are
/// missing from the given page body. Trait so the pipeline runs without an
/// external application (or a spreadsheet on disk) in tests.
pub trait SourceRefresher {
    fn refresh_and_compare(&mut self, page_body: &str) -> Result<Vec<String>>;
}

/// Production refresher: spawns the configured external command and
/// re-reads the spreadsheet from disk for the comparison.
pub struct CommandRefresher<'a> {
    settings: &'a RunSettings,
}

impl<'a> CommandRefresher<'a> {
    pub fn new(settings: &'a RunSettings) -> Self {
        Self { settings }
    }
}

impl SourceRefresher for CommandRefresher<'_> {
    fn refresh_and_compare(&mut self, page_body: &str) -> Result<Vec<String>> {
        refresh::refresh_and_compare(self.settings, page_body)
    }
}

/// What one run did, for the CLI to summarize.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub page_title: String,
    pub version_number: i64,
    pub description: String,
    pub missing_files: Vec<String>,
    pub record_count: usize,
    pub group_count: usize,
    pub new_body: String,
}

/// One full reconciliation pass against an already-loaded row snapshot:
/// fetch page state, derive the next version label, collect the operator's
/// confirmed description, refresh-and-compare (advisory), then group,
/// render, and overwrite.
///
/// Grouping uses the startup `snapshot`; the refresher's comparison reads
/// the refreshed file. Those two views may diverge within a run, and the
/// page is rewritten unconditionally either way.
pub fn sync_page(
    page_id: u64,
    snapshot: Vec<FileRecord>,
    store: &mut dyn PageStore,
    prompt: &mut dyn ChangePrompt,
    refresher: &mut dyn SourceRefresher,
) -> Result<RunReport> {
    let page = store.fetch_page(page_id)?;
    println!("Fetched page '{}' (version {}).", page.title, page.version_number);

    let last_comment = store.fetch_last_version_comment(page_id)?;
    let version_number = next_version_number(&last_comment);

    let description = confirmed_description(prompt, &page.title, version_number)?;

    let missing_files = refresher.refresh_and_compare(&page.body)?;
    for name in &missing_files {
        println!("{name} is not found on the Confluence page.");
    }

    let record_count = snapshot.len();
    let groups = group_records(snapshot);
    let stamp = UploadStamp::now();
    let new_body = assemble_body(&groups, &stamp);

    store.update_page(
        page_id,
        &page.title,
        &new_body,
        &version_number.to_string(),
        true,
    )?;

    Ok(RunReport {
        page_title: page.title,
        version_number,
        description,
        missing_files,
        record_count,
        group_count: groups.len(),
        new_body,
    })
}

/// Production entry point: read credentials, snapshot the spreadsheet,
/// open an authenticated session, and run one pass with the terminal
/// prompt. Everything is owned locally, so all handles are released on any
/// exit path.
pub fn run(settings: &RunSettings) -> Result<RunReport> {
    let credentials = load_credentials(&settings.credentials_path)?;
    let (api_token, username) = credentials.into_required()?;

    let snapshot = load_inventory(&settings.spreadsheet_path, &settings.master_folder_marker)?;
    println!(
        "Loaded {} inventory rows from {}.",
        snapshot.len(),
        settings.spreadsheet_path.display()
    );

    let mut store = ConfluenceClient::new(settings, username, api_token)?;
    let mut prompt = TerminalPrompt::from_stdio();
    let mut refresher = CommandRefresher::new(settings);
    sync_page(
        settings.page_id,
        snapshot,
        &mut store,
        &mut prompt,
        &mut refresher,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confluence::RemotePage;
    use crate::error::SyncError;
    use crate::inventory::folder_key;
    use chrono::NaiveDate;

    struct MemoryStore {
        page: RemotePage,
        last_comment: String,
        updates: Vec<(u64, String, String, String, bool)>,
    }

    impl MemoryStore {
        fn new(body: &str, last_comment: &str) -> Self {
            Self {
                page: RemotePage {
                    title: "File Inventory".to_string(),
                    body: body.to_string(),
                    version_number: 7,
                },
                last_comment: last_comment.to_string(),
                updates: Vec::new(),
            }
        }
    }

    impl PageStore for MemoryStore {
        fn fetch_page(&mut self, _page_id: u64) -> Result<RemotePage> {
            Ok(self.page.clone())
        }

        fn fetch_last_version_comment(&mut self, _page_id: u64) -> Result<String> {
            Ok(self.last_comment.clone())
        }

        fn update_page(
            &mut self,
            page_id: u64,
            title: &str,
            body: &str,
            version_comment: &str,
            minor_edit: bool,
        ) -> Result<()> {
            self.page.body = body.to_string();
            self.page.version_number += 1;
            self.last_comment = version_comment.to_string();
            self.updates.push((
                page_id,
                title.to_string(),
                body.to_string(),
                version_comment.to_string(),
                minor_edit,
            ));
            Ok(())
        }
    }

    struct ScriptedPrompt {
        description: String,
    }

    impl ChangePrompt for ScriptedPrompt {
        fn request_description(&mut self, _page_title: &str, _version: i64) -> Result<String> {
            Ok(self.description.clone())
        }

        fn confirm(&mut self, _description: &str, _version: i64) -> Result<bool> {
            Ok(true)
        }
    }

    struct SnapshotRefresher {
        names: Vec<String>,
    }

    impl SourceRefresher for SnapshotRefresher {
        fn refresh_and_compare(&mut self, page_body: &str) -> Result<Vec<String>> {
            Ok(crate::diff::missing_files(
                page_body,
                self.names.iter().map(String::as_str),
            ))
        }
    }

    fn record(name: &str, location: &str) -> FileRecord {
        FileRecord {
            folder_key: folder_key(location, "MASTER_FOLDER"),
            file_name: name.to_string(),
            file_type: "txt".to_string(),
            date_created: NaiveDate::from_ymd_opt(2024, 1, 15).expect("date"),
            date_modified: NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"),
            location: location.to_string(),
        }
    }

    fn snapshot() -> Vec<FileRecord> {
        vec![
            record("a.txt", r"C:\Data\MASTER_FOLDER\Proj1"),
            record("b.txt", r"C:\Data\MASTER_FOLDER\Proj1"),
            record("c.txt", r"C:\Data\MASTER_FOLDER\Proj2"),
        ]
    }

    fn run_once(store: &mut MemoryStore) -> RunReport {
        let mut prompt = ScriptedPrompt {
            description: "added Proj1 files".to_string(),
        };
        let mut refresher = SnapshotRefresher {
            names: vec!["a.txt".to_string(), "b.txt".to_string(), "c.txt".to_string()],
        };
        sync_page(65538, snapshot(), store, &mut prompt, &mut refresher).expect("sync")
    }

    #[test]
    fn sync_rewrites_the_page_with_one_row_per_group() {
        let mut store = MemoryStore::new("<p>a.txt</p>", "Updated docs v3");
        let report = run_once(&mut store);

        assert_eq!(report.version_number, 4);
        assert_eq!(report.record_count, 3);
        assert_eq!(report.group_count, 2);
        assert_eq!(report.missing_files, vec!["b.txt", "c.txt"]);

        assert_eq!(store.updates.len(), 1);
        let (page_id, title, body, comment, minor_edit) = store.updates[0].clone();
        assert_eq!(page_id, 65538);
        assert_eq!(title, "File Inventory");
        assert_eq!(comment, "4");
        assert!(minor_edit);
        assert!(body.contains("<td>a.txt, b.txt</td>"));
        assert!(body.contains("<td>c.txt</td>"));
        assert_eq!(body.matches("<table>").count(), 1);
    }

    #[test]
    fn diff_result_never_blocks_the_overwrite() {
        // Every file already on the page: diff is empty, page still rewritten.
        let mut store = MemoryStore::new("<td>a.txt, b.txt</td><td>c.txt</td>", "2");
        let report = run_once(&mut store);
        assert!(report.missing_files.is_empty());
        assert_eq!(store.updates.len(), 1);
    }

    #[test]
    fn comment_without_digits_starts_the_version_counter_at_one() {
        let mut store = MemoryStore::new("", "initial upload");
        let report = run_once(&mut store);
        assert_eq!(report.version_number, 1);
        assert_eq!(store.updates[0].3, "1");
    }

    #[test]
    fn rerunning_with_unchanged_data_increments_the_version_by_one() {
        let mut store = MemoryStore::new("", "1");
        let first = run_once(&mut store);
        let second = run_once(&mut store);

        assert_eq!(second.version_number, first.version_number + 1);
        // Rows are identical apart from the upload stamp columns; drop every
        // time- or date-shaped cell before comparing.
        let strip_stamp = |body: &str| {
            body.split("<td>")
                .filter(|cell| !cell.contains(':') && !cell.contains('/'))
                .collect::<Vec<_>>()
                .join("<td>")
        };
        assert_eq!(
            strip_stamp(&store.updates[0].2),
            strip_stamp(&store.updates[1].2)
        );
    }

    #[test]
    fn store_failure_aborts_the_run() {
        struct FailingStore;
        impl PageStore for FailingStore {
            fn fetch_page(&mut self, _page_id: u64) -> Result<RemotePage> {
                Err(SyncError::remote("HTTP 503"))
            }
            fn fetch_last_version_comment(&mut self, _page_id: u64) -> Result<String> {
                unreachable!("fetch_page fails first")
            }
            fn update_page(&mut self, _: u64, _: &str, _: &str, _: &str, _: bool) -> Result<()> {
                unreachable!("fetch_page fails first")
            }
        }

        let mut prompt = ScriptedPrompt {
            description: String::new(),
        };
        let mut refresher = SnapshotRefresher { names: Vec::new() };
        let error = sync_page(65538, snapshot(), &mut FailingStore, &mut prompt, &mut refresher)
            .expect_err("must fail");
        assert!(matches!(error, SyncError::RemoteService { .. }));
    }
}
