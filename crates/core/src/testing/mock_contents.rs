//! Mock contents host serving an in-memory file tree.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::browser::{BrowseError, ContentsHost, DirEntry, EntryKind};

/// In-memory [`ContentsHost`]. Directories are implied by file paths, the
/// way a real listing API surfaces them.
pub struct MockContentsHost {
    /// path -> (size_bytes, content)
    files: Mutex<HashMap<String, (u64, String)>>,
    failed_raw: Mutex<HashSet<String>>,
    fail_listings: AtomicBool,
    default_branch: Mutex<String>,
    fail_default_branch: AtomicBool,
    existing_branches: Mutex<HashSet<String>>,
    list_calls: AtomicUsize,
    raw_calls: AtomicUsize,
}

impl Default for MockContentsHost {
    fn default() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            failed_raw: Mutex::new(HashSet::new()),
            fail_listings: AtomicBool::new(false),
            default_branch: Mutex::new("main".to_string()),
            fail_default_branch: AtomicBool::new(false),
            existing_branches: Mutex::new(HashSet::new()),
            list_calls: AtomicUsize::new(0),
            raw_calls: AtomicUsize::new(0),
        }
    }
}

impl MockContentsHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed files as (path, size_bytes, content) triples.
    pub fn add_files(&self, files: &[(String, u64, String)]) {
        let mut map = self.files.lock().unwrap();
        for (path, size, content) in files {
            map.insert(path.clone(), (*size, content.clone()));
        }
    }

    /// Make one file's raw fetch fail.
    pub fn fail_raw_fetch(&self, path: &str) {
        self.failed_raw.lock().unwrap().insert(path.to_string());
    }

    /// Make every listing fail as not-found (repository gone).
    pub fn fail_all_listings(&self) {
        self.fail_listings.store(true, Ordering::SeqCst);
    }

    pub fn set_default_branch(&self, branch: &str) {
        *self.default_branch.lock().unwrap() = branch.to_string();
    }

    pub fn fail_default_branch(&self) {
        self.fail_default_branch.store(true, Ordering::SeqCst);
    }

    pub fn set_existing_branch(&self, branch: &str) {
        self.existing_branches
            .lock()
            .unwrap()
            .insert(branch.to_string());
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn raw_calls(&self) -> usize {
        self.raw_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentsHost for MockContentsHost {
    async fn list_dir(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<DirEntry>, BrowseError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_listings.load(Ordering::SeqCst) {
            return Err(BrowseError::NotFound(format!("{}/{}", owner, repo)));
        }

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path)
        };

        let files = self.files.lock().unwrap();
        let mut entries: Vec<DirEntry> = Vec::new();
        let mut dirs: BTreeSet<String> = BTreeSet::new();

        for (file_path, (size, _)) in files.iter() {
            let Some(rest) = file_path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) if !dir.is_empty() => {
                    dirs.insert(dir.to_string());
                }
                None if !rest.is_empty() => {
                    entries.push(DirEntry {
                        name: rest.to_string(),
                        path: file_path.clone(),
                        kind: EntryKind::File,
                        size_bytes: *size,
                        download_url: Some(format!("mock://{}", file_path)),
                    });
                }
                _ => {}
            }
        }

        for dir in dirs {
            let dir_path = format!("{}{}", prefix, dir);
            entries.push(DirEntry {
                name: dir,
                path: dir_path,
                kind: EntryKind::Dir,
                size_bytes: 0,
                download_url: None,
            });
        }

        if entries.is_empty() && !path.is_empty() {
            return Err(BrowseError::NotFound(path.to_string()));
        }

        // Stable order: files then dirs is incidental, sort by path.
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    async fn fetch_raw(&self, url: &str) -> Result<String, BrowseError> {
        self.raw_calls.fetch_add(1, Ordering::SeqCst);

        let path = url.strip_prefix("mock://").unwrap_or(url);
        if self.failed_raw.lock().unwrap().contains(path) {
            return Err(BrowseError::Api {
                status: 500,
                message: format!("scripted failure for {}", path),
            });
        }
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| BrowseError::NotFound(path.to_string()))
    }

    async fn default_branch(&self, _owner: &str, _repo: &str) -> Result<String, BrowseError> {
        if self.fail_default_branch.load(Ordering::SeqCst) {
            return Err(BrowseError::Api {
                status: 500,
                message: "scripted default-branch failure".to_string(),
            });
        }
        Ok(self.default_branch.lock().unwrap().clone())
    }

    async fn branch_exists(
        &self,
        _owner: &str,
        _repo: &str,
        branch: &str,
    ) -> Result<bool, BrowseError> {
        Ok(self.existing_branches.lock().unwrap().contains(branch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(host: &MockContentsHost) {
        host.add_files(&[
            ("src/lib.rs".to_string(), 100, "mod a;".to_string()),
            ("src/a/deep.rs".to_string(), 50, "fn deep() {}".to_string()),
            ("README.md".to_string(), 10, "# readme".to_string()),
        ]);
    }

    #[tokio::test]
    async fn test_root_listing() {
        let host = MockContentsHost::new();
        seed(&host);

        let entries = host.list_dir("o", "r", "").await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"README.md"));
        assert!(names.contains(&"src"));
        // Nested files are not surfaced at the root.
        assert!(!names.contains(&"lib.rs"));
    }

    #[tokio::test]
    async fn test_subdir_listing_and_implied_dirs() {
        let host = MockContentsHost::new();
        seed(&host);

        let entries = host.list_dir("o", "r", "src").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .any(|e| e.path == "src/a" && e.kind == EntryKind::Dir));
        assert!(entries
            .iter()
            .any(|e| e.path == "src/lib.rs" && e.kind == EntryKind::File));
    }

    #[tokio::test]
    async fn test_missing_dir_is_not_found() {
        let host = MockContentsHost::new();
        seed(&host);
        assert!(matches!(
            host.list_dir("o", "r", "contracts").await,
            Err(BrowseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_raw_fetch_round_trip() {
        let host = MockContentsHost::new();
        seed(&host);
        let content = host.fetch_raw("mock://src/lib.rs").await.unwrap();
        assert_eq!(content, "mod a;");
        assert_eq!(host.raw_calls(), 1);
    }
}
