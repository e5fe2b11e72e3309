use anyhow::{anyhow, Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub title: String,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Board {
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    Above,
    Below,
}

impl Board {
    pub fn seed() -> Self {
        Self {
            groups: vec![
                Group {
                    id: "col-1".to_string(),
                    title: "分组 1".to_string(),
                    urls: vec![
                        "https://picsum.photos/seed/a1/200".to_string(),
                        "https://picsum.photos/seed/a2/200".to_string(),
                    ],
                },
                Group {
                    id: "col-2".to_string(),
                    title: "分组 2".to_string(),
                    urls: vec![
                        "https://picsum.photos/seed/b1/200".to_string(),
                        "https://picsum.photos/seed/b2/200".to_string(),
                    ],
                },
            ],
        }
    }

    #[must_use]
    pub fn add_group(mut self) -> Board {
        let id = next_group_id(&self.groups);
        let title = format!("新分组 {}", self.groups.len() + 1);
        self.groups.push(Group {
            id,
            title,
            urls: Vec::new(),
        });
        self
    }

    /// The last remaining group is never removed.
    #[must_use]
    pub fn remove_group(mut self, group_id: &str) -> Board {
        if self.groups.len() <= 1 {
            return self;
        }
        self.groups.retain(|group| group.id != group_id);
        self
    }

    #[must_use]
    pub fn rename_group(mut self, group_id: &str, title: &str) -> Board {
        if let Some(group) = self.group_mut(group_id) {
            group.title = title.to_string();
        }
        self
    }

    /// Replaces the whole url list from pasted text: one url per line,
    /// trimmed, empty lines dropped.
    #[must_use]
    pub fn set_group_urls(mut self, group_id: &str, raw_text: &str) -> Board {
        if let Some(group) = self.group_mut(group_id) {
            group.urls = split_url_lines(raw_text);
        }
        self
    }

    #[must_use]
    pub fn remove_url_at(mut self, group_id: &str, index: usize) -> Board {
        if let Some(group) = self.group_mut(group_id) {
            if index < group.urls.len() {
                group.urls.remove(index);
            } else {
                tracing::debug!(group_id, index, "url index out of range, ignored");
            }
        }
        self
    }

    #[must_use]
    pub fn set_url_at(mut self, group_id: &str, index: usize, value: &str) -> Board {
        if let Some(group) = self.group_mut(group_id) {
            if let Some(slot) = group.urls.get_mut(index) {
                *slot = value.to_string();
            } else {
                tracing::debug!(group_id, index, "url index out of range, ignored");
            }
        }
        self
    }

    /// Inserts an empty placeholder slot before (`Above`) or after (`Below`)
    /// the url at `index`.
    #[must_use]
    pub fn insert_url_at(
        mut self,
        group_id: &str,
        index: usize,
        position: InsertPosition,
    ) -> Board {
        if let Some(group) = self.group_mut(group_id) {
            if index < group.urls.len() {
                let at = match position {
                    InsertPosition::Above => index,
                    InsertPosition::Below => index + 1,
                };
                group.urls.insert(at, String::new());
            } else {
                tracing::debug!(group_id, index, "url index out of range, ignored");
            }
        }
        self
    }

    pub fn group(&self, group_id: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.id == group_id)
    }

    pub fn url_count(&self) -> usize {
        self.groups.iter().map(|group| group.urls.len()).sum()
    }

    fn group_mut(&mut self, group_id: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|group| group.id == group_id)
    }
}

fn split_url_lines(raw_text: &str) -> Vec<String> {
    raw_text
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn next_group_id(groups: &[Group]) -> String {
    let mut seq: u32 = 1;
    for group in groups {
        let Some(suffix) = group.id.strip_prefix("col-") else {
            continue;
        };
        if let Ok(parsed) = suffix.parse::<u32>() {
            seq = seq.max(parsed.saturating_add(1));
        }
    }
    format!("col-{seq}")
}

pub struct BoardStore {
    board_json_path: PathBuf,
}

impl BoardStore {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("failed to create base dir: {}", base_dir.display()))?;
        Ok(Self {
            board_json_path: base_dir.join("board.json"),
        })
    }

    /// Loads the persisted board. Missing, unreadable, or malformed data
    /// falls back to the seed board; a malformed file is set aside first so
    /// the next persist does not clobber whatever the user had.
    pub fn load(&self) -> Board {
        if !self.board_json_path.exists() {
            return Board::seed();
        }

        match self.read_groups() {
            Ok(groups) if !groups.is_empty() => Board { groups },
            Ok(_) => {
                tracing::warn!(
                    path = %self.board_json_path.display(),
                    "persisted board holds no usable groups, using seed board"
                );
                Board::seed()
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.board_json_path.display(),
                    error = %err,
                    "failed to load persisted board, using seed board"
                );
                self.set_aside_broken_file();
                Board::seed()
            }
        }
    }

    pub fn persist(&self, board: &Board) -> Result<()> {
        let payload =
            serde_json::to_string_pretty(&board.groups).context("failed to serialize board json")?;
        let tmp_path = self.board_json_path.with_file_name("board.json.tmp");

        fs::write(&tmp_path, payload)
            .with_context(|| format!("failed to write temp json: {}", tmp_path.display()))?;
        if self.board_json_path.exists() {
            fs::remove_file(&self.board_json_path).with_context(|| {
                format!(
                    "failed to remove old json: {}",
                    self.board_json_path.display()
                )
            })?;
        }
        fs::rename(&tmp_path, &self.board_json_path).with_context(|| {
            format!("failed to replace json: {}", self.board_json_path.display())
        })
    }

    fn read_groups(&self) -> Result<Vec<Group>> {
        let raw_text = fs::read_to_string(&self.board_json_path).with_context(|| {
            format!("failed to read json: {}", self.board_json_path.display())
        })?;
        let raw: Value = serde_json::from_str(&raw_text).with_context(|| {
            format!("failed to parse json: {}", self.board_json_path.display())
        })?;

        let Some(array) = raw.as_array() else {
            return Err(anyhow!(
                "json is not an array: {}",
                self.board_json_path.display()
            ));
        };

        let mut groups: Vec<Group> = Vec::new();
        for item in array {
            let Some(obj) = item.as_object() else {
                continue;
            };

            let id = obj
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string();
            if id.is_empty() || groups.iter().any(|group| group.id == id) {
                continue;
            }

            let title = obj
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            let mut urls = Vec::new();
            if let Some(raw_urls) = obj.get("urls").and_then(Value::as_array) {
                for value in raw_urls {
                    if let Some(url) = value.as_str().map(str::trim).filter(|v| !v.is_empty()) {
                        urls.push(url.to_string());
                    }
                }
            }

            groups.push(Group { id, title, urls });
        }

        Ok(groups)
    }

    fn set_aside_broken_file(&self) {
        let now_tag = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let backup = self
            .board_json_path
            .with_file_name(format!("board.broken.{}.json", now_tag));
        if let Err(err) = fs::rename(&self.board_json_path, &backup) {
            tracing::warn!(
                path = %self.board_json_path.display(),
                error = %err,
                "failed to set aside broken board file"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Board, BoardStore, InsertPosition};
    use std::fs;
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT_FIXTURE_ID: AtomicU64 = AtomicU64::new(1);

    fn fixture_base() -> std::path::PathBuf {
        let mut base = std::env::temp_dir();
        let sequence = NEXT_FIXTURE_ID.fetch_add(1, Ordering::Relaxed);
        base.push(format!(
            "icb_board_store_test_{}_{}",
            std::process::id(),
            sequence
        ));
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&base).expect("mkdir fixture");
        base
    }

    fn board_with_urls(urls: &[&str]) -> Board {
        let mut board = Board::seed();
        board.groups[0].urls = urls.iter().map(ToString::to_string).collect();
        board
    }

    #[test]
    fn load_without_file_yields_seed_board() {
        let base = fixture_base();
        let store = BoardStore::new(base.clone()).expect("create store");

        let board = store.load();
        assert_eq!(board.groups.len(), 2);
        assert_eq!(board.groups[0].title, "分组 1");
        assert_eq!(board.groups[1].urls.len(), 2);

        fs::remove_dir_all(base).ok();
    }

    #[test]
    fn persist_then_load_round_trips() {
        let base = fixture_base();
        let store = BoardStore::new(base.clone()).expect("create store");

        let board = Board::seed()
            .rename_group("col-1", "对照组")
            .set_group_urls("col-2", "http://x/a.png\nhttp://x/b.png");
        store.persist(&board).expect("persist");

        let loaded = store.load();
        assert_eq!(loaded.groups.len(), 2);
        assert_eq!(loaded.groups[0].title, "对照组");
        assert_eq!(
            loaded.groups[1].urls,
            vec!["http://x/a.png", "http://x/b.png"]
        );

        fs::remove_dir_all(base).ok();
    }

    #[test]
    fn load_with_corrupted_file_yields_seed_and_sets_file_aside() {
        let base = fixture_base();
        let store = BoardStore::new(base.clone()).expect("create store");
        fs::write(base.join("board.json"), "{not json").expect("write fixture");

        let board = store.load();
        assert_eq!(board.groups.len(), 2);
        assert_eq!(board.groups[0].id, "col-1");

        let backups = fs::read_dir(&base)
            .expect("list base dir")
            .filter_map(|item| item.ok())
            .filter(|item| {
                item.file_name()
                    .to_string_lossy()
                    .starts_with("board.broken.")
            })
            .count();
        assert_eq!(backups, 1, "broken file should be set aside");

        fs::remove_dir_all(base).ok();
    }

    #[test]
    fn load_with_empty_array_yields_seed_board() {
        let base = fixture_base();
        let store = BoardStore::new(base.clone()).expect("create store");
        fs::write(base.join("board.json"), "[]").expect("write fixture");

        let board = store.load();
        assert_eq!(board.groups.len(), 2);

        fs::remove_dir_all(base).ok();
    }

    #[test]
    fn load_skips_unusable_entries() {
        let base = fixture_base();
        let store = BoardStore::new(base.clone()).expect("create store");
        fs::write(
            base.join("board.json"),
            r#"[
                42,
                { "title": "no id", "urls": [] },
                { "id": "col-1", "title": "ok", "urls": ["  http://x/a.png  ", "", 7] },
                { "id": "col-1", "title": "duplicate id", "urls": [] }
            ]"#,
        )
        .expect("write fixture");

        let board = store.load();
        assert_eq!(board.groups.len(), 1);
        assert_eq!(board.groups[0].title, "ok");
        assert_eq!(board.groups[0].urls, vec!["http://x/a.png"]);

        fs::remove_dir_all(base).ok();
    }

    #[test]
    fn add_group_appends_empty_group_with_fresh_id() {
        let board = Board::seed().add_group();

        assert_eq!(board.groups.len(), 3);
        let added = board.groups.last().expect("added group");
        assert_eq!(added.id, "col-3");
        assert_eq!(added.title, "新分组 3");
        assert!(added.urls.is_empty());
    }

    #[test]
    fn add_group_never_reuses_an_id_after_removal() {
        let board = Board::seed().add_group().remove_group("col-2").add_group();

        assert_eq!(board.groups.len(), 3);
        let ids: Vec<&str> = board.groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["col-1", "col-3", "col-4"]);
    }

    #[test]
    fn remove_group_keeps_the_last_group() {
        let board = Board::seed().remove_group("col-2");
        assert_eq!(board.groups.len(), 1);

        let board = board.remove_group("col-1");
        assert_eq!(board.groups.len(), 1, "last group must survive");
        assert_eq!(board.groups[0].id, "col-1");
    }

    #[test]
    fn rename_group_allows_empty_title() {
        let board = Board::seed().rename_group("col-1", "");
        assert_eq!(board.groups[0].title, "");
        assert_eq!(board.groups[1].title, "分组 2");
    }

    #[test]
    fn set_group_urls_splits_trims_and_drops_blank_lines() {
        let board = Board::seed().set_group_urls(
            "col-1",
            "  http://x/a.png  \n\n   \nhttp://x/b.png\nhttp://x/c.png   ",
        );

        assert_eq!(
            board.groups[0].urls,
            vec!["http://x/a.png", "http://x/b.png", "http://x/c.png"]
        );
    }

    #[test]
    fn set_group_urls_is_idempotent_over_its_own_output() {
        let board = Board::seed().set_group_urls("col-1", " a \n\n b \nc");
        let joined = board.groups[0].urls.join("\n");

        let again = board.clone().set_group_urls("col-1", &joined);
        assert_eq!(again.groups[0].urls, board.groups[0].urls);
    }

    #[test]
    fn remove_url_at_keeps_relative_order() {
        let board = board_with_urls(&["u0", "u1", "u2", "u3"]).remove_url_at("col-1", 1);
        assert_eq!(board.groups[0].urls, vec!["u0", "u2", "u3"]);
    }

    #[test]
    fn remove_url_at_out_of_range_is_a_no_op() {
        let board = board_with_urls(&["u0", "u1"]).remove_url_at("col-1", 2);
        assert_eq!(board.groups[0].urls, vec!["u0", "u1"]);
    }

    #[test]
    fn set_url_at_replaces_in_place() {
        let board = board_with_urls(&["u0", "u1", "u2"]).set_url_at("col-1", 1, "edited");
        assert_eq!(board.groups[0].urls, vec!["u0", "edited", "u2"]);
    }

    #[test]
    fn set_url_at_out_of_range_is_a_no_op() {
        let board = board_with_urls(&["u0"]).set_url_at("col-1", 5, "edited");
        assert_eq!(board.groups[0].urls, vec!["u0"]);
    }

    #[test]
    fn insert_url_above_shifts_the_tail() {
        let board =
            board_with_urls(&["u0", "u1", "u2"]).insert_url_at("col-1", 1, InsertPosition::Above);
        assert_eq!(board.groups[0].urls, vec!["u0", "", "u1", "u2"]);
    }

    #[test]
    fn insert_url_below_lands_after_the_slot() {
        let board =
            board_with_urls(&["u0", "u1", "u2"]).insert_url_at("col-1", 1, InsertPosition::Below);
        assert_eq!(board.groups[0].urls, vec!["u0", "u1", "", "u2"]);
    }

    #[test]
    fn insert_above_then_below_surrounds_the_slot_with_placeholders() {
        let board = board_with_urls(&["u0", "u1", "u2"])
            .insert_url_at("col-1", 1, InsertPosition::Above)
            .insert_url_at("col-1", 2, InsertPosition::Below);

        assert_eq!(board.groups[0].urls.len(), 5);
        assert_eq!(board.groups[0].urls, vec!["u0", "", "u1", "", "u2"]);
        assert_eq!(board.groups[0].urls[2], "u1");
    }

    #[test]
    fn insert_url_out_of_range_is_a_no_op() {
        let board = board_with_urls(&["u0"]).insert_url_at("col-1", 1, InsertPosition::Above);
        assert_eq!(board.groups[0].urls, vec!["u0"]);
    }

    #[test]
    fn operations_on_unknown_group_leave_board_unchanged() {
        let board = Board::seed()
            .rename_group("col-9", "ghost")
            .set_group_urls("col-9", "http://x/a.png")
            .remove_url_at("col-9", 0);

        assert_eq!(board.groups.len(), 2);
        assert_eq!(board.groups[0].title, "分组 1");
    }
}
