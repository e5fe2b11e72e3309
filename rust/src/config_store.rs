use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use toml::map::Map;
use toml::Value;

use crate::snippet::{RenderConfig, DEFAULT_PREVIEW_SIZE};

const DEFAULT_SERVER_PORT: i64 = 3000;

#[derive(Debug)]
pub struct ConfigStore {
    pub path: PathBuf,
    doc: Value,
}

impl ConfigStore {
    /// Opens the settings file, creating it with defaults when absent.
    /// A file that no longer parses is set aside and replaced by defaults;
    /// hand-edits with bad types degrade field by field instead of failing.
    pub fn new(path: PathBuf) -> Result<Self> {
        let doc = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            match toml::from_str::<Value>(&text) {
                Ok(doc) => doc,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config, using defaults"
                    );
                    set_aside_broken_config(&path);
                    Value::Table(Map::new())
                }
            }
        } else {
            Value::Table(Map::new())
        };

        let mut store = Self { path, doc };
        store.normalize_doc();
        store.save()?;
        Ok(store)
    }

    pub fn save(&self) -> Result<()> {
        let text = toml::to_string_pretty(&self.doc).context("failed to serialize TOML")?;
        fs::write(&self.path, text)
            .with_context(|| format!("failed to write config: {}", self.path.display()))
    }

    pub fn preview_size(&self) -> u32 {
        self.app_table()
            .and_then(|t| t.get("preview_size"))
            .and_then(value_to_i64)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_PREVIEW_SIZE)
    }

    pub fn use_table_wrapper(&self) -> bool {
        self.app_table()
            .and_then(|t| t.get("use_table_wrapper"))
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    pub fn server_port(&self) -> u16 {
        self.app_table()
            .and_then(|t| t.get("server_port"))
            .and_then(value_to_i64)
            .and_then(|v| u16::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_SERVER_PORT as u16)
    }

    pub fn confirm_delete(&self) -> bool {
        self.app_table()
            .and_then(|t| t.get("confirm_delete"))
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            preview_size: self.preview_size(),
            use_table_wrapper: self.use_table_wrapper(),
        }
    }

    pub fn set_render_config(&mut self, preview_size: u32, use_table_wrapper: bool) -> Result<()> {
        let size = if preview_size > 0 {
            preview_size
        } else {
            DEFAULT_PREVIEW_SIZE
        };

        let app = self.ensure_app_table_mut();
        app.insert("preview_size".to_string(), Value::Integer(i64::from(size)));
        app.insert(
            "use_table_wrapper".to_string(),
            Value::Boolean(use_table_wrapper),
        );
        self.save()
    }

    fn normalize_doc(&mut self) {
        if !self.doc.is_table() {
            self.doc = Value::Table(Map::new());
        }

        let default_size = i64::from(DEFAULT_PREVIEW_SIZE);
        let app = self.ensure_app_table_mut();

        let preview_size = app
            .get("preview_size")
            .and_then(value_to_i64)
            .filter(|v| *v > 0 && u32::try_from(*v).is_ok())
            .unwrap_or(default_size);
        app.insert("preview_size".to_string(), Value::Integer(preview_size));

        if app
            .get("use_table_wrapper")
            .and_then(Value::as_bool)
            .is_none()
        {
            app.insert("use_table_wrapper".to_string(), Value::Boolean(true));
        }

        let port = app
            .get("server_port")
            .and_then(value_to_i64)
            .filter(|v| (1..=65_535).contains(v))
            .unwrap_or(DEFAULT_SERVER_PORT);
        app.insert("server_port".to_string(), Value::Integer(port));

        if app.get("confirm_delete").and_then(Value::as_bool).is_none() {
            app.insert("confirm_delete".to_string(), Value::Boolean(true));
        }
    }

    fn app_table(&self) -> Option<&Map<String, Value>> {
        self.doc
            .as_table()
            .and_then(|root| root.get("app"))
            .and_then(Value::as_table)
    }

    fn ensure_app_table_mut(&mut self) -> &mut Map<String, Value> {
        if !self.doc.is_table() {
            self.doc = Value::Table(Map::new());
        }
        let root = self
            .doc
            .as_table_mut()
            .expect("root should be table after normalization");
        let app = root
            .entry("app".to_string())
            .or_insert_with(|| Value::Table(Map::new()));
        if !app.is_table() {
            *app = Value::Table(Map::new());
        }
        app.as_table_mut()
            .expect("app should be table after normalization")
    }
}

fn set_aside_broken_config(path: &Path) {
    let now_tag = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let file_name = path
        .file_name()
        .and_then(|v| v.to_str())
        .unwrap_or("config.txt");
    let backup = path.with_file_name(format!("{}.broken.{}", file_name, now_tag));
    if let Err(err) = fs::rename(path, &backup) {
        tracing::warn!(
            path = %path.display(),
            error = %err,
            "failed to set aside broken config file"
        );
    }
}

fn value_to_i64(value: &Value) -> Option<i64> {
    value
        .as_integer()
        .or_else(|| value.as_float().map(|v| v as i64))
        .or_else(|| value.as_str().and_then(|v| v.parse::<i64>().ok()))
}

#[cfg(test)]
mod tests {
    use super::ConfigStore;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT_FIXTURE_ID: AtomicU64 = AtomicU64::new(1);

    fn fixture_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let sequence = NEXT_FIXTURE_ID.fetch_add(1, Ordering::Relaxed);
        path.push(format!(
            "icb_config_store_test_{}_{}_{}.toml",
            name,
            std::process::id(),
            sequence
        ));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let path = fixture_path("defaults");

        let store = ConfigStore::new(path.clone()).expect("create store");
        assert!(path.exists(), "config file should be written");
        assert_eq!(store.preview_size(), 100);
        assert!(store.use_table_wrapper());
        assert_eq!(store.server_port(), 3000);
        assert!(store.confirm_delete());

        fs::remove_file(path).ok();
    }

    #[test]
    fn bad_field_values_fall_back_per_field() {
        let path = fixture_path("bad_fields");
        fs::write(
            &path,
            r#"
[app]
preview_size = -20
use_table_wrapper = "yes"
server_port = 0
confirm_delete = false
"#,
        )
        .expect("fixture write");

        let store = ConfigStore::new(path.clone()).expect("load store");
        assert_eq!(store.preview_size(), 100);
        assert!(store.use_table_wrapper());
        assert_eq!(store.server_port(), 3000);
        assert!(!store.confirm_delete());

        fs::remove_file(path).ok();
    }

    #[test]
    fn render_config_changes_survive_a_reload() {
        let path = fixture_path("persist_render");

        {
            let mut store = ConfigStore::new(path.clone()).expect("create store");
            store
                .set_render_config(64, false)
                .expect("set render config");
        }

        let store = ConfigStore::new(path.clone()).expect("reload store");
        assert_eq!(store.preview_size(), 64);
        assert!(!store.use_table_wrapper());

        fs::remove_file(path).ok();
    }

    #[test]
    fn zero_preview_size_is_stored_as_the_default() {
        let path = fixture_path("zero_size");

        let mut store = ConfigStore::new(path.clone()).expect("create store");
        store.set_render_config(0, true).expect("set render config");
        assert_eq!(store.preview_size(), 100);

        fs::remove_file(path).ok();
    }

    #[test]
    fn unparseable_file_is_set_aside_and_replaced_by_defaults() {
        let path = fixture_path("broken");
        fs::write(&path, "not [ toml").expect("fixture write");

        let store = ConfigStore::new(path.clone()).expect("create store");
        assert_eq!(store.preview_size(), 100);

        let dir = path.parent().expect("fixture dir").to_path_buf();
        let stem = path
            .file_name()
            .and_then(|v| v.to_str())
            .expect("fixture name")
            .to_string();
        let backup_names: Vec<String> = fs::read_dir(&dir)
            .expect("list fixture dir")
            .filter_map(|item| item.ok())
            .map(|item| item.file_name().to_string_lossy().to_string())
            .filter(|name| name.starts_with(&format!("{stem}.broken.")))
            .collect();
        assert_eq!(backup_names.len(), 1, "broken config should be set aside");

        for name in backup_names {
            fs::remove_file(dir.join(name)).ok();
        }
        fs::remove_file(path).ok();
    }
}
