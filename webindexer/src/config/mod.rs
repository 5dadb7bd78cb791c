use crate::error::{ConfigErrorKind, IndexerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

mod settings;

pub use settings::{split_user_list, Credentials, Settings, SortDir, SortStyle, SETTINGS_FILE};

const VALID_ACCESS_ATTRIBUTES: [&str; 2] = ["xattr", "none"];

/// Process-wide server configuration, read from `~/.config/webindexer/config.toml`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_root", deserialize_with = "deserialize_path_with_tilde")]
    pub root: PathBuf,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(
        default = "default_thumbnail_dir",
        deserialize_with = "deserialize_path_with_tilde"
    )]
    pub thumbnail_dir: PathBuf,
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
    #[serde(default = "default_access_attributes")]
    pub access_attributes: String,
}

fn deserialize_path_with_tilde<'de, D>(deserializer: D) -> std::result::Result<PathBuf, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let path_str = String::deserialize(deserializer)?;
    expand_tilde(&path_str).map_err(serde::de::Error::custom)
}

fn expand_tilde(path_str: &str) -> std::result::Result<PathBuf, String> {
    match path_str.strip_prefix('~') {
        Some(rest) => {
            let home =
                dirs::home_dir().ok_or_else(|| "Could not determine home directory".to_string())?;
            Ok(home.join(rest.trim_start_matches('/')))
        }
        None => Ok(PathBuf::from(path_str)),
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_thumbnail_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("webindexer-thumbs")
}

fn default_thumbnail_size() -> u32 {
    150
}

fn default_access_attributes() -> String {
    "xattr".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: default_root(),
            bind: default_bind(),
            base_url: String::new(),
            thumbnail_dir: default_thumbnail_dir(),
            thumbnail_size: default_thumbnail_size(),
            access_attributes: default_access_attributes(),
        }
    }
}

impl Config {
    /// Reads the configuration file, or returns defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn get_config_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("webindexer").join("config.toml")
    }

    fn display_path(path: &Path) -> String {
        if let Some(home) = dirs::home_dir() {
            if let Ok(relative) = path.strip_prefix(&home) {
                return format!("~/{}", relative.to_string_lossy());
            }
        }
        path.to_string_lossy().to_string()
    }

    fn generate_config_content(&self) -> String {
        format!(
            r#"# webindexer Configuration File
# Process-level settings for the directory browser.
# Per-directory behaviour lives in indexer.json files inside the served tree.

# Directory served as "/"
# Default: "."
root = "{}"

# Address the HTTP server listens on
# Default: "127.0.0.1:8080"
bind = "{}"

# Prefix prepended to every generated link, e.g. "/files" behind a reverse proxy
# Default: "" (links are absolute paths)
base_url = "{}"

# Where generated thumbnails are cached
# Default: <cache dir>/webindexer-thumbs
thumbnail_dir = "{}"

# Edge length in pixels of the square thumbnails
# Default: 150
thumbnail_size = {}

# Source of per-entry access lists when indexer.json enables auth_filtering
# Possible values:
#   - "xattr": read user.access, user.access_add and user.access_del
#   - "none": only the auth_default list of indexer.json applies
# Default: "xattr"
access_attributes = "{}"
"#,
            Self::display_path(&self.root),
            self.bind,
            self.base_url,
            Self::display_path(&self.thumbnail_dir),
            self.thumbnail_size,
            self.access_attributes,
        )
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.generate_config_content())?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.bind.trim().is_empty() {
            return Err(IndexerError::Config(ConfigErrorKind::InvalidValue(
                "bind".to_string(),
                "bind address cannot be empty".to_string(),
            )));
        }

        if self.thumbnail_size == 0 {
            return Err(IndexerError::Config(ConfigErrorKind::InvalidValue(
                "thumbnail_size".to_string(),
                "thumbnail_size must be greater than zero".to_string(),
            )));
        }

        if !VALID_ACCESS_ATTRIBUTES.contains(&self.access_attributes.as_str()) {
            return Err(IndexerError::Config(ConfigErrorKind::InvalidValue(
                "access_attributes".to_string(),
                format!(
                    "Invalid access_attributes value: {}. Must be one of: {}",
                    self.access_attributes,
                    VALID_ACCESS_ATTRIBUTES.join(", ")
                ),
            )));
        }

        Ok(())
    }

    /// Canonical form of `root`, so containment checks compare real paths.
    pub fn canonical_root(&self) -> Result<PathBuf> {
        self.root.canonicalize().map_err(|err| {
            IndexerError::Config(ConfigErrorKind::InvalidPath(format!(
                "Cannot use {} as root: {}",
                self.root.display(),
                err
            )))
        })
    }
}

/// Whether `path` lies at or below `root`, compared by whole path components.
pub fn is_within_root(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

/// Finds the effective settings for `directory` by walking up towards `root`.
///
/// The first `indexer.json` found wins. A file found above the starting directory
/// that declares `recursive: false` is not inherited; defaults are returned instead.
pub fn resolve_settings(directory: &Path, root: &Path) -> Settings {
    let mut current_dir = directory.to_path_buf();
    let mut steps = 0usize;

    while is_within_root(&current_dir, root) {
        steps += 1;
        let candidate = current_dir.join(SETTINGS_FILE);
        if candidate.is_file() {
            let settings = Settings::load_or_default(&candidate);
            if steps > 1 && !settings.recursive {
                return Settings::default();
            }
            return settings;
        }

        if !current_dir.pop() {
            break;
        }
    }

    Settings::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_settings(dir: &Path, json: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(SETTINGS_FILE), json).unwrap();
    }

    #[test]
    fn containment_is_per_component() {
        assert!(is_within_root(Path::new("/srv/root"), Path::new("/srv/root")));
        assert!(is_within_root(Path::new("/srv/root/a/b"), Path::new("/srv/root")));
        assert!(!is_within_root(Path::new("/srv/root2"), Path::new("/srv/root")));
        assert!(!is_within_root(Path::new("/srv"), Path::new("/srv/root")));
    }

    #[test]
    fn no_settings_anywhere_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(resolve_settings(&nested, tmp.path()), Settings::default());
    }

    #[test]
    fn nearest_settings_file_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write_settings(root, r#"{"sort_style": "size"}"#);
        write_settings(&root.join("a"), r#"{"sort_style": "name"}"#);
        let deeper = root.join("a").join("b");
        fs::create_dir_all(&deeper).unwrap();

        assert_eq!(resolve_settings(root, root).sort_style, SortStyle::Size);
        assert_eq!(resolve_settings(&deeper, root).sort_style, SortStyle::Name);
    }

    #[test]
    fn recursive_settings_are_inherited() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write_settings(&root.join("a"), r#"{"sort_dir": "asc"}"#);
        let deeper = root.join("a").join("b").join("c");
        fs::create_dir_all(&deeper).unwrap();

        assert_eq!(resolve_settings(&deeper, root).sort_dir, SortDir::Ascending);
    }

    #[test]
    fn non_recursive_settings_stop_at_their_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write_settings(root, r#"{"sort_style": "size"}"#);
        write_settings(
            &root.join("a"),
            r#"{"recursive": false, "sort_style": "name"}"#,
        );
        let child = root.join("a").join("b");
        fs::create_dir_all(&child).unwrap();

        let own = resolve_settings(&root.join("a"), root);
        assert_eq!(own.sort_style, SortStyle::Name);
        assert!(!own.recursive);

        assert_eq!(resolve_settings(&child, root), Settings::default());
    }

    #[test]
    fn walk_does_not_leave_root() {
        let tmp = tempfile::tempdir().unwrap();
        write_settings(tmp.path(), r#"{"sort_style": "name"}"#);
        let root = tmp.path().join("served");
        let inner = root.join("x");
        fs::create_dir_all(&inner).unwrap();

        assert_eq!(resolve_settings(&inner, &root), Settings::default());
        assert_eq!(
            resolve_settings(&tmp.path().join("served2"), &root),
            Settings::default()
        );
    }

    #[test]
    fn malformed_settings_do_not_fall_through_to_ancestors() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write_settings(root, r#"{"sort_style": "name"}"#);
        write_settings(&root.join("a"), "{ broken");

        assert_eq!(resolve_settings(&root.join("a"), root), Settings::default());
    }

    #[test]
    fn config_round_trips_through_generated_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        let config = Config {
            root: tmp.path().to_path_buf(),
            bind: "0.0.0.0:9000".to_string(),
            base_url: "/files".to_string(),
            thumbnail_dir: tmp.path().join("thumbs"),
            thumbnail_size: 96,
            access_attributes: "none".to_string(),
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.bind, "0.0.0.0:9000");
        assert_eq!(loaded.base_url, "/files");
        assert_eq!(loaded.thumbnail_size, 96);
        assert_eq!(loaded.access_attributes, "none");
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.thumbnail_size, 150);
    }

    #[test]
    fn invalid_access_attributes_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "access_attributes = \"acl\"\n").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(IndexerError::Config(ConfigErrorKind::InvalidValue(..)))
        ));
    }
}
