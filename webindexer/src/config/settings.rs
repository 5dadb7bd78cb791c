use crate::error::{IndexerError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// Name of the per-directory settings file.
pub const SETTINGS_FILE: &str = "indexer.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortStyle {
    Date,
    Name,
    Size,
}

impl SortStyle {
    pub const ALL: [SortStyle; 3] = [SortStyle::Name, SortStyle::Size, SortStyle::Date];

    pub fn as_str(self) -> &'static str {
        match self {
            SortStyle::Date => "date",
            SortStyle::Name => "name",
            SortStyle::Size => "size",
        }
    }
}

impl FromStr for SortStyle {
    type Err = IndexerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "date" => Ok(SortStyle::Date),
            "name" => Ok(SortStyle::Name),
            "size" => Ok(SortStyle::Size),
            other => Err(IndexerError::Parse(format!(
                "Invalid sort style: {}. Must be one of: name, size, date",
                other
            ))),
        }
    }
}

impl fmt::Display for SortStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDir {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDir {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Ascending => "asc",
            SortDir::Descending => "desc",
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            SortDir::Ascending => SortDir::Descending,
            SortDir::Descending => SortDir::Ascending,
        }
    }
}

impl FromStr for SortDir {
    type Err = IndexerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortDir::Ascending),
            "desc" => Ok(SortDir::Descending),
            other => Err(IndexerError::Parse(format!(
                "Invalid sort direction: {}. Must be one of: asc, desc",
                other
            ))),
        }
    }
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `user:password` pair, either configured in `auth` or sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl FromStr for Credentials {
    type Err = IndexerError;

    /// Splits on the first `:` only, so passwords may contain colons.
    fn from_str(term: &str) -> Result<Self> {
        term.split_once(':')
            .map(|(user, password)| Credentials::new(user, password))
            .ok_or_else(|| {
                IndexerError::Parse(format!(
                    "Credential '{}' is not of the form user:password",
                    term
                ))
            })
    }
}

/// Effective listing settings for one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub filter: String,
    pub header: String,
    pub footer: String,
    pub sort_style: SortStyle,
    pub sort_dir: SortDir,
    pub recursive: bool,
    pub enable_galleries: bool,
    pub show_images_as_files: bool,
    pub auth: Vec<Credentials>,
    pub auth_filtering: bool,
    pub auth_default: BTreeSet<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            filter: String::new(),
            header: String::new(),
            footer: String::new(),
            sort_style: SortStyle::Date,
            sort_dir: SortDir::Descending,
            recursive: true,
            enable_galleries: true,
            show_images_as_files: false,
            auth: Vec::new(),
            auth_filtering: false,
            auth_default: BTreeSet::new(),
        }
    }
}

/// On-disk shape of `indexer.json`. Every key is optional; unknown keys are ignored.
/// A key that is present must hold a value of its type; `null` is a type error.
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default, deserialize_with = "present")]
    filter: Option<String>,
    #[serde(default, deserialize_with = "present")]
    header: Option<String>,
    #[serde(default, deserialize_with = "present")]
    footer: Option<String>,
    #[serde(default, deserialize_with = "present")]
    sort_style: Option<SortStyle>,
    #[serde(default, deserialize_with = "present")]
    sort_dir: Option<SortDir>,
    #[serde(default, deserialize_with = "present")]
    recursive: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    enable_galleries: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    show_images_as_files: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    auth: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    auth_filtering: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    auth_default: Option<String>,
}

fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Splits a colon-separated user list, dropping empty segments.
pub fn split_user_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(':')
        .filter(|user| !user.is_empty())
        .map(str::to_string)
}

impl Settings {
    /// Parses settings from the text of an `indexer.json`.
    ///
    /// Parsing is all-or-nothing: any malformed field rejects the whole document.
    pub fn from_json(contents: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(contents)?;
        if !value.is_object() {
            return Err(IndexerError::Parse(
                "settings file must contain a JSON object".to_string(),
            ));
        }
        let file: SettingsFile = serde_json::from_value(value)?;

        let mut settings = Settings::default();
        if let Some(filter) = file.filter {
            settings.filter = filter;
        }
        if let Some(header) = file.header {
            settings.header = header;
        }
        if let Some(footer) = file.footer {
            settings.footer = footer;
        }
        if let Some(style) = file.sort_style {
            settings.sort_style = style;
        }
        if let Some(dir) = file.sort_dir {
            settings.sort_dir = dir;
        }
        if let Some(recursive) = file.recursive {
            settings.recursive = recursive;
        }
        if let Some(enable) = file.enable_galleries {
            settings.enable_galleries = enable;
        }
        if let Some(show) = file.show_images_as_files {
            settings.show_images_as_files = show;
        }
        if let Some(auth) = file.auth {
            settings.auth = auth
                .iter()
                .map(|term| term.parse())
                .collect::<Result<Vec<Credentials>>>()?;
        }
        if let Some(filtering) = file.auth_filtering {
            settings.auth_filtering = filtering;
        }
        if let Some(default_users) = file.auth_default {
            settings.auth_default = split_user_list(&default_users).collect();
        }
        Ok(settings)
    }

    /// Loads an `indexer.json`, falling back to defaults with a warning when it cannot be used.
    pub fn load_or_default(path: &Path) -> Self {
        let parsed = fs::read_to_string(path)
            .map_err(IndexerError::from)
            .and_then(|contents| Settings::from_json(&contents));
        match parsed {
            Ok(settings) => settings,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to decode settings file");
                Settings::default()
            }
        }
    }

    /// Layers `sort_style` / `sort_dir` query parameters on top of resolved settings.
    ///
    /// Each parameter is applied on its own; values that do not parse are ignored.
    pub fn apply_query_overrides<'a, I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, value) in pairs {
            match key {
                "sort_style" => {
                    if let Ok(style) = value.parse() {
                        self.sort_style = style;
                    }
                }
                "sort_dir" => {
                    if let Ok(dir) = value.parse() {
                        self.sort_dir = dir;
                    }
                }
                _ => {}
            }
        }
    }

    /// Whether `credentials` pass the login gate. An empty `auth` list is open access.
    pub fn is_authorized(&self, credentials: Option<&Credentials>) -> bool {
        if self.auth.is_empty() {
            return true;
        }
        credentials.is_some_and(|given| self.auth.iter().any(|known| known == given))
    }
}
