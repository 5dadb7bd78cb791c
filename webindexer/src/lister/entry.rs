use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Serialize, Serializer};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Everything outside the RFC 3986 unreserved set is escaped.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const PARENT_NAME: &str = "..";

/// Where a listing is served from and which directory backs it.
#[derive(Debug, Clone, Copy)]
pub struct ListingContext<'a> {
    pub base_url: &'a str,
    pub web_path: &'a str,
    pub local_path: &'a Path,
}

impl ListingContext<'_> {
    /// True when the request path has no segments, i.e. the served root.
    pub fn is_root(&self) -> bool {
        !self.web_path.split('/').any(|segment| !segment.is_empty())
    }
}

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub url: String,
    pub is_dir: bool,
    pub is_image: bool,
    pub size: u64,
    #[serde(serialize_with = "serialize_epoch_secs")]
    pub mtime: SystemTime,
    #[serde(skip)]
    pub local_path: PathBuf,
}

fn serialize_epoch_secs<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    serializer.serialize_u64(secs)
}

pub fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Escapes a single path segment for use in a URL.
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Joins `base_url`, the escaped request path and the escaped `name`.
pub fn build_url(base_url: &str, web_path: &str, name: &str, is_dir: bool) -> String {
    let mut url = base_url.trim_end_matches('/').to_string();
    for segment in web_path.split('/').filter(|s| !s.is_empty()) {
        url.push('/');
        url.push_str(&encode_segment(segment));
    }
    url.push('/');
    url.push_str(&encode_segment(name));
    if is_dir {
        url.push('/');
    }
    url
}

impl Entry {
    pub fn from_metadata(ctx: &ListingContext<'_>, path: PathBuf, metadata: &Metadata) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_dir = metadata.is_dir();
        Self {
            url: build_url(ctx.base_url, ctx.web_path, &name, is_dir),
            is_image: !is_dir && is_image_name(&name),
            size: metadata.len(),
            mtime: metadata.modified().unwrap_or(UNIX_EPOCH),
            name,
            is_dir,
            local_path: path,
        }
    }

    /// The synthetic `..` entry pointing one level up from the listed directory.
    pub fn parent(ctx: &ListingContext<'_>) -> Self {
        let local_path = ctx
            .local_path
            .parent()
            .unwrap_or(ctx.local_path)
            .to_path_buf();
        let (size, mtime) = match local_path.metadata() {
            Ok(meta) => (meta.len(), meta.modified().unwrap_or(UNIX_EPOCH)),
            Err(_) => (0, UNIX_EPOCH),
        };
        Self {
            name: PARENT_NAME.to_string(),
            url: build_url(ctx.base_url, ctx.web_path, PARENT_NAME, true),
            is_dir: true,
            is_image: false,
            size,
            mtime,
            local_path,
        }
    }

    pub fn is_parent(&self) -> bool {
        self.name == PARENT_NAME
    }
}
