use crate::config::{resolve_settings, Config, Credentials, SETTINGS_FILE};
use crate::error::{IndexerError, Result};
use crate::filter::{access_resolver, AccessResolver, NoAccessAttributes};
use crate::formatter::{build_breadcrumbs, HtmlRenderer, ListingPage, ListingRenderer};
use crate::lister::{list_entries, ListingContext};
use crate::utils::thumbnail::ThumbnailCache;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use percent_encoding::percent_decode_str;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Path prefix under which thumbnails are served.
pub const THUMBNAIL_PREFIX: &str = ".thumb";

/// The parts of an HTTP request the indexer looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexRequest<'a> {
    /// Percent-encoded request path, e.g. `/photos/summer%202020/`.
    pub path: &'a str,
    pub query: Option<&'a str>,
    /// Raw `Authorization` header value.
    pub authorization: Option<&'a str>,
}

/// What the transport should send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexResponse {
    Listing { body: String },
    File { path: PathBuf, content_type: String },
    Thumbnail { path: PathBuf },
    NotFound { body: String },
    AccessDenied { body: String },
    LoginRequired,
    ServerError { message: String },
}

impl IndexResponse {
    pub fn status(&self) -> u16 {
        match self {
            IndexResponse::Listing { .. }
            | IndexResponse::File { .. }
            | IndexResponse::Thumbnail { .. } => 200,
            IndexResponse::LoginRequired => 401,
            IndexResponse::AccessDenied { .. } => 403,
            IndexResponse::NotFound { .. } => 404,
            IndexResponse::ServerError { .. } => 500,
        }
    }
}

/// Decodes an HTTP Basic `Authorization` header. Anything malformed is anonymous.
pub fn parse_basic_auth(header: &str) -> Option<Credentials> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    text.parse().ok()
}

/// Splits a request path into clean segments. `None` means the path must not be served.
fn sanitize_path(raw: &str) -> Option<Vec<String>> {
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;
    let mut segments = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            other if other.contains('\0') || other.contains('\\') => return None,
            other => segments.push(other.to_string()),
        }
    }
    Some(segments)
}

fn web_path(segments: &[String], is_dir: bool) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut path = format!("/{}", segments.join("/"));
    if is_dir {
        path.push('/');
    }
    path
}

/// Serves a directory tree: listings, raw files and thumbnails.
pub struct Indexer {
    root: PathBuf,
    base_url: String,
    renderer: Box<dyn ListingRenderer>,
    thumbnails: ThumbnailCache,
    access: Box<dyn AccessResolver>,
}

impl Indexer {
    pub fn new(root: PathBuf, thumbnails: ThumbnailCache) -> Self {
        Self {
            root,
            base_url: String::new(),
            renderer: Box::new(HtmlRenderer),
            thumbnails,
            access: Box::new(NoAccessAttributes),
        }
    }

    /// Builds an indexer for the configured root, thumbnail cache and access source.
    pub fn from_config(config: &Config) -> Result<Self> {
        let root = config.canonical_root()?;
        let thumbnails = ThumbnailCache::new(config.thumbnail_dir.clone(), config.thumbnail_size);
        Ok(Indexer::new(root, thumbnails)
            .with_base_url(config.base_url.clone())
            .with_access_resolver(access_resolver(&config.access_attributes)))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn ListingRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_access_resolver(mut self, access: Box<dyn AccessResolver>) -> Self {
        self.access = access;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn not_found(&self, path: &str) -> IndexResponse {
        IndexResponse::NotFound {
            body: self.renderer.render_not_found(path),
        }
    }

    /// Login gate for anything inside `directory`.
    fn is_authorized(&self, directory: &Path, credentials: Option<&Credentials>) -> bool {
        resolve_settings(directory, &self.root).is_authorized(credentials)
    }

    pub fn handle(&self, request: &IndexRequest<'_>) -> IndexResponse {
        let credentials = request.authorization.and_then(parse_basic_auth);
        let segments = match sanitize_path(request.path) {
            Some(segments) => segments,
            None => {
                debug!(path = request.path, "rejected request path");
                return self.not_found(request.path);
            }
        };

        if segments.first().map(String::as_str) == Some(THUMBNAIL_PREFIX) {
            return self.respond_thumbnail(&segments[1..], credentials.as_ref());
        }

        let local_path = segments
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(segment));

        if !local_path.exists() {
            return self.not_found(&web_path(&segments, false));
        }

        if !local_path.is_dir() {
            return self.respond_file(&segments, local_path, credentials.as_ref());
        }

        self.respond_listing(&segments, &local_path, request.query, credentials.as_ref())
    }

    fn respond_thumbnail(
        &self,
        segments: &[String],
        credentials: Option<&Credentials>,
    ) -> IndexResponse {
        let display = format!("/{}{}", THUMBNAIL_PREFIX, web_path(segments, false));
        if segments.is_empty() {
            return self.not_found(&display);
        }
        let source = segments
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(segment));
        if !source.is_file() {
            return self.not_found(&display);
        }

        let directory = source.parent().unwrap_or(&self.root);
        if !self.is_authorized(directory, credentials) {
            return IndexResponse::LoginRequired;
        }

        match self.thumbnails.get_or_create(&source) {
            Ok(path) => IndexResponse::Thumbnail { path },
            Err(err) => {
                error!(source = %source.display(), error = %err, "thumbnail generation failed");
                self.not_found(&display)
            }
        }
    }

    fn respond_file(
        &self,
        segments: &[String],
        local_path: PathBuf,
        credentials: Option<&Credentials>,
    ) -> IndexResponse {
        if local_path.file_name().and_then(|n| n.to_str()) == Some(SETTINGS_FILE) {
            return IndexResponse::AccessDenied {
                body: self
                    .renderer
                    .render_access_denied(&web_path(segments, false)),
            };
        }

        let directory = local_path.parent().unwrap_or(&self.root);
        if !self.is_authorized(directory, credentials) {
            return IndexResponse::LoginRequired;
        }

        let content_type = mime_guess::from_path(&local_path)
            .first_or_octet_stream()
            .to_string();
        IndexResponse::File {
            path: local_path,
            content_type,
        }
    }

    fn respond_listing(
        &self,
        segments: &[String],
        local_path: &Path,
        query: Option<&str>,
        credentials: Option<&Credentials>,
    ) -> IndexResponse {
        let mut settings = resolve_settings(local_path, &self.root);
        if !settings.is_authorized(credentials) {
            return IndexResponse::LoginRequired;
        }

        if let Some(query) = query {
            let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect();
            settings.apply_query_overrides(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let path = web_path(segments, true);
        let ctx = ListingContext {
            base_url: &self.base_url,
            web_path: &path,
            local_path,
        };
        let entries = match list_entries(&ctx, &settings, credentials, self.access.as_ref()) {
            Ok(entries) => entries,
            Err(err) => {
                error!(path = %local_path.display(), error = %err, "cannot list directory");
                return match err {
                    IndexerError::Io(ref io_err)
                        if io_err.kind() == io::ErrorKind::NotFound =>
                    {
                        self.not_found(&path)
                    }
                    _ => IndexResponse::ServerError {
                        message: err.to_string(),
                    },
                };
            }
        };

        let links = build_breadcrumbs(&self.base_url, &path);
        let body = self.renderer.render_listing(&ListingPage {
            base_url: &self.base_url,
            path: &path,
            links: &links,
            entries: &entries,
            settings: &settings,
        });
        IndexResponse::Listing { body }
    }
}
