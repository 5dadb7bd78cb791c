use super::entry::{Entry, ListingContext};
use crate::config::{Credentials, Settings, SETTINGS_FILE};
use crate::error::Result;
use crate::filter::{compose_valid_users, AccessResolver, NameFilter};
use crate::sorter::sort_listing;
use std::fs;
use std::io;
use tracing::{error, warn};

/// Directory and file children of one directory, in enumeration order.
#[derive(Debug, Default)]
pub struct Catalog {
    pub directories: Vec<Entry>,
    pub files: Vec<Entry>,
}

/// Enumerates and filters the children of a directory for one caller.
pub struct EntryCatalog<'a> {
    settings: &'a Settings,
    credentials: Option<&'a Credentials>,
    access: &'a dyn AccessResolver,
}

impl<'a> EntryCatalog<'a> {
    pub fn new(
        settings: &'a Settings,
        credentials: Option<&'a Credentials>,
        access: &'a dyn AccessResolver,
    ) -> Self {
        Self {
            settings,
            credentials,
            access,
        }
    }

    fn name_filter(&self) -> NameFilter {
        match NameFilter::new(&self.settings.filter) {
            Ok(filter) => filter,
            Err(err) => {
                warn!(filter = %self.settings.filter, error = %err, "ignoring invalid filter");
                NameFilter::disabled()
            }
        }
    }

    /// Whether the caller may see `entry`. Attribute read failures hide the entry.
    fn is_visible(&self, entry: &Entry) -> bool {
        let attributes = match self.access.attributes(&entry.local_path) {
            Ok(attributes) => attributes,
            Err(err) => {
                error!(
                    path = %entry.local_path.display(),
                    error = %err,
                    "cannot read access lists"
                );
                return false;
            }
        };
        let valid_users = compose_valid_users(&self.settings.auth_default, &attributes);
        self.credentials
            .is_some_and(|credentials| valid_users.contains(&credentials.user))
    }

    pub fn collect(&self, ctx: &ListingContext<'_>) -> Result<Catalog> {
        let filter = self.name_filter();
        let mut catalog = Catalog::default();

        for dent in fs::read_dir(ctx.local_path)? {
            let dent = match dent {
                Ok(dent) => dent,
                Err(err) => {
                    warn!(
                        dir = %ctx.local_path.display(),
                        error = %err,
                        "skipping unreadable entry"
                    );
                    continue;
                }
            };

            let name = dent.file_name();
            let name = name.to_string_lossy();
            if name == SETTINGS_FILE {
                continue;
            }

            let path = dent.path();
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping entry without metadata");
                    continue;
                }
            };

            if filter.excludes(&name) {
                continue;
            }

            let entry = Entry::from_metadata(ctx, path, &metadata);

            if self.settings.auth_filtering && !self.is_visible(&entry) {
                continue;
            }

            if entry.is_dir {
                catalog.directories.push(entry);
            } else {
                catalog.files.push(entry);
            }
        }

        Ok(catalog)
    }
}

/// Builds the ordered listing for `ctx.local_path`.
///
/// The parent entry is prepended unless the request path is the served root.
pub fn list_entries(
    ctx: &ListingContext<'_>,
    settings: &Settings,
    credentials: Option<&Credentials>,
    access: &dyn AccessResolver,
) -> Result<Vec<Entry>> {
    let catalog = EntryCatalog::new(settings, credentials, access).collect(ctx)?;
    let parent = if ctx.is_root() {
        None
    } else {
        Some(Entry::parent(ctx))
    };

    Ok(sort_listing(
        catalog.directories,
        catalog.files,
        settings.sort_style,
        settings.sort_dir,
        parent,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SortDir, SortStyle};
    use crate::filter::{AccessAttributes, NoAccessAttributes};
    use std::collections::{BTreeSet, HashMap};
    use std::path::{Path, PathBuf};

    /// Access lists keyed by file name; names listed in `broken` fail to read.
    #[derive(Default)]
    struct FakeAccess {
        lists: HashMap<String, AccessAttributes>,
        broken: Vec<String>,
    }

    impl AccessResolver for FakeAccess {
        fn attributes(&self, path: &Path) -> io::Result<AccessAttributes> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            if self.broken.contains(&name) {
                return Err(io::Error::new(io::ErrorKind::Other, "attribute read failed"));
            }
            Ok(self.lists.get(&name).cloned().unwrap_or_default())
        }
    }

    fn ctx<'a>(web_path: &'a str, local: &'a Path) -> ListingContext<'a> {
        ListingContext {
            base_url: "",
            web_path,
            local_path: local,
        }
    }

    fn names(entries: &[Entry]) -> Vec<String> {
        entries.iter().map(|e| e.name.clone()).collect()
    }

    fn by_name() -> Settings {
        Settings {
            sort_style: SortStyle::Name,
            sort_dir: SortDir::Ascending,
            ..Settings::default()
        }
    }

    fn tree() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("a.txt"), b"aaa").unwrap();
        fs::write(tmp.path().join(".hidden"), b"").unwrap();
        fs::write(tmp.path().join(SETTINGS_FILE), b"{}").unwrap();
        tmp
    }

    #[test]
    fn settings_file_is_never_listed() {
        let tmp = tree();
        let listing =
            list_entries(&ctx("/", tmp.path()), &by_name(), None, &NoAccessAttributes).unwrap();
        assert_eq!(names(&listing), vec!["sub", ".hidden", "a.txt"]);
    }

    #[test]
    fn filter_hides_matching_names() {
        let tmp = tree();
        let settings = Settings {
            filter: r"^\.".to_string(),
            ..by_name()
        };
        let listing =
            list_entries(&ctx("/", tmp.path()), &settings, None, &NoAccessAttributes).unwrap();
        assert_eq!(names(&listing), vec!["sub", "a.txt"]);
    }

    #[test]
    fn invalid_filter_lists_everything() {
        let tmp = tree();
        let settings = Settings {
            filter: "(".to_string(),
            ..by_name()
        };
        let listing =
            list_entries(&ctx("/", tmp.path()), &settings, None, &NoAccessAttributes).unwrap();
        assert_eq!(listing.len(), 3);
    }

    #[test]
    fn parent_entry_outside_root_only() {
        let tmp = tree();
        let sub = tmp.path().join("sub");
        fs::write(sub.join("inner.txt"), b"x").unwrap();

        let listing =
            list_entries(&ctx("/sub/", &sub), &by_name(), None, &NoAccessAttributes).unwrap();
        assert_eq!(names(&listing), vec!["..", "inner.txt"]);
        assert_eq!(listing[0].url, "/sub/../");
        assert_eq!(listing[0].local_path, tmp.path().to_path_buf());
        assert_eq!(listing[1].url, "/sub/inner.txt");

        let root_listing =
            list_entries(&ctx("/", tmp.path()), &by_name(), None, &NoAccessAttributes).unwrap();
        assert!(root_listing.iter().all(|e| !e.is_parent()));
    }

    #[test]
    fn entries_carry_metadata() {
        let tmp = tree();
        let listing =
            list_entries(&ctx("/", tmp.path()), &by_name(), None, &NoAccessAttributes).unwrap();
        let file = listing.iter().find(|e| e.name == "a.txt").unwrap();
        assert_eq!(file.size, 3);
        assert!(!file.is_dir);
        assert_eq!(file.url, "/a.txt");
        let dir = listing.iter().find(|e| e.name == "sub").unwrap();
        assert!(dir.is_dir);
        assert_eq!(dir.url, "/sub/");
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_skipped() {
        let tmp = tree();
        std::os::unix::fs::symlink(tmp.path().join("missing"), tmp.path().join("dangling"))
            .unwrap();
        let listing =
            list_entries(&ctx("/", tmp.path()), &by_name(), None, &NoAccessAttributes).unwrap();
        assert!(!names(&listing).contains(&"dangling".to_string()));
    }

    #[test]
    fn access_filtering_uses_composed_lists() {
        let tmp = tree();
        let mut access = FakeAccess::default();
        access.lists.insert(
            "a.txt".to_string(),
            AccessAttributes {
                access_add: Some("carol".to_string()),
                access_del: Some("bob".to_string()),
                ..AccessAttributes::default()
            },
        );
        let settings = Settings {
            auth_filtering: true,
            auth_default: ["alice", "bob"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            ..by_name()
        };

        let list_for = |user: &str| {
            let credentials = Credentials::new(user, "pw");
            let listing =
                list_entries(&ctx("/", tmp.path()), &settings, Some(&credentials), &access);
            names(&listing.unwrap())
        };

        assert_eq!(list_for("alice"), vec!["sub", ".hidden", "a.txt"]);
        assert_eq!(list_for("bob"), vec!["sub", ".hidden"]);
        assert_eq!(list_for("carol"), vec!["a.txt"]);
        assert!(list_for("mallory").is_empty());
    }

    #[test]
    fn anonymous_caller_sees_nothing_when_filtering() {
        let tmp = tree();
        let settings = Settings {
            auth_filtering: true,
            auth_default: ["alice"].iter().map(|s| s.to_string()).collect(),
            ..by_name()
        };
        let listing =
            list_entries(&ctx("/", tmp.path()), &settings, None, &NoAccessAttributes).unwrap();
        assert!(listing.is_empty());
    }

    #[test]
    fn attribute_failure_hides_only_that_entry() {
        let tmp = tree();
        let access = FakeAccess {
            broken: vec!["sub".to_string()],
            ..FakeAccess::default()
        };
        let settings = Settings {
            auth_filtering: true,
            auth_default: ["alice"].iter().map(|s| s.to_string()).collect(),
            ..by_name()
        };
        let credentials = Credentials::new("alice", "pw");
        let listing =
            list_entries(&ctx("/", tmp.path()), &settings, Some(&credentials), &access).unwrap();
        assert_eq!(names(&listing), vec![".hidden", "a.txt"]);
    }

    #[test]
    fn repeated_listings_are_identical() {
        let tmp = tree();
        for i in 0..5 {
            fs::write(tmp.path().join(format!("f{}", i)), vec![0u8; i]).unwrap();
        }
        let settings = Settings::default();
        let credentials = Credentials::new("alice", "pw");
        let list = || {
            list_entries(
                &ctx("/", tmp.path()),
                &settings,
                Some(&credentials),
                &NoAccessAttributes,
            )
            .unwrap()
        };
        let first = list();
        let second = list();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let gone: PathBuf = tmp.path().join("gone");
        let result = list_entries(
            &ctx("/gone", &gone),
            &Settings::default(),
            None,
            &NoAccessAttributes,
        );
        assert!(result.is_err());
    }
}
