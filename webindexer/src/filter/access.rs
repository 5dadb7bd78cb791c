//! Per-entry access lists.
//!
//! Each entry may carry up to three colon-separated user lists. `access` replaces
//! the directory's default users, `access_add` adds to the result and
//! `access_del` removes from it, always in that order.

use crate::config::split_user_list;
use std::collections::BTreeSet;
use std::io;
use std::path::Path;

pub const ACCESS_ATTR: &str = "user.access";
pub const ACCESS_ADD_ATTR: &str = "user.access_add";
pub const ACCESS_DEL_ATTR: &str = "user.access_del";

/// Raw access lists attached to one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessAttributes {
    pub access: Option<String>,
    pub access_add: Option<String>,
    pub access_del: Option<String>,
}

/// Source of access lists for filesystem entries.
pub trait AccessResolver: Send + Sync {
    /// Reads the access lists of `path`. Errors make the caller hide the entry.
    fn attributes(&self, path: &Path) -> io::Result<AccessAttributes>;
}

/// Resolver for platforms or deployments without access lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAccessAttributes;

impl AccessResolver for NoAccessAttributes {
    fn attributes(&self, _path: &Path) -> io::Result<AccessAttributes> {
        Ok(AccessAttributes::default())
    }
}

/// Reads access lists from `user.*` extended attributes, following symlinks.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct XattrAccessResolver;

#[cfg(unix)]
impl XattrAccessResolver {
    fn read(path: &Path, name: &str) -> io::Result<Option<String>> {
        match xattr::get_deref(path, name)? {
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|err| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{} on {} is not UTF-8: {}", name, path.display(), err),
                )
            }),
            None => Ok(None),
        }
    }
}

#[cfg(unix)]
impl AccessResolver for XattrAccessResolver {
    fn attributes(&self, path: &Path) -> io::Result<AccessAttributes> {
        Ok(AccessAttributes {
            access: Self::read(path, ACCESS_ATTR)?,
            access_add: Self::read(path, ACCESS_ADD_ATTR)?,
            access_del: Self::read(path, ACCESS_DEL_ATTR)?,
        })
    }
}

/// Computes the users allowed to see an entry.
pub fn compose_valid_users(
    default_users: &BTreeSet<String>,
    attributes: &AccessAttributes,
) -> BTreeSet<String> {
    let mut valid_users = match &attributes.access {
        Some(access) => split_user_list(access).collect(),
        None => default_users.clone(),
    };

    if let Some(added) = &attributes.access_add {
        valid_users.extend(split_user_list(added));
    }

    if let Some(removed) = &attributes.access_del {
        for user in split_user_list(removed) {
            valid_users.remove(&user);
        }
    }

    valid_users
}
