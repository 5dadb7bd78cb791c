use crate::config::{SortDir, SortStyle};
use crate::lister::Entry;

mod natural;

pub use natural::NaturalKey;

/// Sorts one group of entries in place by `style`, ascending, then reverses it
/// for descending order. The sort is stable, so ties keep enumeration order.
pub fn sort_group(entries: &mut [Entry], style: SortStyle, dir: SortDir) {
    match style {
        SortStyle::Name => entries.sort_by_cached_key(|entry| NaturalKey::new(&entry.name)),
        SortStyle::Size => entries.sort_by_key(|entry| entry.size),
        SortStyle::Date => entries.sort_by_key(|entry| entry.mtime),
    }

    if dir == SortDir::Descending {
        entries.reverse();
    }
}

/// Orders a listing: optional parent first, then directories, then files.
pub fn sort_listing(
    mut directories: Vec<Entry>,
    mut files: Vec<Entry>,
    style: SortStyle,
    dir: SortDir,
    parent: Option<Entry>,
) -> Vec<Entry> {
    sort_group(&mut directories, style, dir);
    sort_group(&mut files, style, dir);

    let mut listing = Vec::with_capacity(directories.len() + files.len() + 1);
    listing.extend(parent);
    listing.extend(directories);
    listing.extend(files);
    listing
}
