use crate::config::Settings;
use crate::lister::{encode_segment, Entry};
use chrono::{DateTime, Local};
use std::time::SystemTime;

mod html;
mod table;

pub use html::HtmlRenderer;
pub use table::TableFormatter;

/// One link of the "you are here" trail above a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub url: String,
    pub label: String,
}

/// Everything a renderer needs to draw one directory listing.
#[derive(Debug, Clone, Copy)]
pub struct ListingPage<'a> {
    pub base_url: &'a str,
    pub path: &'a str,
    pub links: &'a [Breadcrumb],
    pub entries: &'a [Entry],
    pub settings: &'a Settings,
}

/// Turns listings and error pages into response bodies.
pub trait ListingRenderer: Send + Sync {
    fn render_listing(&self, page: &ListingPage<'_>) -> String;
    fn render_not_found(&self, path: &str) -> String;
    fn render_access_denied(&self, path: &str) -> String;
}

/// Trail of links for `path`: the root (labelled `/`), then one link per segment.
pub fn build_breadcrumbs(base_url: &str, path: &str) -> Vec<Breadcrumb> {
    let mut url = base_url.trim_end_matches('/').to_string();
    url.push('/');
    let mut links = vec![Breadcrumb {
        url: url.clone(),
        label: "/".to_string(),
    }];

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        url.push_str(&encode_segment(segment));
        url.push('/');
        links.push(Breadcrumb {
            url: url.clone(),
            label: segment.to_string(),
        });
    }
    links
}

/// Decimal byte count, e.g. `1.5 kB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["kB", "MB", "GB", "TB", "PB", "EB"];
    if bytes < 1000 {
        return if bytes == 1 {
            "1 Byte".to_string()
        } else {
            format!("{} Bytes", bytes)
        };
    }

    let mut value = bytes as f64 / 1000.0;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

pub fn format_date(time: SystemTime) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(format_size(0), "0 Bytes");
        assert_eq!(format_size(1), "1 Byte");
        assert_eq!(format_size(999), "999 Bytes");
        assert_eq!(format_size(1500), "1.5 kB");
        assert_eq!(format_size(2_000_000), "2.0 MB");
        assert_eq!(format_size(3_210_000_000), "3.2 GB");
    }

    #[test]
    fn breadcrumbs_for_nested_path() {
        let links = build_breadcrumbs("", "/photos/summer 2020/");
        let pairs: Vec<(&str, &str)> = links
            .iter()
            .map(|l| (l.url.as_str(), l.label.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("/", "/"),
                ("/photos/", "photos"),
                ("/photos/summer%202020/", "summer 2020"),
            ]
        );
    }

    #[test]
    fn breadcrumbs_keep_base_url() {
        let links = build_breadcrumbs("/files/", "/a");
        assert_eq!(links[0].url, "/files/");
        assert_eq!(links[1].url, "/files/a/");
    }

    #[test]
    fn root_breadcrumb_has_a_label() {
        let links = build_breadcrumbs("", "/");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].label, "/");
    }
}
