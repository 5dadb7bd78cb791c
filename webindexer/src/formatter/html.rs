use super::{format_date, format_size, ListingPage, ListingRenderer};
use crate::config::{SortDir, SortStyle};
use crate::lister::{build_url, Entry};
use maud::{html, Markup, PreEscaped, DOCTYPE};

const STYLE: &str = r#"
        body { background: #FFFAF5; font-family: sans-serif; }
        a { color: green; }
        table { border-collapse: collapse; min-width: 50vw; }
        h1 { font-size: 20pt; font-weight: normal; }
        th, td { text-align: left; padding: 0.3em; }
        th { font-weight: normal; background: #DDC; }
        td { border-left: 1px solid #DDC; border-right: 1px solid #DDC; }
        tr:last-child td { border-bottom: 1px solid #DDC; }
        .gallery { display: flex; flex-wrap: wrap; gap: 0.5em; margin: 1em 0; }
        .gallery a { display: block; width: 150px; text-align: center; font-size: 9pt; }
        .gallery img { width: 150px; height: 150px; object-fit: cover; }
"#;

/// Built-in HTML pages. Every interpolated value is escaped by `maud`; only the
/// configured header and footer are inserted verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

fn document(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) }
                style type="text/css" { (PreEscaped(STYLE)) }
            }
            body { (body) }
        }
    }
}

impl HtmlRenderer {
    fn sort_link(page: &ListingPage<'_>, style: SortStyle) -> Markup {
        let settings = page.settings;
        let label = match style {
            SortStyle::Name => "Name",
            SortStyle::Size => "Size",
            SortStyle::Date => "Date",
        };
        let (dir, marker) = if settings.sort_style == style {
            let marker = match settings.sort_dir {
                SortDir::Ascending => "\u{25B2}",
                SortDir::Descending => "\u{25BC}",
            };
            (settings.sort_dir.reverse(), Some(marker))
        } else {
            (settings.sort_dir, None)
        };
        let href = format!("?sort_style={}&sort_dir={}", style, dir);

        html! {
            a href=(href) { (label) }
            @if let Some(marker) = marker {
                " " (marker)
            }
        }
    }

    fn thumbnail_url(page: &ListingPage<'_>, entry: &Entry) -> String {
        build_url(
            page.base_url,
            &format!("/.thumb/{}", page.path.trim_start_matches('/')),
            &entry.name,
            false,
        )
    }

    fn row(entry: &Entry) -> Markup {
        html! {
            tr {
                td {
                    a href=(entry.url) {
                        (entry.name)
                        @if entry.is_dir { "/" }
                    }
                }
                td {
                    @if !entry.is_dir { (format_size(entry.size)) }
                }
                td {
                    @if !entry.is_parent() { (format_date(entry.mtime)) }
                }
            }
        }
    }
}

impl ListingRenderer for HtmlRenderer {
    fn render_listing(&self, page: &ListingPage<'_>) -> String {
        let settings = page.settings;
        let gallery_mode = settings.enable_galleries && !settings.show_images_as_files;
        let (images, rows): (Vec<&Entry>, Vec<&Entry>) = page
            .entries
            .iter()
            .partition(|entry| gallery_mode && entry.is_image && !entry.is_dir);

        let body = html! {
            @if !settings.header.is_empty() {
                (PreEscaped(&settings.header))
            }
            h1 {
                "Index of "
                @for (idx, link) in page.links.iter().enumerate() {
                    a href=(link.url) { (link.label) }
                    @if idx > 0 { "/" }
                }
            }
            table {
                thead {
                    tr {
                        @for style in SortStyle::ALL {
                            th { (Self::sort_link(page, style)) }
                        }
                    }
                }
                tbody {
                    @for entry in &rows {
                        (Self::row(entry))
                    }
                }
            }
            @if !images.is_empty() {
                div.gallery {
                    @for entry in &images {
                        a href=(entry.url) {
                            img
                                src=(Self::thumbnail_url(page, entry))
                                alt=(entry.name)
                                loading="lazy";
                            br;
                            (entry.name)
                        }
                    }
                }
            }
            @if !settings.footer.is_empty() {
                (PreEscaped(&settings.footer))
            }
        };

        document(&format!("Index of {}", page.path), body).into_string()
    }

    fn render_not_found(&self, path: &str) -> String {
        document(
            "Not found",
            html! {
                h1 { "Not found" }
                p { "The path " code { (path) } " was not found on this server." }
            },
        )
        .into_string()
    }

    fn render_access_denied(&self, path: &str) -> String {
        document(
            "Access denied",
            html! {
                h1 { "Access denied" }
                p { "You are not allowed to view " code { (path) } "." }
            },
        )
        .into_string()
    }
}
