use super::{format_date, format_size};
use crate::lister::Entry;
use colored::*;

/// Boxed terminal table of a listing, used by the `list` command.
pub struct TableFormatter {
    pub use_color: bool,
}

impl TableFormatter {
    const PADDING: usize = 1;
    const HEADERS: [&'static str; 3] = ["Name", "Size", "Modified"];

    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn border(&self, text: String) -> String {
        if self.use_color {
            text.bright_black().to_string()
        } else {
            text
        }
    }

    fn create_line(&self, widths: &[usize], left: char, middle: char, right: char) -> String {
        let mut line = String::new();
        line.push(left);
        for (i, &width) in widths.iter().enumerate() {
            line.push_str(&"─".repeat(width + Self::PADDING * 2));
            if i < widths.len() - 1 {
                line.push(middle);
            }
        }
        line.push(right);
        self.border(line)
    }

    fn format_cell(content: &str, width: usize, align_right: bool) -> String {
        let padding = width.saturating_sub(content.chars().count());
        if align_right {
            format!("{}{}", " ".repeat(padding), content)
        } else {
            format!("{}{}", content, " ".repeat(padding))
        }
    }

    fn create_row(&self, values: &[String], widths: &[usize], is_dir: bool) -> String {
        let bar = self.border("│".to_string());
        let mut row = bar.clone();
        for (idx, (value, width)) in values.iter().zip(widths.iter()).enumerate() {
            let cell = Self::format_cell(value, *width, idx == 1);
            let cell = if self.use_color && idx == 0 && is_dir {
                cell.blue().bold().to_string()
            } else {
                cell
            };
            row.push(' ');
            row.push_str(&cell);
            row.push(' ');
            row.push_str(&bar);
        }
        row
    }

    fn render_values(entry: &Entry) -> Vec<String> {
        let name = if entry.is_dir {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        };
        let size = if entry.is_dir {
            "-".to_string()
        } else {
            format_size(entry.size)
        };
        vec![name, size, format_date(entry.mtime)]
    }

    pub fn format_entries(&self, entries: &[Entry]) -> String {
        if entries.is_empty() {
            return String::new();
        }

        let headers: Vec<String> = Self::HEADERS.iter().map(|h| h.to_string()).collect();
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        let rows: Vec<(Vec<String>, bool)> = entries
            .iter()
            .map(|entry| (Self::render_values(entry), entry.is_dir))
            .collect();
        for (values, _) in &rows {
            for (idx, value) in values.iter().enumerate() {
                widths[idx] = widths[idx].max(value.chars().count());
            }
        }

        let mut output = String::new();
        output.push_str(&self.create_line(&widths, '┌', '┬', '┐'));
        output.push('\n');
        output.push_str(&self.create_row(&headers, &widths, false));
        output.push('\n');
        output.push_str(&self.create_line(&widths, '├', '┼', '┤'));
        output.push('\n');
        for (values, is_dir) in rows {
            output.push_str(&self.create_row(&values, &widths, is_dir));
            output.push('\n');
        }
        output.push_str(&self.create_line(&widths, '└', '┴', '┘'));
        output.push('\n');
        output
    }
}
