//! Filename assignment for mirrored PDFs.
//!
//! Every item gets `"<FirstAuthor> et al. <Year>.pdf"`, or a truncated title
//! when the item has no author. Items that share a base name are numbered in
//! input order: the first keeps the bare name, the next becomes
//! `"<base> (2).pdf"`, and so on.
//!
//! Numbering depends on the order the catalog returned the items in. That
//! order is stable within one pass but not guaranteed across passes, so a
//! reordered catalog can swap suffixes between two colliding items.

use bridge_traits::catalog::Item;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::hierarchy::sanitize_name;

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4}").expect("year pattern is valid"));

/// Characters of the title kept when an item has no author.
const TITLE_PREFIX_CHARS: usize = 40;

const PDF_EXTENSION: &str = ".pdf";

/// Last names of the item's authors, in creator order.
pub fn author_last_names(item: &Item) -> Vec<&str> {
    item.creators
        .iter()
        .filter(|c| c.is_author())
        .filter_map(|c| c.display_last_name())
        .collect()
}

/// First run of four ASCII digits in a free-form date.
pub fn extract_year(date: &str) -> Option<&str> {
    YEAR_PATTERN.find(date).map(|m| m.as_str())
}

/// Base filename for one item, before collision numbering.
pub fn base_filename(item: &Item) -> String {
    let mut base = match author_last_names(item).first() {
        Some(author) => format!("{author} et al."),
        None => item
            .title
            .chars()
            .take(TITLE_PREFIX_CHARS)
            .collect::<String>()
            .trim()
            .to_string(),
    };

    if let Some(year) = extract_year(&item.date) {
        if !base.is_empty() {
            base.push(' ');
        }
        base.push_str(year);
    }

    if base.trim().is_empty() {
        base = "Untitled".to_string();
    }

    format!("{}{}", sanitize_name(&base), PDF_EXTENSION)
}

/// Insert ` (n)` before the extension.
fn numbered(filename: &str, n: usize) -> String {
    let stem = filename.strip_suffix(PDF_EXTENSION).unwrap_or(filename);
    format!("{stem} ({n}){PDF_EXTENSION}")
}

/// Assign a final filename to every item, keyed by item key.
///
/// Pure and order-sensitive: the same item order always yields the same map.
pub fn assign_filenames(items: &[Item]) -> HashMap<String, String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut assigned = HashMap::with_capacity(items.len());

    for item in items {
        let base = base_filename(item);
        let count = seen.entry(base.clone()).or_insert(0);
        *count += 1;

        let filename = if *count == 1 {
            base
        } else {
            numbered(&base, *count)
        };
        assigned.insert(item.key.clone(), filename);
    }

    assigned
}
