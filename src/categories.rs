//! Label-file loading and the name → category-id mapping.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::warn;

use crate::coco::Category;
use crate::error::{Error, Result};

/// Reserved first line of the labels file; never assigned an id.
pub const IGNORE_LABEL: &str = "__ignore__";

/// The loaded label table: the lookup map used while converting, plus the
/// COCO `categories` entries in label-file order.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    pub name_to_id: HashMap<String, u32>,
    pub categories: Vec<Category>,
}

/// Read and parse the labels file (one class name per line, first line the
/// ignore sentinel).
pub fn load_labels(path: &Path) -> Result<LabelTable> {
    let text = fs::read_to_string(path).map_err(|source| Error::io(path, source))?;
    parse_labels(text.lines())
}

/// Parse label lines into a [`LabelTable`].
///
/// The first line must equal [`IGNORE_LABEL`]; subsequent lines are
/// assigned ids 0, 1, … in order. Duplicate names are kept in the
/// `categories` list but the later id shadows the earlier one in the
/// lookup map; a warning is emitted so the operator can clean the file.
pub fn parse_labels<'a, I>(lines: I) -> Result<LabelTable>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut table = LabelTable::default();

    for (i, line) in lines.into_iter().enumerate() {
        let name = line.trim();
        if i == 0 {
            if name != IGNORE_LABEL {
                return Err(Error::LabelFormat {
                    expected: IGNORE_LABEL,
                    found: name.to_string(),
                });
            }
            continue;
        }

        let id = (i - 1) as u32;
        if let Some(previous) = table.name_to_id.insert(name.to_string(), id) {
            warn!(
                "duplicate label {:?}: id {} shadows id {}",
                name, id, previous
            );
        }
        table.categories.push(Category {
            supercategory: None,
            id,
            name: name.to_string(),
        });
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_line_order() {
        let table = parse_labels(["__ignore__", "cat", "dog", "bird"]).unwrap();
        assert_eq!(table.name_to_id["cat"], 0);
        assert_eq!(table.name_to_id["dog"], 1);
        assert_eq!(table.name_to_id["bird"], 2);
        let names: Vec<_> = table.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["cat", "dog", "bird"]);
    }

    #[test]
    fn sentinel_never_gets_an_id() {
        let table = parse_labels(["__ignore__", "cat"]).unwrap();
        assert!(!table.name_to_id.contains_key(IGNORE_LABEL));
        assert!(table.categories.iter().all(|c| c.name != IGNORE_LABEL));
    }

    #[test]
    fn missing_sentinel_fails() {
        let err = parse_labels(["cat", "dog"]).unwrap_err();
        assert!(matches!(err, Error::LabelFormat { ref found, .. } if found == "cat"));
    }

    #[test]
    fn lines_are_trimmed() {
        let table = parse_labels(["  __ignore__  ", " cat "]).unwrap();
        assert_eq!(table.name_to_id["cat"], 0);
    }

    #[test]
    fn duplicate_label_keeps_last_id() {
        let table = parse_labels(["__ignore__", "cat", "dog", "cat"]).unwrap();
        assert_eq!(table.name_to_id["cat"], 2);
        // Both entries remain in the categories list.
        assert_eq!(table.categories.len(), 3);
    }
}
