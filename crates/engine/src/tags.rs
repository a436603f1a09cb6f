//! Filename tag codec.
//!
//! Tags are carried in the filename itself as one or more bracket groups,
//! e.g. `match3 [goal, away] [firsthalf].mp4`. The backend owns the write
//! side (it renames files when tags change); this module only decodes.

use std::collections::HashSet;

/// Extracts tags from a filename.
///
/// Scans every `[...]` group left to right and splits the group body on
/// whitespace and commas. Duplicate tags are dropped case-insensitively,
/// keeping the first-seen spelling.
///
/// # Example
/// ```
/// use engine::tags::extract_tags;
///
/// let tags = extract_tags("match3 [Goal, away][goal].mp4");
/// assert_eq!(tags, vec!["Goal", "away"]);
/// ```
pub fn extract_tags(filename: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut seen = HashSet::new();
    let mut rest = filename;

    while let Some(open) = rest.find('[') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find(']') else {
            break;
        };
        for token in after_open[..close].split(|c: char| c.is_whitespace() || c == ',') {
            if token.is_empty() {
                continue;
            }
            if seen.insert(token.to_lowercase()) {
                tags.push(token.to_string());
            }
        }
        rest = &after_open[close + 1..];
    }

    tags
}

/// Returns the filename component of a slash-separated relative path.
pub fn filename_from_relpath(relpath: &str) -> &str {
    relpath.rsplit('/').next().unwrap_or(relpath)
}

#[cfg(test)]
mod tests {
    use super::{extract_tags, filename_from_relpath};

    #[test]
    fn extracts_tags_from_multiple_bracket_groups() {
        let tags = extract_tags("match3 [goal, away] [firsthalf].mp4");
        assert_eq!(tags, vec!["goal", "away", "firsthalf"]);
    }

    #[test]
    fn splits_group_bodies_on_whitespace_and_commas() {
        let tags = extract_tags("clip [a b,c,,  d].mp4");
        assert_eq!(tags, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn deduplicates_case_insensitively_keeping_first_spelling() {
        let tags = extract_tags("clip [Goal goal][GOAL, other].mp4");
        assert_eq!(tags, vec!["Goal", "other"]);
    }

    #[test]
    fn filename_without_brackets_has_no_tags() {
        assert!(extract_tags("plain_name.mp4").is_empty());
    }

    #[test]
    fn unterminated_bracket_group_is_ignored() {
        let tags = extract_tags("clip [done] [oops.mp4");
        assert_eq!(tags, vec!["done"]);
    }

    #[test]
    fn filename_from_relpath_takes_the_last_component() {
        assert_eq!(filename_from_relpath("a/b/c.mp4"), "c.mp4");
        assert_eq!(filename_from_relpath("c.mp4"), "c.mp4");
    }
}
