//! Cross-view selection over file paths.
//!
//! One selection set is shared by the directory listing and the search
//! result list. Range selection works on the *order* of whichever view the
//! click happened in, handed in by the caller as a slice of paths, so the
//! model never inspects rendered rows.

use std::collections::BTreeSet;

use tracing::debug;

/// The view a checkbox interaction happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Folders,
    Results,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Anchor {
    view: ViewKind,
    relpath: String,
}

/// Selected source paths plus the anchor for shift-range selection.
///
/// Invariants: the set never contains an empty path, and membership is
/// keyed by path alone, so the same file selected in either view counts
/// once.
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    selected: BTreeSet<String>,
    anchor: Option<Anchor>,
}

impl SelectionModel {
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, relpath: &str) -> bool {
        self.selected.contains(relpath)
    }

    /// Returns the selected paths in stable (sorted) order.
    pub fn relpaths(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    /// Applies one checkbox interaction.
    ///
    /// `items` is the path order of the view the interaction happened in.
    /// With `shift` held and a usable anchor in the same view, the whole
    /// inclusive range between anchor and target follows `checked`,
    /// regardless of click direction. A shift-click whose anchor is
    /// missing, in the other view, or no longer present in `items`
    /// degrades to a single toggle.
    pub fn toggle(&mut self, view: ViewKind, items: &[&str], relpath: &str, checked: bool, shift: bool) {
        if relpath.is_empty() {
            return;
        }

        let range = shift
            .then(|| self.anchor.as_ref())
            .flatten()
            .filter(|anchor| anchor.view == view)
            .and_then(|anchor| {
                let a = items.iter().position(|item| *item == anchor.relpath)?;
                let b = items.iter().position(|item| *item == relpath)?;
                Some((a.min(b), a.max(b)))
            });

        if let Some((lo, hi)) = range {
            for item in &items[lo..=hi] {
                self.set(item, checked);
            }
            debug!(count = hi - lo + 1, checked, "range selection applied");
            return;
        }

        self.set(relpath, checked);
        self.anchor = Some(Anchor {
            view,
            relpath: relpath.to_string(),
        });
    }

    fn set(&mut self, relpath: &str, checked: bool) {
        if relpath.is_empty() {
            return;
        }
        if checked {
            self.selected.insert(relpath.to_string());
        } else {
            self.selected.remove(relpath);
        }
    }

    /// Selects every path in `items` and clears the anchor: a select-all
    /// is not a click, so the next shift-click has no range to extend.
    pub fn select_all(&mut self, items: &[&str]) {
        for item in items {
            self.set(item, true);
        }
        self.anchor = None;
    }

    /// Clears the selection and the anchor.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
    }

    /// Removes one path from the selection.
    pub fn remove(&mut self, relpath: &str) {
        self.selected.remove(relpath);
        if self
            .anchor
            .as_ref()
            .is_some_and(|anchor| anchor.relpath == relpath)
        {
            self.anchor = None;
        }
    }

    /// Rewrites a selected path after a rename, keeping the anchor in step.
    pub fn rekey(&mut self, old: &str, new: &str) {
        if self.selected.remove(old) && !new.is_empty() {
            self.selected.insert(new.to_string());
        }
        if let Some(mut anchor) = self.anchor.take_if(|anchor| anchor.relpath == old)
            && !new.is_empty()
        {
            anchor.relpath = new.to_string();
            self.anchor = Some(anchor);
        }
    }

    /// Drops selected paths that `visible` rejects, and the anchor with
    /// them if it pointed at a pruned path.
    pub fn retain_visible(&mut self, visible: impl Fn(&str) -> bool) {
        self.selected.retain(|relpath| visible(relpath));
        if self
            .anchor
            .as_ref()
            .is_some_and(|anchor| !self.selected.contains(&anchor.relpath))
        {
            self.anchor = None;
        }
    }
}
