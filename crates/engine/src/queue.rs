//! Merge queue ordering rules.
//!
//! The queue itself lives on the backend; this module only decides where a
//! dragged or newly added item should land and what the persisted id order
//! becomes. Geometry comes in as measured row bounds so the rules stay
//! independent of any widget tree.

/// Vertical bounds of one rendered queue row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBounds {
    pub top: f64,
    pub height: f64,
}

impl RowBounds {
    fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Maps a drop position to an insertion index.
///
/// The index is the first row whose vertical midpoint lies below the
/// pointer; a drop below every midpoint appends.
pub fn insert_index(rows: &[RowBounds], pointer_y: f64) -> usize {
    rows.iter()
        .position(|row| pointer_y < row.midpoint())
        .unwrap_or(rows.len())
}

/// Moves `item_id` to `target_index` within the id order.
///
/// The index is interpreted against the list *without* the moved item, so
/// moving an item one slot down lands where the caller sees it land. An
/// out-of-range index clamps to the end. Returns `None` when the id is not
/// in the queue.
pub fn reorder(ids: &[i64], item_id: i64, target_index: usize) -> Option<Vec<i64>> {
    let current = ids.iter().position(|id| *id == item_id)?;
    let mut out = ids.to_vec();
    out.remove(current);
    let index = target_index.min(out.len());
    out.insert(index, item_id);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::{RowBounds, insert_index, reorder};

    fn rows() -> Vec<RowBounds> {
        (0..4)
            .map(|i| RowBounds {
                top: i as f64 * 40.0,
                height: 40.0,
            })
            .collect()
    }

    #[test]
    fn drop_above_the_first_midpoint_inserts_at_zero() {
        assert_eq!(insert_index(&rows(), 10.0), 0);
    }

    #[test]
    fn drop_between_midpoints_inserts_between_the_rows() {
        assert_eq!(insert_index(&rows(), 65.0), 1);
        assert_eq!(insert_index(&rows(), 101.0), 2);
    }

    #[test]
    fn drop_below_every_midpoint_appends() {
        assert_eq!(insert_index(&rows(), 500.0), 4);
        assert_eq!(insert_index(&[], 0.0), 0);
    }

    #[test]
    fn reorder_moves_an_item_to_the_target_slot() {
        let order = reorder(&[1, 2, 3, 4], 4, 0).expect("id is present");
        assert_eq!(order, vec![4, 1, 2, 3]);
    }

    #[test]
    fn reorder_interprets_the_index_without_the_moved_item() {
        let order = reorder(&[1, 2, 3, 4], 1, 2).expect("id is present");
        assert_eq!(order, vec![2, 3, 1, 4]);
    }

    #[test]
    fn reorder_clamps_an_out_of_range_index() {
        let order = reorder(&[1, 2, 3], 1, 99).expect("id is present");
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn reorder_of_an_unknown_id_returns_none() {
        assert!(reorder(&[1, 2, 3], 9, 0).is_none());
    }
}
