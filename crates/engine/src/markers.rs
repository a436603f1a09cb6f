//! Clip markers and the segments derived from them.
//!
//! Markers are timestamps in seconds on the currently open source video.
//! Segments are derived, never stored: the first marker closes an implicit
//! segment starting at zero, and each later marker closes the segment that
//! the previous one opened.

use serde::{Deserialize, Serialize};

/// Two markers closer than this are considered the same marker (seconds).
pub const MARKER_EPSILON: f64 = 0.05;

/// Half-open cut range on the source video, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipSegment {
    pub start: f64,
    pub end: f64,
}

impl ClipSegment {
    /// Returns the segment length in seconds.
    pub fn span(&self) -> f64 {
        self.end - self.start
    }
}

/// Returns the markers sorted ascending with near-duplicates collapsed.
///
/// Non-finite and negative values are dropped. Of a run of markers within
/// [`MARKER_EPSILON`] of each other, the earliest survives.
pub fn normalize(markers: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = markers
        .iter()
        .copied()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .collect();
    sorted.sort_by(f64::total_cmp);

    let mut out: Vec<f64> = Vec::with_capacity(sorted.len());
    for t in sorted {
        match out.last() {
            Some(prev) if (t - prev).abs() < MARKER_EPSILON => {}
            _ => out.push(t),
        }
    }
    out
}

/// Derives cut segments from a marker set.
///
/// A leading segment from zero to the first marker is included unless the
/// first marker sits within [`MARKER_EPSILON`] of zero. Gaps between
/// consecutive markers become segments when wider than the epsilon, so the
/// result never contains a zero-length cut.
///
/// # Example
/// ```
/// use engine::markers::segments_from_markers;
///
/// let segments = segments_from_markers(&[12.0, 4.0]);
/// assert_eq!(segments.len(), 2);
/// assert_eq!(segments[0].start, 0.0);
/// assert_eq!(segments[0].end, 4.0);
/// assert_eq!(segments[1].end, 12.0);
/// ```
pub fn segments_from_markers(markers: &[f64]) -> Vec<ClipSegment> {
    let normalized = normalize(markers);
    let mut out = Vec::new();
    let Some(&first) = normalized.first() else {
        return out;
    };

    if first > MARKER_EPSILON {
        out.push(ClipSegment {
            start: 0.0,
            end: first,
        });
    }
    for pair in normalized.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b - a > MARKER_EPSILON {
            out.push(ClipSegment { start: a, end: b });
        }
    }
    out
}

/// Adds one marker and returns the normalized set.
///
/// Non-finite or negative timestamps are ignored.
pub fn add_marker(existing: &[f64], t: f64) -> Vec<f64> {
    if !t.is_finite() || t < 0.0 {
        return normalize(existing);
    }
    let mut all = existing.to_vec();
    all.push(t);
    normalize(&all)
}

/// Removes every marker within [`MARKER_EPSILON`] of `t`.
pub fn delete_marker_near(existing: &[f64], t: f64) -> Vec<f64> {
    existing
        .iter()
        .copied()
        .filter(|m| (m - t).abs() >= MARKER_EPSILON)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        MARKER_EPSILON, add_marker, delete_marker_near, normalize, segments_from_markers,
    };

    #[test]
    fn normalize_sorts_and_collapses_near_duplicates() {
        let markers = normalize(&[10.0, 3.0, 3.04, 7.0, 3.01]);
        assert_eq!(markers, vec![3.0, 7.0, 10.0]);
    }

    #[test]
    fn normalize_drops_negative_and_non_finite_values() {
        let markers = normalize(&[-1.0, f64::NAN, f64::INFINITY, 2.0]);
        assert_eq!(markers, vec![2.0]);
    }

    #[test]
    fn normalize_is_order_independent() {
        let a = normalize(&[9.0, 1.0, 5.0]);
        let b = normalize(&[5.0, 9.0, 1.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn segments_are_contiguous_and_strictly_increasing() {
        let segments = segments_from_markers(&[4.0, 12.0, 20.5]);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].start, 0.0);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        for segment in &segments {
            assert!(segment.span() > MARKER_EPSILON);
        }
    }

    #[test]
    fn first_marker_near_zero_suppresses_the_leading_segment() {
        let segments = segments_from_markers(&[0.03, 5.0]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, 0.03);
        assert_eq!(segments[0].end, 5.0);
    }

    #[test]
    fn no_markers_derive_no_segments() {
        assert!(segments_from_markers(&[]).is_empty());
    }

    #[test]
    fn add_marker_within_epsilon_of_an_existing_one_is_a_no_op() {
        let markers = add_marker(&[3.0, 7.0], 3.02);
        assert_eq!(markers, vec![3.0, 7.0]);
    }

    #[test]
    fn delete_removes_only_markers_near_the_given_timestamp() {
        let markers = delete_marker_near(&[3.0, 7.0, 7.04], 7.0);
        assert_eq!(markers, vec![3.0]);
    }

    #[test]
    fn segments_serialize_with_start_and_end_keys() {
        let segments = segments_from_markers(&[4.0]);
        let json = serde_json::to_value(&segments).expect("segments serialize");
        assert_eq!(json, serde_json::json!([{ "start": 0.0, "end": 4.0 }]));
    }
}
