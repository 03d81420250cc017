use crate::MAX_LEVEL;

/// A half-open-free, inclusive `[start, end]` interval of max-level
/// trixel ids, as stored on disk (spec §4.A, §4.B "Geo" serialization).
pub type TrixelRange = (u64, u64);

fn digit_value(c: char) -> u64 {
    match c {
        '0' => 0,
        '1' => 1,
        '2' => 2,
        '3' => 3,
        _ => unreachable!("trixel names are validated before use"),
    }
}

/// Maps a trixel name to its `[start, end]` interval at [`MAX_LEVEL`]
/// (spec §4.A `id_range_of`).
pub fn id_range_of(name: &str) -> TrixelRange {
    let level = name.len() as u32;
    debug_assert!(level <= MAX_LEVEL);
    let shift = 2 * (MAX_LEVEL - level);
    let path_value = name.chars().fold(0u64, |acc, c| (acc << 2) | digit_value(c));
    let start = path_value << shift;
    let width = if shift >= 64 { u64::MAX } else { (1u64 << shift) - 1 };
    (start, start + width)
}

/// Coalesces overlapping or adjacent ranges in `ranges`, sorting as a
/// side effect (spec §4.A `merge_ranges`).
pub fn merge_ranges(ranges: &mut Vec<TrixelRange>) {
    if ranges.is_empty() {
        return;
    }
    ranges.sort_unstable();
    let mut merged: Vec<TrixelRange> = Vec::with_capacity(ranges.len());
    for &(start, end) in ranges.iter() {
        match merged.last_mut() {
            Some((_, last_end)) if start <= last_end.saturating_add(1) => {
                *last_end = (*last_end).max(end);
            }
            _ => merged.push((start, end)),
        }
    }
    *ranges = merged;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deeper_trixel_nests_inside_shallower_range() {
        let parent = id_range_of("12");
        let child = id_range_of("120");
        assert!(parent.0 <= child.0 && child.1 <= parent.1);
    }

    #[test]
    fn merge_coalesces_adjacent_and_overlapping() {
        let mut ranges = vec![(0, 10), (11, 20), (30, 40), (35, 50)];
        merge_ranges(&mut ranges);
        assert_eq!(ranges, vec![(0, 20), (30, 50)]);
    }

    #[test]
    fn merge_keeps_disjoint_ranges_separate() {
        let mut ranges = vec![(0, 5), (10, 15)];
        merge_ranges(&mut ranges);
        assert_eq!(ranges, vec![(0, 5), (10, 15)]);
    }
}
