use std::collections::{HashMap, HashSet};

use crate::covers;

const DIGITS: [char; 4] = ['0', '1', '2', '3'];

/// Repeatedly replaces any run of all four sibling trixels sharing a
/// parent with that parent, bottom-up, until no more collapses are
/// possible. This is what turns `["120","121","122","123"]` into
/// `["12"]` in spec §7 scenario S7.
fn collapse(mut names: Vec<String>) -> Vec<String> {
    loop {
        let mut by_parent: HashMap<&str, HashSet<char>> = HashMap::new();
        for n in &names {
            if n.is_empty() {
                continue;
            }
            let parent = &n[..n.len() - 1];
            by_parent.entry(parent).or_default().insert(n.chars().last().unwrap());
        }

        let full_parents: HashSet<String> = by_parent
            .into_iter()
            .filter(|(_, children)| DIGITS.iter().all(|d| children.contains(d)))
            .map(|(parent, _)| parent.to_string())
            .collect();

        if full_parents.is_empty() {
            return names;
        }

        let mut collapsed = Vec::with_capacity(names.len());
        let mut added_parent: HashSet<String> = HashSet::new();
        for n in &names {
            if n.is_empty() {
                collapsed.push(n.clone());
                continue;
            }
            let parent = &n[..n.len() - 1];
            if full_parents.contains(parent) {
                if added_parent.insert(parent.to_string()) {
                    collapsed.push(parent.to_string());
                }
            } else {
                collapsed.push(n.clone());
            }
        }
        names = collapsed;
    }
}

fn dedup_preserve_order(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}

/// A trixel-name list is only a valid partition representation if no
/// element is a proper prefix of another. `collapse` alone doesn't
/// guarantee this across two independently-authored lists, so every
/// entry point normalizes its operands through this first.
fn normalize(names: &[String]) -> Vec<String> {
    collapse(dedup_preserve_order(names.to_vec()))
}

/// Removes any element of one list fully covered by the other;
/// concatenates the rest, then collapses complete sibling quadruples
/// into their parent (spec §4.A `OR`).
pub fn or(a: &[String], b: &[String]) -> Vec<String> {
    let a = normalize(a);
    let b = normalize(b);

    let keep_a = a.iter().filter(|x| !b.iter().any(|y| covers(y, x) && y != *x));
    let keep_b = b.iter().filter(|y| !a.iter().any(|x| covers(x, y)));

    let combined: Vec<String> = keep_a.chain(keep_b).cloned().collect();
    collapse(dedup_preserve_order(combined))
}

/// For each pair where one is a prefix of the other, keeps the longer
/// (deeper) one; discards unrelated pairs (spec §4.A `AND`).
pub fn and(a: &[String], b: &[String]) -> Vec<String> {
    let a = normalize(a);
    let b = normalize(b);

    let mut result = Vec::new();
    for x in &a {
        for y in &b {
            if x == y {
                result.push(x.clone());
            } else if covers(x, y) {
                result.push(y.clone());
            } else if covers(y, x) {
                result.push(x.clone());
            }
        }
    }
    dedup_preserve_order(result)
}

/// Enumerates the three sibling trixels at each level descended from
/// `parent` down to (but excluding) `path`, which must have `parent` as
/// a proper prefix (spec §4.A `sibling-expand`). Only correct when
/// `path` is the *sole* descendant of `parent` being removed; for the
/// general case of several descendants removed from the same `parent`
/// at once, see [`subtract_descendants`].
pub fn sibling_expand(parent: &str, path: &str) -> Vec<String> {
    debug_assert!(path.starts_with(parent) && path.len() > parent.len());
    let path_chars: Vec<char> = path.chars().collect();
    let mut result = Vec::new();
    for depth in parent.len()..path.len() {
        let taken = path_chars[depth];
        let prefix = &path[..depth];
        for &d in DIGITS.iter() {
            if d != taken {
                result.push(format!("{prefix}{d}"));
            }
        }
    }
    result
}

/// Covers `parent`'s block minus the union of `removed` (each of which
/// must be `parent` itself or a proper descendant of it), recursing
/// into the quadtree only where needed. Generalizes [`sibling_expand`]
/// to the case where several of `parent`'s descendants are removed at
/// once.
fn subtract_descendants(parent: &str, removed: &[&str]) -> Vec<String> {
    if removed.iter().any(|r| *r == parent) {
        return Vec::new();
    }
    if removed.is_empty() {
        return vec![parent.to_string()];
    }
    let mut result = Vec::new();
    for &d in DIGITS.iter() {
        let child = format!("{parent}{d}");
        let under_child: Vec<&str> = removed.iter().filter(|r| r.starts_with(&child)).copied().collect();
        if under_child.is_empty() {
            result.push(child);
        } else {
            result.extend(subtract_descendants(&child, &under_child));
        }
    }
    result
}

/// Symmetric difference accounting for the prefix relation: when one
/// trixel properly prefixes one or more trixels in the other list, the
/// shallower is replaced by its block minus those deeper ones, which
/// are themselves removed. Unrelated elements pass through unchanged
/// (spec §4.A `XOR`).
pub fn xor(a: &[String], b: &[String]) -> Vec<String> {
    let a = normalize(a);
    let b = normalize(b);

    let mut consumed_a = vec![false; a.len()];
    let mut consumed_b = vec![false; b.len()];
    let mut result = Vec::new();

    // Exact matches cancel outright.
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            if !consumed_a[i] && !consumed_b[j] && x == y {
                consumed_a[i] = true;
                consumed_b[j] = true;
            }
        }
    }

    // `a`'s shallower cells absorb every still-unconsumed `b` descendant at once.
    for (i, x) in a.iter().enumerate() {
        if consumed_a[i] {
            continue;
        }
        let descendants: Vec<&str> = b
            .iter()
            .enumerate()
            .filter(|(j, y)| !consumed_b[*j] && covers(x, y) && *y != x)
            .map(|(_, y)| y.as_str())
            .collect();
        if !descendants.is_empty() {
            result.extend(subtract_descendants(x, &descendants));
            consumed_a[i] = true;
            for (j, y) in b.iter().enumerate() {
                if covers(x, y) {
                    consumed_b[j] = true;
                }
            }
        }
    }

    // Symmetric pass for `b`'s shallower cells over remaining `a` descendants.
    for (j, y) in b.iter().enumerate() {
        if consumed_b[j] {
            continue;
        }
        let descendants: Vec<&str> = a
            .iter()
            .enumerate()
            .filter(|(i, x)| !consumed_a[*i] && covers(y, x) && *x != y)
            .map(|(_, x)| x.as_str())
            .collect();
        if !descendants.is_empty() {
            result.extend(subtract_descendants(y, &descendants));
            consumed_b[j] = true;
            for (i, x) in a.iter().enumerate() {
                if covers(y, x) {
                    consumed_a[i] = true;
                }
            }
        }
    }

    for (i, x) in a.iter().enumerate() {
        if !consumed_a[i] {
            result.push(x.clone());
        }
    }
    for (j, y) in b.iter().enumerate() {
        if !consumed_b[j] {
            result.push(y.clone());
        }
    }

    collapse(dedup_preserve_order(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // spec §7 scenario S7.
    #[test]
    fn s7_geospatial_xor() {
        let a = v(&["120", "121", "122", "123"]);
        let b = v(&["120"]);

        let mut xor_result = xor(&a, &b);
        xor_result.sort();
        assert_eq!(xor_result, v(&["121", "122", "123"]));

        assert_eq!(or(&a, &b), v(&["12"]));
        assert_eq!(and(&a, &b), v(&["120"]));
    }

    #[test]
    fn and_keeps_the_deeper_of_a_prefix_pair() {
        let a = v(&["1", "20"]);
        let b = v(&["12"]);
        let result = and(&a, &b);
        assert_eq!(result, v(&["12"]));
    }

    #[test]
    fn or_is_superset_of_both_operands() {
        let a = v(&["0"]);
        let b = v(&["1"]);
        let mut result = or(&a, &b);
        result.sort();
        assert_eq!(result, v(&["0", "1"]));
    }

    #[test]
    fn xor_of_identical_sets_is_empty() {
        let a = v(&["10", "11", "12", "13"]);
        let b = v(&["1"]);
        assert_eq!(xor(&a, &b), Vec::<String>::new());
    }

    #[test]
    fn xor_leaves_the_uncovered_remainder_of_a_partial_block() {
        let a = v(&["1"]);
        let b = v(&["10", "11", "12"]);
        assert_eq!(xor(&a, &b), v(&["13"]));
    }

    #[test]
    fn operations_are_commutative() {
        let a = v(&["10", "11"]);
        let b = v(&["1"]);

        let mut or_ab = or(&a, &b);
        let mut or_ba = or(&b, &a);
        or_ab.sort();
        or_ba.sort();
        assert_eq!(or_ab, or_ba);

        let mut and_ab = and(&a, &b);
        let mut and_ba = and(&b, &a);
        and_ab.sort();
        and_ba.sort();
        assert_eq!(and_ab, and_ba);

        let mut xor_ab = xor(&a, &b);
        let mut xor_ba = xor(&b, &a);
        xor_ab.sort();
        xor_ba.sort();
        assert_eq!(xor_ab, xor_ba);
    }
}
