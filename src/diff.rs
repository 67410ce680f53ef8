//! Minimal-change diffing between two contact lists.
//!
//! Matching is by identity (id equality), change detection by full equality,
//! so a display layer can animate only the rows that changed. `diff` is a
//! pure function of its inputs: diffing a list against itself yields no
//! operations.

use std::collections::HashMap;

use crate::model::Contact;

/// A single change a display layer must apply to go from the old list to
/// the new one. Indices refer to the list named in the field docs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOp {
    /// Row `index` of the new list has no identity match in the old list.
    Insert { index: usize },
    /// Row `index` of the old list has no identity match in the new list.
    Remove { index: usize },
    /// The row moved: `from` indexes the old list, `to` the new one.
    Move { from: usize, to: usize },
    /// Same identity at row `index` of the new list, but field content
    /// changed.
    Update { index: usize },
}

/// Compute the operations turning `old` into `new`.
///
/// Rows kept in both lists and already in relative order are left alone;
/// the rest of the kept rows become moves (the longest stable run wins).
/// When two rows share an identity within one list, the first occurrence is
/// the one that matches.
pub fn diff(old: &[Contact], new: &[Contact]) -> Vec<ListOp> {
    let mut old_by_id: HashMap<&Option<String>, usize> = HashMap::new();
    for (i, c) in old.iter().enumerate() {
        old_by_id.entry(&c.id).or_insert(i);
    }
    let mut new_by_id: HashMap<&Option<String>, usize> = HashMap::new();
    for (i, c) in new.iter().enumerate() {
        new_by_id.entry(&c.id).or_insert(i);
    }

    let mut ops = Vec::new();

    for (i, c) in old.iter().enumerate() {
        if !new_by_id.contains_key(&c.id) {
            ops.push(ListOp::Remove { index: i });
        }
    }

    // Pairs kept in both lists, walked in new-list order. The old indices of
    // a stable (non-moving) subset must be increasing; everything outside
    // the longest such run is reported as a move.
    let mut kept: Vec<(usize, usize)> = Vec::new();
    for (new_index, c) in new.iter().enumerate() {
        match old_by_id.get(&c.id) {
            Some(&old_index) => kept.push((old_index, new_index)),
            None => ops.push(ListOp::Insert { index: new_index }),
        }
    }

    let old_positions: Vec<usize> = kept.iter().map(|&(o, _)| o).collect();
    let stable = longest_increasing_run(&old_positions);

    for (k, &(old_index, new_index)) in kept.iter().enumerate() {
        if !stable[k] {
            ops.push(ListOp::Move {
                from: old_index,
                to: new_index,
            });
        }
        if old[old_index] != new[new_index] {
            ops.push(ListOp::Update { index: new_index });
        }
    }

    ops
}

/// Marks the elements of a longest strictly-increasing subsequence.
fn longest_increasing_run(xs: &[usize]) -> Vec<bool> {
    let n = xs.len();
    let mut keep = vec![false; n];
    if n == 0 {
        return keep;
    }

    let mut best_len = vec![1usize; n];
    let mut prev = vec![usize::MAX; n];
    let mut end = 0;
    for i in 0..n {
        for j in 0..i {
            if xs[j] < xs[i] && best_len[j] + 1 > best_len[i] {
                best_len[i] = best_len[j] + 1;
                prev[i] = j;
            }
        }
        if best_len[i] > best_len[end] {
            end = i;
        }
    }

    let mut i = end;
    loop {
        keep[i] = true;
        if prev[i] == usize::MAX {
            break;
        }
        i = prev[i];
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: &str, name: &str) -> Contact {
        Contact {
            id: Some(id.to_string()),
            name: name.to_string(),
            title: None,
            email: format!("{}@example.com", id),
            phone: "555".to_string(),
            address: None,
            status: None,
            photo_url: None,
        }
    }

    #[test]
    fn test_identical_lists_yield_no_ops() {
        let list = vec![contact("1", "Ana"), contact("2", "Bo"), contact("3", "Cy")];
        assert!(diff(&list, &list).is_empty());
        // Stable under repetition.
        assert!(diff(&list, &list).is_empty());
    }

    #[test]
    fn test_empty_to_two_yields_two_inserts() {
        let new = vec![contact("1", "Ana"), contact("2", "Bo")];
        let ops = diff(&[], &new);
        assert_eq!(
            ops,
            vec![ListOp::Insert { index: 0 }, ListOp::Insert { index: 1 }]
        );
    }

    #[test]
    fn test_dropping_head_yields_one_removal() {
        let old = vec![contact("1", "Ana"), contact("2", "Bo")];
        let new = vec![contact("2", "Bo")];
        assert_eq!(diff(&old, &new), vec![ListOp::Remove { index: 0 }]);
    }

    #[test]
    fn test_field_change_is_an_update_not_churn() {
        let old = vec![contact("1", "Ana"), contact("2", "Bo")];
        let mut renamed = contact("1", "Anabel");
        renamed.status = Some("away".into());
        let new = vec![renamed, contact("2", "Bo")];
        assert_eq!(diff(&old, &new), vec![ListOp::Update { index: 0 }]);
    }

    #[test]
    fn test_reorder_is_reported_as_a_move() {
        let old = vec![contact("1", "Ana"), contact("2", "Bo"), contact("3", "Cy")];
        let new = vec![contact("2", "Bo"), contact("3", "Cy"), contact("1", "Ana")];
        // One row out of place; the other two form the stable run.
        assert_eq!(diff(&old, &new), vec![ListOp::Move { from: 0, to: 2 }]);
    }

    #[test]
    fn test_unsaved_contacts_match_by_absent_id() {
        let mut draft_old = contact("x", "Draft");
        draft_old.id = None;
        let mut draft_new = draft_old.clone();
        draft_new.id = None;
        draft_new.phone = "556".to_string();
        let ops = diff(
            std::slice::from_ref(&draft_old),
            std::slice::from_ref(&draft_new),
        );
        assert_eq!(ops, vec![ListOp::Update { index: 0 }]);
    }

    #[test]
    fn test_mixed_change_set() {
        let old = vec![contact("1", "Ana"), contact("2", "Bo"), contact("3", "Cy")];
        let new = vec![contact("3", "Cy"), contact("4", "Di")];
        let ops = diff(&old, &new);
        assert!(ops.contains(&ListOp::Remove { index: 0 }));
        assert!(ops.contains(&ListOp::Remove { index: 1 }));
        assert!(ops.contains(&ListOp::Insert { index: 1 }));
        assert_eq!(ops.len(), 3);
    }
}
