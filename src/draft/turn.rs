// Snake-order turn resolution.

/// Resolve which team's turn it is, given the fixed draft order and the
/// current (pre-pick) counters.
///
/// Snake rule: with `position = current_pick % order.len()`, odd rounds walk
/// the order forward and even rounds walk it backward, so the team picking
/// last in round 1 picks first in round 2. Index arithmetic only; no
/// reversed copy of the order is allocated.
///
/// Must be called with the state *before* a pick is committed -- resolving
/// after the commit would report the next slot's owner, not the one the
/// pick belonged to. Returns `None` when the order is empty (draft not
/// started).
pub fn resolve<'a>(order: &'a [String], current_round: u32, current_pick: u32) -> Option<&'a str> {
    if order.is_empty() {
        return None;
    }
    let team_count = order.len() as u32;
    let position = (current_pick % team_count) as usize;
    let idx = if current_round % 2 == 1 {
        position
    } else {
        order.len() - 1 - position
    };
    Some(order[idx].as_str())
}

/// 0-indexed position within the current round for a given overall pick
/// count.
pub fn position_in_round(current_pick: u32, team_count: usize) -> usize {
    debug_assert!(team_count > 0);
    (current_pick as usize) % team_count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_order_resolves_to_none() {
        assert_eq!(resolve(&[], 1, 0), None);
    }

    #[test]
    fn round_one_walks_forward() {
        let o = order(&["A", "B", "C", "D"]);
        assert_eq!(resolve(&o, 1, 0), Some("A"));
        assert_eq!(resolve(&o, 1, 1), Some("B"));
        assert_eq!(resolve(&o, 1, 2), Some("C"));
        assert_eq!(resolve(&o, 1, 3), Some("D"));
    }

    #[test]
    fn round_two_walks_backward() {
        let o = order(&["A", "B", "C", "D"]);
        // Picks 4..8 fall in round 2; D picks twice in a row at the turn.
        assert_eq!(resolve(&o, 2, 4), Some("D"));
        assert_eq!(resolve(&o, 2, 5), Some("C"));
        assert_eq!(resolve(&o, 2, 6), Some("B"));
        assert_eq!(resolve(&o, 2, 7), Some("A"));
    }

    #[test]
    fn round_three_walks_forward_again() {
        let o = order(&["A", "B", "C", "D"]);
        assert_eq!(resolve(&o, 3, 8), Some("A"));
        assert_eq!(resolve(&o, 3, 11), Some("D"));
    }

    #[test]
    fn alternation_property_for_any_team_count() {
        // For any N >= 2: odd round r at in-round position p resolves to
        // order[p]; even round r resolves to order[N-1-p].
        for n in 2..=12usize {
            let o: Vec<String> = (0..n).map(|i| format!("T{i}")).collect();
            for r in 1..=5u32 {
                for p in 0..n {
                    let pick = (r - 1) * n as u32 + p as u32;
                    let got = resolve(&o, r, pick).unwrap();
                    let want = if r % 2 == 1 {
                        o[p].as_str()
                    } else {
                        o[n - 1 - p].as_str()
                    };
                    assert_eq!(got, want, "N={n} round={r} pos={p}");
                }
            }
        }
    }

    #[test]
    fn single_team_always_on_the_clock() {
        let o = order(&["Solo"]);
        assert_eq!(resolve(&o, 1, 0), Some("Solo"));
        assert_eq!(resolve(&o, 2, 1), Some("Solo"));
        assert_eq!(resolve(&o, 7, 6), Some("Solo"));
    }

    #[test]
    fn position_in_round_wraps() {
        assert_eq!(position_in_round(0, 4), 0);
        assert_eq!(position_in_round(3, 4), 3);
        assert_eq!(position_in_round(4, 4), 0);
        assert_eq!(position_in_round(9, 4), 1);
    }
}
