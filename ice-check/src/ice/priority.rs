//! Candidate pair priority (RFC 8445 section 6.1.2.3).

/// Combined priority of a pair from the two candidate priorities.
///
/// G is the controlling agent's candidate priority and D the controlled
/// agent's: `2^32 * min(G, D) + 2 * max(G, D) + (G > D ? 1 : 0)`.
///
/// Candidate priorities are at most 2^31 - 1; a peer advertising larger
/// values saturates at `u64::MAX` instead of wrapping.
pub fn pair_priority(local_priority: u32, remote_priority: u32, is_local_controller: bool) -> u64 {
    let (g, d) = if is_local_controller {
        (local_priority as u64, remote_priority as u64)
    } else {
        (remote_priority as u64, local_priority as u64)
    };

    (g.min(d) << 32)
        .saturating_add(2 * g.max(d))
        .saturating_add(if g > d { 1 } else { 0 })
}
