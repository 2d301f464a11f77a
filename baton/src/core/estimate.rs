//! Approximate cost estimation for metered actions.
//!
//! Deliberately rough: content length over a chars-per-token divisor, scaled
//! by a fixed multiplier approximating the ratio of metered content to total
//! session context. Exact token counting is a non-goal.

/// Estimated budget cost of an action with `content_len` bytes of content.
///
/// Integer division first, then a saturating multiply. With the default
/// divisor and multiplier both at 4 the estimate collapses to the raw length.
pub fn estimate_cost(content_len: usize, chars_per_token: u64, context_multiplier: u64) -> u64 {
    let tokens = content_len as u64 / chars_per_token.max(1);
    tokens.saturating_mul(context_multiplier)
}

/// Pick the content size for an action from the optional hint.
///
/// A hint that parses as a number is a size; any other hint is the content
/// itself. Without a hint the command line stands in for the content.
pub fn action_size(content_or_size_hint: Option<&str>, descriptor: &str) -> usize {
    match content_or_size_hint {
        Some(hint) => hint.trim().parse::<usize>().unwrap_or(hint.len()),
        None => descriptor.len(),
    }
}
