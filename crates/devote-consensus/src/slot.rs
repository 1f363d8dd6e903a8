//! Time-to-slot arithmetic. Exactly one block is expected per slot.

/// Width of a production slot in seconds
pub const BLOCK_INTERVAL: u64 = 10;

/// Start of the slot preceding `now`
pub fn previous_slot(now: u64) -> u64 {
    (now.saturating_sub(1) / BLOCK_INTERVAL) * BLOCK_INTERVAL
}

/// Start of the next slot at or after `now`
pub fn next_slot(now: u64) -> u64 {
    (now.saturating_add(BLOCK_INTERVAL - 1) / BLOCK_INTERVAL) * BLOCK_INTERVAL
}
