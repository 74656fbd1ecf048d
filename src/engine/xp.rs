use serde::Serialize;

// XP needed to *reach* a level follows the triangular curve
// threshold(l) = 50 * (l - 1) * l, so level 2 opens at 100 XP, level 3 at
// 300, level 4 at 600, level 5 at 1000. Monotonic and total: every
// non-negative XP value maps to exactly one level.
const LEVEL_STEP: u32 = 50;

pub fn threshold(level: u32) -> u32 {
    LEVEL_STEP * level.saturating_sub(1) * level
}

pub fn level_for_xp(xp: u32) -> u32 {
    let mut level = 1;
    while threshold(level + 1) <= xp {
        level += 1;
    }
    level
}

pub fn xp_to_next_level(xp: u32) -> u32 {
    threshold(level_for_xp(xp) + 1) - xp
}

/// 0.0..1.0 progress within the current level
pub fn level_progress(xp: u32) -> f64 {
    let level = level_for_xp(xp);
    let floor = threshold(level);
    let ceil = threshold(level + 1);
    (xp - floor) as f64 / (ceil - floor) as f64
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct XpAward {
    pub amount: u32,
    pub new_xp: u32,
    pub old_level: u32,
    pub new_level: u32,
    pub leveled_up: bool,
}

// Awarding is additive only. Several levels crossed by one award still
// report a single new_level: the UI shows one popup per triggering action.
pub fn award(current_xp: u32, amount: u32) -> XpAward {
    let new_xp = current_xp.saturating_add(amount);
    let old_level = level_for_xp(current_xp);
    let new_level = level_for_xp(new_xp);
    XpAward {
        amount,
        new_xp,
        old_level,
        new_level,
        leveled_up: new_level > old_level,
    }
}
