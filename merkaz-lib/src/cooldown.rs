//! Escalating cooldown between submissions.
//!
//! The state for a single user is a plain record. [`evaluate`] never mutates
//! it, the caller stores [`Decision::next`] wherever it keeps per-user state.

use chrono::NaiveDateTime;
use serde::{Serialize, Deserialize};

/// seconds to wait after the 1st, 2nd, ... submission of the day
pub const DEFAULT_LEVELS: [u64; 5] = [60, 300, 600, 1800, 3600];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownState {
    pub last: Option<NaiveDateTime>,
    pub index: usize,
}

impl CooldownState {
    /// one based level shown to users
    pub fn level(&self) -> usize {
        self.index + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub next: CooldownState,
    pub wait_seconds: u64,
}

impl Decision {
    /// whole minutes left, never less than one while waiting
    pub fn wait_minutes(&self) -> u64 {
        if self.wait_seconds == 0 {
            0
        } else {
            std::cmp::max(1, (self.wait_seconds + 30) / 60)
        }
    }
}

pub fn evaluate(levels: &[u64], state: &CooldownState, now: NaiveDateTime) -> Decision {
    let max_index = levels.len().saturating_sub(1);
    let mut index = std::cmp::min(state.index, max_index);

    if let Some(last) = state.last {
        // a new day forgives previous submissions
        if last.date() < now.date() && index > 0 {
            index = 0;
        }

        let elapsed = std::cmp::max((now - last).num_seconds(), 0) as u64;
        let current = levels.get(index).copied().unwrap_or(0);

        if elapsed < current {
            return Decision {
                allowed: false,
                next: CooldownState {
                    last: Some(last),
                    index,
                },
                wait_seconds: current - elapsed,
            };
        }
    }

    Decision {
        allowed: true,
        next: CooldownState {
            last: Some(now),
            index: std::cmp::min(index + 1, max_index),
        },
        wait_seconds: 0,
    }
}
