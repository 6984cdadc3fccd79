// Substitution rule used by programmatic state processing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

/// Controls what survives when a value is pushed into a state
/// programmatically (`ScanSession::try_process_by`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSubstitutionRule(u8);

impl StateSubstitutionRule {
    /// Drop every prior report and keep the pointer where it is
    pub const REPLACE: Self = Self(0);
    /// Keep prior info and warning reports
    pub const KEEP_POSITIVE_REPORTS: Self = Self(0b001);
    /// Keep prior error reports
    pub const KEEP_NEGATIVE_REPORTS: Self = Self(0b010);
    /// Advance the pointer from the processed state on success
    pub const KEEP_STATE_CHANGE: Self = Self(0b100);
    pub const KEEP_ALL: Self = Self(0b111);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn keeps_positive_reports(self) -> bool {
        self.contains(Self::KEEP_POSITIVE_REPORTS)
    }

    pub fn keeps_negative_reports(self) -> bool {
        self.contains(Self::KEEP_NEGATIVE_REPORTS)
    }

    pub fn keeps_state_change(self) -> bool {
        self.contains(Self::KEEP_STATE_CHANGE)
    }
}

impl Default for StateSubstitutionRule {
    fn default() -> Self {
        Self::KEEP_ALL
    }
}

impl BitOr for StateSubstitutionRule {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for StateSubstitutionRule {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for StateSubstitutionRule {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0 & Self::KEEP_ALL.0)
    }
}

impl fmt::Debug for StateSubstitutionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.keeps_positive_reports() {
            names.push("KEEP_POSITIVE_REPORTS");
        }
        if self.keeps_negative_reports() {
            names.push("KEEP_NEGATIVE_REPORTS");
        }
        if self.keeps_state_change() {
            names.push("KEEP_STATE_CHANGE");
        }
        if names.is_empty() {
            names.push("REPLACE");
        }
        write!(f, "StateSubstitutionRule({})", names.join(" | "))
    }
}
