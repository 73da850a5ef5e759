//! Condition flags and their constraints
//!
//! Flag state forms the top nibble of a ROM address:
//! `carry << 3 | zero << 2 | less << 1 | greater`.

use std::iter::FusedIterator;

/// Number of distinct flag states
pub const FLAG_STATES: u8 = 16;

/// Values a single flag may take for an instruction to apply
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FlagSet {
    /// Flag must be 0
    Clear,
    /// Flag must be 1
    Set,
    /// Either value
    #[default]
    Any,
}

impl FlagSet {
    pub fn allows(self, value: bool) -> bool {
        match self {
            FlagSet::Clear => !value,
            FlagSet::Set => value,
            FlagSet::Any => true,
        }
    }

    /// Number of values allowed
    pub fn count(self) -> usize {
        match self {
            FlagSet::Clear | FlagSet::Set => 1,
            FlagSet::Any => 2,
        }
    }
}

/// A concrete flag state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlagState {
    pub carry: bool,
    pub zero: bool,
    pub less: bool,
    pub greater: bool,
}

impl FlagState {
    pub fn from_nibble(nibble: u8) -> Self {
        Self {
            carry: nibble & 0b1000 != 0,
            zero: nibble & 0b0100 != 0,
            less: nibble & 0b0010 != 0,
            greater: nibble & 0b0001 != 0,
        }
    }

    pub fn nibble(&self) -> u8 {
        (u8::from(self.carry) << 3)
            | (u8::from(self.zero) << 2)
            | (u8::from(self.less) << 1)
            | u8::from(self.greater)
    }
}

/// Per-flag constraints of one instruction descriptor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FlagConstraints {
    pub carry: FlagSet,
    pub zero: FlagSet,
    pub less: FlagSet,
    pub greater: FlagSet,
}

impl FlagConstraints {
    /// No constraint on any flag
    pub const ANY: Self = Self {
        carry: FlagSet::Any,
        zero: FlagSet::Any,
        less: FlagSet::Any,
        greater: FlagSet::Any,
    };

    pub fn carry(self, carry: FlagSet) -> Self {
        Self { carry, ..self }
    }

    pub fn zero(self, zero: FlagSet) -> Self {
        Self { zero, ..self }
    }

    pub fn less(self, less: FlagSet) -> Self {
        Self { less, ..self }
    }

    pub fn greater(self, greater: FlagSet) -> Self {
        Self { greater, ..self }
    }

    pub fn allows(&self, state: &FlagState) -> bool {
        self.carry.allows(state.carry)
            && self.zero.allows(state.zero)
            && self.less.allows(state.less)
            && self.greater.allows(state.greater)
    }

    /// Every flag state satisfying the constraints, in ascending nibble order
    pub fn combinations(&self) -> Combinations {
        Combinations {
            constraints: *self,
            next: 0,
        }
    }

    /// Number of states [`combinations`](Self::combinations) yields
    pub fn state_count(&self) -> usize {
        self.carry.count() * self.zero.count() * self.less.count() * self.greater.count()
    }
}

/// Lazy cross product of the allowed flag values
#[derive(Clone, Debug)]
pub struct Combinations {
    constraints: FlagConstraints,
    next: u8,
}

impl Iterator for Combinations {
    type Item = FlagState;

    fn next(&mut self) -> Option<FlagState> {
        while self.next < FLAG_STATES {
            let state = FlagState::from_nibble(self.next);
            self.next += 1;
            if self.constraints.allows(&state) {
                return Some(state);
            }
        }
        None
    }
}

impl FusedIterator for Combinations {}
