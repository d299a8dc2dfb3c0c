use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Symbolic state of the modulated stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SymbolicState {
    LowFluctuation,
    Oscillation,
    PersistentHigh,
}

impl fmt::Display for SymbolicState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LowFluctuation => "LOW_FLUCTUATION",
            Self::Oscillation => "OSCILLATION",
            Self::PersistentHigh => "PERSISTENT_HIGH",
        };
        f.write_str(name)
    }
}

/// Three-state machine over a sliding window of the last K bits.
///
/// Per new bit: PERSISTENT_HIGH when the window is almost all ones with
/// at most one flip, LOW_FLUCTUATION when almost all zeros with at most
/// one flip, OSCILLATION otherwise.
#[derive(Debug, Clone)]
pub struct StateMachine {
    bits: VecDeque<bool>,
    window: usize,
    state: SymbolicState,
}

impl StateMachine {
    pub fn new(window: usize) -> Self {
        Self {
            bits: VecDeque::with_capacity(window),
            window,
            state: SymbolicState::LowFluctuation,
        }
    }

    pub fn state(&self) -> SymbolicState {
        self.state
    }

    /// Incorporate one bit and return the state after it.
    pub fn push(&mut self, bit: bool) -> SymbolicState {
        if self.bits.len() == self.window {
            self.bits.pop_front();
        }
        self.bits.push_back(bit);

        let ones = self.bits.iter().filter(|&&b| b).count();
        let transitions = self
            .bits
            .iter()
            .zip(self.bits.iter().skip(1))
            .filter(|(a, b)| a != b)
            .count();

        self.state = if ones >= self.window - 1 && transitions <= 1 {
            SymbolicState::PersistentHigh
        } else if ones <= 1 && transitions <= 1 {
            SymbolicState::LowFluctuation
        } else {
            SymbolicState::Oscillation
        };
        self.state
    }
}
