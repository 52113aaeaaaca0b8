use crate::error::RulesError;
use serde::{Deserialize, Serialize};

/// Shape of the playing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardSpec {
    pub width: usize,
    pub height: usize,
    /// Stones drop to the lowest empty row of their column.
    pub gravity: bool,
}

/// Win and capture conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    pub winning_length: usize,
    pub allow_captures: bool,
    pub win_by_captures: bool,
    /// Number of opposing stones that must be flanked to capture them.
    pub capture_size: usize,
    pub winning_num_captures: u32,
}

/// Complete, immutable description of a game variant.
///
/// Serializes to the same JSON shape the lobby and presets use:
/// `{"board": {"width", "height", "gravity"}, "rules": {"winningLength", ...}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RulesSpec {
    pub board: BoardSpec,
    pub rules: RuleSpec,
}

impl RulesSpec {
    /// Classic 3x3, three in a row.
    pub const fn tic_tac_toe() -> Self {
        Self {
            board: BoardSpec {
                width: 3,
                height: 3,
                gravity: false,
            },
            rules: RuleSpec {
                winning_length: 3,
                allow_captures: false,
                win_by_captures: false,
                capture_size: 0,
                winning_num_captures: 0,
            },
        }
    }

    /// Seven columns, six rows, stones fall, four to win.
    pub const fn link_four() -> Self {
        Self {
            board: BoardSpec {
                width: 7,
                height: 6,
                gravity: true,
            },
            rules: RuleSpec {
                winning_length: 4,
                allow_captures: false,
                win_by_captures: false,
                capture_size: 0,
                winning_num_captures: 0,
            },
        }
    }

    /// 13x13 Pente: five in a row, pairs are captured, five captures win.
    pub const fn pente() -> Self {
        Self {
            board: BoardSpec {
                width: 13,
                height: 13,
                gravity: false,
            },
            rules: RuleSpec {
                winning_length: 5,
                allow_captures: true,
                win_by_captures: true,
                capture_size: 2,
                winning_num_captures: 5,
            },
        }
    }

    /// The built-in presets, keyed by display name.
    pub fn presets() -> [(&'static str, RulesSpec); 3] {
        [
            ("Tic-Tac-Toe", Self::tic_tac_toe()),
            ("Link Four", Self::link_four()),
            ("Pente", Self::pente()),
        ]
    }

    /// Checks the numeric bounds the engine relies on.
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.board.width == 0 || self.board.height == 0 {
            return Err(RulesError::EmptyBoard {
                width: self.board.width,
                height: self.board.height,
            });
        }
        if self.rules.winning_length == 0 {
            return Err(RulesError::ZeroWinningLength);
        }
        if self.rules.allow_captures {
            if self.rules.capture_size == 0 {
                return Err(RulesError::ZeroCaptureSize);
            }
            if self.rules.win_by_captures && self.rules.winning_num_captures == 0 {
                return Err(RulesError::ZeroWinningCaptures);
            }
        }
        Ok(())
    }

    /// Whether capture counts matter for winning.
    pub fn counts_captures(&self) -> bool {
        self.rules.allow_captures && self.rules.win_by_captures
    }

    pub fn num_cells(&self) -> usize {
        self.board.width * self.board.height
    }
}
