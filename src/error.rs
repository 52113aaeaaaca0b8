use crate::board::Move;
use thiserror::Error;

/// Reasons a rules specification is rejected.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RulesError {
    #[error("board dimensions must be at least 1x1, got {width}x{height}")]
    EmptyBoard { width: usize, height: usize },
    #[error("winning length must be at least 1")]
    ZeroWinningLength,
    #[error("capture size must be at least 1 when captures are allowed")]
    ZeroCaptureSize,
    #[error("winning capture count must be at least 1 when winning by captures")]
    ZeroWinningCaptures,
}

/// Errors raised by the game state engine.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Rules(#[from] RulesError),
    #[error("a game needs at least one player")]
    NoPlayers,
    #[error("at most {max} players are supported, got {0}", max = crate::board::MAX_PLAYERS)]
    TooManyPlayers(usize),
    #[error("starting player {player} is out of range for {num_players} players")]
    InvalidPlayer { player: usize, num_players: usize },
    #[error("illegal move at ({}, {})", .0.row, .0.col)]
    IllegalMove(Move),
    #[error("the game is already over")]
    GameOver,
    #[error("state does not match the rules: {0}")]
    MalformedState(String),
    #[error("invalid game record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the move search.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SearchError {
    /// The position has no legal move; the caller searched a finished game.
    #[error("no legal moves available from the current position")]
    NoLegalMoves,
    #[error("the game is already over")]
    GameOver,
}
