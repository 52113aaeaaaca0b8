//! Rules engine and game-tree search AI for configurable connect and capture games.
//!
//! One rules model covers Tic-Tac-Toe, Connect-Four-style gravity games and
//! Pente-style flank captures: board size, gravity, winning line length and
//! capture rules are all part of a [`RulesSpec`]. The engine validates and
//! applies moves, resolves captures and detects winners; the search picks a
//! move for any number of players.
//!
//! # Example
//!
//! ```rust
//! use connect_capture::game::Game;
//! use connect_capture::board::Move;
//! use connect_capture::rules::RulesSpec;
//! use connect_capture::search::GameSearch;
//! use connect_capture::random::SeededRandomGenerator;
//!
//! // Start a two-player game of Tic-Tac-Toe, player 0 first
//! let mut game = Game::new(RulesSpec::tic_tac_toe(), 2, 0).unwrap();
//! game.apply_move(Move::new(0, 0)).unwrap();
//!
//! // Configure a reproducible search using the builder
//! let mut search = GameSearch::builder(*game.spec(), game.num_players())
//!     .with_random_generator(SeededRandomGenerator::new(7))
//!     .build();
//!
//! // Let the AI answer and feed its move back through the engine
//! let reply = search.choose_move(game.state()).unwrap();
//! let result = game.apply_move(reply).unwrap();
//!
//! println!("AI played {:?}, winner so far: {:?}", reply, result.winner);
//! ```

/// Board grid and move coordinates.
pub mod board;
/// Error types for rules, game play and search.
pub mod error;
/// Game state engine: legality, captures, victory detection.
pub mod game;
/// Zobrist hashing of game states for transposition detection.
pub mod hash;
/// Static evaluation of positions.
pub mod heuristic;
/// Injectable random sources.
pub mod random;
/// Rules specifications and presets.
pub mod rules;
/// The move search driver.
pub mod search;
/// Nodes of the search graph and their move frontiers.
pub mod search_node;

pub use board::{Board, Move, PlayerId};
pub use error::{GameError, RulesError, SearchError};
pub use game::{Game, GameState, MoveResult};
pub use rules::RulesSpec;
pub use search::{GameSearch, SearchConfig, choose_ai_move};
