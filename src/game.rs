use crate::board::{Board, MAX_PLAYERS, Move, PlayerId};
use crate::error::{GameError, SearchError};
use crate::rules::RulesSpec;
use crate::search;
use log::trace;
use serde::{Deserialize, Serialize};

/// The four line axes through a cell: vertical, both diagonals, horizontal.
const LINE_AXES: [(isize, isize); 4] = [(1, 0), (1, -1), (0, 1), (1, 1)];

/// Everything that changes from turn to turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    /// Player to move next.
    pub player: PlayerId,
    /// Number of plies played so far.
    pub turn: usize,
    /// Groups captured by each player.
    pub captures: Vec<u32>,
}

/// The outcome of applying one move to a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    pub state: GameState,
    /// Cells vacated by captures.
    pub captured: Vec<Move>,
    pub winner: Option<PlayerId>,
}

impl GameState {
    /// An empty board with `starting_player` to move.
    pub fn new(
        spec: &RulesSpec,
        num_players: usize,
        starting_player: PlayerId,
    ) -> Result<Self, GameError> {
        spec.validate()?;
        check_player_count(num_players)?;
        if starting_player >= num_players {
            return Err(GameError::InvalidPlayer {
                player: starting_player,
                num_players,
            });
        }
        Ok(Self {
            board: Board::new(spec.board.width, spec.board.height),
            player: starting_player,
            turn: 0,
            captures: vec![0; num_players],
        })
    }

    /// Number of players, taken from the capture counters.
    pub fn num_players(&self) -> usize {
        self.captures.len()
    }

    /// Whether `m` may be played. Occupied and off-board cells are never legal;
    /// under gravity the cell must also rest on a stone or on the bottom row.
    pub fn is_legal(&self, spec: &RulesSpec, m: Move) -> bool {
        if !self.board.is_empty_at(m) {
            return false;
        }
        if spec.board.gravity && m.row + 1 < self.board.height() {
            return !self.board.is_empty_at(Move::new(m.row + 1, m.col));
        }
        true
    }

    /// Whether every cell is occupied.
    pub fn board_full(&self) -> bool {
        self.board.is_full()
    }

    /// Plays `m` in place and returns the cells freed by captures.
    pub fn apply_move(&mut self, spec: &RulesSpec, m: Move) -> Result<Vec<Move>, GameError> {
        if !self.is_legal(spec, m) {
            return Err(GameError::IllegalMove(m));
        }
        Ok(self.play_unchecked(spec, m))
    }

    /// Copy-on-write form of [`GameState::apply_move`]: `self` is left untouched.
    pub fn with_move(&self, spec: &RulesSpec, m: Move) -> Result<MoveResult, GameError> {
        let mut state = self.clone();
        let captured = state.apply_move(spec, m)?;
        let winner = state.check_victor(spec, m);
        Ok(MoveResult {
            state,
            captured,
            winner,
        })
    }

    /// Places the mover's stone, resolves captures and passes the turn.
    /// The caller guarantees legality.
    pub(crate) fn play_unchecked(&mut self, spec: &RulesSpec, m: Move) -> Vec<Move> {
        let mover = self.player;
        self.board.set(m, Some(mover));
        let captured = self.resolve_captures(spec, m, mover);
        self.player = (self.player + 1) % self.num_players();
        self.turn += 1;
        captured
    }

    /// Winner produced by the stone at `m`, judged after captures were resolved.
    ///
    /// A capture win takes precedence over a line win.
    pub fn check_victor(&self, spec: &RulesSpec, m: Move) -> Option<PlayerId> {
        let player = self.board.get(m)?;

        if spec.counts_captures()
            && self.captures.get(player).copied().unwrap_or(0) >= spec.rules.winning_num_captures
        {
            trace!("player {player} wins by captures at ({}, {})", m.row, m.col);
            return Some(player);
        }

        for (dr, dc) in LINE_AXES {
            let mut count = 1;
            for sign in [-1, 1] {
                count += (1..)
                    .map_while(|k| self.board.step(m, dr * sign, dc * sign, k))
                    .take_while(|&cell| self.board.get(cell) == Some(player))
                    .count();
            }
            if count >= spec.rules.winning_length {
                trace!("player {player} wins by line through ({}, {})", m.row, m.col);
                return Some(player);
            }
        }
        None
    }

    /// Flank captures around the stone just placed at `m`.
    ///
    /// Every direction is judged against the board as it stood right after
    /// placement; clearing happens once all directions have been examined.
    fn resolve_captures(&mut self, spec: &RulesSpec, m: Move, mover: PlayerId) -> Vec<Move> {
        if !spec.rules.allow_captures || spec.rules.capture_size == 0 {
            return Vec::new();
        }
        let size = spec.rules.capture_size;

        let mut flanks = 0;
        let mut captured = Vec::new();
        for dr in -1..=1 {
            for dc in -1..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                match self.board.step(m, dr, dc, size + 1) {
                    Some(end) if self.board.get(end) == Some(mover) => {}
                    _ => continue,
                }
                let between: Option<Vec<Move>> = (1..=size)
                    .map(|k| self.board.step(m, dr, dc, k))
                    .collect();
                let Some(between) = between else { continue };
                let sandwiched = between
                    .iter()
                    .all(|&cell| matches!(self.board.get(cell), Some(p) if p != mover));
                if sandwiched {
                    flanks += 1;
                    captured.extend(between);
                }
            }
        }

        for &cell in &captured {
            self.board.set(cell, None);
        }
        if flanks > 0 {
            self.captures[mover] += flanks;
            trace!(
                "player {mover} captured {flanks} group(s) from ({}, {})",
                m.row, m.col
            );
        }
        captured
    }

    /// Checks that the state fits `spec` and `num_players`.
    fn check_against(&self, spec: &RulesSpec) -> Result<(), GameError> {
        let n = self.num_players();
        check_player_count(n)?;
        if self.board.width() != spec.board.width || self.board.height() != spec.board.height {
            return Err(GameError::MalformedState(format!(
                "board is {}x{}, rules expect {}x{}",
                self.board.width(),
                self.board.height(),
                spec.board.width,
                spec.board.height
            )));
        }
        if self.player >= n {
            return Err(GameError::InvalidPlayer {
                player: self.player,
                num_players: n,
            });
        }
        if let Some((m, p)) = self.board.stones().find(|&(_, p)| p >= n) {
            return Err(GameError::MalformedState(format!(
                "cell ({}, {}) holds unknown player {p}",
                m.row, m.col
            )));
        }
        Ok(())
    }
}

fn check_player_count(num_players: usize) -> Result<(), GameError> {
    match num_players {
        0 => Err(GameError::NoPlayers),
        n if n > MAX_PLAYERS => Err(GameError::TooManyPlayers(n)),
        _ => Ok(()),
    }
}

/// A game in progress: the rules, the current state and the result so far.
///
/// Every transition replaces the whole state, so a reference obtained from
/// [`Game::state`] is never observed half-updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    spec: RulesSpec,
    state: GameState,
    winner: Option<PlayerId>,
}

impl Game {
    /// Starts a game on an empty board with `starting_player` to move.
    pub fn new(
        spec: RulesSpec,
        num_players: usize,
        starting_player: PlayerId,
    ) -> Result<Self, GameError> {
        let state = GameState::new(&spec, num_players, starting_player)?;
        Ok(Self {
            spec,
            state,
            winner: None,
        })
    }

    /// Rebuilds a game from plain data, e.g. after a reload.
    pub fn restore(
        spec: RulesSpec,
        state: GameState,
        winner: Option<PlayerId>,
    ) -> Result<Self, GameError> {
        spec.validate()?;
        state.check_against(&spec)?;
        if let Some(w) = winner.filter(|&w| w >= state.num_players()) {
            return Err(GameError::InvalidPlayer {
                player: w,
                num_players: state.num_players(),
            });
        }
        Ok(Self {
            spec,
            state,
            winner,
        })
    }

    /// Parses a game saved with [`Game::to_json`] and validates it like [`Game::restore`].
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let raw: Game = serde_json::from_str(json)?;
        Self::restore(raw.spec, raw.state, raw.winner)
    }

    /// Serializes the rules, state and winner.
    pub fn to_json(&self) -> Result<String, GameError> {
        Ok(serde_json::to_string(self)?)
    }

    /// The rules this game is played under.
    pub fn spec(&self) -> &RulesSpec {
        &self.spec
    }

    /// The current state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The current board.
    pub fn board(&self) -> &Board {
        &self.state.board
    }

    /// Player to move next.
    pub fn player(&self) -> PlayerId {
        self.state.player
    }

    /// Number of plies played so far.
    pub fn turn(&self) -> usize {
        self.state.turn
    }

    /// Capture count per player.
    pub fn captures(&self) -> &[u32] {
        &self.state.captures
    }

    /// Number of players taking turns.
    pub fn num_players(&self) -> usize {
        self.state.num_players()
    }

    /// The winner, once there is one.
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Whether every cell is occupied.
    pub fn board_full(&self) -> bool {
        self.state.board_full()
    }

    /// Whether the game has a winner or the board is full.
    pub fn is_over(&self) -> bool {
        self.winner.is_some() || self.board_full()
    }

    /// Whether the player to move may play `m` now.
    pub fn is_legal_move(&self, m: Move) -> bool {
        !self.is_over() && self.state.is_legal(&self.spec, m)
    }

    /// Applies `m` for the player to move. Illegal requests leave the game untouched.
    pub fn apply_move(&mut self, m: Move) -> Result<MoveResult, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        let result = self.state.with_move(&self.spec, m)?;
        self.state = result.state.clone();
        self.winner = result.winner;
        Ok(result)
    }

    /// Picks a move for the player to move with the default search settings.
    pub fn choose_ai_move(&self) -> Result<Move, SearchError> {
        if self.winner.is_some() {
            return Err(SearchError::GameOver);
        }
        search::choose_ai_move(&self.spec, &self.state, self.num_players())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play_all(game: &mut Game, moves: &[(usize, usize)]) -> MoveResult {
        let mut last = None;
        for &(r, c) in moves {
            last = Some(game.apply_move(Move::new(r, c)).unwrap());
        }
        last.unwrap()
    }

    #[test]
    fn row_of_three_wins_tic_tac_toe() {
        // arrange
        let mut game = Game::new(RulesSpec::tic_tac_toe(), 2, 0).unwrap();

        // act
        let result = play_all(&mut game, &[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)]);

        // assert
        assert_eq!(result.winner, Some(0));
        assert_eq!(game.winner(), Some(0));
        assert!(game.is_over());
        assert!(!game.is_legal_move(Move::new(2, 2)));
        assert_eq!(game.choose_ai_move(), Err(SearchError::GameOver));
    }

    #[test]
    fn ai_reply_is_accepted_by_the_engine() {
        let mut game = Game::new(RulesSpec::link_four(), 2, 0).unwrap();
        game.apply_move(Move::new(5, 3)).unwrap();

        let reply = game.choose_ai_move().unwrap();
        assert!(game.is_legal_move(reply));
        let result = game.apply_move(reply).unwrap();
        assert_eq!(result.state.turn, 2);
        assert_eq!(game.player(), 0);
    }

    #[test]
    fn victor_found_on_every_axis() {
        let spec = RulesSpec::tic_tac_toe();
        let lines = [
            [(0, 1), (1, 1), (2, 1)],
            [(0, 0), (1, 1), (2, 2)],
            [(0, 2), (1, 1), (2, 0)],
            [(1, 0), (1, 1), (1, 2)],
        ];
        for line in lines {
            for &placed in &line {
                let mut state = GameState::new(&spec, 2, 0).unwrap();
                for &(r, c) in &line {
                    state.board.set(Move::new(r, c), Some(0));
                }
                let m = Move::new(placed.0, placed.1);
                assert_eq!(state.check_victor(&spec, m), Some(0), "{line:?} at {placed:?}");
            }
        }
    }

    #[test]
    fn broken_line_does_not_win() {
        let spec = RulesSpec::link_four();
        let mut state = GameState::new(&spec, 2, 0).unwrap();
        for c in [0, 1, 3] {
            state.board.set(Move::new(5, c), Some(0));
        }
        state.board.set(Move::new(5, 2), Some(1));
        assert_eq!(state.check_victor(&spec, Move::new(5, 3)), None);
        assert_eq!(state.check_victor(&spec, Move::new(4, 3)), None);
    }

    #[test]
    fn gravity_forces_lowest_row() {
        // arrange
        let spec = RulesSpec::link_four();
        let state = GameState::new(&spec, 2, 0).unwrap();

        // assert
        assert!(!state.is_legal(&spec, Move::new(0, 3)));
        assert!(!state.is_legal(&spec, Move::new(4, 3)));
        assert!(state.is_legal(&spec, Move::new(5, 3)));

        let next = state.with_move(&spec, Move::new(5, 3)).unwrap().state;
        assert!(next.is_legal(&spec, Move::new(4, 3)));
        assert!(!next.is_legal(&spec, Move::new(5, 3)));
    }

    #[test]
    fn occupied_and_off_board_cells_are_illegal() {
        let spec = RulesSpec::tic_tac_toe();
        let mut game = Game::new(spec, 2, 0).unwrap();
        game.apply_move(Move::new(1, 1)).unwrap();

        assert!(!game.is_legal_move(Move::new(1, 1)));
        assert!(!game.is_legal_move(Move::new(3, 0)));
        assert!(!game.is_legal_move(Move::new(0, 3)));
        assert!(matches!(
            game.apply_move(Move::new(1, 1)),
            Err(GameError::IllegalMove(_))
        ));
        assert_eq!(game.turn(), 1);
        assert_eq!(game.player(), 1);
    }

    #[test]
    fn turn_and_player_advance_cyclically() {
        let spec = RulesSpec::pente();
        let mut state = GameState::new(&spec, 3, 2).unwrap();
        let expected = [0, 1, 2, 0];
        for (i, &player) in expected.iter().enumerate() {
            state.apply_move(&spec, Move::new(0, i)).unwrap();
            assert_eq!(state.player, player);
            assert_eq!(state.turn, i + 1);
        }
    }

    #[test]
    fn flank_captures_pair() {
        // arrange
        let spec = RulesSpec::pente();
        let mut state = GameState::new(&spec, 2, 0).unwrap();
        state.board.set(Move::new(5, 5), Some(0));
        state.board.set(Move::new(5, 6), Some(1));
        state.board.set(Move::new(5, 7), Some(1));

        // act
        let result = state.with_move(&spec, Move::new(5, 8)).unwrap();

        // assert
        let mut captured = result.captured.clone();
        captured.sort();
        assert_eq!(captured, vec![Move::new(5, 6), Move::new(5, 7)]);
        assert_eq!(result.state.captures, vec![1, 0]);
        assert_eq!(result.state.board.get(Move::new(5, 6)), None);
        assert_eq!(result.state.board.get(Move::new(5, 7)), None);
        assert_eq!(result.state.board.get(Move::new(5, 8)), Some(0));
        assert_eq!(result.winner, None);
        // the original is untouched
        assert_eq!(state.board.get(Move::new(5, 6)), Some(1));
    }

    #[test]
    fn capture_counts_once_per_direction() {
        // arrange: two flanks meet at (6, 6)
        let spec = RulesSpec::pente();
        let mut state = GameState::new(&spec, 2, 0).unwrap();
        for (m, p) in [
            ((6, 3), 0),
            ((6, 4), 1),
            ((6, 5), 1),
            ((3, 6), 0),
            ((4, 6), 1),
            ((5, 6), 1),
        ] {
            state.board.set(Move::new(m.0, m.1), Some(p));
        }

        // act
        let captured = state.apply_move(&spec, Move::new(6, 6)).unwrap();

        // assert
        assert_eq!(captured.len(), 4);
        assert_eq!(state.captures[0], 2);
        assert_eq!(state.board.stone_count(), 3);
    }

    #[test]
    fn no_capture_of_own_or_empty_cells() {
        let spec = RulesSpec::pente();
        let mut state = GameState::new(&spec, 2, 0).unwrap();
        state.board.set(Move::new(0, 0), Some(0));
        state.board.set(Move::new(0, 1), Some(1));
        state.board.set(Move::new(0, 2), Some(0));
        state.board.set(Move::new(1, 0), Some(0));
        state.board.set(Move::new(2, 0), Some(1));

        let captured = state.apply_move(&spec, Move::new(0, 3)).unwrap();
        assert!(captured.is_empty());
        let captured = state.apply_move(&spec, Move::new(3, 0)).unwrap();
        assert!(captured.is_empty());
        assert_eq!(state.captures, vec![0, 0]);
    }

    #[test]
    fn captures_disabled_leave_board_alone() {
        let mut spec = RulesSpec::pente();
        spec.rules.allow_captures = false;
        let mut state = GameState::new(&spec, 2, 0).unwrap();
        state.board.set(Move::new(5, 5), Some(0));
        state.board.set(Move::new(5, 6), Some(1));
        state.board.set(Move::new(5, 7), Some(1));

        let captured = state.apply_move(&spec, Move::new(5, 8)).unwrap();
        assert!(captured.is_empty());
        assert_eq!(state.board.stone_count(), 4);
    }

    #[test]
    fn enough_captures_win_outright() {
        // arrange
        let spec = RulesSpec::pente();
        let mut state = GameState::new(&spec, 2, 0).unwrap();
        state.captures = vec![4, 0];
        state.board.set(Move::new(10, 1), Some(0));
        state.board.set(Move::new(10, 2), Some(1));
        state.board.set(Move::new(10, 3), Some(1));

        // act
        let result = state.with_move(&spec, Move::new(10, 4)).unwrap();

        // assert
        assert_eq!(result.state.captures[0], 5);
        assert_eq!(result.winner, Some(0));
    }

    #[test]
    fn copies_do_not_share_boards() {
        let spec = RulesSpec::tic_tac_toe();
        let original = GameState::new(&spec, 2, 0).unwrap();
        let mut copy = original.clone();
        assert_eq!(copy, original);

        copy.board.set(Move::new(0, 0), Some(1));
        copy.captures[1] = 3;
        assert_eq!(original.board.get(Move::new(0, 0)), None);
        assert_eq!(original.captures, vec![0, 0]);
    }

    #[test]
    fn full_board_without_winner_is_a_draw() {
        let mut game = Game::new(RulesSpec::tic_tac_toe(), 2, 0).unwrap();
        let result = play_all(
            &mut game,
            &[
                (0, 0),
                (0, 1),
                (0, 2),
                (1, 1),
                (1, 0),
                (1, 2),
                (2, 1),
                (2, 0),
                (2, 2),
            ],
        );
        assert_eq!(result.winner, None);
        assert!(game.board_full());
        assert!(game.is_over());
        assert!(matches!(game.apply_move(Move::new(0, 0)), Err(GameError::GameOver)));
    }

    #[test]
    fn rejects_bad_setup() {
        assert!(matches!(
            Game::new(RulesSpec::tic_tac_toe(), 0, 0),
            Err(GameError::NoPlayers)
        ));
        assert!(matches!(
            Game::new(RulesSpec::tic_tac_toe(), 2, 2),
            Err(GameError::InvalidPlayer { .. })
        ));
        let mut spec = RulesSpec::tic_tac_toe();
        spec.rules.winning_length = 0;
        assert!(matches!(Game::new(spec, 2, 0), Err(GameError::Rules(_))));
    }

    #[test]
    fn restores_from_json() {
        // arrange
        let mut game = Game::new(RulesSpec::pente(), 2, 1).unwrap();
        game.apply_move(Move::new(6, 6)).unwrap();
        game.apply_move(Move::new(6, 7)).unwrap();

        // act
        let json = game.to_json().unwrap();
        let restored = Game::from_json(&json).unwrap();

        // assert
        assert_eq!(restored, game);
        assert_eq!(restored.player(), 1);
        assert_eq!(restored.board().get(Move::new(6, 6)), Some(1));
    }

    #[test]
    fn restore_rejects_mismatched_board() {
        let state = GameState::new(&RulesSpec::tic_tac_toe(), 2, 0).unwrap();
        let result = Game::restore(RulesSpec::link_four(), state, None);
        assert!(matches!(result, Err(GameError::MalformedState(_))));
    }

    #[test]
    fn ai_answers_a_restored_position_with_a_stale_turn_counter() {
        // arrange
        let spec = RulesSpec::tic_tac_toe();
        let mut state = GameState::new(&spec, 2, 1).unwrap();
        state.board.set(Move::new(1, 1), Some(0));
        let game = Game::restore(spec, state, None).unwrap();

        // act
        let reply = game.choose_ai_move().unwrap();

        // assert
        assert!(game.is_legal_move(reply));
    }
}
