use crate::game::GameState;
use crate::random::RandomGenerator;

/// Zobrist keys for content-hashing game states during one search.
///
/// Each (cell, player) pair and each player-to-move gets a random key; capture
/// counts and the turn number are folded in by multiplication, since they are
/// unbounded. Equal states always hash equally. Distinct states may collide,
/// so callers confirm a hit by comparing states.
pub struct ZobristTable {
    num_players: usize,
    stones: Vec<u64>,
    to_move: Vec<u64>,
    captures: Vec<u64>,
    turn: u64,
}

impl ZobristTable {
    pub fn new<R: RandomGenerator>(num_cells: usize, num_players: usize, random: &mut R) -> Self {
        let mut keys = |n: usize| (0..n).map(|_| random.next_u64()).collect::<Vec<_>>();
        let stones = keys(num_cells * num_players);
        let to_move = keys(num_players);
        let captures = keys(num_players);
        let turn = random.next_u64();
        Self {
            num_players,
            stones,
            to_move,
            captures,
            turn,
        }
    }

    pub fn hash(&self, state: &GameState) -> u64 {
        let mut h = 0u64;
        for (cell, owner) in state.board.raw_cells().iter().enumerate() {
            if let Some(p) = owner {
                h ^= self.stones[cell * self.num_players + usize::from(*p)];
            }
        }
        h ^= self.to_move[state.player];
        for (key, &count) in self.captures.iter().zip(&state.captures) {
            h ^= key.wrapping_mul(u64::from(count) + 1);
        }
        h ^ self.turn.wrapping_mul(state.turn as u64 + 1)
    }
}
