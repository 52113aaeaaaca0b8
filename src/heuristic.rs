//! Static evaluation of non-terminal positions.
//!
//! Scores are per player, higher is better. Each normalized component lies in
//! `[-2, 2]` and the optional threat bonus in `[-9, 9]`, so a heuristic vector
//! never leaves `[-13, 13]` and [`WIN_VALUE`] always dominates it.

use crate::board::{Move, PlayerId};
use crate::game::GameState;
use crate::rules::RulesSpec;

/// Added to the winner's score and subtracted from everyone else's at a
/// decided position. Larger than the whole heuristic range.
pub const WIN_VALUE: f64 = 27.0;

/// Weight of a player's own share when normalizing against rivals.
const SELF_WEIGHT: f64 = 0.2;

/// Magnitude of the one-hot threat bonus: two normalized ranges plus one.
const THREAT_VALUE: f64 = 9.0;

/// Window directions that enumerate every line exactly once.
const WINDOW_AXES: [(isize, isize); 4] = [(0, 1), (1, -1), (1, 0), (1, 1)];

/// Turns raw per-player tallies into relative scores in `[-2, 2]`.
///
/// A player is rewarded for its own share and penalized by both the strongest
/// rival's share and the average rival share. All-zero input yields zeros.
pub fn normalize(raw: &[f64]) -> Vec<f64> {
    let sum: f64 = raw.iter().sum();
    if sum == 0.0 {
        return vec![0.0; raw.len()];
    }
    let rivals = raw.len().saturating_sub(1).max(1) as f64;

    raw.iter()
        .enumerate()
        .map(|(i, &own)| {
            let weighted = sum - (1.0 - SELF_WEIGHT) * own;
            let (total, max) = raw
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &other)| other / weighted)
                .fold((0.0, 0.0_f64), |(t, m), share| (t + share, m.max(share)));
            2.0 * SELF_WEIGHT * (own / weighted) - (max + total / rivals)
        })
        .collect()
}

/// Heuristic vector for `state`: capture skew plus line potential, and the
/// one-hot threat bonus when `threat_bonus` is set.
pub fn heuristic_scores(spec: &RulesSpec, state: &GameState, threat_bonus: bool) -> Vec<f64> {
    let n = state.num_players();

    let capture_scores = if spec.counts_captures() {
        let raw: Vec<f64> = state.captures.iter().map(|&c| f64::from(c)).collect();
        normalize(&raw)
    } else {
        vec![0.0; n]
    };

    let lines = scan_lines(spec, state);
    let line_scores = normalize(&lines.potential);

    let mut result: Vec<f64> = capture_scores
        .iter()
        .zip(&line_scores)
        .map(|(c, l)| c + l)
        .collect();

    if threat_bonus {
        let mut chances = lines.open_threats;
        if spec.counts_captures() {
            for (p, extra) in capture_threats(spec, state).into_iter().enumerate() {
                chances[p] += extra;
            }
        }
        for (score, bonus) in result.iter_mut().zip(threat_vector(state, &chances)) {
            *score += THREAT_VALUE * bonus;
        }
    }
    result
}

struct LineScan {
    /// Sum of `count^5` over single-owner windows.
    potential: Vec<f64>,
    /// Windows one stone short of a win whose gap is playable.
    open_threats: Vec<usize>,
}

fn scan_lines(spec: &RulesSpec, state: &GameState) -> LineScan {
    let n = state.num_players();
    let board = &state.board;
    let len = spec.rules.winning_length;
    let mut scan = LineScan {
        potential: vec![0.0; n],
        open_threats: vec![0; n],
    };
    if len == 0 {
        return scan;
    }

    for row in 0..board.height() {
        for col in 0..board.width() {
            let start = Move::new(row, col);
            for (dr, dc) in WINDOW_AXES {
                if board.step(start, dr, dc, len - 1).is_none() {
                    continue;
                }
                let mut owner: Option<PlayerId> = None;
                let mut count = 0;
                let mut gap = None;
                for k in 0..len {
                    let Some(cell) = board.step(start, dr, dc, k) else {
                        break;
                    };
                    match (board.get(cell), owner) {
                        (None, _) => gap = Some(cell),
                        (Some(p), None) => {
                            owner = Some(p);
                            count = 1;
                        }
                        (Some(p), Some(o)) if p == o => count += 1,
                        (Some(_), Some(_)) => {
                            count = 0;
                            break;
                        }
                    }
                }
                let Some(p) = owner.filter(|_| count > 0) else {
                    continue;
                };
                scan.potential[p] += (count as f64).powi(5);
                if count + 1 == len && gap.is_some_and(|g| state.is_legal(spec, g)) {
                    scan.open_threats[p] += 1;
                }
            }
        }
    }
    scan
}

/// Capturing moves available to players one capture short of a capture win.
fn capture_threats(spec: &RulesSpec, state: &GameState) -> Vec<usize> {
    let n = state.num_players();
    let mut threats = vec![0; n];
    let needed = spec.rules.winning_num_captures.saturating_sub(1);
    let close: Vec<bool> = state.captures.iter().map(|&c| c == needed).collect();
    if !close.contains(&true) {
        return threats;
    }

    let board = &state.board;
    let size = spec.rules.capture_size;
    let cells = (0..board.height()).flat_map(|r| (0..board.width()).map(move |c| Move::new(r, c)));
    for target in cells {
        if !state.is_legal(spec, target) {
            continue;
        }
        for dr in -1..=1 {
            for dc in -1..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let Some(end) = board.step(target, dr, dc, size + 1) else {
                    continue;
                };
                let Some(p) = board.get(end).filter(|&p| close[p]) else {
                    continue;
                };
                let flanked = (1..=size).all(|k| {
                    board
                        .step(target, dr, dc, k)
                        .and_then(|cell| board.get(cell))
                        .is_some_and(|o| o != p)
                });
                if flanked {
                    threats[p] += 1;
                }
            }
        }
    }
    threats
}

/// One-hot vector favouring the first player in turn order whose threats
/// survive the opponents' intervening turns.
fn threat_vector(state: &GameState, chances: &[usize]) -> Vec<f64> {
    let n = state.num_players();
    let order: Vec<PlayerId> = (0..n).map(|t| (state.player + t) % n).collect();
    let live = |t: usize| chances[order[t]].saturating_sub(t) > 0;

    match (0..n).find(|&t| live(t)) {
        None => vec![0.0; n],
        Some(t) => {
            let mut v = vec![-1.0; n];
            v[order[t]] = 1.0;
            v
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(spec: &RulesSpec, stones: &[((usize, usize), PlayerId)]) -> GameState {
        let mut state = GameState::new(spec, 2, 0).unwrap();
        for &((r, c), p) in stones {
            state.board.set(Move::new(r, c), Some(p));
        }
        state
    }

    #[test]
    fn normalize_all_zero_gives_no_signal() {
        assert_eq!(normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn normalize_rewards_the_leader() {
        let scores = normalize(&[4.0, 1.0]);
        assert!(scores[0] > scores[1]);
        for s in &scores {
            assert!((-2.0..=2.0).contains(s));
        }

        // a lone leader is the only positive score
        let scores = normalize(&[4.0, 0.0]);
        assert!(scores[0] > 0.0);
        assert!(scores[1] < 0.0);
    }

    #[test]
    fn normalize_matches_hand_computation() {
        // player 0: weighted = 4 - 0.8 * 3 = 1.6, self = 0.2 * 3 / 1.6, rival = 1 / 1.6
        let scores = normalize(&[3.0, 1.0]);
        let expected = 2.0 * 0.2 * 3.0 / 1.6 - 2.0 * (1.0 / 1.6);
        assert!((scores[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn empty_board_scores_zero() {
        let spec = RulesSpec::pente();
        let state = GameState::new(&spec, 2, 0).unwrap();
        assert_eq!(heuristic_scores(&spec, &state, true), vec![0.0, 0.0]);
    }

    #[test]
    fn longer_lines_score_higher() {
        // arrange
        let spec = RulesSpec::pente();
        let state = state_with(
            &spec,
            &[((6, 3), 0), ((6, 4), 0), ((6, 5), 0), ((0, 0), 1)],
        );

        // act
        let scores = heuristic_scores(&spec, &state, false);

        // assert
        assert!(scores[0] > scores[1]);
        assert!(scores[0] > 0.0);
    }

    #[test]
    fn mixed_windows_count_for_nobody() {
        let spec = RulesSpec::tic_tac_toe();
        let state = state_with(&spec, &[((1, 1), 0), ((0, 0), 1)]);
        let lines = scan_lines(&spec, &state);
        // centre lines: row 1, column 1, anti-diagonal are owned by 0; the main diagonal is mixed
        assert_eq!(lines.potential[0], 3.0);
        // row 0, column 0 owned by 1
        assert_eq!(lines.potential[1], 2.0);
    }

    #[test]
    fn capture_lead_shows_in_scores() {
        let spec = RulesSpec::pente();
        let mut state = GameState::new(&spec, 2, 0).unwrap();
        state.captures = vec![3, 0];
        let scores = heuristic_scores(&spec, &state, false);
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn open_threat_for_player_to_move_dominates() {
        // arrange: player 0 to move with two in a row and a free third cell
        let spec = RulesSpec::tic_tac_toe();
        let state = state_with(&spec, &[((0, 0), 0), ((0, 1), 0), ((2, 0), 1)]);

        // act
        let plain = heuristic_scores(&spec, &state, false);
        let with_threats = heuristic_scores(&spec, &state, true);

        // assert
        assert!((with_threats[0] - plain[0] - THREAT_VALUE).abs() < 1e-9);
        assert!((with_threats[1] - plain[1] + THREAT_VALUE).abs() < 1e-9);
    }

    #[test]
    fn capture_threat_detected_near_capture_win() {
        let spec = RulesSpec::pente();
        let mut state = state_with(&spec, &[((5, 5), 0), ((5, 6), 1), ((5, 7), 1)]);
        state.captures = vec![4, 0];
        let threats = capture_threats(&spec, &state);
        assert_eq!(threats, vec![1, 0]);
    }

    #[test]
    fn heuristic_stays_below_win_value() {
        let spec = RulesSpec::pente();
        let mut state = state_with(
            &spec,
            &[((0, 0), 0), ((0, 1), 0), ((0, 2), 0), ((0, 3), 0), ((12, 12), 1)],
        );
        state.captures = vec![4, 0];
        for s in heuristic_scores(&spec, &state, true) {
            assert!(s.abs() <= 13.0);
            assert!(s.abs() < WIN_VALUE / 2.0);
        }
    }
}
