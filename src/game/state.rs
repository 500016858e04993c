//! Game state and rules.

use serde::{Deserialize, Serialize};

use crate::game::Action;

/// Index of a seat at the table: 0 moves on even move counts, 1 on odd.
pub type Seat = usize;

/// Sticks a hand holds at the start of a game.
pub const STARTING_STICKS: u8 = 1;

/// A hand reaching this many sticks is knocked out (reset to zero).
pub const OVERFLOW: u8 = 5;

/// Default move budget per game.
pub const DEFAULT_MAX_MOVES: u32 = 100;

/// Terminal result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Winning seat.
    pub winner: Seat,
    /// Moves played as a fraction of the move budget, in [0, 1].
    pub length: f64,
}

/// Complete state of one game of Chopsticks.
///
/// Illegal moves are part of the rules: the acting player's hands are
/// zeroed and the move counter does not advance, which ends the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Stick counts, indexed by seat then hand.
    hands: [[u8; 2]; 2],
    /// Moves successfully played so far.
    move_count: u32,
    /// Move budget; the game ends when it is reached.
    max_moves: u32,
    /// Number of `apply_*` calls made against this state.
    #[serde(skip)]
    applied: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MOVES)
    }
}

impl GameState {
    /// Create a fresh game with the given move budget.
    #[must_use]
    pub const fn new(max_moves: u32) -> Self {
        Self {
            hands: [[STARTING_STICKS; 2]; 2],
            move_count: 0,
            max_moves,
            applied: 0,
        }
    }

    /// Create a game in an arbitrary position.
    ///
    /// Counts above 4 are clamped to 4; `move_count` is clamped to the budget.
    #[must_use]
    pub fn from_hands(hands: [[u8; 2]; 2], move_count: u32, max_moves: u32) -> Self {
        let clamp = |h: [u8; 2]| [h[0].min(OVERFLOW - 1), h[1].min(OVERFLOW - 1)];
        Self {
            hands: [clamp(hands[0]), clamp(hands[1])],
            move_count: move_count.min(max_moves),
            max_moves,
            applied: 0,
        }
    }

    /// Return to the starting position.
    pub fn reset(&mut self) {
        self.hands = [[STARTING_STICKS; 2]; 2];
        self.move_count = 0;
        self.applied = 0;
    }

    /// All stick counts, indexed by seat then hand.
    #[must_use]
    pub const fn hands(&self) -> [[u8; 2]; 2] {
        self.hands
    }

    /// The two hands of one seat.
    #[must_use]
    pub const fn hand(&self, seat: Seat) -> [u8; 2] {
        self.hands[seat & 1]
    }

    /// Total sticks held by one seat.
    #[must_use]
    pub const fn total(&self, seat: Seat) -> u8 {
        let [l, r] = self.hand(seat);
        l + r
    }

    /// Moves played so far.
    #[must_use]
    pub const fn move_count(&self) -> u32 {
        self.move_count
    }

    /// Move budget.
    #[must_use]
    pub const fn max_moves(&self) -> u32 {
        self.max_moves
    }

    /// Number of mutating apply calls since creation or the last reset.
    #[must_use]
    pub const fn applied(&self) -> u64 {
        self.applied
    }

    /// Seat to move.
    #[must_use]
    pub const fn current_player(&self) -> Seat {
        (self.move_count % 2) as Seat
    }

    /// Seat waiting for its turn.
    #[must_use]
    pub const fn opponent(&self) -> Seat {
        1 - self.current_player()
    }

    /// Whether a player is eliminated or the move budget is spent.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.total(0) == 0 || self.total(1) == 0 || self.move_count >= self.max_moves
    }

    /// Winning seat, once the game is finished.
    ///
    /// Seat 1 wins whenever it still holds sticks, so a game that runs out
    /// of moves with both players alive goes to seat 1.
    #[must_use]
    pub const fn winner(&self) -> Option<Seat> {
        if !self.is_finished() {
            return None;
        }
        Some(if self.total(1) > 0 { 1 } else { 0 })
    }

    /// Winner together with the normalized game length.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        let winner = self.winner()?;
        let length = if self.max_moves == 0 {
            1.0
        } else {
            f64::from(self.move_count) / f64::from(self.max_moves)
        };
        Some(Outcome { winner, length })
    }

    /// Apply an action for the current player.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Attack { from, to } => self.apply_attack(from, to),
            Action::Transfer { left, right } => self.apply_transfer(left, right),
        }
    }

    /// Add the current player's `from` hand onto the opponent's `to` hand.
    ///
    /// Attacking from or onto an empty hand eliminates the attacker.
    pub fn apply_attack(&mut self, from: u8, to: u8) {
        self.applied += 1;
        let me = self.current_player();
        let them = self.opponent();
        let (from, to) = (usize::from(from), usize::from(to));

        if from > 1 || to > 1 || self.hands[me][from] == 0 || self.hands[them][to] == 0 {
            self.hands[me] = [0, 0];
            return;
        }

        let sum = self.hands[them][to] + self.hands[me][from];
        self.hands[them][to] = if sum >= OVERFLOW { 0 } else { sum };
        self.move_count += 1;
    }

    /// Split the current player's sticks as `[left, right]`.
    ///
    /// The split must keep the total and leave both hands in 1..=4,
    /// otherwise the current player is eliminated.
    pub fn apply_transfer(&mut self, left: u8, right: u8) {
        self.applied += 1;
        let me = self.current_player();

        if u16::from(left) + u16::from(right) != u16::from(self.total(me))
            || left == 0
            || right == 0
            || left >= OVERFLOW
            || right >= OVERFLOW
        {
            self.hands[me] = [0, 0];
            return;
        }

        self.hands[me] = [left, right];
        self.move_count += 1;
    }

    /// Every legal action for the current player.
    ///
    /// Attacks come first, then transfers. A transfer never reproduces the
    /// current split or its mirror.
    #[must_use]
    pub fn legal_moves(&self) -> Vec<Action> {
        let mine = self.hand(self.current_player());
        let theirs = self.hand(self.opponent());
        let total = mine[0] + mine[1];
        let mut moves = Vec::with_capacity(8);

        for from in 0..2u8 {
            if mine[usize::from(from)] == 0 {
                continue;
            }
            for to in 0..2u8 {
                if theirs[usize::from(to)] > 0 {
                    moves.push(Action::Attack { from, to });
                }
            }
        }

        if total > 1 {
            if mine[0] == 0 {
                moves.extend((1..total).map(|left| Action::Transfer {
                    left,
                    right: total - left,
                }));
            }
            if mine[1] == 0 {
                moves.extend((1..total).map(|right| Action::Transfer {
                    left: total - right,
                    right,
                }));
            }
        }

        if mine[0] > 0 && mine[1] > 0 {
            moves.extend(
                (1..total.min(OVERFLOW))
                    .filter(|&left| left != mine[0] && left != mine[1] && total - left < OVERFLOW)
                    .map(|left| Action::Transfer {
                        left,
                        right: total - left,
                    }),
            );
        }

        moves
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_position() {
        let mut state = GameState::from_hands([[0, 3], [4, 2]], 7, 100);
        state.reset();
        assert_eq!(state.hands(), [[1, 1], [1, 1]]);
        assert_eq!(state.move_count(), 0);
        assert!(!state.is_finished());
    }

    #[test]
    fn test_attack_adds_to_target() {
        let mut state = GameState::new(100);
        state.apply_attack(0, 0);
        assert_eq!(state.hands(), [[1, 1], [2, 1]]);
        assert_eq!(state.move_count(), 1);
        assert_eq!(state.current_player(), 1);
    }

    #[test]
    fn test_attack_overflow_knocks_out_hand() {
        let mut state = GameState::from_hands([[3, 1], [2, 1]], 0, 100);
        state.apply_attack(0, 0);
        assert_eq!(state.hand(1), [0, 1]);
        assert_eq!(state.move_count(), 1);
    }

    #[test]
    fn test_attack_from_empty_hand_self_eliminates() {
        let mut state = GameState::from_hands([[0, 3], [1, 1]], 0, 100);
        state.apply_attack(0, 1);
        assert_eq!(state.hand(0), [0, 0]);
        assert_eq!(state.move_count(), 0);
        assert!(state.is_finished());
        assert_eq!(state.winner(), Some(1));
    }

    #[test]
    fn test_attack_out_of_range_hand_is_illegal() {
        let mut state = GameState::new(100);
        state.apply_attack(2, 0);
        assert_eq!(state.hand(0), [0, 0]);
    }

    #[test]
    fn test_transfer_from_empty_hand() {
        let mut state = GameState::from_hands([[0, 3], [1, 1]], 0, 100);
        state.apply_transfer(1, 2);
        assert_eq!(state.hand(0), [1, 2]);
        assert_eq!(state.move_count(), 1);
    }

    #[test]
    fn test_transfer_illegal_splits() {
        for (left, right) in [(0, 3), (3, 0), (1, 1), (2, 2)] {
            let mut state = GameState::from_hands([[0, 3], [1, 1]], 0, 100);
            state.apply_transfer(left, right);
            assert_eq!(state.hand(0), [0, 0], "split ({left}, {right})");
            assert_eq!(state.move_count(), 0);
        }
    }

    #[test]
    fn test_winner_requires_finished_game() {
        let state = GameState::new(100);
        assert_eq!(state.winner(), None);
        assert!(state.outcome().is_none());
    }

    #[test]
    fn test_move_cap_goes_to_second_seat() {
        let state = GameState::from_hands([[1, 1], [1, 1]], 10, 10);
        assert!(state.is_finished());
        let outcome = state.outcome().unwrap();
        assert_eq!(outcome.winner, 1);
        assert!((outcome.length - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_second_seat_eliminated_goes_to_first_seat() {
        let state = GameState::from_hands([[2, 0], [0, 0]], 9, 100);
        assert_eq!(state.winner(), Some(0));
    }

    #[test]
    fn test_legal_moves_opening() {
        let state = GameState::new(100);
        let moves = state.legal_moves();
        // four attacks, and (1, 1) has no other split of two
        assert_eq!(moves.len(), 4);
        assert!(moves.iter().all(Action::is_attack));
    }

    #[test]
    fn test_legal_moves_with_empty_hand() {
        let state = GameState::from_hands([[0, 3], [2, 0]], 0, 100);
        let moves = state.legal_moves();
        assert!(moves.contains(&Action::Attack { from: 1, to: 0 }));
        assert!(moves.contains(&Action::Transfer { left: 1, right: 2 }));
        assert!(moves.contains(&Action::Transfer { left: 2, right: 1 }));
        assert!(!moves.contains(&Action::Attack { from: 0, to: 0 }));
    }

    #[test]
    fn test_legal_transfers_skip_current_split() {
        let state = GameState::from_hands([[1, 3], [1, 1]], 0, 100);
        let transfers: Vec<_> = state
            .legal_moves()
            .into_iter()
            .filter(|a| !a.is_attack())
            .collect();
        assert_eq!(transfers, vec![Action::Transfer { left: 2, right: 2 }]);
    }

    #[test]
    fn test_apply_counter() {
        let mut state = GameState::new(100);
        state.apply(Action::Attack { from: 0, to: 0 });
        state.apply(Action::Transfer { left: 4, right: 4 });
        assert_eq!(state.applied(), 2);
    }
}
