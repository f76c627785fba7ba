//! Game session controller.
//!
//! `Game` wraps a `Position` with the state a turn loop needs: the move log,
//! an undo stack, and a cached `GameStatus` recomputed after every mutation.
//! Candidate moves are validated by membership in the legal-move set before
//! they touch the board, so an illegal candidate never mutates anything.

use tracing::debug;

use crate::engine::board::{Position, UndoInfo};
use crate::engine::movegen;
use crate::engine::types::{ChessError, Color, GameStatus, Move, PieceType, Square};

/// A chess game in progress.
#[derive(Clone, Debug)]
pub struct Game {
    position: Position,
    move_log: Vec<Move>,
    undo_stack: Vec<UndoInfo>,
    status: GameStatus,
}

impl Game {
    /// Start a new game from the standard starting position.
    pub fn new() -> Self {
        Game {
            position: Position::starting(),
            move_log: Vec::new(),
            undo_stack: Vec::new(),
            status: GameStatus::InProgress,
        }
    }

    /// Start a game from an arbitrary FEN position.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let position = Position::from_fen(fen)?;
        let status = movegen::terminal_status(&position, &movegen::legal_moves(&position));
        Ok(Game {
            position,
            move_log: Vec::new(),
            undo_stack: Vec::new(),
            status,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move
    }

    /// All moves played so far, in order.
    pub fn move_log(&self) -> &[Move] {
        &self.move_log
    }

    pub fn is_game_over(&self) -> bool {
        self.status.is_game_over()
    }

    pub fn in_check(&self) -> bool {
        movegen::is_in_check(&self.position, self.position.side_to_move)
    }

    /// Legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        movegen::legal_moves(&self.position)
    }

    /// Legal moves from one square, for move highlighting.
    pub fn legal_moves_from(&self, from: Square) -> Vec<Move> {
        movegen::legal_moves_from(&self.position, from)
    }

    pub fn to_fen(&self) -> String {
        self.position.to_fen()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Play a move. The candidate must compare equal to one of the current
    /// legal moves; anything else is rejected without touching the board.
    /// Returns the move's coordinate notation (e.g. "e2e4").
    pub fn make_move(&mut self, mv: Move) -> Result<String, ChessError> {
        if self.is_game_over() {
            return Err(ChessError::GameOver(format!(
                "game is over: {}",
                self.status
            )));
        }

        let legal = self.legal_moves();
        if !legal.contains(&mv) {
            return Err(ChessError::InvalidMove {
                from: mv.from.to_algebraic(),
                to: mv.to.to_algebraic(),
                reason: "not a legal move".into(),
            });
        }

        let undo = self.position.make_move(mv);
        self.move_log.push(mv);
        self.undo_stack.push(undo);
        self.status =
            movegen::terminal_status(&self.position, &movegen::legal_moves(&self.position));

        debug!(mv = %mv, ply = self.move_log.len(), status = %self.status, "move played");

        Ok(mv.notation())
    }

    /// Play a move given as a pair of algebraic squares ("e2", "e4"), with an
    /// optional promotion piece for pawn moves reaching the last rank.
    pub fn make_move_coords(
        &mut self,
        from: &str,
        to: &str,
        promotion: Option<PieceType>,
    ) -> Result<String, ChessError> {
        let from_sq =
            Square::from_algebraic(from).ok_or_else(|| ChessError::InvalidSquare(from.into()))?;
        let to_sq =
            Square::from_algebraic(to).ok_or_else(|| ChessError::InvalidSquare(to.into()))?;
        let mv = self.position.move_from_coords(from_sq, to_sq, promotion)?;
        self.make_move(mv)
    }

    /// Take back the last played move. Restores the position exactly,
    /// including castling rights and the en-passant target, and clears any
    /// terminal status.
    pub fn undo_move(&mut self) -> Result<Move, ChessError> {
        let mv = self.move_log.pop().ok_or(ChessError::NothingToUndo)?;
        let undo = self
            .undo_stack
            .pop()
            .ok_or(ChessError::NothingToUndo)?;
        self.position.undo_move(mv, &undo);
        self.status =
            movegen::terminal_status(&self.position, &movegen::legal_moves(&self.position));

        debug!(mv = %mv, ply = self.move_log.len(), "move undone");

        Ok(mv)
    }

    /// Reset to the standard starting position, discarding history.
    pub fn reset(&mut self) {
        *self = Game::new();
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
