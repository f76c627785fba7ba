//! Core chess engine: board representation, move generation, game state.

pub mod board;
pub mod game;
pub mod movegen;
pub mod types;

pub use board::{Position, UndoInfo};
pub use game::Game;
pub use movegen::{is_in_check, legal_moves, legal_moves_from, pseudo_legal_moves, terminal_status};
pub use types::{CastlingRights, ChessError, Color, GameStatus, Move, MoveKind, PieceType, Square};
