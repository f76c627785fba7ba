//! Board representation and move application.
//!
//! `Position` stores piece placement as a flat 64-entry array of squares
//! (LERF mapping: a1 = 0, b1 = 1, … h8 = 63), side to move, castling rights,
//! en-passant target square, and move counters. It is a plain value: `Clone`
//! for snapshots, structural `PartialEq` for replay verification.

use crate::engine::types::{CastlingRights, ChessError, Color, Move, MoveKind, PieceType, Square};

/// A piece on a square: its colour and kind.
pub type Piece = (Color, PieceType);

// ---------------------------------------------------------------------------
// Direction tables (file delta, rank delta)
// ---------------------------------------------------------------------------

pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

pub(crate) const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

pub(crate) const ROOK_DIRS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

pub(crate) const BISHOP_DIRS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

// ---------------------------------------------------------------------------
// UndoInfo — saved state for reversing a move
// ---------------------------------------------------------------------------

/// State that cannot be recomputed from the move record alone and must be
/// saved before making a move so it can be restored on undo. The captured
/// piece itself travels inside the `Move`.
#[derive(Clone, Copy, Debug)]
pub struct UndoInfo {
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u16,
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A complete chess position.
///
/// Invariant during legal play: exactly one king per colour is present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    /// Flat board: `squares[sq.index()]` is the piece on that square, if any.
    pub squares: [Option<Piece>; 64],

    /// Whose turn it is.
    pub side_to_move: Color,

    /// Castling availability (K/Q/k/q).
    pub castling_rights: CastlingRights,

    /// En-passant target square (the square *behind* the double-pushed pawn).
    /// Set only on the ply immediately following the double push.
    pub en_passant: Option<Square>,

    /// Half-move clock (reset on pawn move or capture).
    pub halfmove_clock: u16,

    /// Full-move number (starts at 1, incremented after Black moves).
    pub fullmove_number: u16,
}

impl Position {
    /// Create an empty board with no pieces.
    pub fn empty() -> Self {
        Position {
            squares: [None; 64],
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Standard starting position.
    pub fn starting() -> Self {
        Self::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .expect("starting FEN is always valid")
    }

    // -----------------------------------------------------------------------
    // Piece manipulation
    // -----------------------------------------------------------------------

    #[inline]
    pub fn put_piece(&mut self, sq: Square, color: Color, piece: PieceType) {
        self.squares[sq.index()] = Some((color, piece));
    }

    #[inline]
    pub fn remove_piece(&mut self, sq: Square) {
        self.squares[sq.index()] = None;
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// What piece (if any) is on a given square?
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    /// Find the king square for the given colour.
    pub fn king_sq(&self, color: Color) -> Square {
        for idx in 0..64u8 {
            if self.squares[idx as usize] == Some((color, PieceType::King)) {
                return Square(idx);
            }
        }
        panic!("no {color} king on the board:\n{}", self.board_string());
    }

    // -----------------------------------------------------------------------
    // Attack detection
    // -----------------------------------------------------------------------

    /// Is `sq` attacked by any piece of colour `by`?
    ///
    /// Works outward from the target square: leaper offsets for knights,
    /// kings, and pawns, then rays for sliders stopping at the first piece.
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        let file = sq.file() as i8;
        let rank = sq.rank() as i8;

        // Pawns: a pawn of `by` sits one rank short of `sq` on an adjacent
        // file (reverse of its own attack direction).
        let pawn_rank = rank - by.forward();
        for df in [-1i8, 1] {
            if let Some(from) = Square::try_from_file_rank(file + df, pawn_rank) {
                if self.piece_at(from) == Some((by, PieceType::Pawn)) {
                    return true;
                }
            }
        }

        // Knights.
        for &(df, dr) in &KNIGHT_OFFSETS {
            if let Some(from) = Square::try_from_file_rank(file + df, rank + dr) {
                if self.piece_at(from) == Some((by, PieceType::Knight)) {
                    return true;
                }
            }
        }

        // Adjacent enemy king.
        for &(df, dr) in &KING_OFFSETS {
            if let Some(from) = Square::try_from_file_rank(file + df, rank + dr) {
                if self.piece_at(from) == Some((by, PieceType::King)) {
                    return true;
                }
            }
        }

        // Rook / Queen along ranks and files.
        if self.ray_hits(file, rank, &ROOK_DIRS, by, PieceType::Rook) {
            return true;
        }

        // Bishop / Queen along diagonals.
        if self.ray_hits(file, rank, &BISHOP_DIRS, by, PieceType::Bishop) {
            return true;
        }

        false
    }

    /// Walk each ray in `dirs`; true if the first piece met is a `by` slider
    /// of type `slider` or a `by` queen.
    fn ray_hits(&self, file: i8, rank: i8, dirs: &[(i8, i8)], by: Color, slider: PieceType) -> bool {
        for &(df, dr) in dirs {
            let mut f = file + df;
            let mut r = rank + dr;
            while let Some(from) = Square::try_from_file_rank(f, r) {
                if let Some((color, pt)) = self.piece_at(from) {
                    if color == by && (pt == slider || pt == PieceType::Queen) {
                        return true;
                    }
                    break; // any piece blocks the ray
                }
                f += df;
                r += dr;
            }
        }
        false
    }

    /// Is `color`'s king currently attacked?
    #[inline]
    pub fn in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king_sq(color), !color)
    }

    // -----------------------------------------------------------------------
    // Make / Undo move
    // -----------------------------------------------------------------------

    /// Apply a move to the position. Returns `UndoInfo` for reversal.
    ///
    /// The caller is responsible for ensuring the move is legal (the mover's
    /// king is not left in check); the legality filter in `movegen` relies on
    /// being able to make and then undo pseudo-legal moves.
    pub fn make_move(&mut self, mv: Move) -> UndoInfo {
        let us = self.side_to_move;
        let them = !us;

        let undo = UndoInfo {
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
        };

        // En passant is only available for the single reply ply.
        self.en_passant = None;

        // The en-passant victim is not on the destination square.
        if mv.kind == MoveKind::EnPassant {
            self.remove_piece(ep_victim_square(mv.to, us));
        }

        // Move the piece; a normal capture is overwritten implicitly.
        self.remove_piece(mv.from);
        let landing = match mv.kind {
            MoveKind::Promotion(promo) => promo,
            _ => mv.piece,
        };
        self.put_piece(mv.to, us, landing);

        // Castling also moves the rook.
        match mv.kind {
            MoveKind::CastleKingside | MoveKind::CastleQueenside => {
                let (rook_from, rook_to) = castling_rook_squares(mv.to);
                self.remove_piece(rook_from);
                self.put_piece(rook_to, us, PieceType::Rook);
            }
            _ => {}
        }

        // Revoke castling rights when a king or rook moves, or a rook's home
        // square is captured.
        self.castling_rights.0 &= CASTLING_MASK[mv.from.index()];
        self.castling_rights.0 &= CASTLING_MASK[mv.to.index()];

        // Double pawn push exposes an en-passant target behind the pawn.
        if mv.piece == PieceType::Pawn && (mv.to.rank() as i8 - mv.from.rank() as i8).abs() == 2 {
            self.en_passant = Some(Square((mv.from.0 + mv.to.0) / 2));
        }

        if mv.piece == PieceType::Pawn || mv.captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }

        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.side_to_move = them;

        undo
    }

    /// Reverse a move previously applied with `make_move`. Restores board
    /// contents, captured piece, castling rights, and en-passant target
    /// exactly as they were before the move.
    pub fn undo_move(&mut self, mv: Move, undo: &UndoInfo) {
        let them = self.side_to_move; // side was switched by make_move
        let us = !them;
        self.side_to_move = us;

        // Put the mover back; a promoted pawn reverts to a pawn via mv.piece.
        self.remove_piece(mv.to);
        self.put_piece(mv.from, us, mv.piece);

        // Restore whatever was captured.
        match mv.kind {
            MoveKind::EnPassant => {
                self.put_piece(ep_victim_square(mv.to, us), them, PieceType::Pawn);
            }
            _ => {
                if let Some(captured) = mv.captured {
                    self.put_piece(mv.to, them, captured);
                }
            }
        }

        // Walk the rook back for castles.
        match mv.kind {
            MoveKind::CastleKingside | MoveKind::CastleQueenside => {
                let (rook_from, rook_to) = castling_rook_squares(mv.to);
                self.remove_piece(rook_to);
                self.put_piece(rook_from, us, PieceType::Rook);
            }
            _ => {}
        }

        self.castling_rights = undo.castling_rights;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;

        if us == Color::Black {
            self.fullmove_number -= 1;
        }
    }

    // -----------------------------------------------------------------------
    // Candidate move construction
    // -----------------------------------------------------------------------

    /// Build a candidate `Move` from two squares, deriving the piece moved,
    /// the piece captured, and the special-move kind from the current board —
    /// exactly what a presentation layer needs to turn two clicks into a move
    /// it can match against `legal_moves`.
    ///
    /// `promotion` selects the promotion piece when the move reaches the last
    /// rank; it defaults to queen and is ignored for non-promoting moves.
    /// This performs only structural checks — legality is confirmed by
    /// membership in the legal-move set.
    pub fn move_from_coords(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    ) -> Result<Move, ChessError> {
        let (color, piece) = self.piece_at(from).ok_or_else(|| ChessError::InvalidMove {
            from: from.to_algebraic(),
            to: to.to_algebraic(),
            reason: "no piece on the start square".into(),
        })?;

        if color != self.side_to_move {
            return Err(ChessError::InvalidMove {
                from: from.to_algebraic(),
                to: to.to_algebraic(),
                reason: format!("it is {}'s turn", self.side_to_move),
            });
        }

        let captured = match self.piece_at(to) {
            Some((c, _)) if c == color => {
                return Err(ChessError::InvalidMove {
                    from: from.to_algebraic(),
                    to: to.to_algebraic(),
                    reason: "destination occupied by own piece".into(),
                });
            }
            Some((_, pt)) => Some(pt),
            None => None,
        };

        let file_delta = to.file() as i8 - from.file() as i8;
        let last_rank = match color {
            Color::White => 7,
            Color::Black => 0,
        };

        let (kind, captured) = if piece == PieceType::King && file_delta.abs() == 2 {
            let kind = if file_delta > 0 {
                MoveKind::CastleKingside
            } else {
                MoveKind::CastleQueenside
            };
            (kind, None)
        } else if piece == PieceType::Pawn && file_delta != 0 && self.en_passant == Some(to) {
            (MoveKind::EnPassant, Some(PieceType::Pawn))
        } else if piece == PieceType::Pawn && to.rank() == last_rank {
            let promo = promotion.unwrap_or(PieceType::Queen);
            (MoveKind::Promotion(promo), captured)
        } else {
            (MoveKind::Normal, captured)
        };

        Ok(Move::with_kind(from, to, piece, captured, kind))
    }

    // -----------------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top), useful for
    /// debugging and logging.
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for rank in (0..8).rev() {
            s.push((b'1' + rank) as char);
            s.push(' ');
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                let ch = match self.piece_at(sq) {
                    Some((c, p)) => p.to_char(c),
                    None => '.',
                };
                s.push(ch);
                if file < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

// ---------------------------------------------------------------------------
// Castling helpers
// ---------------------------------------------------------------------------

/// For a king-destination square (after castling), return (rook_from, rook_to).
fn castling_rook_squares(king_to: Square) -> (Square, Square) {
    match king_to.0 {
        // White kingside: king e1→g1, rook h1→f1.
        6 => (Square(7), Square(5)),
        // White queenside: king e1→c1, rook a1→d1.
        2 => (Square(0), Square(3)),
        // Black kingside: king e8→g8, rook h8→f8.
        62 => (Square(63), Square(61)),
        // Black queenside: king e8→c8, rook a8→d8.
        58 => (Square(56), Square(59)),
        _ => panic!("invalid castling king destination: {king_to}"),
    }
}

/// Square of the pawn removed by an en-passant capture: directly behind the
/// capture square from the mover's point of view.
#[inline]
fn ep_victim_square(to: Square, us: Color) -> Square {
    Square((to.0 as i8 - 8 * us.forward()) as u8)
}

/// Mask table indexed by square. When a move touches a square, AND the
/// castling rights with this mask: a rook leaving (or being captured on) its
/// home square drops that side's right, the king's home square drops both.
#[rustfmt::skip]
const CASTLING_MASK: [u8; 64] = {
    let mut mask = [0b1111u8; 64];
    mask[0]  = 0b1111 & !CastlingRights::WHITE_QUEENSIDE;
    mask[4]  = 0b1111 & !(CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE);
    mask[7]  = 0b1111 & !CastlingRights::WHITE_KINGSIDE;
    mask[56] = 0b1111 & !CastlingRights::BLACK_QUEENSIDE;
    mask[60] = 0b1111 & !(CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE);
    mask[63] = 0b1111 & !CastlingRights::BLACK_KINGSIDE;
    mask
};

// ---------------------------------------------------------------------------
// FEN parsing & generation
// ---------------------------------------------------------------------------

impl Position {
    /// Parse a FEN string into a `Position`.
    ///
    /// Validates all 6 fields (piece placement, side to move, castling,
    /// en passant, halfmove clock, fullmove number) and ensures exactly one
    /// king per side.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(ChessError::InvalidFen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        let mut pos = Position::empty();

        // ----- Field 1: Piece placement -----
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::InvalidFen(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as u8; // FEN starts from rank 8
            let mut file: u8 = 0;
            for ch in rank_str.chars() {
                if file > 7 {
                    return Err(ChessError::InvalidFen(format!(
                        "too many squares in rank {}",
                        rank + 1
                    )));
                }
                if let Some(digit) = ch.to_digit(10) {
                    if !(1..=8).contains(&digit) {
                        return Err(ChessError::InvalidFen(format!(
                            "invalid empty count '{ch}' in rank {}",
                            rank + 1
                        )));
                    }
                    file += digit as u8;
                } else if let Some((color, piece)) = PieceType::from_char(ch) {
                    pos.put_piece(Square::from_file_rank(file, rank), color, piece);
                    file += 1;
                } else {
                    return Err(ChessError::InvalidFen(format!(
                        "invalid character '{ch}' in piece placement"
                    )));
                }
            }
            if file != 8 {
                return Err(ChessError::InvalidFen(format!(
                    "rank {} has {} squares instead of 8",
                    rank + 1,
                    file
                )));
            }
        }

        // Exactly one king per side.
        for color in [Color::White, Color::Black] {
            let king_count = pos
                .squares
                .iter()
                .filter(|&&p| p == Some((color, PieceType::King)))
                .count();
            if king_count != 1 {
                return Err(ChessError::InvalidFen(format!(
                    "{color} has {king_count} kings (expected 1)"
                )));
            }
        }

        // ----- Field 2: Side to move -----
        pos.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(ChessError::InvalidFen(format!(
                    "invalid side to move: '{other}'"
                )));
            }
        };

        // ----- Field 3: Castling availability -----
        pos.castling_rights = CastlingRights::from_fen(fields[2]).ok_or_else(|| {
            ChessError::InvalidFen(format!("invalid castling string: '{}'", fields[2]))
        })?;

        // ----- Field 4: En passant target square -----
        if fields[3] != "-" {
            let ep_sq = Square::from_algebraic(fields[3]).ok_or_else(|| {
                ChessError::InvalidFen(format!("invalid en passant square: '{}'", fields[3]))
            })?;
            // Must be on rank 3 (after a White push) or rank 6 (after Black's).
            let rank = ep_sq.rank();
            if rank != 2 && rank != 5 {
                return Err(ChessError::InvalidFen(format!(
                    "en passant square {} is not on rank 3 or 6",
                    fields[3]
                )));
            }
            pos.en_passant = Some(ep_sq);
        }

        // ----- Field 5: Halfmove clock -----
        pos.halfmove_clock = fields[4].parse::<u16>().map_err(|_| {
            ChessError::InvalidFen(format!("invalid halfmove clock: '{}'", fields[4]))
        })?;

        // ----- Field 6: Fullmove number -----
        pos.fullmove_number = fields[5].parse::<u16>().map_err(|_| {
            ChessError::InvalidFen(format!("invalid fullmove number: '{}'", fields[5]))
        })?;
        if pos.fullmove_number == 0 {
            return Err(ChessError::InvalidFen(
                "fullmove number must be >= 1".to_string(),
            ));
        }

        Ok(pos)
    }

    /// Export the position as a FEN string.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(80);

        for rank in (0..8).rev() {
            let mut empty_count = 0u8;
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empty_count > 0 {
                            fen.push((b'0' + empty_count) as char);
                            empty_count = 0;
                        }
                        fen.push(piece.to_char(color));
                    }
                    None => {
                        empty_count += 1;
                    }
                }
            }
            if empty_count > 0 {
                fen.push((b'0' + empty_count) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        fen.push_str(&self.castling_rights.to_fen());

        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_algebraic()),
            None => fen.push('-'),
        }

        fen.push(' ');
        fen.push_str(&self.halfmove_clock.to_string());

        fen.push(' ');
        fen.push_str(&self.fullmove_number.to_string());

        fen
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
