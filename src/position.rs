use crate::prelude::*;
use crate::sfen;
use crate::{Error, Result};

/// 駒種ごとの総数。成駒はナマ駒として数える。
pub fn piece_limit(pt: Piece) -> usize {
    match pt.to_raw() {
        Piece::Pawn => 18,
        Piece::King | Piece::Rook | Piece::Bishop => 2,
        _ => 4,
    }
}

/// 局面 (手番、盤面、持駒、手数)。
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Position {
    side: Side,
    board: Board,
    hands: Hands,
    ply: i32,
}

impl Position {
    pub fn new(side: Side, board: Board, hands: Hands, ply: i32) -> Self {
        Self {
            side,
            board,
            hands,
            ply,
        }
    }

    /// 平手初期局面。
    pub fn startpos() -> Self {
        let mut board = Board::empty();

        for side in Side::iter() {
            let mut put = |file, rank, pt| {
                board[Sq::from_file_rank(file, rank).rel(side)] = Cell::Piece(side, pt);
            };
            for file in 1_i32..=9 {
                // 端から香桂銀金、中央に玉
                let back = match file.min(10 - file) {
                    1 => Piece::Lance,
                    2 => Piece::Knight,
                    3 => Piece::Silver,
                    4 => Piece::Gold,
                    _ => Piece::King,
                };
                put(file, 9, back);
                put(file, 7, Piece::Pawn);
            }
            put(8, 8, Piece::Bishop);
            put(2, 8, Piece::Rook);
        }

        Self::new(Side::Sente, board, Hands::default(), 1)
    }

    /// `sfen <盤面> <手番> <持駒> [手数]` または `startpos` を読む。
    pub fn from_sfen(s: &str) -> Result<Self> {
        sfen::parse_position(s)
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn hand(&self, side: Side) -> &Hand {
        &self.hands[side]
    }

    /// 次に指す手の手数。初期局面は 1 で、do_move() ごとに 1 増える。
    pub fn ply(&self) -> i32 {
        self.ply
    }

    /// 盤面と持駒の配置が平手初期局面と一致するかどうか。手番と手数は問わない。
    pub fn is_startpos_layout(&self) -> bool {
        let start = Self::startpos();
        self.board == start.board && self.hands == start.hands
    }

    /// 盤上にも駒台にもない pt (ナマ駒として数える) の枚数、すなわち駒箱の枚数。
    pub fn piece_box_count(&self, pt: Piece) -> usize {
        let pt = pt.to_raw();
        let on_board = Sq::iter_valid()
            .filter_map(|sq| self.board[sq].piece())
            .filter(|p| p.to_raw() == pt)
            .count();
        let in_hand: usize = if pt.is_hand() {
            self.hands.iter().map(|hand| usize::from(hand[pt])).sum()
        } else {
            0
        };

        piece_limit(pt).saturating_sub(on_board + in_hand)
    }

    pub fn king_sq(&self, side: Side) -> Option<Sq> {
        Sq::iter_valid().find(|&sq| self.board[sq].is_side_pt(side, Piece::King))
    }

    /// 指し手を適用して手番を渡す。
    ///
    /// 駒の動きや二歩などは見ない (movegen の仕事)。
    /// 盤面と持駒の整合が取れない手ならエラーを返し、局面は変更しない。
    pub fn do_move(&mut self, mv: &Move) -> Result<()> {
        let side = self.side;

        match *mv {
            Move::Walk { src, dst, promote } => {
                let pt = self.board[src]
                    .piece_of(side)
                    .ok_or_else(|| Error::illegal_move(mv, "no own piece on src"))?;
                let captured = match self.board[dst] {
                    Cell::Empty => None,
                    Cell::Piece(owner, pt_dst) if owner != side => Some(pt_dst.to_raw()),
                    _ => return Err(Error::illegal_move(mv, "dst is blocked")),
                };
                chk!(
                    captured != Some(Piece::King),
                    Error::illegal_move(mv, "capturing king")
                );
                let pt = if promote {
                    pt.to_promoted()
                        .ok_or_else(|| Error::illegal_move(mv, "cannot promote"))?
                } else {
                    pt
                };

                self.board[src] = Cell::Empty;
                self.board[dst] = Cell::Piece(side, pt);
                if let Some(pt) = captured {
                    self.hands[side][pt] += 1;
                }
            }
            Move::Drop { pt, dst } => {
                chk!(
                    pt.is_hand() && self.hands[side][pt] > 0,
                    Error::illegal_move(mv, "not in hand")
                );
                chk!(
                    self.board[dst].is_empty(),
                    Error::illegal_move(mv, "dst is not empty")
                );

                self.board[dst] = Cell::Piece(side, pt);
                self.hands[side][pt] -= 1;
            }
        }

        self.side = side.inv();
        self.ply += 1;

        Ok(())
    }
}
