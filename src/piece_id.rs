//!===================================================================
//! 駒番号
//!
//! 平手初期局面の 40 枚の駒それぞれに固定の番号を振る。
//! 番号は駒が取られて持駒になっても変わらない。
//!
//! 駒種の順序は玉、飛、角、金、銀、桂、香、歩。
//! 同じ駒種の中では、先手の盤上 (１筋から９筋、各筋の中では一段目から九段目)、
//! 後手の盤上 (先手の走査順を 180 度回したもの)、先手の持駒、後手の持駒の順に振る。
//!
//! 平手初期局面の場合:
//!
//!   * 金: ４九 (先手右)、６九 (先手左)、６一 (後手右)、４一 (後手左)
//!   * 歩: 先手は１筋から９筋、後手は (後手から見た) １筋から９筋
//!===================================================================

use arrayvec::ArrayVec;

use crate::position::{piece_limit, Position};
use crate::prelude::*;
use crate::trace::Location;
use crate::{Error, Result};

/// 駒番号の総数
pub const PIECE_ID_COUNT: usize = 40;

/// 番号を振る駒種の順序
pub const PIECE_ORDER: [Piece; 8] = [
    Piece::King,
    Piece::Rook,
    Piece::Bishop,
    Piece::Gold,
    Piece::Silver,
    Piece::Knight,
    Piece::Lance,
    Piece::Pawn,
];

/// 駒種ごとの番号の開始位置 (PIECE_ORDER と対応)
const PIECE_OFFSET: [usize; 8] = [0, 2, 4, 6, 10, 14, 18, 22];

fn order_index(pt: Piece) -> usize {
    match pt.to_raw() {
        Piece::King => 0,
        Piece::Rook => 1,
        Piece::Bishop => 2,
        Piece::Gold => 3,
        Piece::Silver => 4,
        Piece::Knight => 5,
        Piece::Lance => 6,
        _ => 7,
    }
}

/// 金銀桂香の左右。自陣から見た左右で、右は１筋側。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Wing {
    Right,
    Left,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct PieceId(u8);

impl PieceId {
    pub fn new(value: usize) -> Option<Self> {
        (value < PIECE_ID_COUNT).then(|| Self(value as u8))
    }

    pub fn get(&self) -> usize {
        self.0 as usize
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        (0..PIECE_ID_COUNT as u8).map(Self)
    }

    /// この番号が属する駒種 (ナマ駒) を返す。
    pub fn piece(&self) -> Piece {
        let i = PIECE_OFFSET
            .iter()
            .rposition(|&offset| offset <= self.get())
            .unwrap_or(0);
        PIECE_ORDER[i]
    }

    /// 平手初期局面でこの駒を持っている側を返す。
    pub fn home_side(&self) -> Side {
        let i = order_index(self.piece());
        let n_half = piece_limit(self.piece()) / 2;
        if self.get() - PIECE_OFFSET[i] < n_half {
            Side::Sente
        } else {
            Side::Gote
        }
    }

    pub fn king(side: Side) -> Self {
        Self::from_parts(Piece::King, side, 0)
    }

    pub fn rook(side: Side) -> Self {
        Self::from_parts(Piece::Rook, side, 0)
    }

    pub fn bishop(side: Side) -> Self {
        Self::from_parts(Piece::Bishop, side, 0)
    }

    pub fn gold(side: Side, wing: Wing) -> Self {
        Self::from_parts(Piece::Gold, side, wing as usize)
    }

    pub fn silver(side: Side, wing: Wing) -> Self {
        Self::from_parts(Piece::Silver, side, wing as usize)
    }

    pub fn knight(side: Side, wing: Wing) -> Self {
        Self::from_parts(Piece::Knight, side, wing as usize)
    }

    pub fn lance(side: Side, wing: Wing) -> Self {
        Self::from_parts(Piece::Lance, side, wing as usize)
    }

    /// side の (side から見て) file 筋の歩。
    pub fn pawn(side: Side, file: i32) -> Self {
        assert!((1..=9).contains(&file));
        Self::from_parts(Piece::Pawn, side, (file - 1) as usize)
    }

    fn from_parts(pt: Piece, side: Side, index: usize) -> Self {
        let i = order_index(pt);
        let n_half = piece_limit(pt) / 2;
        assert!(index < n_half);
        let side_offset = if side.is_sente() { 0 } else { n_half };
        Self((PIECE_OFFSET[i] + side_offset + index) as u8)
    }
}

impl std::fmt::Display for PieceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------------------------------------
// 駒番号表
//--------------------------------------------------------------------

/// マスまたは持駒の枠から駒番号を引く表。
///
/// 持駒は駒種ごとのスタックで、駒を打つときは最後に積んだ番号から使う。
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IdMap {
    board: [Option<PieceId>; 11 * 11],
    hands: [[ArrayVec<[PieceId; 18]>; 7]; 2],
}

impl IdMap {
    pub fn empty() -> Self {
        Self {
            board: [None; 11 * 11],
            hands: Default::default(),
        }
    }

    pub fn at(&self, sq: Sq) -> Option<PieceId> {
        self.board[sq.0 as usize]
    }

    /// side の持駒 pt の番号たちを積んだ順に返す。
    pub fn hand(&self, side: Side, pt: Piece) -> &[PieceId] {
        &self.hands[side][pt as usize]
    }

    pub(crate) fn set(&mut self, sq: Sq, id: Option<PieceId>) {
        self.board[sq.0 as usize] = id;
    }

    pub(crate) fn push_hand(&mut self, side: Side, pt: Piece, id: PieceId) {
        debug_assert!(pt.is_hand());
        self.hands[side][pt as usize].push(id);
    }

    pub(crate) fn pop_hand(&mut self, side: Side, pt: Piece) -> Option<PieceId> {
        self.hands[side][pt as usize].pop()
    }
}

/// 駒番号の割り当て結果。
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Assignment {
    pub map: IdMap,
    /// 番号ごとの初期位置。駒箱にある駒の番号は None。
    pub starts: [Option<Location>; PIECE_ID_COUNT],
}

/// 局面の全ての駒に番号を振る。
///
/// 駒種ごとに (振った枚数) + (駒箱の枚数) が総数と一致しなければエラー。
/// これは局面が壊れているか、このモジュールにバグがあることを意味する。
pub fn assign(pos: &Position) -> Result<Assignment> {
    let mut map = IdMap::empty();
    let mut starts = [None; PIECE_ID_COUNT];

    for (i, &pt) in PIECE_ORDER.iter().enumerate() {
        let on_board = |side: Side| {
            let order = Sq::iter_file_major().map(move |sq| sq.rel(side));
            order.filter(move |&sq| {
                pos.board()[sq]
                    .piece_of(side)
                    .map_or(false, |pt_sq| pt_sq.to_raw() == pt)
            })
        };
        let in_hand = |side: Side| {
            let n = if pt.is_hand() { pos.hand(side)[pt] } else { 0 };
            itertools::repeat_n(side, n as usize)
        };

        let locs: Vec<Location> = on_board(Side::Sente)
            .chain(on_board(Side::Gote))
            .map(Location::Board)
            .chain(
                in_hand(Side::Sente)
                    .chain(in_hand(Side::Gote))
                    .map(|side| Location::Hand(side, pt)),
            )
            .collect();

        let assigned = locs.len();
        let limit = piece_limit(pt);
        chk!(
            assigned + pos.piece_box_count(pt) == limit,
            Error::piece_count(pt, assigned, limit)
        );

        for (j, loc) in locs.into_iter().enumerate() {
            let id = PieceId((PIECE_OFFSET[i] + j) as u8);
            match loc {
                Location::Board(sq) => map.set(sq, Some(id)),
                Location::Hand(side, pt) => map.push_hand(side, pt, id),
            }
            starts[id.get()] = Some(loc);
        }
    }

    Ok(Assignment { map, starts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startpos() {
        let pos = Position::startpos();
        let asg = assign(&pos).unwrap();

        // 全ての番号が一度ずつ使われる
        assert!(asg.starts.iter().all(Option::is_some));
        let n_board = Sq::iter_valid().filter(|&sq| asg.map.at(sq).is_some()).count();
        assert_eq!(n_board, PIECE_ID_COUNT);

        let at = |file, rank| asg.map.at(Sq::from_file_rank(file, rank)).unwrap();

        assert_eq!(at(5, 9), PieceId::king(Side::Sente));
        assert_eq!(at(5, 1), PieceId::king(Side::Gote));
        assert_eq!(at(2, 8), PieceId::rook(Side::Sente));
        assert_eq!(at(8, 2), PieceId::rook(Side::Gote));
        assert_eq!(at(8, 8), PieceId::bishop(Side::Sente));
        assert_eq!(at(2, 2), PieceId::bishop(Side::Gote));

        assert_eq!(at(4, 9).get(), 6);
        assert_eq!(at(6, 9).get(), 7);
        assert_eq!(at(6, 1).get(), 8);
        assert_eq!(at(4, 1).get(), 9);
        assert_eq!(at(4, 9), PieceId::gold(Side::Sente, Wing::Right));
        assert_eq!(at(4, 1), PieceId::gold(Side::Gote, Wing::Left));
        assert_eq!(at(7, 9), PieceId::silver(Side::Sente, Wing::Left));
        assert_eq!(at(3, 1), PieceId::silver(Side::Gote, Wing::Left));
        assert_eq!(at(1, 9), PieceId::lance(Side::Sente, Wing::Right));
        assert_eq!(at(2, 1), PieceId::knight(Side::Gote, Wing::Left));

        assert_eq!(at(1, 7).get(), 22);
        assert_eq!(at(9, 7).get(), 30);
        assert_eq!(at(9, 3).get(), 31);
        assert_eq!(at(1, 3).get(), 39);
        assert_eq!(at(2, 7), PieceId::pawn(Side::Sente, 2));
        assert_eq!(at(8, 3), PieceId::pawn(Side::Gote, 2));
    }

    #[test]
    fn test_piece_side() {
        let counts: Vec<usize> = PIECE_ORDER
            .iter()
            .map(|&pt| PieceId::iter().filter(|id| id.piece() == pt).count())
            .collect();
        assert_eq!(counts, vec![2, 2, 2, 4, 4, 4, 4, 18]);

        for id in PieceId::iter() {
            let n_sente = PieceId::iter()
                .filter(|other| other.piece() == id.piece() && other.home_side().is_sente())
                .count();
            assert_eq!(n_sente * 2, piece_limit(id.piece()));
        }
        assert_eq!(PieceId::pawn(Side::Gote, 9).home_side(), Side::Gote);
        assert_eq!(PieceId::new(40), None);
    }

    #[test]
    fn test_hand_and_box() {
        // 駒落ちのように駒箱に駒がある局面は数が合う
        let pos = Position::from_sfen("sfen lnsgkgsnl/9/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL b - 1")
            .unwrap();
        let asg = assign(&pos).unwrap();
        assert_eq!(asg.starts[PieceId::rook(Side::Gote).get()], None);

        let pos = Position::from_sfen("sfen 4k4/9/9/9/9/9/9/9/4K4 b 2P 1").unwrap();
        let asg = assign(&pos).unwrap();
        assert_eq!(asg.map.hand(Side::Sente, Piece::Pawn).len(), 2);
        assert_eq!(
            asg.starts[22],
            Some(Location::Hand(Side::Sente, Piece::Pawn))
        );

        // 歩が 19 枚ある局面は不整合
        let pos = Position::from_sfen(
            "sfen lnsgkgsnl/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL b P 1",
        )
        .unwrap();
        match assign(&pos) {
            Err(Error::PieceCount {
                piece,
                assigned,
                limit,
            }) => {
                assert_eq!(piece, Piece::Pawn);
                assert_eq!(assigned, 19);
                assert_eq!(limit, 18);
            }
            res => panic!("unexpected: {:?}", res.map(|_| ())),
        }
    }
}
