//!===================================================================
//! 平手棋譜の戦型判定
//!
//! 平手初期局面から棋譜を 1 手ずつ再生し、駒ごとの移動軌跡を記録しながら
//! 戦型の分類木を辿っていく。
//!
//! 盤面は 9*9 の周囲に幅 1 の壁を付けた 11*11 の配列で、マスの値は 11*段 + (10-筋)。
//! 先手から見て上 (前) が -11、左 (９筋側) が -1 となる。
//!
//! 「相対マス」とは、指定した陣営から見たマスの意。後手の場合は盤面を 180 度回す。
//!===================================================================

#[macro_use]
mod util;

pub mod analyzer;
pub mod log;
pub mod movegen;
pub mod piece_id;
pub mod position;
pub mod predicate;
pub mod prelude;
pub mod pretty;
pub mod record;
pub mod sfen;
pub mod trace;
pub mod tree;

//--------------------------------------------------------------------
// エラー
//--------------------------------------------------------------------

/// 棋譜側の不正 (`IllegalMove` など) と、内部の整合性違反 (`PieceCount`) は
/// 別の種類として扱う。
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("illegal move: {1}: {0}")]
    IllegalMove(Move, String),

    #[error("piece count mismatch: {piece:?}: assigned {assigned}, limit {limit}")]
    PieceCount {
        piece: Piece,
        assigned: usize,
        limit: usize,
    },

    #[error("invalid sfen: {0}")]
    InvalidSfen(String),

    #[error("record parse error: {0}")]
    RecordParseError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn illegal_move(mv: &Move, msg: impl Into<String>) -> Self {
        Self::IllegalMove(mv.clone(), msg.into())
    }

    pub fn piece_count(piece: Piece, assigned: usize, limit: usize) -> Self {
        Self::PieceCount {
            piece,
            assigned,
            limit,
        }
    }

    pub fn invalid_sfen(msg: impl Into<String>) -> Self {
        Self::InvalidSfen(msg.into())
    }

    pub fn record_parse_error(msg: impl Into<String>) -> Self {
        Self::RecordParseError(msg.into())
    }

    /// 棋譜の内容ではなく、判定器自身の不整合を表すエラーかどうかを返す。
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::PieceCount { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//--------------------------------------------------------------------
// 陣営
//--------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Side {
    Sente,
    Gote,
}

impl Side {
    const BOTH: [Side; 2] = [Side::Sente, Side::Gote];

    /// 先手、後手の順に列挙する。
    pub fn iter() -> impl Iterator<Item = Self> {
        Self::BOTH.iter().copied()
    }

    pub fn is_sente(self) -> bool {
        self == Self::Sente
    }

    pub fn inv(self) -> Self {
        Self::BOTH[1 - self as usize]
    }
}

// [先手の値, 後手の値] という形の配列を Side で引く
impl<T> std::ops::Index<Side> for [T] {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        &self[side as usize]
    }
}

impl<T> std::ops::IndexMut<Side> for [T] {
    fn index_mut(&mut self, side: Side) -> &mut T {
        &mut self[side as usize]
    }
}

//--------------------------------------------------------------------
// マス
//--------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Sq(i32);

impl Sq {
    /// 壁を含む配列の大きさ。
    pub const ARRAY_LEN: usize = 11 * 11;

    pub fn from_file_rank(file: i32, rank: i32) -> Self {
        Self(11 * rank + 10 - file)
    }

    pub fn file(self) -> i32 {
        10 - self.0 % 11
    }

    pub fn rank(self) -> i32 {
        self.0 / 11
    }

    /// 将棋盤 (壁を除く 9*9) 内かどうかを返す。
    pub fn is_valid(self) -> bool {
        (0..Self::ARRAY_LEN as i32).contains(&self.0)
            && (1..=9).contains(&self.file())
            && (1..=9).contains(&self.rank())
    }

    /// 盤面を 180 度回したマス。
    pub fn inv(self) -> Self {
        Self(11 * 11 - 1 - self.0)
    }

    /// side から見た相対マス。
    pub fn rel(self, side: Side) -> Self {
        if side.is_sente() {
            self
        } else {
            self.inv()
        }
    }

    /// side から見た段。
    pub fn rel_rank(self, side: Side) -> i32 {
        self.rel(side).rank()
    }

    /// 盤内の全マスを一段目から順に列挙する。
    pub fn iter_valid() -> impl Iterator<Item = Self> {
        (1..=9).flat_map(|rank| (1..=9).rev().map(move |file| Self::from_file_rank(file, rank)))
    }

    /// 盤内の全マスを 1 筋から順に、各筋の中では一段目から列挙する。
    pub fn iter_file_major() -> impl Iterator<Item = Self> {
        (1..=9).flat_map(|file| (1..=9).map(move |rank| Self::from_file_rank(file, rank)))
    }
}

impl std::ops::Add<i32> for Sq {
    type Output = Self;

    fn add(self, d: i32) -> Self {
        Self(self.0 + d)
    }
}

//--------------------------------------------------------------------
// 駒種
//--------------------------------------------------------------------

// 先手から見た方向
const UP: i32 = -11;
const DOWN: i32 = 11;
const LEFT: i32 = -1;
const RIGHT: i32 = 1;

const DIRS_PAWN: &[i32] = &[UP];
const DIRS_KNIGHT: &[i32] = &[2 * UP + LEFT, 2 * UP + RIGHT];
const DIRS_SILVER: &[i32] = &[UP + LEFT, UP, UP + RIGHT, DOWN + LEFT, DOWN + RIGHT];
const DIRS_GOLD: &[i32] = &[UP + LEFT, UP, UP + RIGHT, LEFT, RIGHT, DOWN];
const DIRS_KING: &[i32] = &[
    UP + LEFT,
    UP,
    UP + RIGHT,
    LEFT,
    RIGHT,
    DOWN + LEFT,
    DOWN,
    DOWN + RIGHT,
];
const DIRS_ORTHO: &[i32] = &[UP, LEFT, RIGHT, DOWN];
const DIRS_DIAG: &[i32] = &[UP + LEFT, UP + RIGHT, DOWN + LEFT, DOWN + RIGHT];

/// 持駒になりうる 7 種が 0..7 に来るように並べてある。
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Piece {
    Pawn,
    Lance,
    Knight,
    Silver,
    Bishop,
    Rook,
    Gold,
    King,
    ProPawn,
    ProLance,
    ProKnight,
    ProSilver,
    Horse,
    Dragon,
}

impl Piece {
    /// 持駒の表示順。
    pub const HANDS: [Piece; 7] = [
        Piece::Rook,
        Piece::Bishop,
        Piece::Gold,
        Piece::Silver,
        Piece::Knight,
        Piece::Lance,
        Piece::Pawn,
    ];

    pub fn is_hand(self) -> bool {
        (self as usize) < 7
    }

    pub fn is_promoted(self) -> bool {
        self > Self::King
    }

    pub fn to_raw(self) -> Self {
        match self {
            Self::ProPawn => Self::Pawn,
            Self::ProLance => Self::Lance,
            Self::ProKnight => Self::Knight,
            Self::ProSilver => Self::Silver,
            Self::Horse => Self::Bishop,
            Self::Dragon => Self::Rook,
            pt => pt,
        }
    }

    /// 成れない駒 (金、玉、成駒) なら None。
    pub fn to_promoted(self) -> Option<Self> {
        let pt = match self {
            Self::Pawn => Self::ProPawn,
            Self::Lance => Self::ProLance,
            Self::Knight => Self::ProKnight,
            Self::Silver => Self::ProSilver,
            Self::Bishop => Self::Horse,
            Self::Rook => Self::Dragon,
            _ => return None,
        };
        Some(pt)
    }

    /// 1 マスだけ進める方向 (桂を含む)。
    pub fn steps(self, side: Side) -> impl Iterator<Item = i32> {
        let dirs = match self {
            Self::Pawn => DIRS_PAWN,
            Self::Knight => DIRS_KNIGHT,
            Self::Silver => DIRS_SILVER,
            Self::Gold | Self::ProPawn | Self::ProLance | Self::ProKnight | Self::ProSilver => {
                DIRS_GOLD
            }
            Self::King => DIRS_KING,
            Self::Horse => DIRS_ORTHO,
            Self::Dragon => DIRS_DIAG,
            Self::Lance | Self::Bishop | Self::Rook => &[],
        };
        orient(dirs, side)
    }

    /// 駒に当たるまで何マスでも進める方向。
    pub fn slides(self, side: Side) -> impl Iterator<Item = i32> {
        let dirs = match self {
            Self::Lance => DIRS_PAWN,
            Self::Bishop | Self::Horse => DIRS_DIAG,
            Self::Rook | Self::Dragon => DIRS_ORTHO,
            _ => &[],
        };
        orient(dirs, side)
    }
}

/// 先手から見た方向を side から見た方向に直す。
fn orient(dirs: &'static [i32], side: Side) -> impl Iterator<Item = i32> {
    let sgn = if side.is_sente() { 1 } else { -1 };
    dirs.iter().map(move |&d| sgn * d)
}

//--------------------------------------------------------------------
// 指し手
//--------------------------------------------------------------------

/// 棋譜の 1 手。合法性はここでは保証しない。
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Move {
    Walk { src: Sq, dst: Sq, promote: bool },
    Drop { pt: Piece, dst: Sq },
}

impl Move {
    pub fn walk(src: Sq, dst: Sq, promote: bool) -> Self {
        Self::Walk { src, dst, promote }
    }

    pub fn drop(pt: Piece, dst: Sq) -> Self {
        Self::Drop { pt, dst }
    }

    /// USI 形式 (`7g7f`, `8h2b+`, `P*5e`) の 1 手を読む。
    pub fn from_sfen(s: &str) -> Result<Self> {
        sfen::parse_move(s)
    }

    /// 駒を動かす手なら移動元を返す。
    pub fn src(&self) -> Option<Sq> {
        match *self {
            Self::Walk { src, .. } => Some(src),
            Self::Drop { .. } => None,
        }
    }

    pub fn dst(&self) -> Sq {
        match *self {
            Self::Walk { dst, .. } | Self::Drop { dst, .. } => dst,
        }
    }

    /// 駒を打つ手なら打つ駒種を返す。
    pub fn dropped(&self) -> Option<Piece> {
        match *self {
            Self::Walk { .. } => None,
            Self::Drop { pt, .. } => Some(pt),
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&sfen::move_to_sfen(self))
    }
}

//--------------------------------------------------------------------
// 盤面
//--------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Cell {
    Wall,
    Empty,
    Piece(Side, Piece),
}

impl Cell {
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }

    pub fn is_wall(self) -> bool {
        self == Self::Wall
    }

    pub fn is_piece(self) -> bool {
        matches!(self, Self::Piece(..))
    }

    pub fn piece(self) -> Option<Piece> {
        match self {
            Self::Piece(_, pt) => Some(pt),
            _ => None,
        }
    }

    /// side の駒ならその駒種を返す。
    pub fn piece_of(self, side: Side) -> Option<Piece> {
        match self {
            Self::Piece(owner, pt) if owner == side => Some(pt),
            _ => None,
        }
    }

    pub fn is_side(self, side: Side) -> bool {
        self.piece_of(side).is_some()
    }

    pub fn is_side_pt(self, side: Side, pt: Piece) -> bool {
        self == Self::Piece(side, pt)
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Board([Cell; Sq::ARRAY_LEN]);

impl Board {
    /// 駒のない盤面。
    pub fn empty() -> Self {
        Self(array_init::array_init(|i| {
            if Sq(i as i32).is_valid() {
                Cell::Empty
            } else {
                Cell::Wall
            }
        }))
    }
}

impl std::ops::Index<Sq> for Board {
    type Output = Cell;

    fn index(&self, sq: Sq) -> &Cell {
        &self.0[sq.0 as usize]
    }
}

impl std::ops::IndexMut<Sq> for Board {
    fn index_mut(&mut self, sq: Sq) -> &mut Cell {
        &mut self.0[sq.0 as usize]
    }
}

//--------------------------------------------------------------------
// 持駒
//--------------------------------------------------------------------

/// 片方の陣営の持駒。持駒になりうる駒種だけで引ける。
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Hand([u8; 7]);

impl Hand {
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&n| n == 0)
    }
}

impl std::ops::Index<Piece> for Hand {
    type Output = u8;

    fn index(&self, pt: Piece) -> &u8 {
        debug_assert!(pt.is_hand());
        &self.0[pt as usize]
    }
}

impl std::ops::IndexMut<Piece> for Hand {
    fn index_mut(&mut self, pt: Piece) -> &mut u8 {
        debug_assert!(pt.is_hand());
        &mut self.0[pt as usize]
    }
}

/// 先手と後手の持駒。hands[side][pt] で枚数を引く。
pub type Hands = [Hand; 2];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sq() {
        let sq = Sq::from_file_rank(7, 6);
        assert_eq!(sq.file(), 7);
        assert_eq!(sq.rank(), 6);
        assert!(sq.is_valid());
        assert!(!Sq::from_file_rank(0, 6).is_valid());
        assert!(!Sq::from_file_rank(7, 10).is_valid());

        // ７六 <-> ３四
        assert_eq!(sq.inv(), Sq::from_file_rank(3, 4));
        assert_eq!(sq.rel(Side::Gote), Sq::from_file_rank(3, 4));
        assert_eq!(sq.rel(Side::Sente), sq);
        assert_eq!(sq.rel_rank(Side::Gote), 4);

        assert_eq!(sq + UP, Sq::from_file_rank(7, 5));
        assert_eq!(sq + LEFT, Sq::from_file_rank(8, 6));
    }

    #[test]
    fn test_sq_iter() {
        let sqs: Vec<_> = Sq::iter_file_major().collect();
        assert_eq!(sqs.len(), 81);
        assert_eq!(sqs[0], Sq::from_file_rank(1, 1));
        assert_eq!(sqs[1], Sq::from_file_rank(1, 2));
        assert_eq!(sqs[9], Sq::from_file_rank(2, 1));
        assert_eq!(sqs[80], Sq::from_file_rank(9, 9));

        assert_eq!(Sq::iter_valid().count(), 81);
        assert!(Sq::iter_valid().all(Sq::is_valid));
    }

    #[test]
    fn test_piece_dirs() {
        // 後手の桂は先手から見て下に跳ぶ
        let knight: Vec<_> = Piece::Knight.steps(Side::Gote).collect();
        assert_eq!(knight, vec![2 * DOWN + RIGHT, 2 * DOWN + LEFT]);

        // 金は斜め後ろに動けない
        assert!(!Piece::Gold.steps(Side::Sente).any(|d| d == DOWN + LEFT));
        assert_eq!(Piece::Horse.steps(Side::Sente).count(), 4);
        assert_eq!(Piece::Horse.slides(Side::Sente).count(), 4);
        assert_eq!(Piece::King.slides(Side::Sente).count(), 0);

        assert_eq!(Piece::ProSilver.to_raw(), Piece::Silver);
        assert_eq!(Piece::Gold.to_promoted(), None);
        assert!(Piece::Dragon.is_promoted());
        assert!(!Piece::King.is_promoted());
        assert!(Piece::HANDS.iter().all(|pt| pt.is_hand()));
    }

    #[test]
    fn test_error_kind() {
        let mv = Move::walk(Sq::from_file_rank(7, 7), Sq::from_file_rank(7, 6), false);
        assert!(!Error::illegal_move(&mv, "test").is_internal());
        assert!(Error::piece_count(Piece::Pawn, 19, 18).is_internal());
    }
}
