use std::borrow::Cow;

use itertools::Itertools;

use crate::analyzer::Classification;
use crate::piece_id::PieceId;
use crate::prelude::*;
use crate::trace::{Location, Tracker, Trajectory};
use crate::tree::Node;

pub trait Pretty {
    fn pretty(&self) -> Cow<'static, str>;
}

impl Pretty for Side {
    fn pretty(&self) -> Cow<'static, str> {
        match self {
            Side::Sente => "先手".into(),
            Side::Gote => "後手".into(),
        }
    }
}

impl Pretty for Sq {
    /// ```
    /// # use senkei::prelude::*;
    /// assert_eq!(Sq::from_file_rank(7, 6).pretty(), "７六");
    /// assert_eq!(Sq::from_file_rank(1, 9).pretty(), "１九");
    /// ```
    fn pretty(&self) -> Cow<'static, str> {
        const FILES: [char; 9] = ['１', '２', '３', '４', '５', '６', '７', '８', '９'];
        const RANKS: [char; 9] = ['一', '二', '三', '四', '五', '六', '七', '八', '九'];

        debug_assert!(self.is_valid());
        let file = FILES[(self.file() - 1) as usize];
        let rank = RANKS[(self.rank() - 1) as usize];
        format!("{}{}", file, rank).into()
    }
}

impl Pretty for Piece {
    fn pretty(&self) -> Cow<'static, str> {
        // 列挙子の並び順
        const NAMES: [&str; 14] = [
            "歩", "香", "桂", "銀", "角", "飛", "金", "玉", "と", "杏", "圭", "全", "馬", "龍",
        ];
        NAMES[*self as usize].into()
    }
}

impl Pretty for Move {
    /// ```
    /// # use senkei::prelude::*;
    /// let sq = Sq::from_file_rank;
    /// assert_eq!(Move::walk(sq(7, 7), sq(7, 6), false).pretty(), "７七７六");
    /// assert_eq!(Move::walk(sq(2, 8), sq(2, 3), true).pretty(), "２八２三成");
    /// assert_eq!(Move::drop(Piece::Gold, sq(4, 1)).pretty(), "４一金打");
    /// ```
    fn pretty(&self) -> Cow<'static, str> {
        let s = match *self {
            Self::Walk { src, dst, promote } => format!(
                "{}{}{}",
                src.pretty(),
                dst.pretty(),
                if promote { "成" } else { "" }
            ),
            Self::Drop { pt, dst } => format!("{}{}打", dst.pretty(), pt.pretty()),
        };
        s.into()
    }
}

impl Pretty for Cell {
    fn pretty(&self) -> Cow<'static, str> {
        match *self {
            Self::Piece(Side::Sente, pt) => format!(" {}", pt.pretty()).into(),
            Self::Piece(Side::Gote, pt) => format!("v{}", pt.pretty()).into(),
            Self::Empty => " ・".into(),
            Self::Wall => " 壁".into(),
        }
    }
}

impl Pretty for Board {
    /// 後手側 (一段目) から順に、各段を９筋から並べる。
    fn pretty(&self) -> Cow<'static, str> {
        (1..=9)
            .map(|rank| {
                (1..=9)
                    .rev()
                    .map(|file| self[Sq::from_file_rank(file, rank)].pretty())
                    .join("")
            })
            .map(|row| row + "\n")
            .collect::<String>()
            .into()
    }
}

impl Pretty for Hand {
    /// ```
    /// # use senkei::prelude::*;
    /// let mut hand = Hand::default();
    /// assert_eq!(hand.pretty(), "なし");
    /// hand[Piece::Pawn] = 3;
    /// hand[Piece::Bishop] = 1;
    /// assert_eq!(hand.pretty(), "角 歩3");
    /// ```
    fn pretty(&self) -> Cow<'static, str> {
        if self.is_empty() {
            return "なし".into();
        }

        Piece::HANDS
            .iter()
            .filter(|&&pt| self[pt] > 0)
            .map(|&pt| match self[pt] {
                1 => pt.pretty().into_owned(),
                n => format!("{}{}", pt.pretty(), n),
            })
            .join(" ")
            .into()
    }
}

impl Pretty for Position {
    fn pretty(&self) -> Cow<'static, str> {
        format!(
            "{}手目 {}番\n後手持駒: {}\n{}先手持駒: {}\n",
            self.ply(),
            self.side().pretty(),
            self.hand(Side::Gote).pretty(),
            self.board().pretty(),
            self.hand(Side::Sente).pretty(),
        )
        .into()
    }
}

impl Pretty for PieceId {
    /// ```
    /// # use senkei::prelude::*;
    /// # use senkei::piece_id::PieceId;
    /// assert_eq!(PieceId::rook(Side::Gote).pretty(), "後手飛#3");
    /// ```
    fn pretty(&self) -> Cow<'static, str> {
        format!("{}{}{}", self.home_side().pretty(), self.piece().pretty(), self).into()
    }
}

impl Pretty for Location {
    /// ```
    /// # use senkei::prelude::*;
    /// # use senkei::trace::Location;
    /// assert_eq!(Location::Board(Sq::from_file_rank(7, 6)).pretty(), "７六");
    /// assert_eq!(Location::Hand(Side::Gote, Piece::Bishop).pretty(), "後手持駒角");
    /// ```
    fn pretty(&self) -> Cow<'static, str> {
        match self {
            Self::Board(sq) => sq.pretty(),
            Self::Hand(side, pt) => format!("{}持駒{}", side.pretty(), pt.pretty()).into(),
        }
    }
}

impl Pretty for Trajectory {
    fn pretty(&self) -> Cow<'static, str> {
        self.steps()
            .iter()
            .map(|step| format!("{}({})", step.loc.pretty(), step.ply))
            .join(" ")
            .into()
    }
}

impl Pretty for Tracker {
    fn pretty(&self) -> Cow<'static, str> {
        use std::fmt::Write;

        let mut res = String::new();

        write!(res, "{}", self.position().pretty()).unwrap();

        let info = self.info();
        for side in Side::iter() {
            let fmt_ply = |ply: Option<i32>| ply.map_or_else(|| "-".to_owned(), |ply| ply.to_string());
            writeln!(
                res,
                "{}: 角道を開けた手数={} 止めた手数={}",
                side.pretty(),
                fmt_ply(info.open_ply(side)),
                fmt_ply(info.close_ply(side))
            )
            .unwrap();
        }

        for (id, traj) in self.trajectories() {
            writeln!(res, "{}: {}", id.pretty(), traj.pretty()).unwrap();
        }

        res.into()
    }
}

impl Pretty for Node {
    fn pretty(&self) -> Cow<'static, str> {
        format!("{} ({}) [{}]", self.name_ja(), self.name(), self.kind()).into()
    }
}

impl Pretty for Classification {
    fn pretty(&self) -> Cow<'static, str> {
        let mut res = format!("{} ({}手目)", self.label_ja(), self.ply);
        if let Some(i) = self.stopped_at {
            res.push_str(&format!(" 違法手により {} 手目で中断", i + 1));
        }
        res.into()
    }
}
