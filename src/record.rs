//!===================================================================
//! 棋譜
//!
//! 平手初期局面 (先手番) から始まる指し手リスト。1 行 1 棋譜で、以下の形式を受け付ける:
//!
//!   * `startpos moves 7g7f 3c3d ...` (先頭の `position` は省略可能)
//!   * `sfen <平手初期局面> moves ...`
//!   * 指し手だけを並べたもの (`7g7f 3c3d ...`)
//!
//! 指し手の合法性はここでは判定しない。
//!===================================================================

use std::path::Path;

use itertools::Itertools;

use crate::prelude::*;
use crate::sfen;
use crate::{Error, Result};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Record {
    mvs: Vec<Move>,
}

impl Record {
    pub fn new(mvs: Vec<Move>) -> Self {
        Self { mvs }
    }

    pub fn moves(&self) -> &[Move] {
        &self.mvs
    }

    pub fn len(&self) -> usize {
        self.mvs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mvs.is_empty()
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.mvs.is_empty() {
            write!(f, "startpos")
        } else {
            write!(f, "startpos moves {}", self.mvs.iter().join(" "))
        }
    }
}

impl std::str::FromStr for Record {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let magic = s
            .split_ascii_whitespace()
            .next()
            .ok_or_else(|| Error::record_parse_error("empty record"))?;

        if !matches!(magic, "position" | "startpos" | "sfen") {
            let mvs = s
                .split_ascii_whitespace()
                .map(sfen::parse_move)
                .collect::<Result<Vec<_>>>()
                .map_err(|e| Error::record_parse_error(e.to_string()))?;
            return Ok(Self::new(mvs));
        }

        let (pos, mvs) =
            sfen::parse_record(s).map_err(|e| Error::record_parse_error(e.to_string()))?;
        chk!(
            pos.is_startpos_layout() && pos.side().is_sente(),
            Error::record_parse_error("non-standard initial position")
        );

        Ok(Self::new(mvs))
    }
}

/// 1 行 1 棋譜のテキストをパースする。空行と `#` で始まる行は無視する。
pub fn parse_many(text: &str) -> Result<Vec<Record>> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(i, line)| {
            line.parse::<Record>().map_err(|e| match e {
                Error::RecordParseError(msg) => {
                    Error::record_parse_error(format!("line {}: {}", i + 1, msg))
                }
                e => e,
            })
        })
        .collect()
}

pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path)?;
    parse_many(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let expected = Record::new(vec![
            Move::from_sfen("7g7f").unwrap(),
            Move::from_sfen("3c3d").unwrap(),
        ]);

        for s in &[
            "startpos moves 7g7f 3c3d",
            "position startpos moves 7g7f 3c3d",
            "sfen lnsgkgsnl/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL b - 1 moves 7g7f 3c3d",
            "  7g7f 3c3d ",
        ] {
            assert_eq!(s.parse::<Record>().unwrap(), expected, "{}", s);
        }

        assert_eq!(expected.to_string(), "startpos moves 7g7f 3c3d");
        assert_eq!("startpos".parse::<Record>().unwrap(), Record::default());
    }

    #[test]
    fn test_parse_error() {
        // 香落ち
        let err = "sfen lnsgkgsn1/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL w - 1 moves 3c3d"
            .parse::<Record>()
            .unwrap_err();
        assert!(matches!(err, Error::RecordParseError(_)));

        assert!("startpos moves 7g7x".parse::<Record>().is_err());
        assert!("".parse::<Record>().is_err());
    }

    #[test]
    fn test_parse_hand_overflow() {
        let err = "sfen lnsgkgsnl/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL b 300P 1 moves 7g7f"
            .parse::<Record>()
            .unwrap_err();
        assert!(matches!(err, Error::RecordParseError(_)), "{}", err);
        assert!(err.to_string().contains("overflow"), "{}", err);
    }

    #[test]
    fn test_parse_many() {
        let text = "\
# comment
startpos moves 7g7f

2g2f 8c8d
";
        let records = parse_many(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].len(), 2);

        let err = parse_many("startpos\nfoo\n").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);
    }
}
