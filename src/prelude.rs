pub use crate::position::Position;
pub use crate::pretty::Pretty;
pub use crate::{Board, Cell, Hand, Hands, Move, Piece, Side, Sq};
