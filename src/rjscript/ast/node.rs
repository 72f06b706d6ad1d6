use super::position::Position;

/// Position-carrying wrapper for expressions read from a script.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<T> {
    pub kind: T,
    pub pos: Position,
}

impl<T> Located<T> {
    #[inline]
    pub fn new(kind: T, pos: Position) -> Self {
        Self { kind, pos }
    }

    /// Same position, different payload. Used when a node is rewritten in place.
    #[inline]
    pub fn with_kind<U>(&self, kind: U) -> Located<U> {
        Located { kind, pos: self.pos }
    }
}
