use core::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const UNKNOWN: Position = Position { line: 0, column: 0 };

    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::UNKNOWN {
            write!(f, "?:?")
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// Where a call site was declared: the script it came from plus a position inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSite {
    pub script: Option<Rc<str>>,
    pub pos: Position,
}

impl SourceSite {
    pub fn new(script: Option<Rc<str>>, pos: Position) -> Self {
        Self { script, pos }
    }
}

impl fmt::Display for SourceSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.script {
            Some(script) => write!(f, "{}:{}", script, self.pos),
            None => write!(f, "{}", self.pos),
        }
    }
}
