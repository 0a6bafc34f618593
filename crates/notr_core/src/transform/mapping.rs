//! Position maps produced by applied steps.
//!
//! Positions are never updated behind a caller's back; a caller holding a
//! position across an edit maps it explicitly through the transaction's
//! `Mapping`.

/// Which side a position sticks to when content is inserted at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// Replacement of `old_size` positions at `pos` by `new_size` positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMap {
    pos: usize,
    old_size: usize,
    new_size: usize,
}

impl StepMap {
    pub fn new(pos: usize, old_size: usize, new_size: usize) -> Self {
        Self {
            pos,
            old_size,
            new_size,
        }
    }

    /// Map of a step that moves nothing (attribute edits).
    pub fn identity() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        let end = self.pos + self.old_size;
        if pos < self.pos || (self.old_size == 0 && self.new_size == 0) {
            return pos;
        }
        if pos > end {
            return pos - self.old_size + self.new_size;
        }
        let stick_left = if self.old_size == 0 {
            assoc == Assoc::Left
        } else if pos == self.pos {
            true
        } else if pos == end {
            false
        } else {
            assoc == Assoc::Left
        };
        if stick_left {
            self.pos
        } else {
            self.pos + self.new_size
        }
    }
}

/// Ordered composition of step maps for one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.maps
            .iter()
            .fold(pos, |pos, step_map| step_map.map(pos, assoc))
    }
}
