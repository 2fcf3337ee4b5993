// Precomputed loop nest for one function. Discovery happens upstream; the
// backend only asks which loop a block belongs to and whether it heads a
// top-level loop.

use serde::{Deserialize, Serialize};

use super::function::BlockId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoopId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loop {
    pub header: BlockId,
    #[serde(default)]
    pub parent: Option<LoopId>,
    /// Every block in the loop, nested loops' blocks included.
    pub blocks: Vec<BlockId>,
}

/// Loops indexed by `LoopId`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopNest {
    #[serde(default)]
    pub loops: Vec<Loop>,
}

impl LoopNest {
    pub fn get(&self, id: LoopId) -> Option<&Loop> {
        self.loops.get(id.0 as usize)
    }

    pub fn add(&mut self, lp: Loop) -> LoopId {
        let id = LoopId(self.loops.len() as u32);
        self.loops.push(lp);
        id
    }

    fn depth(&self, id: LoopId) -> usize {
        let mut depth = 0;
        let mut cur = self.get(id).and_then(|l| l.parent);
        while let Some(p) = cur {
            depth += 1;
            if depth > self.loops.len() {
                break;
            }
            cur = self.get(p).and_then(|l| l.parent);
        }
        depth
    }

    /// Innermost loop containing `block`.
    #[must_use]
    pub fn loop_for(&self, block: BlockId) -> Option<LoopId> {
        (0..self.loops.len() as u32)
            .map(LoopId)
            .filter(|&id| self.loops[id.0 as usize].blocks.contains(&block))
            .max_by_key(|&id| self.depth(id))
    }

    /// The top-level loop headed by `block`, if any.
    #[must_use]
    pub fn top_level_header(&self, block: BlockId) -> Option<LoopId> {
        let id = self.loop_for(block)?;
        let lp = self.get(id)?;
        (lp.header == block && lp.parent.is_none()).then_some(id)
    }

    #[must_use]
    pub fn contains(&self, id: LoopId, block: BlockId) -> bool {
        self.get(id).is_some_and(|l| l.blocks.contains(&block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nest() -> LoopNest {
        let mut nest = LoopNest::default();
        let outer = nest.add(Loop {
            header: BlockId(1),
            parent: None,
            blocks: vec![BlockId(1), BlockId(2), BlockId(3), BlockId(4)],
        });
        nest.add(Loop {
            header: BlockId(2),
            parent: Some(outer),
            blocks: vec![BlockId(2), BlockId(3)],
        });
        nest
    }

    #[test]
    fn innermost_loop_wins() {
        let nest = nest();
        assert_eq!(nest.loop_for(BlockId(3)), Some(LoopId(1)));
        assert_eq!(nest.loop_for(BlockId(4)), Some(LoopId(0)));
        assert_eq!(nest.loop_for(BlockId(0)), None);
    }

    #[test]
    fn only_outermost_headers_start_a_loop_construct() {
        let nest = nest();
        assert_eq!(nest.top_level_header(BlockId(1)), Some(LoopId(0)));
        assert_eq!(nest.top_level_header(BlockId(2)), None);
        assert_eq!(nest.top_level_header(BlockId(4)), None);
    }
}
