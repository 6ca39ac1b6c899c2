use std::ops::{Index, IndexMut};

use super::block::Block;

/// Handle of a block in the document. Handles of removed blocks are reused,
/// so holders must drop them when the block goes away.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(usize);

#[derive(Debug)]
struct Slot {
    block: Block,
    prev: Option<BlockId>,
    next: Option<BlockId>,
}

/// Document-ordered chain of blocks stored in an arena, with O(1)
/// insert-after and removal. An empty list has neither first nor last.
#[derive(Debug, Default)]
pub(crate) struct BlockList {
    slots: Vec<Option<Slot>>,
    free: Vec<usize>,
    first: Option<BlockId>,
    last: Option<BlockId>,
    len: usize,
}

impl BlockList {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.first = None;
        self.last = None;
        self.len = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn first(&self) -> Option<BlockId> {
        self.first
    }

    pub(crate) fn last(&self) -> Option<BlockId> {
        self.last
    }

    pub(crate) fn next(&self, id: BlockId) -> Option<BlockId> {
        self.slot(id).next
    }

    pub(crate) fn prev(&self, id: BlockId) -> Option<BlockId> {
        self.slot(id).prev
    }

    pub(crate) fn contains(&self, id: BlockId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    pub(crate) fn push_back(&mut self, block: Block) -> BlockId {
        match self.last {
            Some(last) => self.insert_after(last, block),
            None => {
                let id = self.allocate(block);
                self.first = Some(id);
                self.last = Some(id);
                id
            }
        }
    }

    pub(crate) fn insert_after(&mut self, after: BlockId, block: Block) -> BlockId {
        let id = self.allocate(block);
        let next = self.slot(after).next;
        {
            let slot = self.slot_mut(id);
            slot.prev = Some(after);
            slot.next = next;
        }
        self.slot_mut(after).next = Some(id);
        match next {
            Some(next) => self.slot_mut(next).prev = Some(id),
            None => self.last = Some(id),
        }
        id
    }

    pub(crate) fn remove(&mut self, id: BlockId) -> Block {
        let Some(slot) = self.slots.get_mut(id.0).and_then(Option::take) else {
            panic!("block {id:?} is not part of the document");
        };
        match slot.prev {
            Some(prev) => self.slot_mut(prev).next = slot.next,
            None => self.first = slot.next,
        }
        match slot.next {
            Some(next) => self.slot_mut(next).prev = slot.prev,
            None => self.last = slot.prev,
        }
        self.free.push(id.0);
        self.len -= 1;
        slot.block
    }

    pub(crate) fn ids(&self) -> BlockIds<'_> {
        BlockIds {
            list: self,
            current: self.first,
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.ids().map(move |id| (id, &self[id]))
    }

    fn allocate(&mut self, block: Block) -> BlockId {
        let slot = Slot {
            block,
            prev: None,
            next: None,
        };
        self.len += 1;
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(slot);
                BlockId(index)
            }
            None => {
                self.slots.push(Some(slot));
                BlockId(self.slots.len() - 1)
            }
        }
    }

    fn slot(&self, id: BlockId) -> &Slot {
        match self.slots.get(id.0) {
            Some(Some(slot)) => slot,
            _ => panic!("block {id:?} is not part of the document"),
        }
    }

    fn slot_mut(&mut self, id: BlockId) -> &mut Slot {
        match self.slots.get_mut(id.0) {
            Some(Some(slot)) => slot,
            _ => panic!("block {id:?} is not part of the document"),
        }
    }
}

impl Index<BlockId> for BlockList {
    type Output = Block;

    fn index(&self, id: BlockId) -> &Block {
        &self.slot(id).block
    }
}

impl IndexMut<BlockId> for BlockList {
    fn index_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.slot_mut(id).block
    }
}

pub(crate) struct BlockIds<'a> {
    list: &'a BlockList,
    current: Option<BlockId>,
}

impl Iterator for BlockIds<'_> {
    type Item = BlockId;

    fn next(&mut self) -> Option<BlockId> {
        let id = self.current?;
        self.current = self.list.next(id);
        Some(id)
    }
}
