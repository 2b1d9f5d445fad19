use std::ptr::NonNull;
use tracing::{trace, warn};

pub const DEFAULT_BLOCK_SIZE: usize = 32;
pub const DEFAULT_BLOCK_COUNT: usize = 32;

/// Pool with the firmware's default geometry: 32 blocks of 32 bytes.
pub type MemPool = BlockPool<DEFAULT_BLOCK_SIZE, DEFAULT_BLOCK_COUNT>;

/// Address of a block handed out by a [`BlockPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block(NonNull<u8>);

impl Block {
    /// Wrap an arbitrary address. Pools ignore addresses they do not own.
    pub fn from_raw(ptr: NonNull<u8>) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(self) -> *mut u8 {
        self.0.as_ptr()
    }
}

/// Fixed-count, fixed-size block allocator.
///
/// Storage is reserved once at construction and never grows. Allocation is a
/// first-fit scan of the used flags; freeing maps the address back to a block
/// index and silently ignores anything that is not a live block of this pool.
pub struct BlockPool<const BLOCK_SIZE: usize, const BLOCK_COUNT: usize> {
    blocks: Box<[[u8; BLOCK_SIZE]; BLOCK_COUNT]>,
    used: [bool; BLOCK_COUNT],
    free_blocks: usize,
}

impl<const BLOCK_SIZE: usize, const BLOCK_COUNT: usize> BlockPool<BLOCK_SIZE, BLOCK_COUNT> {
    pub fn new() -> Self {
        const {
            assert!(BLOCK_SIZE > 0, "block size must be non-zero");
            assert!(BLOCK_COUNT > 0, "block count must be non-zero");
        }
        Self {
            blocks: Box::new([[0; BLOCK_SIZE]; BLOCK_COUNT]),
            used: [false; BLOCK_COUNT],
            free_blocks: BLOCK_COUNT,
        }
    }

    /// Mark every block free.
    pub fn init(&mut self) {
        self.used = [false; BLOCK_COUNT];
        self.free_blocks = BLOCK_COUNT;
    }

    /// Take the first free block, or `None` when the pool is exhausted.
    pub fn alloc(&mut self) -> Option<Block> {
        let Some(index) = self.used.iter().position(|used| !used) else {
            warn!(blocks = BLOCK_COUNT, "Block pool exhausted");
            return None;
        };
        self.used[index] = true;
        self.free_blocks -= 1;
        trace!(index, free = self.free_blocks, "Block allocated");
        Some(Block(NonNull::from(&mut self.blocks[index]).cast()))
    }

    /// Return a block. Foreign addresses and double frees are no-ops.
    pub fn free(&mut self, block: Block) {
        let Some(index) = self.index_of(block) else {
            trace!(addr = ?block.as_ptr(), "Ignoring free of foreign address");
            return;
        };
        if !self.used[index] {
            trace!(index, "Ignoring free of an unused block");
            return;
        }
        self.used[index] = false;
        self.free_blocks += 1;
        trace!(index, free = self.free_blocks, "Block freed");
    }

    /// Borrow the bytes of a live block.
    pub fn get(&self, block: Block) -> Option<&[u8; BLOCK_SIZE]> {
        let index = self.index_of(block)?;
        self.used[index].then(|| &self.blocks[index])
    }

    /// Mutably borrow the bytes of a live block.
    pub fn get_mut(&mut self, block: Block) -> Option<&mut [u8; BLOCK_SIZE]> {
        let index = self.index_of(block)?;
        if self.used[index] {
            Some(&mut self.blocks[index])
        } else {
            None
        }
    }

    /// Percentage of blocks in use, rounded down.
    pub fn usage(&self) -> u8 {
        ((BLOCK_COUNT - self.free_blocks) * 100 / BLOCK_COUNT) as u8
    }

    pub fn free_blocks(&self) -> usize {
        self.free_blocks
    }

    pub const fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    pub const fn block_count(&self) -> usize {
        BLOCK_COUNT
    }

    /// Block index of `block`, if it is the start of one of our blocks.
    fn index_of(&self, block: Block) -> Option<usize> {
        let base = self.blocks.as_ptr() as usize;
        let offset = (block.as_ptr() as usize).checked_sub(base)?;
        let index = offset / BLOCK_SIZE;
        (index < BLOCK_COUNT && offset % BLOCK_SIZE == 0).then_some(index)
    }
}

impl<const BLOCK_SIZE: usize, const BLOCK_COUNT: usize> Default
    for BlockPool<BLOCK_SIZE, BLOCK_COUNT>
{
    fn default() -> Self {
        Self::new()
    }
}
