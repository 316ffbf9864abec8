use crate::analyzer::{EntryId, WORD_SIZE};

/// Offset cursor value on procedure entry: the saved base pointer word.
pub const FRAME_BASE: i32 = WORD_SIZE;

/// Locals of the outermost procedure live at this depth and are addressed by
/// name instead of through the frame.
pub const GLOBAL_DEPTH: usize = 1;

/// Translation state of the procedure currently being parsed.
///
/// A nested procedure gets a fresh context and the enclosing one is put back
/// once its body is done, so siblings never see each other's offsets.
#[derive(Clone, Debug, PartialEq)]
pub struct Context {
    pub depth: usize,
    pub offset: i32,
    pub procedure: Option<EntryId>,
    pub temp_count: usize,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self {
            depth: 0,
            offset: FRAME_BASE,
            procedure: None,
            temp_count: 0,
        }
    }

    /// Context for the body of `procedure`, one level deeper.
    pub fn nested(&self, procedure: EntryId) -> Self {
        Self {
            depth: self.depth + 1,
            offset: FRAME_BASE,
            procedure: Some(procedure),
            temp_count: 0,
        }
    }

    /// Reserves `size` bytes below the base pointer and returns the (negative)
    /// offset of the slot's lowest byte.
    pub fn allocate(&mut self, size: i32) -> i32 {
        let offset = -(self.offset + size - WORD_SIZE);
        self.offset += size;
        offset
    }

    /// Bytes reserved for locals and temporaries so far.
    pub fn local_size(&self) -> i32 {
        self.offset - FRAME_BASE
    }

    pub fn next_temp(&mut self) -> String {
        self.temp_count += 1;
        format!("_t{}", self.temp_count)
    }
}
