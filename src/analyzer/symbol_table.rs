use super::{ConstValue, ParamMode, VarType, WORD_SIZE};

/// Number of hash buckets. Identifiers are short and programs small, so the
/// table never grows.
pub const TABLE_SIZE: usize = 211;

/// Stable handle to an entry. Handles are never reused, so one that outlives
/// its scope simply stops resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

#[derive(Clone, Debug, PartialEq)]
pub struct Constant {
    pub value: ConstValue,
    pub offset: i32,
}

impl Constant {
    pub fn ty(&self) -> VarType {
        self.value.ty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub ty: VarType,
    pub size: i32,
    pub offset: i32,
    /// `Some` for formal parameters.
    pub mode: Option<ParamMode>,
}

impl Variable {
    pub fn new(ty: VarType) -> Self {
        Self {
            ty,
            size: ty.sizeof(),
            offset: 0,
            mode: None,
        }
    }

    pub fn param(ty: VarType, mode: ParamMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::new(ty)
        }
    }

    pub fn is_param(&self) -> bool {
        self.mode.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Param {
    pub ty: VarType,
    pub mode: ParamMode,
    /// Displacement above the base pointer, set once the whole list is known.
    pub offset: i32,
}

impl Param {
    pub fn new(ty: VarType, mode: ParamMode) -> Self {
        Self { ty, mode, offset: 0 }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Procedure {
    /// Assembly label; the name itself unless that is already taken.
    pub label: String,
    pub params: Vec<Param>,
    /// Filled in once the whole body has been translated.
    pub local_size: Option<i32>,
    pub return_type: Option<VarType>,
}

impl Procedure {
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Bytes the caller pushes; every argument takes one word.
    pub fn param_size(&self) -> i32 {
        self.params.len() as i32 * WORD_SIZE
    }

    /// Offsets of the formals that hold an address instead of a value.
    pub fn reference_offsets(&self) -> impl Iterator<Item = i32> + '_ {
        self.params
            .iter()
            .filter(|p| p.mode.by_reference())
            .map(|p| p.offset)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntryKind {
    Constant(Constant),
    Variable(Variable),
    Procedure(Procedure),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub lexeme: String,
    pub depth: usize,
    pub kind: EntryKind,
    /// Set on procedures whose declaring scope has been closed. They stay
    /// callable but no longer occupy their name at that depth.
    pub retired: bool,
}

impl Entry {
    pub fn is_procedure(&self) -> bool {
        matches!(self.kind, EntryKind::Procedure(_))
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match &self.kind {
            EntryKind::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_procedure(&self) -> Option<&Procedure> {
        match &self.kind {
            EntryKind::Procedure(p) => Some(p),
            _ => None,
        }
    }
}

/// Scope-chained store of declarations.
///
/// Entries live in an arena and are addressed through [`EntryId`]s; every
/// bucket keeps the ids of its names in insertion order so the newest
/// declaration of a name shadows the older ones. Duplicate detection is the
/// caller's job.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    entries: Vec<Option<Entry>>,
    buckets: Vec<Vec<EntryId>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            entries: vec![],
            buckets: vec![vec![]; TABLE_SIZE],
        }
    }

    /// PJW hash over the raw name text.
    pub fn hash(lexeme: &str) -> usize {
        let mut h: u32 = 0;
        for b in lexeme.bytes() {
            h = (h << 4).wrapping_add(b as u32);
            let g = h & 0xf000_0000;
            if g != 0 {
                h ^= g >> 24;
                h ^= g;
            }
        }
        h as usize % TABLE_SIZE
    }

    pub fn insert(&mut self, lexeme: &str, depth: usize, kind: EntryKind) -> EntryId {
        let id = EntryId(self.entries.len());
        self.entries.push(Some(Entry {
            lexeme: lexeme.to_string(),
            depth,
            kind,
            retired: false,
        }));
        self.buckets[Self::hash(lexeme)].push(id);
        id
    }

    /// Newest declaration of `lexeme` in an open scope. Procedures retired
    /// from closed scopes are only found when nothing open matches.
    pub fn lookup(&self, lexeme: &str) -> Option<EntryId> {
        let bucket = &self.buckets[Self::hash(lexeme)];
        let newest = |retired: bool| {
            bucket.iter().rev().copied().find(|&id| {
                self.get(id)
                    .is_some_and(|e| e.lexeme == lexeme && e.retired == retired)
            })
        };
        newest(false).or_else(|| newest(true))
    }

    /// Entry declared as `lexeme` in the open scope at `depth`, even when a
    /// deeper declaration hides it.
    pub fn lookup_at(&self, lexeme: &str, depth: usize) -> Option<EntryId> {
        self.buckets[Self::hash(lexeme)].iter().copied().find(|&id| {
            self.get(id)
                .is_some_and(|e| e.lexeme == lexeme && e.depth == depth && !e.retired)
        })
    }

    pub fn lookup_entry(&self, lexeme: &str) -> Option<&Entry> {
        self.lookup(lexeme).and_then(|id| self.get(id))
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(id.0).and_then(|e| e.as_ref())
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.entries.get_mut(id.0).and_then(|e| e.as_mut())
    }

    /// Drops every entry declared at `depth`, except procedures, which are
    /// retired and stay callable for the rest of the compilation.
    pub fn delete_depth(&mut self, depth: usize) {
        let entries = &mut self.entries;
        for bucket in self.buckets.iter_mut() {
            bucket.retain(|id| {
                let slot = &mut entries[id.0];
                let Some(entry) = slot.as_mut().filter(|e| e.depth == depth) else {
                    return true;
                };
                if entry.is_procedure() {
                    entry.retired = true;
                    return true;
                }
                *slot = None;
                false
            });
        }
    }

    /// Procedure emitted under the assembly label `label`.
    pub fn procedure(&self, label: &str) -> Option<&Procedure> {
        self.entries
            .iter()
            .flatten()
            .filter_map(Entry::as_procedure)
            .find(|p| p.label == label)
    }

    /// Finalized local frame size of the procedure labelled `proc_name`,
    /// zero when unknown.
    pub fn local_frame_size(&self, proc_name: &str) -> i32 {
        self.procedure(proc_name)
            .and_then(|p| p.local_size)
            .unwrap_or(0)
    }

    pub fn param_size(&self, proc_name: &str) -> i32 {
        self.procedure(proc_name)
            .map(Procedure::param_size)
            .unwrap_or(0)
    }

    /// Active entries at `depth` with their bucket index, bucket order first.
    pub fn entries_at(&self, depth: usize) -> impl Iterator<Item = (usize, &Entry)> + '_ {
        self.buckets.iter().enumerate().flat_map(move |(i, bucket)| {
            bucket
                .iter()
                .rev()
                .filter_map(move |&id| self.get(id))
                .filter(move |e| e.depth == depth && !e.retired)
                .map(move |e| (i, e))
        })
    }

    /// Human readable listing of one scope depth.
    pub fn write_table(&self, depth: usize) -> String {
        let mut out = format!("Symbol Table for Depth {depth}:\n");
        out.push_str(&format!(
            "{:<15}{:<20}{:<15}{:<15}{:<15}{:<15}{:<20}\n",
            "Index", "Lexeme", "Type", "DataType", "Size", "Offset", "Value/Params"
        ));

        let mut count = 0;
        for (index, entry) in self.entries_at(depth) {
            count += 1;
            let index = format!("[{index}]");
            let row = match &entry.kind {
                EntryKind::Constant(c) => format!(
                    "{:<15}{:<20}{:<15}{:<15}{:<15}{:<15}{:<20}",
                    index,
                    entry.lexeme,
                    "Constant",
                    c.ty().to_string(),
                    c.ty().sizeof(),
                    c.offset,
                    c.value.to_string()
                ),
                EntryKind::Variable(v) => format!(
                    "{:<15}{:<20}{:<15}{:<15}{:<15}{:<15}",
                    index,
                    entry.lexeme,
                    if v.is_param() { "Parameter" } else { "Variable" },
                    v.ty.to_string(),
                    v.size,
                    v.offset
                ),
                EntryKind::Procedure(p) => format!(
                    "{:<15}{:<20}{:<15}{:<15}{:<15}{:<15}{:<20}",
                    index,
                    entry.lexeme,
                    "Procedure",
                    "-",
                    p.local_size.unwrap_or(0),
                    "-",
                    format!("Params: {}", p.param_count())
                ),
            };
            out.push_str(row.trim_end());
            out.push('\n');
        }

        if count == 0 {
            out.push_str("No entries at this depth\n");
        }
        out
    }
}
