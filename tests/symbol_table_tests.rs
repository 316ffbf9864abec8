use adacc::analyzer::*;
use adacc::parser::{Context, FRAME_BASE};

fn int_var(offset: i32) -> EntryKind {
    let mut v = Variable::new(VarType::Int);
    v.offset = offset;
    EntryKind::Variable(v)
}

fn procedure(label: &str, local_size: i32, params: usize) -> EntryKind {
    EntryKind::Procedure(Procedure {
        label: label.to_string(),
        params: vec![Param::new(VarType::Int, ParamMode::In); params],
        local_size: Some(local_size),
        return_type: None,
    })
}

#[test]
fn hash_is_stable_and_in_range() {
    for name in ["a", "main", "_t1", "abcdefghijklmnopq"] {
        let h = SymbolTable::hash(name);
        assert!(h < TABLE_SIZE);
        assert_eq!(h, SymbolTable::hash(name));
    }
    assert_eq!(SymbolTable::hash("a"), 97);
}

#[test]
fn newest_declaration_shadows() {
    let mut table = SymbolTable::new();
    table.insert("x", 1, int_var(-2));
    let inner = table.insert("x", 2, int_var(-4));

    assert_eq!(table.lookup("x"), Some(inner));
    assert_eq!(table.lookup_entry("x").map(|e| e.depth), Some(2));

    table.delete_depth(2);
    let entry = table.lookup_entry("x").unwrap();
    assert_eq!(entry.depth, 1);
    assert_eq!(entry.as_variable().map(|v| v.offset), Some(-2));
    assert!(table.get(inner).is_none());
}

#[test]
fn lookup_missing() {
    let table = SymbolTable::new();
    assert_eq!(table.lookup("nothing"), None);
    assert_eq!(table.local_frame_size("nothing"), 0);
}

#[test]
fn delete_depth_keeps_procedures() {
    let mut table = SymbolTable::new();
    table.insert("p", 0, procedure("p", 6, 0));
    table.insert("q", 1, procedure("q", 4, 2));
    table.insert("a", 1, int_var(-2));
    table.insert("b", 1, int_var(-4));

    table.delete_depth(1);
    assert!(table.lookup("a").is_none());
    assert!(table.lookup("b").is_none());
    assert!(table.lookup_entry("q").is_some_and(Entry::is_procedure));
    assert_eq!(table.local_frame_size("q"), 4);
    assert_eq!(table.param_size("q"), 4);
    assert_eq!(table.local_frame_size("p"), 6);
    assert_eq!(table.param_size("p"), 0);
}

#[test]
fn lookup_at_sees_through_shadowing() {
    let mut table = SymbolTable::new();
    let outer = table.insert("x", 1, int_var(-2));
    table.insert("x", 2, procedure("x", 0, 0));

    assert_eq!(table.lookup_entry("x").map(|e| e.depth), Some(2));
    assert_eq!(table.lookup_at("x", 1), Some(outer));
    assert_eq!(table.lookup_at("x", 3), None);
}

#[test]
fn closed_procedures_are_retired() {
    let mut table = SymbolTable::new();
    let q = table.insert("q", 2, procedure("q", 2, 0));
    table.insert("t", 2, int_var(-2));

    table.delete_depth(2);
    // still callable, but the name is free again at depth 2
    assert_eq!(table.lookup("q"), Some(q));
    assert_eq!(table.lookup_at("q", 2), None);
    assert!(table.get(q).is_some_and(|e| e.retired));
    assert_eq!(table.entries_at(2).count(), 0);
}

#[test]
fn open_declarations_hide_retired_procedures() {
    let mut table = SymbolTable::new();
    let outer = table.insert("q", 1, procedure("q", 2, 0));
    table.insert("r", 1, procedure("r", 0, 0));
    let inner = table.insert("q", 2, procedure("q$1", 4, 0));

    assert_eq!(table.lookup("q"), Some(inner));
    table.delete_depth(2);
    assert_eq!(table.lookup("q"), Some(outer));
    assert_eq!(table.local_frame_size("q$1"), 4);
}

#[test]
fn frame_sizes_are_keyed_by_label() {
    let mut table = SymbolTable::new();
    table.insert("q", 1, procedure("q", 4, 1));
    table.insert("q", 2, procedure("q$1", 8, 2));

    assert_eq!(table.local_frame_size("q"), 4);
    assert_eq!(table.param_size("q"), 2);
    assert_eq!(table.local_frame_size("q$1"), 8);
    assert_eq!(table.param_size("q$1"), 4);
}

#[test]
fn reference_offsets() {
    let mut params = vec![
        Param::new(VarType::Int, ParamMode::Out),
        Param::new(VarType::Int, ParamMode::In),
        Param::new(VarType::Int, ParamMode::InOut),
    ];
    for (param, offset) in params.iter_mut().zip([8, 6, 4]) {
        param.offset = offset;
    }
    let procedure = Procedure {
        params,
        ..Procedure::default()
    };
    assert_eq!(procedure.reference_offsets().collect::<Vec<_>>(), vec![8, 4]);
}

#[test]
fn entries_at_depth() {
    let mut table = SymbolTable::new();
    table.insert("a", 1, int_var(-2));
    table.insert("b", 2, int_var(-2));
    table.insert("c", 1, int_var(-4));

    let mut names: Vec<_> = table.entries_at(1).map(|(_, e)| e.lexeme.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["a", "c"]);
}

#[test]
fn write_table() {
    let mut table = SymbolTable::new();
    table.insert(
        "k",
        1,
        EntryKind::Constant(Constant {
            value: ConstValue::Float(2.5),
            offset: -4,
        }),
    );
    table.insert("n", 1, int_var(-6));

    let listing = table.write_table(1);
    assert!(listing.starts_with("Symbol Table for Depth 1:"));
    assert!(listing.contains("Constant"));
    assert!(listing.contains("FloatType"));
    assert!(listing.contains("2.5"));
    assert!(listing.contains("IntType"));

    assert!(table.write_table(3).contains("No entries at this depth"));
}

#[test]
fn type_sizes() {
    assert_eq!(VarType::Char.sizeof(), 1);
    assert_eq!(VarType::Int.sizeof(), 2);
    assert_eq!(VarType::Float.sizeof(), 4);
    assert_eq!(ConstValue::Int(1).ty(), VarType::Int);
    assert!(ParamMode::Out.by_reference());
    assert!(ParamMode::InOut.by_reference());
    assert!(!ParamMode::default().by_reference());
}

#[test]
fn frame_allocation() {
    let mut table = SymbolTable::new();
    let id = table.insert("p", 0, procedure("p", 0, 0));
    let mut ctx = Context::new().nested(id);
    assert_eq!(ctx.depth, 1);
    assert_eq!(ctx.offset, FRAME_BASE);

    // int, char, float, int
    assert_eq!(ctx.allocate(2), -2);
    assert_eq!(ctx.allocate(1), -3);
    assert_eq!(ctx.allocate(4), -7);
    assert_eq!(ctx.allocate(2), -9);
    assert_eq!(ctx.local_size(), 9);

    assert_eq!(ctx.next_temp(), "_t1");
    assert_eq!(ctx.next_temp(), "_t2");
    let inner = ctx.nested(id);
    assert_eq!(inner.depth, 2);
    assert_eq!(inner.temp_count, 0);
    assert_eq!(inner.local_size(), 0);
}

#[test]
fn literal_labels_are_shared() {
    let mut literals = LiteralTable::new();
    assert!(literals.is_empty());
    assert_eq!(literals.intern("hi"), "_S0");
    assert_eq!(literals.intern("there"), "_S1");
    assert_eq!(literals.intern("hi"), "_S0");
    assert_eq!(literals.len(), 2);
    assert_eq!(
        literals.iter().collect::<Vec<_>>(),
        vec![("_S0", "hi"), ("_S1", "there")]
    );
}
