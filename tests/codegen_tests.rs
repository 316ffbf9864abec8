use adacc::error::TacError;
use adacc::tac::{BinOp, Instruction, Operand, Rvalue, UnaryOp};
use adacc::{compile, generate_assembly, translate};

fn asm_lines(input: &str) -> Vec<String> {
    let compiled = compile(input).unwrap();
    compiled.asm.lines().map(str::to_string).collect()
}

/// The lines following `first` in `asm`, `first` included.
fn block<'a>(asm: &'a [String], first: &str, len: usize) -> &'a [String] {
    let start = asm.iter().position(|l| l == first).unwrap();
    &asm[start..start + len]
}

#[test]
fn program_layout() {
    let input = "
procedure p is
  x : integer;
begin
  x := 3;
  put(\"x is \", x);
end p;
";
    let asm = asm_lines(input);
    assert_eq!(
        asm[..12],
        [
            ".model small",
            ".586",
            ".stack 100h",
            "",
            ".data",
            "_S0 DB \"x is \",\"$\"",
            "x DW ?",
            "",
            ".code",
            "include io.asm",
            "",
            "p PROC",
        ]
    );
    assert_eq!(
        block(&asm, "p PROC", 18),
        [
            "p PROC",
            "push bp",
            "mov bp, sp",
            "sub sp, 2",
            "mov ax, 3",
            "mov x, ax",
            "mov dx, offset _S0",
            "call writestr",
            "mov dx, x",
            "call writeint",
            "add sp, 2",
            "pop bp",
            "ret 0",
            "p ENDP",
            "",
            "start PROC",
            "mov ax, @data",
            "mov ds, ax",
        ]
    );
    assert_eq!(
        asm[asm.len() - 7..],
        [
            "call p",
            "mov ah, 4ch",
            "mov al, 0",
            "int 21h",
            "start ENDP",
            "",
            "END start",
        ]
    );
}

#[test]
fn frame_operands() {
    let input = "
procedure main is
  procedure q(a, b : integer) is
    z : integer;
  begin
    z := a - b;
    get(z);
    putln(z);
  end q;
begin
  q(1, 2);
end main;
";
    let asm = asm_lines(input);
    assert_eq!(
        block(&asm, "q PROC", 20),
        [
            "q PROC",
            "push bp",
            "mov bp, sp",
            "sub sp, 4",
            "mov ax, [bp+6]",
            "sub ax, [bp+4]",
            "mov [bp-4], ax",
            "mov ax, [bp-4]",
            "mov [bp-2], ax",
            "call readint",
            "mov [bp-2], bx",
            "mov dx, [bp-2]",
            "call writeint",
            "call writeln",
            "add sp, 4",
            "pop bp",
            "ret 4",
            "q ENDP",
            "",
            "main PROC",
        ]
    );
    assert_eq!(
        block(&asm, "mov ax, 1", 5),
        ["mov ax, 1", "push ax", "mov ax, 2", "push ax", "call q"]
    );
}

#[test]
fn pass_by_reference() {
    let input = "
procedure main is
  x : integer;
  procedure r(out y : integer) is
  begin
    y := 5;
  end r;
  procedure s(a : integer) is
    t : integer;
  begin
    r(t);
  end s;
begin
  r(x);
end main;
";
    let asm = asm_lines(input);
    assert_eq!(block(&asm, "mov ax, offset x", 3)[1..], ["push ax", "call r"]);
    assert_eq!(block(&asm, "lea ax, [bp-2]", 3)[1..], ["push ax", "call r"]);
}

#[test]
fn reference_formals_are_accessed_through_their_address() {
    let input = "
procedure main is
  x : integer;
  procedure r(out y : integer) is
  begin
    y := 5;
    put(y);
  end r;
  procedure s(inout z : integer) is
  begin
    get(z);
    r(z);
  end s;
begin
  s(x);
end main;
";
    let asm = asm_lines(input);
    assert_eq!(
        block(&asm, "r PROC", 14),
        [
            "r PROC",
            "push bp",
            "mov bp, sp",
            "sub sp, 0",
            "mov ax, 5",
            "mov bx, [bp+4]",
            "mov [bx], ax",
            "mov bx, [bp+4]",
            "mov dx, [bx]",
            "call writeint",
            "add sp, 0",
            "pop bp",
            "ret 2",
            "r ENDP",
        ]
    );
    // forwarded as the address it already holds
    assert_eq!(
        block(&asm, "s PROC", 14)[4..],
        [
            "call readint",
            "mov ax, bx",
            "mov bx, [bp+4]",
            "mov [bx], ax",
            "mov ax, [bp+4]",
            "push ax",
            "call r",
            "add sp, 0",
            "pop bp",
            "ret 2",
        ]
    );
    assert!(!asm.contains(&"mov [bp+4], ax".to_string()));
    assert_eq!(block(&asm, "mov ax, offset x", 3)[1..], ["push ax", "call s"]);
}

#[test]
fn reference_formals_in_expressions() {
    let input = "
procedure main is
  x : integer;
  procedure r(inout y : integer; n : integer) is
  begin
    y := y + n;
  end r;
begin
  r(x, 2);
end main;
";
    let asm = asm_lines(input);
    assert_eq!(
        block(&asm, "r PROC", 12)[4..],
        [
            "mov bx, [bp+6]",
            "mov ax, [bx]",
            "add ax, [bp+4]",
            "mov [bp-2], ax",
            "mov ax, [bp-2]",
            "mov bx, [bp+6]",
            "mov [bx], ax",
            "add sp, 2",
        ]
    );
}

#[test]
fn shadowed_procedures_have_separate_frames() {
    let input = "
procedure main is
  procedure q is
    a : integer;
  begin
    a := 1;
  end q;
  procedure r is
    procedure q is
      a, b : integer;
    begin
      b := 2;
    end q;
  begin
    q;
  end r;
begin
  q;
  r;
end main;
";
    let asm = asm_lines(input);
    assert_eq!(block(&asm, "q PROC", 4)[3], "sub sp, 2");
    assert_eq!(block(&asm, "q$1 PROC", 4)[3], "sub sp, 4");
    assert_eq!(block(&asm, "add sp, 4", 4)[1..], ["pop bp", "ret 0", "q$1 ENDP"]);
    assert_eq!(block(&asm, "r PROC", 5)[4], "call q$1");
    assert_eq!(block(&asm, "main PROC", 6)[4..], ["call q", "call r"]);
}

#[test]
fn operator_lowering() {
    let input = "
procedure p is
  a, b : integer;
begin
  a := a * b;
  a := a / b;
  a := a mod b;
  a := a and b;
  a := not a;
  a := a <= b;
end p;
";
    let asm = asm_lines(input);
    assert_eq!(
        block(&asm, "mov bx, b", 3),
        ["mov bx, b", "imul bx", "mov _t1, ax"]
    );
    assert_eq!(
        block(&asm, "mov ax, _t1", 6)[2..],
        ["mov ax, a", "mov bx, b", "cwd", "idiv bx"]
    );
    assert_eq!(
        block(&asm, "mov _t2, ax", 8)[4..],
        ["mov bx, b", "cwd", "idiv bx", "mov ax, dx"]
    );
    assert!(asm.contains(&"and ax, b".to_string()));
    assert!(asm.contains(&"not ax".to_string()));
    assert_eq!(
        block(&asm, "cmp ax, b", 4),
        ["cmp ax, b", "mov ax, 0", "setle al", "mov _t6, ax"]
    );
}

#[test]
fn temps_are_data() {
    let input = "
procedure p is
  a, b, c : integer;
begin
  a := a + b + c;
end p;
";
    let asm = asm_lines(input);
    assert_eq!(
        block(&asm, ".data", 7),
        [".data", "a DW ?", "b DW ?", "c DW ?", "_t1 DW ?", "_t2 DW ?", ""]
    );
}

#[test]
fn instruction_text() {
    let instructions = vec![
        Instruction::Proc("p".to_string()),
        Instruction::Assign(
            Operand::Frame(-4),
            Rvalue::Binary(Operand::Frame(6), BinOp::NotEqual, Operand::Literal("1".to_string())),
        ),
        Instruction::Assign(
            Operand::Global("x".to_string()),
            Rvalue::Unary(UnaryOp::Not, Operand::Frame(-4)),
        ),
        Instruction::PushRef(Operand::Frame(-2)),
        Instruction::WriteLn,
        Instruction::Start("p".to_string()),
    ];
    let text = adacc::tac::to_text(&instructions);
    assert_eq!(
        text,
        "proc p\n_BP-4 = _BP+6 /= 1\nx = not _BP-4\npush @_BP-2\nwrln\nstart proc p\n"
    );

    let reread: Vec<Instruction> = text.lines().map(|l| l.parse().unwrap()).collect();
    assert_eq!(reread, instructions);
    assert!(BinOp::NotEqual.is_relational());
    assert!(!BinOp::Rem.is_relational());
}

#[test]
fn malformed_tac() {
    let translation = translate("procedure p is begin end p;");
    assert_eq!(
        generate_assembly(&translation, "proc p\nx = a ** b\n"),
        Err(TacError::UnknownOperator("**".to_string()))
    );
    assert_eq!(
        generate_assembly(&translation, "jump somewhere else"),
        Err(TacError::Malformed("jump somewhere else".to_string()))
    );
}
