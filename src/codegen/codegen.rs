use crate::{
    analyzer::{LiteralTable, SymbolTable},
    error::TacError,
    parser::Translation,
    tac::{BinOp, Instruction, Operand, Rvalue, UnaryOp},
};

/// Runtime library linked by name.
const RUNTIME_INCLUDE: &str = "include io.asm";

fn address(operand: &Operand) -> String {
    match operand {
        Operand::Frame(offset) if *offset >= 0 => format!("[bp+{offset}]"),
        Operand::Frame(offset) => format!("[bp-{}]", -offset),
        Operand::Literal(s) | Operand::Global(s) => s.clone(),
        Operand::Empty => String::new(),
    }
}

/// Lowers three address code to 16-bit stack machine assembly, using `ax`
/// and `bx` as the only scratch registers.
pub struct Codegen<'a> {
    symbols: &'a SymbolTable,
    literals: &'a LiteralTable,
    globals: &'a [String],
    temps: &'a [String],
    /// Formals of the procedure being lowered that hold an address.
    references: Vec<i32>,
    out: String,
}

impl<'a> Codegen<'a> {
    pub fn new(translation: &'a Translation) -> Self {
        Self {
            symbols: &translation.symbols,
            literals: &translation.literals,
            globals: &translation.globals,
            temps: &translation.temps,
            references: vec![],
            out: String::new(),
        }
    }

    pub fn generate(mut self, tac: &str) -> Result<String, TacError> {
        self.gen_header();
        self.gen_data();
        self.gen_code(tac)?;
        Ok(self.out)
    }

    fn line(&mut self, s: &str) {
        self.out.push_str(s);
        self.out.push('\n');
    }

    fn gen_header(&mut self) {
        self.line(".model small");
        self.line(".586");
        self.line(".stack 100h");
        self.line("");
    }

    fn gen_data(&mut self) {
        self.line(".data");
        let literals = self.literals;
        for (label, text) in literals.iter() {
            self.line(&format!("{label} DB \"{text}\",\"$\""));
        }
        let globals = self.globals;
        let temps = self.temps;
        for name in globals.iter().chain(temps) {
            self.line(&format!("{name} DW ?"));
        }
        self.line("");
    }

    fn gen_code(&mut self, tac: &str) -> Result<(), TacError> {
        self.line(".code");
        self.line(RUNTIME_INCLUDE);
        self.line("");

        for line in tac.lines().filter(|l| !l.trim().is_empty()) {
            let instruction: Instruction = line.parse()?;
            self.gen_instruction(instruction);
        }
        Ok(())
    }

    fn is_reference(&self, operand: &Operand) -> bool {
        matches!(operand, Operand::Frame(offset) if self.references.contains(offset))
    }

    /// Address text for `operand`. A by-reference formal is first loaded into
    /// `bx` and accessed as `[bx]`.
    fn operand(&mut self, operand: &Operand) -> String {
        if self.is_reference(operand) {
            self.line(&format!("mov bx, {}", address(operand)));
            return "[bx]".to_string();
        }
        address(operand)
    }

    fn gen_instruction(&mut self, instruction: Instruction) {
        match instruction {
            Instruction::Proc(name) => self.gen_proc(&name),
            Instruction::Endp(name) => self.gen_endp(&name),
            Instruction::Start(name) => self.gen_start(&name),
            Instruction::Assign(dest, value) => self.gen_assign(&dest, value),
            Instruction::Read(dest) => {
                self.line("call readint");
                if self.is_reference(&dest) {
                    self.line("mov ax, bx");
                    let dest = self.operand(&dest);
                    self.line(&format!("mov {dest}, ax"));
                } else {
                    self.line(&format!("mov {}, bx", address(&dest)));
                }
            }
            Instruction::WriteInt(a) => {
                let a = self.operand(&a);
                self.line(&format!("mov dx, {a}"));
                self.line("call writeint");
            }
            Instruction::WriteStr(label) => {
                self.line(&format!("mov dx, offset {label}"));
                self.line("call writestr");
            }
            Instruction::WriteLn => self.line("call writeln"),
            Instruction::Call(name) => self.line(&format!("call {name}")),
            Instruction::Push(a) => {
                let a = self.operand(&a);
                self.line(&format!("mov ax, {a}"));
                self.line("push ax");
            }
            Instruction::PushRef(a) => {
                // a by-reference formal is forwarded as the address it holds
                match a {
                    _ if self.is_reference(&a) => self.line(&format!("mov ax, {}", address(&a))),
                    Operand::Frame(_) => self.line(&format!("lea ax, {}", address(&a))),
                    _ => self.line(&format!("mov ax, offset {}", address(&a))),
                }
                self.line("push ax");
            }
        }
    }

    fn gen_proc(&mut self, name: &str) {
        let size = self.symbols.local_frame_size(name);
        self.references = self
            .symbols
            .procedure(name)
            .map(|p| p.reference_offsets().collect())
            .unwrap_or_default();
        self.line(&format!("{name} PROC"));
        self.line("push bp");
        self.line("mov bp, sp");
        self.line(&format!("sub sp, {size}"));
    }

    fn gen_endp(&mut self, name: &str) {
        let size = self.symbols.local_frame_size(name);
        let params = self.symbols.param_size(name);
        self.line(&format!("add sp, {size}"));
        self.line("pop bp");
        self.line(&format!("ret {params}"));
        self.line(&format!("{name} ENDP"));
        self.line("");
        self.references.clear();
    }

    fn gen_start(&mut self, name: &str) {
        self.line("start PROC");
        self.line("mov ax, @data");
        self.line("mov ds, ax");
        self.line(&format!("call {name}"));
        self.line("mov ah, 4ch");
        self.line("mov al, 0");
        self.line("int 21h");
        self.line("start ENDP");
        self.line("");
        self.line("END start");
    }

    fn gen_assign(&mut self, dest: &Operand, value: Rvalue) {
        match value {
            Rvalue::Copy(a) => {
                let a = self.operand(&a);
                self.line(&format!("mov ax, {a}"));
            }
            Rvalue::Unary(op, a) => {
                let a = self.operand(&a);
                self.line(&format!("mov ax, {a}"));
                match op {
                    UnaryOp::Neg => self.line("neg ax"),
                    UnaryOp::Not => self.line("not ax"),
                }
            }
            Rvalue::Binary(a, op, b) => {
                let a = self.operand(&a);
                self.line(&format!("mov ax, {a}"));
                let b = self.operand(&b);
                self.gen_binop(op, &b);
            }
        }
        let dest = self.operand(dest);
        self.line(&format!("mov {dest}, ax"));
    }

    /// Leaves `ax <op> right` in `ax`.
    fn gen_binop(&mut self, op: BinOp, right: &str) {
        match op {
            BinOp::Add => self.line(&format!("add ax, {right}")),
            BinOp::Sub => self.line(&format!("sub ax, {right}")),
            BinOp::And => self.line(&format!("and ax, {right}")),
            BinOp::Or => self.line(&format!("or ax, {right}")),
            BinOp::Mul => {
                self.line(&format!("mov bx, {right}"));
                self.line("imul bx");
            }
            BinOp::Div | BinOp::Mod | BinOp::Rem => {
                self.line(&format!("mov bx, {right}"));
                self.line("cwd");
                self.line("idiv bx");
                if op != BinOp::Div {
                    self.line("mov ax, dx");
                }
            }
            _ => self.gen_compare(op, right),
        }
    }

    /// Relations evaluate to 1 or 0.
    fn gen_compare(&mut self, op: BinOp, right: &str) {
        let set = match op {
            BinOp::Equal => "sete",
            BinOp::NotEqual => "setne",
            BinOp::LessThan => "setl",
            BinOp::LessEqual => "setle",
            BinOp::GreaterThan => "setg",
            _ => "setge",
        };
        self.line(&format!("cmp ax, {right}"));
        self.line("mov ax, 0");
        self.line(&format!("{set} al"));
    }
}
