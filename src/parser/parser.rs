use rustc_hash::FxHashSet;

use crate::{
    analyzer::{
        ConstValue, Constant, Entry, EntryId, EntryKind, LiteralTable, Param, ParamMode,
        Procedure, SymbolTable, VarType, Variable, WORD_SIZE,
    },
    error::{Diagnostic, DiagnosticKind},
    lexer::{Lexer, Token, TokenKind},
    tac::{self, Instruction, Operand, Rvalue},
};

use super::{Context, FRAME_BASE, GLOBAL_DEPTH};

/// Everything pass one produces.
#[derive(Debug)]
pub struct Translation {
    pub tac: Vec<Instruction>,
    pub symbols: SymbolTable,
    pub literals: LiteralTable,
    /// Variables of the outermost procedure, addressed by name.
    pub globals: Vec<String>,
    /// Temporaries of the outermost procedure, addressed by name.
    pub temps: Vec<String>,
    /// Label of the outermost procedure.
    pub program: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
    /// Symbol table listings taken right before each scope was purged.
    pub scope_dumps: Vec<String>,
}

impl Translation {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn tac_text(&self) -> String {
        tac::to_text(&self.tac)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum TypeMark {
    Var(VarType),
    Constant(ConstValue),
}

/// Entry point and runtime routines.
const RESERVED_LABELS: [&str; 5] = ["start", "readint", "writeint", "writestr", "writeln"];

/// What an identifier stands for when it shows up in a statement.
enum Resolved {
    Storage(Operand),
    Constant(Operand),
    Procedure(String, Vec<Param>),
}

fn resolve(entry: &Entry) -> Resolved {
    match &entry.kind {
        EntryKind::Constant(c) => Resolved::Constant(Operand::Literal(c.value.to_string())),
        EntryKind::Variable(v) if v.is_param() => Resolved::Storage(Operand::Frame(v.offset)),
        EntryKind::Variable(_) if entry.depth == GLOBAL_DEPTH => {
            Resolved::Storage(Operand::Global(entry.lexeme.clone()))
        }
        EntryKind::Variable(v) => Resolved::Storage(Operand::Frame(v.offset)),
        EntryKind::Procedure(p) => Resolved::Procedure(p.label.clone(), p.params.clone()),
    }
}

/// Single-pass recursive-descent translator: recognizes the program,
/// maintains the symbol table and emits three address code as productions
/// are reduced.
#[derive(Debug)]
pub struct Parser {
    lexer: Lexer,
    pub(super) token: Token,
    pub(super) symbols: SymbolTable,
    pub(super) ctx: Context,
    tac: Vec<Instruction>,
    diagnostics: Vec<Diagnostic>,
    literals: LiteralTable,
    globals: Vec<String>,
    temps: Vec<String>,
    program: Option<String>,
    pending_ids: Vec<EntryId>,
    pending_params: Vec<EntryId>,
    /// Names already used for data or code in the assembly output.
    labels: FxHashSet<String>,
    scope_dumps: Option<Vec<String>>,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        let mut lexer = Lexer::new(source);
        let token = lexer.next_token();
        let diagnostics = lexer.take_diagnostics();

        Self {
            lexer,
            token,
            symbols: SymbolTable::new(),
            ctx: Context::new(),
            tac: vec![],
            diagnostics,
            literals: LiteralTable::new(),
            globals: vec![],
            temps: vec![],
            program: None,
            pending_ids: vec![],
            pending_params: vec![],
            labels: RESERVED_LABELS.iter().map(|l| l.to_string()).collect(),
            scope_dumps: None,
        }
    }

    /// Records a listing of every scope right before it is closed.
    pub fn with_scope_dumps(mut self) -> Self {
        self.scope_dumps = Some(vec![]);
        self
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn parse(mut self) -> Translation {
        match self.parse_procedure() {
            Ok(()) => {
                if self.token.kind != TokenKind::Eof {
                    while self.token.kind != TokenKind::Eof {
                        self.advance();
                    }
                    self.error(DiagnosticKind::UnusedTokens);
                }
                if self.diagnostics.is_empty() {
                    if let Some(program) = self.program.clone() {
                        self.emit(Instruction::Start(program));
                    }
                }
            }
            Err(fatal) => self.diagnostics.push(fatal),
        }

        Translation {
            tac: self.tac,
            symbols: self.symbols,
            literals: self.literals,
            globals: self.globals,
            temps: self.temps,
            program: self.program,
            diagnostics: self.diagnostics,
            scope_dumps: self.scope_dumps.unwrap_or_default(),
        }
    }

    pub(super) fn advance(&mut self) {
        self.token = self.lexer.next_token();
        self.diagnostics.extend(self.lexer.take_diagnostics());
    }

    pub(super) fn error(&mut self, kind: impl Into<DiagnosticKind>) {
        let line = self.token.line;
        self.error_at(line, kind);
    }

    pub(super) fn error_at(&mut self, line: usize, kind: impl Into<DiagnosticKind>) {
        self.diagnostics.push(Diagnostic::new(line, kind));
    }

    pub(super) fn emit(&mut self, instruction: Instruction) {
        self.tac.push(instruction);
    }

    pub(super) fn consume(&mut self, kind: TokenKind) -> bool {
        if self.token.kind != kind {
            return false;
        }
        self.advance();
        true
    }

    /// Reports a mismatch without consuming anything, so parsing can go on.
    pub(super) fn expect(&mut self, kind: TokenKind) {
        if !self.consume(kind) {
            self.error(DiagnosticKind::Expected {
                expected: kind,
                found: self.token.describe(),
            });
        }
    }

    fn check_duplicate(&self, name: &str) -> Result<(), Diagnostic> {
        let depth = self.ctx.depth;
        match self.symbols.lookup_at(name, depth) {
            Some(_) => Err(Diagnostic::new(
                self.token.line,
                DiagnosticKind::Duplicate {
                    name: name.to_string(),
                    depth,
                },
            )),
            None => Ok(()),
        }
    }

    /// Reserves an assembly name for `name`, suffixed with `$<n>` when the
    /// plain name is already in use.
    fn claim_label(&mut self, name: &str) -> String {
        let mut label = name.to_string();
        let mut n = 0;
        while !self.labels.insert(label.clone()) {
            n += 1;
            label = format!("{name}${n}");
        }
        label
    }

    fn current_procedure_mut(&mut self) -> Option<&mut Procedure> {
        let id = self.ctx.procedure?;
        match &mut self.symbols.get_mut(id)?.kind {
            EntryKind::Procedure(p) => Some(p),
            _ => None,
        }
    }

    /// prog = "procedure" ident args "is" declarative_part procedures
    ///        "begin" seq_of_statements "end" ident ";"
    fn parse_procedure(&mut self) -> Result<(), Diagnostic> {
        if !self.consume(TokenKind::Procedure) {
            self.expect(TokenKind::Procedure);
            return Ok(());
        }
        if self.token.kind != TokenKind::Ident {
            self.expect(TokenKind::Ident);
            return Ok(());
        }

        let name = self.token.lexeme.clone();
        self.check_duplicate(&name)?;

        let id = self.symbols.insert(
            &name,
            self.ctx.depth,
            EntryKind::Procedure(Procedure::default()),
        );
        let inner = self.ctx.nested(id);
        let outer = std::mem::replace(&mut self.ctx, inner);
        self.advance();

        self.parse_args()?;
        self.fix_param_offsets();
        self.expect(TokenKind::Is);
        self.parse_declarative_part()?;

        // Globals are claimed by now, nothing has referenced the label yet.
        let label = self.claim_label(&name);
        if let Some(procedure) = self.current_procedure_mut() {
            procedure.label = label.clone();
        }
        if outer.depth == 0 {
            self.program = Some(label.clone());
        }
        self.parse_procedures()?;

        self.emit(Instruction::Proc(label.clone()));
        self.expect(TokenKind::Begin);
        self.parse_seq_of_statements();
        self.expect(TokenKind::End);
        if self.token.kind == TokenKind::Ident && self.token.lexeme != name {
            self.error(DiagnosticKind::NameMismatch {
                expected: name.clone(),
                found: self.token.lexeme.clone(),
            });
        }
        self.expect(TokenKind::Ident);
        self.expect(TokenKind::SemiColon);

        let local_size = self.ctx.local_size();
        if let Some(procedure) = self.current_procedure_mut() {
            procedure.local_size = Some(local_size);
        }
        self.emit(Instruction::Endp(label));

        let depth = self.ctx.depth;
        if let Some(dumps) = self.scope_dumps.as_mut() {
            dumps.push(self.symbols.write_table(depth));
        }
        self.symbols.delete_depth(depth);
        self.ctx = outer;
        Ok(())
    }

    /// procedures = prog*
    fn parse_procedures(&mut self) -> Result<(), Diagnostic> {
        while self.token.kind == TokenKind::Procedure {
            self.parse_procedure()?;
        }
        Ok(())
    }

    /// args = ("(" arg_list ")")?
    fn parse_args(&mut self) -> Result<(), Diagnostic> {
        if self.consume(TokenKind::LeftParen) {
            self.parse_arg_list()?;
            self.expect(TokenKind::RightParen);
        }
        Ok(())
    }

    /// arg_list = mode identifier_list ":" type_mark (";" arg_list)?
    fn parse_arg_list(&mut self) -> Result<(), Diagnostic> {
        loop {
            if !matches!(
                self.token.kind,
                TokenKind::In | TokenKind::Out | TokenKind::InOut | TokenKind::Ident
            ) {
                self.error(DiagnosticKind::Expected {
                    expected: TokenKind::Ident,
                    found: self.token.describe(),
                });
                return Ok(());
            }

            let mode = self.parse_mode();
            self.parse_identifier_list(EntryKind::Variable(Variable::param(VarType::Int, mode)))?;
            self.expect(TokenKind::Colon);
            let mark = self.parse_type_mark();
            self.declare_params(mode, mark);

            if !self.consume(TokenKind::SemiColon) {
                return Ok(());
            }
        }
    }

    /// mode = ("in" | "out" | "inout")?
    fn parse_mode(&mut self) -> ParamMode {
        let mode = match self.token.kind {
            TokenKind::In => ParamMode::In,
            TokenKind::Out => ParamMode::Out,
            TokenKind::InOut => ParamMode::InOut,
            _ => return ParamMode::In,
        };
        self.advance();
        mode
    }

    fn declare_params(&mut self, mode: ParamMode, mark: Option<TypeMark>) {
        let ty = match mark {
            Some(TypeMark::Var(ty)) => ty,
            Some(TypeMark::Constant(_)) => {
                self.error(DiagnosticKind::InvalidTypeMark {
                    found: TokenKind::Constant.to_string(),
                });
                VarType::Int
            }
            None => VarType::Int,
        };

        for id in std::mem::take(&mut self.pending_ids) {
            if let Some(entry) = self.symbols.get_mut(id) {
                entry.kind = EntryKind::Variable(Variable::param(ty, mode));
            }
            if let Some(procedure) = self.current_procedure_mut() {
                procedure.params.push(Param::new(ty, mode));
            }
            self.pending_params.push(id);
        }
    }

    /// The last declared parameter sits right above the return address, the
    /// first one furthest away.
    fn fix_param_offsets(&mut self) {
        let params = std::mem::take(&mut self.pending_params);
        let count = params.len();
        let offset = |i: usize| FRAME_BASE + (count - i) as i32 * WORD_SIZE;

        for (i, id) in params.iter().enumerate() {
            if let Some(EntryKind::Variable(v)) = self.symbols.get_mut(*id).map(|e| &mut e.kind) {
                v.offset = offset(i);
            }
        }
        if let Some(procedure) = self.current_procedure_mut() {
            for (i, param) in procedure.params.iter_mut().enumerate() {
                param.offset = offset(i);
            }
        }
    }

    /// declarative_part = (identifier_list ":" type_mark ";")*
    fn parse_declarative_part(&mut self) -> Result<(), Diagnostic> {
        while self.token.kind == TokenKind::Ident {
            self.parse_identifier_list(EntryKind::Variable(Variable::new(VarType::Int)))?;
            self.expect(TokenKind::Colon);
            let mark = self.parse_type_mark();
            self.declare_locals(mark);
            self.expect(TokenKind::SemiColon);
        }
        Ok(())
    }

    /// identifier_list = ident ("," ident)*
    fn parse_identifier_list(&mut self, kind: EntryKind) -> Result<(), Diagnostic> {
        loop {
            if self.token.kind != TokenKind::Ident {
                self.expect(TokenKind::Ident);
                return Ok(());
            }

            let name = self.token.lexeme.clone();
            self.check_duplicate(&name)?;
            let id = self.symbols.insert(&name, self.ctx.depth, kind.clone());
            self.pending_ids.push(id);
            self.advance();

            if !self.consume(TokenKind::Comma) {
                return Ok(());
            }
        }
    }

    /// type_mark = "integer" | "float" | "char" | "constant" ":=" value
    fn parse_type_mark(&mut self) -> Option<TypeMark> {
        let mark = match self.token.kind {
            TokenKind::Integer => TypeMark::Var(VarType::Int),
            TokenKind::Float => TypeMark::Var(VarType::Float),
            TokenKind::Char => TypeMark::Var(VarType::Char),
            TokenKind::Constant => {
                self.advance();
                self.expect(TokenKind::Assign);
                return self.parse_value().map(TypeMark::Constant);
            }
            _ => {
                self.error(DiagnosticKind::InvalidTypeMark {
                    found: self.token.describe(),
                });
                return None;
            }
        };
        self.advance();
        Some(mark)
    }

    /// value = num
    fn parse_value(&mut self) -> Option<ConstValue> {
        if self.token.kind != TokenKind::Num {
            self.expect(TokenKind::Num);
            return None;
        }
        let value = self.token.value.map(ConstValue::from);
        self.advance();
        value
    }

    fn declare_locals(&mut self, mark: Option<TypeMark>) {
        let ids = std::mem::take(&mut self.pending_ids);
        let Some(mark) = mark else {
            return;
        };

        for id in ids {
            let kind = match mark {
                TypeMark::Var(ty) => {
                    let mut v = Variable::new(ty);
                    v.offset = self.ctx.allocate(v.size);
                    EntryKind::Variable(v)
                }
                TypeMark::Constant(value) => EntryKind::Constant(Constant {
                    value,
                    offset: self.ctx.allocate(value.ty().sizeof()),
                }),
            };
            let is_variable = matches!(kind, EntryKind::Variable(_));

            if let Some(entry) = self.symbols.get_mut(id) {
                entry.kind = kind;
                if is_variable && entry.depth == GLOBAL_DEPTH {
                    self.labels.insert(entry.lexeme.clone());
                    self.globals.push(entry.lexeme.clone());
                }
            }
        }
    }

    /// seq_of_statements = (statement ";")*
    fn parse_seq_of_statements(&mut self) {
        while matches!(
            self.token.kind,
            TokenKind::Ident | TokenKind::Get | TokenKind::Put | TokenKind::Putln
        ) {
            self.parse_statement();
            self.expect(TokenKind::SemiColon);
        }
    }

    /// statement = assign_stat | in_stat | out_stat
    fn parse_statement(&mut self) {
        match self.token.kind {
            TokenKind::Ident => self.parse_assign_stat(),
            TokenKind::Get => self.parse_in_stat(),
            _ => self.parse_out_stat(),
        }
    }

    /// assign_stat = ident ":=" expr
    ///             | proc_call
    fn parse_assign_stat(&mut self) {
        let name = self.token.lexeme.clone();
        let line = self.token.line;
        let depth = self.ctx.depth;
        let resolved = self.symbols.lookup_entry(&name).map(resolve);
        self.advance();

        if self.consume(TokenKind::Assign) {
            let dest = match resolved {
                Some(Resolved::Storage(operand)) => operand,
                Some(_) => {
                    self.error_at(line, DiagnosticKind::NotAVariable { name });
                    Operand::Empty
                }
                None => {
                    self.error_at(line, DiagnosticKind::Undeclared { name, depth });
                    Operand::Empty
                }
            };
            let value = self.parse_expr();
            self.emit(Instruction::Assign(dest, Rvalue::Copy(value)));
            return;
        }

        let (label, formals) = match resolved {
            Some(Resolved::Procedure(label, formals)) => (label, formals),
            Some(_) => {
                self.expect(TokenKind::Assign);
                return;
            }
            None => {
                self.error_at(line, DiagnosticKind::Undeclared { name: name.clone(), depth });
                (name, vec![])
            }
        };
        self.parse_proc_call(&label, &formals);
    }

    /// proc_call = ident ("(" params? ")")?
    fn parse_proc_call(&mut self, label: &str, formals: &[Param]) {
        if self.consume(TokenKind::LeftParen) {
            if self.token.kind != TokenKind::RightParen {
                self.parse_params(formals);
            }
            self.expect(TokenKind::RightParen);
        }
        self.emit(Instruction::Call(label.to_string()));
    }

    /// params = (ident | num) ("," (ident | num))*
    fn parse_params(&mut self, formals: &[Param]) {
        for position in 0.. {
            let by_reference = formals
                .get(position)
                .is_some_and(|p| p.mode.by_reference());

            match self.token.kind {
                TokenKind::Ident => match self.parse_ident_value() {
                    operand @ (Operand::Global(_) | Operand::Frame(_)) if by_reference => {
                        self.emit(Instruction::PushRef(operand))
                    }
                    Operand::Empty => (),
                    operand => self.emit(Instruction::Push(operand)),
                },
                TokenKind::Num => {
                    self.emit(Instruction::Push(Operand::Literal(self.token.lexeme.clone())));
                    self.advance();
                }
                _ => {
                    self.error(DiagnosticKind::ExpectedOperand {
                        found: self.token.describe(),
                    });
                    return;
                }
            }

            if !self.consume(TokenKind::Comma) {
                return;
            }
        }
    }

    /// in_stat = "get" "(" id_list ")"
    /// id_list = ident ("," ident)*
    fn parse_in_stat(&mut self) {
        self.expect(TokenKind::Get);
        self.expect(TokenKind::LeftParen);
        loop {
            if self.token.kind != TokenKind::Ident {
                self.expect(TokenKind::Ident);
                break;
            }
            let dest = self.parse_ident_storage();
            if dest != Operand::Empty {
                self.emit(Instruction::Read(dest));
            }
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightParen);
    }

    /// out_stat = ("put" | "putln") "(" write_list ")"
    /// write_list = write_token ("," write_token)*
    fn parse_out_stat(&mut self) {
        let newline = self.token.kind == TokenKind::Putln;
        self.advance();
        self.expect(TokenKind::LeftParen);
        loop {
            self.parse_write_token();
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightParen);
        if newline {
            self.emit(Instruction::WriteLn);
        }
    }

    /// write_token = ident | num | literal
    fn parse_write_token(&mut self) {
        match self.token.kind {
            TokenKind::Ident => {
                let value = self.parse_ident_value();
                if value != Operand::Empty {
                    self.emit(Instruction::WriteInt(value));
                }
            }
            TokenKind::Num => {
                self.emit(Instruction::WriteInt(Operand::Literal(
                    self.token.lexeme.clone(),
                )));
                self.advance();
            }
            TokenKind::Literal => {
                let text = self.token.lexeme.trim_matches('"').to_string();
                let label = self.literals.intern(&text);
                self.emit(Instruction::WriteStr(label));
                self.advance();
            }
            _ => self.error(DiagnosticKind::ExpectedOperand {
                found: self.token.describe(),
            }),
        }
    }

    /// Consumes the identifier under the cursor and returns it as a value:
    /// a storage reference, or the literal of a constant.
    pub(super) fn parse_ident_value(&mut self) -> Operand {
        self.parse_ident(true)
    }

    /// Like [`Parser::parse_ident_value`], but constants are rejected.
    fn parse_ident_storage(&mut self) -> Operand {
        self.parse_ident(false)
    }

    fn parse_ident(&mut self, allow_constant: bool) -> Operand {
        let name = self.token.lexeme.clone();
        let depth = self.ctx.depth;
        let resolved = self.symbols.lookup_entry(&name).map(resolve);
        let operand = match resolved {
            Some(Resolved::Storage(operand)) => operand,
            Some(Resolved::Constant(operand)) if allow_constant => operand,
            Some(_) => {
                self.error(DiagnosticKind::NotAVariable { name });
                Operand::Empty
            }
            None => {
                self.error(DiagnosticKind::Undeclared { name, depth });
                Operand::Empty
            }
        };
        self.advance();
        operand
    }

    /// Allocates a compiler temporary in the current frame.
    pub(super) fn new_temp(&mut self) -> Operand {
        let name = self.ctx.next_temp();
        let mut temp = Variable::new(VarType::Int);
        temp.offset = self.ctx.allocate(temp.size);
        let offset = temp.offset;
        let depth = self.ctx.depth;
        self.symbols.insert(&name, depth, EntryKind::Variable(temp));

        if depth == GLOBAL_DEPTH {
            self.temps.push(name.clone());
            Operand::Global(name)
        } else {
            Operand::Frame(offset)
        }
    }
}
