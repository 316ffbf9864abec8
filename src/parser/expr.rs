use crate::{
    error::DiagnosticKind,
    lexer::TokenKind,
    tac::{BinOp, Instruction, Operand, Rvalue, UnaryOp},
};

use super::Parser;

/// Every production returns the operand holding its value. Each operator
/// found costs exactly one temporary and one instruction.
impl Parser {
    /// expr = relation
    pub(super) fn parse_expr(&mut self) -> Operand {
        self.parse_relation()
    }

    /// relation = simple_expr (relop simple_expr)?
    fn parse_relation(&mut self) -> Operand {
        let left = self.parse_simple_expr();
        if let Some(op) = self.consume_operator(TokenKind::RelOp) {
            let right = self.parse_simple_expr();
            return self.emit_binary(left, op, right);
        }
        left
    }

    /// simple_expr = term (addop term)*
    fn parse_simple_expr(&mut self) -> Operand {
        let mut result = self.parse_term();
        while let Some(op) = self.consume_operator(TokenKind::AddOp) {
            let right = self.parse_term();
            result = self.emit_binary(result, op, right);
        }
        result
    }

    /// term = factor (mulop factor)*
    fn parse_term(&mut self) -> Operand {
        let mut result = self.parse_factor();
        while let Some(op) = self.consume_operator(TokenKind::MulOp) {
            let right = self.parse_factor();
            result = self.emit_binary(result, op, right);
        }
        result
    }

    /// factor = ident
    ///        | num
    ///        | "(" expr ")"
    ///        | "not" factor
    ///        | ("+" | "-") factor
    fn parse_factor(&mut self) -> Operand {
        match self.token.kind {
            TokenKind::Ident => self.parse_ident_value(),
            TokenKind::Num => {
                let operand = Operand::Literal(self.token.lexeme.clone());
                self.advance();
                operand
            }
            TokenKind::LeftParen => {
                self.advance();
                let operand = self.parse_expr();
                self.expect(TokenKind::RightParen);
                operand
            }
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_factor();
                self.emit_unary(UnaryOp::Not, operand)
            }
            TokenKind::AddOp if self.token.lexeme == "-" => {
                self.advance();
                let operand = self.parse_factor();
                self.emit_unary(UnaryOp::Neg, operand)
            }
            TokenKind::AddOp if self.token.lexeme == "+" => {
                self.advance();
                self.parse_factor()
            }
            _ => {
                self.error(DiagnosticKind::ExpectedOperand {
                    found: self.token.describe(),
                });
                Operand::Empty
            }
        }
    }

    fn consume_operator(&mut self, kind: TokenKind) -> Option<BinOp> {
        if self.token.kind != kind {
            return None;
        }
        let op = self.token.lexeme.parse().ok()?;
        self.advance();
        Some(op)
    }

    fn emit_binary(&mut self, left: Operand, op: BinOp, right: Operand) -> Operand {
        let temp = self.new_temp();
        self.emit(Instruction::Assign(
            temp.clone(),
            Rvalue::Binary(left, op, right),
        ));
        temp
    }

    fn emit_unary(&mut self, op: UnaryOp, operand: Operand) -> Operand {
        let temp = self.new_temp();
        self.emit(Instruction::Assign(temp.clone(), Rvalue::Unary(op, operand)));
        temp
    }
}
