//! Recursive-descent parser with C operator precedence (spec.md §4.4).
//!
//! Casts are disambiguated with the classic two-token lookahead: a `(`
//! followed by a known type name followed by `)` is a cast; anything else
//! after `(` is a parenthesized sub-expression.

use crate::ast::{BinaryOp, Node, UnaryOp};
use crate::error::CoreError;
use crate::lexer::{Lexer, Token};
use crate::symbol::SymbolTable;
use crate::value::{AddrWidth, ScalarType, Value, ValueType};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    symbols: &'a SymbolTable,
    /// Address width a bare pointer-cast type name (`u32ptr`, `s8ptr`, ...)
    /// resolves to. Fixed for the whole parse, chosen by the caller before
    /// compiling (spec.md §4.6: the 32/64-bit decision happens once,
    /// up-front, never per-expression).
    addr_width: AddrWidth,
}

/// The type a cast's lookahead resolved to: a plain scalar, or a pointer to
/// one (spec.md §6: scalar type names "plus their pointer forms").
enum CastTarget {
    Scalar(ScalarType),
    Pointer(ScalarType),
}

/// Parses `src` into a fully type-checked expression tree, resolving any
/// bare identifier against `symbols`. `addr_width` fixes the width pointer
/// casts and the `addr` identifier are typed with.
pub fn parse(src: &str, symbols: &SymbolTable, addr_width: AddrWidth) -> Result<Node, CoreError> {
    let tokens = Lexer::new(src).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        symbols,
        addr_width,
    };
    let node = parser.parse_expr()?;
    parser.expect_eof()?;
    Ok(node)
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&Token::Eof)
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect_eof(&self) -> Result<(), CoreError> {
        if *self.peek() == Token::Eof {
            Ok(())
        } else {
            Err(CoreError::Parse(format!(
                "unexpected trailing token {:?}",
                self.peek()
            )))
        }
    }

    fn expect(&mut self, tok: &Token) -> Result<(), CoreError> {
        if self.peek() == tok {
            self.bump();
            Ok(())
        } else {
            Err(CoreError::Parse(format!(
                "expected {:?}, found {:?}",
                tok,
                self.peek()
            )))
        }
    }

    fn parse_expr(&mut self) -> Result<Node, CoreError> {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> Result<Node, CoreError> {
        let mut lhs = self.parse_logical_and()?;
        while *self.peek() == Token::OrOr {
            self.bump();
            let rhs = self.parse_logical_and()?;
            lhs = logical_node(BinaryOp::OrCond, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_logical_and(&mut self) -> Result<Node, CoreError> {
        let mut lhs = self.parse_bitor()?;
        while *self.peek() == Token::AndAnd {
            self.bump();
            let rhs = self.parse_bitor()?;
            lhs = logical_node(BinaryOp::AndCond, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_bitor(&mut self) -> Result<Node, CoreError> {
        let mut lhs = self.parse_bitxor()?;
        while *self.peek() == Token::Pipe {
            self.bump();
            let rhs = self.parse_bitxor()?;
            lhs = int_binop_node(BinaryOp::Or, lhs, rhs, "|")?;
        }
        Ok(lhs)
    }

    fn parse_bitxor(&mut self) -> Result<Node, CoreError> {
        let mut lhs = self.parse_bitand()?;
        while *self.peek() == Token::Caret {
            self.bump();
            let rhs = self.parse_bitand()?;
            lhs = int_binop_node(BinaryOp::Xor, lhs, rhs, "^")?;
        }
        Ok(lhs)
    }

    fn parse_bitand(&mut self) -> Result<Node, CoreError> {
        let mut lhs = self.parse_equality()?;
        while *self.peek() == Token::Amp {
            self.bump();
            let rhs = self.parse_equality()?;
            lhs = int_binop_node(BinaryOp::And, lhs, rhs, "&")?;
        }
        Ok(lhs)
    }

    /// At most one equality comparison — the grammar's trailing `?`, not
    /// `*` (spec.md §4.4; `parse.c`'s `equality_expression` is a single
    /// `if`, so `a == b == c` is a parse error there too).
    fn parse_equality(&mut self) -> Result<Node, CoreError> {
        let lhs = self.parse_relational()?;
        let op = match self.peek() {
            Token::EqEq => BinaryOp::Eq,
            Token::Ne => BinaryOp::Ne,
            _ => return Ok(lhs),
        };
        self.bump();
        let rhs = self.parse_relational()?;
        comparison_node(op, lhs, rhs)
    }

    /// At most one relational comparison; see `parse_equality`.
    fn parse_relational(&mut self) -> Result<Node, CoreError> {
        let lhs = self.parse_shift()?;
        let op = match self.peek() {
            Token::Lt => BinaryOp::Lt,
            Token::Gt => BinaryOp::Gt,
            Token::Le => BinaryOp::Le,
            Token::Ge => BinaryOp::Ge,
            _ => return Ok(lhs),
        };
        self.bump();
        let rhs = self.parse_shift()?;
        comparison_node(op, lhs, rhs)
    }

    fn parse_shift(&mut self) -> Result<Node, CoreError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::Shl => BinaryOp::Shl,
                Token::Shr => BinaryOp::Shr,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_additive()?;
            if !lhs.result_type().is_integer() || !rhs.result_type().is_integer() {
                return Err(CoreError::Parse("shift operands must be integers".into()));
            }
            let ty = lhs.result_type();
            lhs = Node::Binary {
                op,
                ty,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Node, CoreError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_multiplicative()?;
            lhs = arith_binop_node(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, CoreError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Rem,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = if op == BinaryOp::Rem {
                int_binop_node(op, lhs, rhs, "%")?
            } else {
                arith_binop_node(op, lhs, rhs)?
            };
        }
        Ok(lhs)
    }

    /// A `(` is a cast exactly when it is followed by a known type name and
    /// then `)`; any other token sequence is a parenthesized expression.
    /// A type name ending in `ptr` (`u32ptr`, `s8ptr`, ...) is that scalar's
    /// pointer form (spec.md §6), used for `*(T ptr)expr` dereferences.
    fn looks_like_cast(&self) -> Option<CastTarget> {
        if *self.peek() != Token::LParen {
            return None;
        }
        let Token::Ident(name) = self.peek_at(1) else {
            return None;
        };
        if *self.peek_at(2) != Token::RParen {
            return None;
        }
        if let Some(scalar) = ScalarType::from_name(name) {
            return Some(CastTarget::Scalar(scalar));
        }
        let pointee = name.strip_suffix("ptr")?;
        ScalarType::from_name(pointee).map(CastTarget::Pointer)
    }

    fn parse_unary(&mut self) -> Result<Node, CoreError> {
        if let Some(target) = self.looks_like_cast() {
            self.bump(); // (
            self.bump(); // type name
            self.bump(); // )
            let operand = self.parse_unary()?;
            let ty = match target {
                CastTarget::Scalar(scalar) => ValueType::Scalar(scalar),
                CastTarget::Pointer(pointee) => ValueType::Pointer {
                    pointee: Box::new(ValueType::Scalar(pointee)),
                    width: self.addr_width,
                },
            };
            return Ok(Node::Cast {
                ty,
                operand: Box::new(operand),
            });
        }

        match self.peek() {
            Token::Minus => {
                self.bump();
                let operand = self.parse_unary()?;
                let ty = operand.result_type();
                Ok(Node::Unary {
                    op: UnaryOp::Neg,
                    ty,
                    operand: Box::new(operand),
                })
            }
            Token::Bang => {
                self.bump();
                let operand = self.parse_unary()?;
                Ok(Node::Unary {
                    op: UnaryOp::Not,
                    ty: ValueType::Scalar(ScalarType::S32),
                    operand: Box::new(operand),
                })
            }
            Token::Tilde => {
                self.bump();
                let operand = self.parse_unary()?;
                if !operand.result_type().is_integer() {
                    return Err(CoreError::Parse("~ requires an integer operand".into()));
                }
                let ty = operand.result_type();
                Ok(Node::Unary {
                    op: UnaryOp::Compl,
                    ty,
                    operand: Box::new(operand),
                })
            }
            Token::Star => {
                self.bump();
                let operand = self.parse_unary()?;
                let ValueType::Pointer { pointee, .. } = operand.result_type() else {
                    return Err(CoreError::Parse("* requires a pointer operand".into()));
                };
                Ok(Node::Deref {
                    ty: *pointee,
                    operand: Box::new(operand),
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Node, CoreError> {
        match self.bump() {
            Token::IntLit(v) => Ok(Node::Literal {
                value: int_literal_value(v),
            }),
            Token::FloatLit(v) => Ok(Node::Literal { value: Value::F64(v) }),
            Token::Ident(name) => {
                let symbol = self
                    .symbols
                    .lookup(&name)
                    .or_else(|| self.symbols.lookup_prefix(&name))
                    .ok_or_else(|| CoreError::Parse(format!("unknown identifier '{name}'")))?;
                Ok(Node::Variable {
                    name: symbol.name.clone(),
                    ty: symbol.ty.clone(),
                    address: symbol.address,
                })
            }
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            other => Err(CoreError::Parse(format!(
                "unexpected token {other:?} in expression"
            ))),
        }
    }
}

fn int_literal_value(v: u64) -> Value {
    if let Ok(v) = i32::try_from(v) {
        Value::S32(v)
    } else if let Ok(v) = u32::try_from(v) {
        Value::U32(v)
    } else if let Ok(v) = i64::try_from(v) {
        Value::S64(v)
    } else {
        Value::U64(v)
    }
}

fn logical_node(op: BinaryOp, lhs: Node, rhs: Node) -> Result<Node, CoreError> {
    Ok(Node::Binary {
        op,
        ty: ValueType::Scalar(ScalarType::S32),
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn comparison_node(op: BinaryOp, lhs: Node, rhs: Node) -> Result<Node, CoreError> {
    Ok(Node::Binary {
        op,
        ty: ValueType::Scalar(ScalarType::S32),
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn arith_binop_node(op: BinaryOp, lhs: Node, rhs: Node) -> Result<Node, CoreError> {
    let ty = ValueType::higher(&lhs.result_type(), &rhs.result_type());
    Ok(Node::Binary {
        op,
        ty,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn int_binop_node(op: BinaryOp, lhs: Node, rhs: Node, symbol: &str) -> Result<Node, CoreError> {
    if lhs.result_type().is_float() || rhs.result_type().is_float() {
        return Err(CoreError::Parse(format!(
            "{symbol} does not accept floating point operands"
        )));
    }
    let ty = ValueType::higher(&lhs.result_type(), &rhs.result_type());
    Ok(Node::Binary {
        op,
        ty,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;

    fn symbols_with_hp() -> SymbolTable {
        let mut table = SymbolTable::new();
        table.insert(Symbol {
            name: "hp".into(),
            ty: ValueType::Scalar(ScalarType::S32),
            address: 0x4000,
        });
        table
    }

    fn parse_w64(src: &str, symbols: &SymbolTable) -> Result<Node, CoreError> {
        parse(src, symbols, AddrWidth::W64)
    }

    #[test]
    fn parses_a_cast_expression() {
        let node = parse_w64("(f64)1 / 2", &SymbolTable::new()).unwrap();
        assert_eq!(node.result_type(), ValueType::Scalar(ScalarType::F64));
    }

    #[test]
    fn distinguishes_cast_from_parenthesized_expression() {
        let node = parse_w64("(1 + 2) * 3", &SymbolTable::new()).unwrap();
        assert_eq!(node.result_type(), ValueType::Scalar(ScalarType::S32));
    }

    #[test]
    fn resolves_known_identifiers() {
        let node = parse_w64("hp == 100", &symbols_with_hp()).unwrap();
        assert_eq!(node.result_type(), ValueType::Scalar(ScalarType::S32));
    }

    #[test]
    fn rejects_bitwise_operators_on_floats() {
        assert!(parse_w64("(f64)1 & 2", &SymbolTable::new()).is_err());
    }

    #[test]
    fn rejects_unknown_identifiers() {
        assert!(parse_w64("unknown_var + 1", &SymbolTable::new()).is_err());
    }

    #[test]
    fn rejects_chained_comparisons() {
        assert!(parse_w64("1 < 2 < 3", &SymbolTable::new()).is_err());
        assert!(parse_w64("1 == 1 == 1", &SymbolTable::new()).is_err());
    }

    #[test]
    fn parses_a_pointer_cast_and_dereferences_it() {
        let mut symbols = SymbolTable::new();
        symbols.insert(Symbol {
            name: "p".into(),
            ty: ValueType::Pointer {
                pointee: Box::new(ValueType::Scalar(ScalarType::U32)),
                width: AddrWidth::W64,
            },
            address: 0x2000,
        });
        let node = parse_w64("*(u32ptr)p", &symbols).unwrap();
        assert_eq!(node.result_type(), ValueType::Scalar(ScalarType::U32));
        assert!(matches!(node, Node::Deref { .. }));
    }

    #[test]
    fn pointer_cast_uses_the_supplied_address_width() {
        let node = parse("(u32ptr)0", &SymbolTable::new(), AddrWidth::W32).unwrap();
        assert_eq!(
            node.result_type(),
            ValueType::Pointer {
                pointee: Box::new(ValueType::Scalar(ScalarType::U32)),
                width: AddrWidth::W32,
            }
        );
    }
}
