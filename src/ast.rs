//! The typed expression tree the parser builds and the optimizer and
//! evaluator both walk (spec.md §3, §4.4).
//!
//! Each node owns its children outright; the tree never becomes a DAG
//! (constant folding rebuilds rather than shares nodes, matching the
//! optimizer design described in SPEC_FULL.md).

use std::fmt;

use crate::value::{Value, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Compl,
}

impl UnaryOp {
    fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Compl => "~",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    AndCond,
    OrCond,
}

impl BinaryOp {
    /// Logical `&&`/`||` short-circuit; every other operator evaluates
    /// both operands unconditionally (spec.md §4.5).
    pub fn short_circuits(&self) -> bool {
        matches!(self, BinaryOp::AndCond | BinaryOp::OrCond)
    }

    fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::AndCond => "&&",
            BinaryOp::OrCond => "||",
        }
    }
}

/// A node in the expression tree. Every node carries the result type the
/// parser computed for it, so the evaluator never needs to re-derive types.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal { value: Value },
    Variable { name: String, ty: ValueType, address: u64 },
    Cast { ty: ValueType, operand: Box<Node> },
    Deref { ty: ValueType, operand: Box<Node> },
    Unary { op: UnaryOp, ty: ValueType, operand: Box<Node> },
    Binary {
        op: BinaryOp,
        ty: ValueType,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
}

impl Node {
    pub fn result_type(&self) -> ValueType {
        match self {
            Node::Literal { value } => value.value_type(),
            Node::Variable { ty, .. } => ty.clone(),
            Node::Cast { ty, .. } => ty.clone(),
            Node::Deref { ty, .. } => ty.clone(),
            Node::Unary { ty, .. } => ty.clone(),
            Node::Binary { ty, .. } => ty.clone(),
        }
    }

    /// True if this node and, recursively, every child is a literal —
    /// the condition under which the optimizer replaces a node with its
    /// folded value (spec.md §4.5, `opt.c`'s `ast_is_constant`).
    pub fn is_constant(&self) -> bool {
        match self {
            Node::Literal { .. } => true,
            Node::Variable { .. } | Node::Deref { .. } => false,
            Node::Cast { operand, .. } => operand.is_constant(),
            Node::Unary { operand, .. } => operand.is_constant(),
            Node::Binary { lhs, rhs, .. } => lhs.is_constant() && rhs.is_constant(),
        }
    }
}

/// Prints a node back into source text the parser can re-read (spec.md §8's
/// "lex-parse-print round trip" property), grounded on `ast.c`'s
/// `ast_*_snprint` family. Every sub-expression is fully parenthesized so
/// the printed text reparses to the same tree shape regardless of operator
/// precedence; literals whose type isn't the parser's default pick for
/// their raw value (`s32` for ints, `f64` for floats) print with an
/// explicit cast so the type survives the round trip too.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal { value } => print_literal(f, value),
            Node::Variable { name, .. } => write!(f, "{name}"),
            Node::Cast { ty, operand } => write!(f, "({ty})({operand})"),
            Node::Deref { operand, .. } => write!(f, "*({operand})"),
            Node::Unary { op, operand, .. } => write!(f, "{}({operand})", op.symbol()),
            Node::Binary { op, lhs, rhs, .. } => write!(f, "({lhs} {} {rhs})", op.symbol()),
        }
    }
}

fn print_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::S32(v) => write!(f, "{v}"),
        Value::F64(v) => write!(f, "{}", float_literal_text(*v)),
        Value::Pointer { address, width } => {
            let ty = ValueType::Pointer {
                pointee: Box::new(ValueType::Scalar(width.as_unsigned())),
                width: *width,
            };
            write!(f, "({ty})({address})")
        }
        other => write!(f, "({})({})", other.value_type(), literal_text(other)),
    }
}

fn literal_text(value: &Value) -> String {
    match value {
        Value::F32(v) => float_literal_text(*v as f64),
        other => other.to_string(),
    }
}

/// Forces a decimal point into a float's text so the lexer tokenizes it as
/// a `FloatLit` rather than an `IntLit` on whole-numbered values (`2` would
/// otherwise reparse as an `s32`, not the original float type).
fn float_literal_text(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') || s.contains('e') || s.contains('E') {
        s
    } else {
        format!("{s}.0")
    }
}

#[cfg(test)]
mod tests {
    use crate::symbol::SymbolTable;
    use crate::value::AddrWidth;

    fn round_trips(src: &str) {
        let symbols = SymbolTable::new();
        let first = crate::parser::parse(src, &symbols, AddrWidth::W64).unwrap();
        let printed = first.to_string();
        let second = crate::parser::parse(&printed, &symbols, AddrWidth::W64)
            .unwrap_or_else(|e| panic!("printed form {printed:?} failed to reparse: {e}"));
        let first = crate::optimize::optimize(first).unwrap();
        let second = crate::optimize::optimize(second).unwrap();
        assert_eq!(first, second, "{src:?} printed as {printed:?} did not round-trip");
    }

    #[test]
    fn round_trips_arithmetic() {
        round_trips("1 + 2 * 3");
    }

    #[test]
    fn round_trips_a_cast_and_mixed_width_literals() {
        round_trips("(f64)1 / 2");
        round_trips("(u8)200 + (s16)(-5)");
    }

    #[test]
    fn round_trips_comparisons_and_short_circuit_logic() {
        round_trips("1 < 2 && 3 == 3");
        round_trips("1 || 0");
    }

    #[test]
    fn round_trips_bitwise_and_shifts() {
        round_trips("(1 | 2) ^ (3 & 4)");
        round_trips("1 << 2 >> 1");
    }

    #[test]
    fn round_trips_a_folded_non_default_literal_type() {
        let symbols = SymbolTable::new();
        let node = crate::parser::parse("(u8)200 + (s16)(-5)", &symbols, AddrWidth::W64).unwrap();
        let folded = crate::optimize::optimize(node).unwrap();
        let printed = folded.to_string();
        let reparsed = crate::parser::parse(&printed, &symbols, AddrWidth::W64)
            .unwrap_or_else(|e| panic!("printed form {printed:?} failed to reparse: {e}"));
        let refolded = crate::optimize::optimize(reparsed).unwrap();
        assert_eq!(folded, refolded);
    }
}
