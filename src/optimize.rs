//! Bottom-up constant folding (spec.md §4.5, grounded on `opt.c`'s four
//! recursive rebuild functions).
//!
//! Every node is rebuilt fresh rather than mutated in place; a node is only
//! replaced by its folded `Literal` once all of its children are already
//! constant, so folding never observes a side effect (dereferences and
//! variables are never constant, which makes this check sufficient without
//! special-casing `&&`/`||` short circuiting).

use crate::ast::Node;
use crate::error::CoreError;
use crate::eval::{eval, NullEnvironment};

pub fn optimize(node: Node) -> Result<Node, CoreError> {
    let folded = match node {
        Node::Literal { .. } | Node::Variable { .. } => node,
        Node::Deref { ty, operand } => Node::Deref {
            ty,
            operand: Box::new(optimize(*operand)?),
        },
        Node::Cast { ty, operand } => {
            let operand = optimize(*operand)?;
            rebuild_if_constant(Node::Cast {
                ty,
                operand: Box::new(operand),
            })?
        }
        Node::Unary { op, ty, operand } => {
            let operand = optimize(*operand)?;
            rebuild_if_constant(Node::Unary {
                op,
                ty,
                operand: Box::new(operand),
            })?
        }
        Node::Binary { op, ty, lhs, rhs } => {
            let lhs = optimize(*lhs)?;
            let rhs = optimize(*rhs)?;
            rebuild_if_constant(Node::Binary {
                op,
                ty,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            })?
        }
    };
    Ok(folded)
}

fn rebuild_if_constant(node: Node) -> Result<Node, CoreError> {
    // A folded pointer value can't carry its pointee type back out (`Value`
    // only stores an address and a width; see `Value::value_type`'s note),
    // so a pointer-typed node is left as a `Cast`/`Unary`/`Binary` tree
    // rather than collapsed into a `Literal` that would misremember it.
    if !node.is_constant() || node.result_type().is_pointer() {
        return Ok(node);
    }
    let value = eval(&node, &NullEnvironment)?;
    Ok(Node::Literal { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolTable;
    use crate::value::{AddrWidth, ScalarType, ValueType};

    #[test]
    fn folds_a_fully_constant_expression() {
        let node = crate::parser::parse("1 + 2 * 3", &SymbolTable::new(), AddrWidth::W64).unwrap();
        let folded = optimize(node).unwrap();
        assert!(matches!(folded, Node::Literal { .. }));
    }

    #[test]
    fn does_not_fold_through_a_variable() {
        let mut symbols = SymbolTable::new();
        symbols.insert(crate::symbol::Symbol {
            name: "hp".into(),
            ty: ValueType::Scalar(ScalarType::S32),
            address: 0x4000,
        });
        let node = crate::parser::parse("hp + 1", &symbols, AddrWidth::W64).unwrap();
        let folded = optimize(node).unwrap();
        assert!(matches!(folded, Node::Binary { .. }));
    }

    #[test]
    fn does_not_fold_a_pointer_cast() {
        let node = crate::parser::parse("(u32ptr)4096", &SymbolTable::new(), AddrWidth::W64).unwrap();
        let folded = optimize(node).unwrap();
        assert!(matches!(folded, Node::Cast { .. }));
    }
}
