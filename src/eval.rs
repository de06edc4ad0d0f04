//! Post-order expression evaluation (spec.md §4.5).
//!
//! Evaluation is a pure function of a tree and an `Environment`: there is
//! no global, mutable interpreter state. `&&`/`||` short-circuit; every
//! other binary operator evaluates both operands unconditionally.

use crate::ast::{BinaryOp, Node, UnaryOp};
use crate::error::CoreError;
use crate::value::{Value, ValueType};

/// Supplies the values a variable or a dereference resolve to. The scanner
/// and CLI implement this over a live `Target`; the optimizer's constant
/// folding pass uses `NullEnvironment`, which is never actually called
/// because folding only fires on subtrees with no `Variable`/`Deref` node.
pub trait Environment {
    fn read(&self, address: u64, ty: &ValueType) -> Result<Value, CoreError>;
}

pub struct NullEnvironment;

impl Environment for NullEnvironment {
    fn read(&self, _address: u64, _ty: &ValueType) -> Result<Value, CoreError> {
        Err(CoreError::Eval(
            "internal error: constant-folded subtree attempted a memory read".into(),
        ))
    }
}

pub fn eval(node: &Node, env: &dyn Environment) -> Result<Value, CoreError> {
    match node {
        Node::Literal { value } => Ok(*value),
        Node::Variable { ty, address, .. } => env.read(*address, ty),
        Node::Cast { ty, operand } => Ok(eval(operand, env)?.cast(ty)),
        Node::Deref { ty, operand } => {
            let pointer = eval(operand, env)?;
            let address = match pointer {
                Value::Pointer { address, .. } => address,
                other => {
                    return Err(CoreError::Eval(format!(
                        "attempted to dereference a non-pointer value {other}"
                    )))
                }
            };
            env.read(address, ty)
        }
        Node::Unary { op, operand, .. } => {
            let v = eval(operand, env)?;
            match op {
                UnaryOp::Neg => v.neg(),
                UnaryOp::Not => Ok(v.logical_not()),
                UnaryOp::Compl => v.compl(),
            }
        }
        Node::Binary { op, lhs, rhs, ty } => eval_binary(*op, lhs, rhs, ty, env),
    }
}

fn eval_binary(
    op: BinaryOp,
    lhs: &Node,
    rhs: &Node,
    ty: &ValueType,
    env: &dyn Environment,
) -> Result<Value, CoreError> {
    if op.short_circuits() {
        let l = eval(lhs, env)?;
        let l_true = !l.is_zero();
        return Ok(match op {
            BinaryOp::AndCond if !l_true => Value::S32(0),
            BinaryOp::OrCond if l_true => Value::S32(1),
            BinaryOp::AndCond => {
                let r = eval(rhs, env)?;
                Value::S32(if !r.is_zero() { 1 } else { 0 })
            }
            BinaryOp::OrCond => {
                let r = eval(rhs, env)?;
                Value::S32(if !r.is_zero() { 1 } else { 0 })
            }
            _ => unreachable!(),
        });
    }

    let l = eval(lhs, env)?;
    let r = eval(rhs, env)?;

    // Arithmetic, bitwise and shift nodes carry their operand/result type
    // in `ty`. Comparisons carry their *result* type there (always s32),
    // so the type operands are promoted to for the comparison itself is
    // recomputed from the operand subtrees.
    let is_comparison = matches!(
        op,
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
    );
    let operand_ty = if is_comparison {
        ValueType::higher(&lhs.result_type(), &rhs.result_type())
    } else {
        ty.clone()
    };
    let l = l.cast(&operand_ty);
    let r = r.cast(&operand_ty);
    match op {
        BinaryOp::Add => Ok(l.add(&r)),
        BinaryOp::Sub => Ok(l.sub(&r)),
        BinaryOp::Mul => Ok(l.mul(&r)),
        BinaryOp::Div => l.div(&r),
        BinaryOp::Rem => l.rem(&r),
        BinaryOp::And => l.bitand(&r),
        BinaryOp::Or => l.bitor(&r),
        BinaryOp::Xor => l.bitxor(&r),
        BinaryOp::Shl => l.shl(&r),
        BinaryOp::Shr => l.shr(&r),
        BinaryOp::Eq => Ok(l.eq_op(&r)),
        BinaryOp::Ne => Ok(l.neq_op(&r)),
        BinaryOp::Lt => Ok(l.lt(&r)),
        BinaryOp::Gt => Ok(l.gt(&r)),
        BinaryOp::Le => Ok(l.le(&r)),
        BinaryOp::Ge => Ok(l.ge(&r)),
        BinaryOp::AndCond | BinaryOp::OrCond => unreachable!("handled above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolTable;
    use crate::value::{AddrWidth, ScalarType};

    struct MapEnvironment(std::collections::HashMap<u64, Value>);

    impl Environment for MapEnvironment {
        fn read(&self, address: u64, _ty: &ValueType) -> Result<Value, CoreError> {
            self.0
                .get(&address)
                .copied()
                .ok_or_else(|| CoreError::Eval(format!("no value at {address:#x}")))
        }
    }

    fn eval_str(src: &str, symbols: &SymbolTable, env: &dyn Environment) -> Value {
        let node = crate::parser::parse(src, symbols, AddrWidth::W64).unwrap();
        eval(&node, env).unwrap()
    }

    #[test]
    fn evaluates_a_cast_and_division() {
        let v = eval_str("(f64)1 / 2", &SymbolTable::new(), &NullEnvironment);
        assert_eq!(v, Value::F64(0.5));
    }

    #[test]
    fn division_by_zero_fails_evaluation() {
        let node = crate::parser::parse("1 / 0", &SymbolTable::new(), AddrWidth::W64).unwrap();
        assert!(eval(&node, &NullEnvironment).is_err());
    }

    #[test]
    fn short_circuits_or_without_evaluating_the_right_side() {
        let mut symbols = SymbolTable::new();
        symbols.insert(crate::symbol::Symbol {
            name: "hp".into(),
            ty: ValueType::Scalar(ScalarType::S32),
            address: 0x4000,
        });
        // `hp` resolves to a value the environment doesn't have, so a
        // non-short-circuiting evaluator would error here.
        let env = MapEnvironment(std::collections::HashMap::new());
        let v = eval_str("1 || hp", &symbols, &env);
        assert_eq!(v, Value::S32(1));
    }
}
