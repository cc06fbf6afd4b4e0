//! Compile-time evaluation interface.
//!
//! The linker asks an injected [`ComptimeEvaluator`] for the value of a
//! `static if` condition. `None` means the condition is not statically
//! decidable, in which case every arm is linked.

use std::collections::HashMap;
use std::fmt;

use kiln_ast::{Ast, BinaryOp, DeclId, ExprId, ExprKind, UnaryOp};

#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl ConstValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(n) => write!(f, "{n}"),
            ConstValue::Float(x) => write!(f, "{x}"),
            ConstValue::Bool(b) => write!(f, "{b}"),
            ConstValue::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// What an evaluator may look at: the tree, the name resolutions made so
/// far, and the values of `comptime let` bindings already linked.
#[derive(Clone, Copy)]
pub struct ComptimeEnv<'a> {
    pub ast: &'a Ast,
    pub linked: &'a HashMap<ExprId, DeclId>,
    pub constants: &'a HashMap<DeclId, ConstValue>,
}

impl ComptimeEnv<'_> {
    fn lookup(&self, expr: ExprId) -> Option<&ConstValue> {
        self.constants.get(self.linked.get(&expr)?)
    }
}

pub trait ComptimeEvaluator {
    fn evaluate(&mut self, expr: ExprId, env: &ComptimeEnv<'_>) -> Option<ConstValue>;
}

/// Decides nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoComptime;

impl ComptimeEvaluator for NoComptime {
    fn evaluate(&mut self, _: ExprId, _: &ComptimeEnv<'_>) -> Option<ConstValue> {
        None
    }
}

/// Folds literals, operators and references to `comptime let` bindings.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConstFolder;

impl ComptimeEvaluator for ConstFolder {
    fn evaluate(&mut self, expr: ExprId, env: &ComptimeEnv<'_>) -> Option<ConstValue> {
        fold(expr, env)
    }
}

fn fold(expr: ExprId, env: &ComptimeEnv<'_>) -> Option<ConstValue> {
    use ConstValue::*;
    Some(match &env.ast.expr(expr).kind {
        ExprKind::IntLit(n) => Int(*n),
        ExprKind::FloatLit(x) => Float(*x),
        ExprKind::BoolLit(b) => Bool(*b),
        ExprKind::StrLit(s) => Str(s.clone()),
        ExprKind::Name(_) | ExprKind::Path(_) => env.lookup(expr)?.clone(),
        ExprKind::Unary { op, operand } => match (op, fold(*operand, env)?) {
            (UnaryOp::Not, Bool(b)) => Bool(!b),
            (UnaryOp::Neg, Int(n)) => Int(n.checked_neg()?),
            (UnaryOp::Neg, Float(x)) => Float(-x),
            _ => return None,
        },
        ExprKind::Binary { op, lhs, rhs } => {
            let lhs = fold(*lhs, env)?;
            // `&&` and `||` short-circuit like they do at run time.
            match (op, &lhs) {
                (BinaryOp::And, Bool(false)) => return Some(Bool(false)),
                (BinaryOp::Or, Bool(true)) => return Some(Bool(true)),
                _ => {}
            }
            binary(*op, lhs, fold(*rhs, env)?)?
        }
        _ => return None,
    })
}

fn binary(op: BinaryOp, lhs: ConstValue, rhs: ConstValue) -> Option<ConstValue> {
    use ConstValue::*;
    if op.is_comparison() {
        let ordering = match (&lhs, &rhs) {
            (Int(a), Int(b)) => a.partial_cmp(b),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Bool(a), Bool(b)) => a.partial_cmp(b),
            (Str(a), Str(b)) => a.partial_cmp(b),
            _ => None,
        }?;
        return Some(Bool(match op {
            BinaryOp::Eq => ordering.is_eq(),
            BinaryOp::Ne => ordering.is_ne(),
            BinaryOp::Lt => ordering.is_lt(),
            BinaryOp::Le => ordering.is_le(),
            BinaryOp::Gt => ordering.is_gt(),
            _ => ordering.is_ge(),
        }));
    }
    Some(match (op, lhs, rhs) {
        (BinaryOp::And, Bool(a), Bool(b)) => Bool(a && b),
        (BinaryOp::Or, Bool(a), Bool(b)) => Bool(a || b),
        (BinaryOp::Add, Int(a), Int(b)) => Int(a.checked_add(b)?),
        (BinaryOp::Sub, Int(a), Int(b)) => Int(a.checked_sub(b)?),
        (BinaryOp::Mul, Int(a), Int(b)) => Int(a.checked_mul(b)?),
        (BinaryOp::Div, Int(a), Int(b)) => Int(a.checked_div(b)?),
        (BinaryOp::Rem, Int(a), Int(b)) => Int(a.checked_rem(b)?),
        (BinaryOp::Add, Float(a), Float(b)) => Float(a + b),
        (BinaryOp::Sub, Float(a), Float(b)) => Float(a - b),
        (BinaryOp::Mul, Float(a), Float(b)) => Float(a * b),
        (BinaryOp::Div, Float(a), Float(b)) => Float(a / b),
        (BinaryOp::Add, Str(a), Str(b)) => Str(a + &b),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_ast::AstBuilder;

    fn eval(
        ast: &Ast,
        expr: ExprId,
        constants: &HashMap<DeclId, ConstValue>,
        linked: &HashMap<ExprId, DeclId>,
    ) -> Option<ConstValue> {
        let env = ComptimeEnv {
            ast,
            linked,
            constants,
        };
        ConstFolder.evaluate(expr, &env)
    }

    fn fold_plain(ast: &Ast, expr: ExprId) -> Option<ConstValue> {
        eval(ast, expr, &HashMap::new(), &HashMap::new())
    }

    #[test]
    fn test_folds_operators() {
        let mut b = AstBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        let sum = b.binary(BinaryOp::Add, one, two);
        let three = b.int(3);
        let cmp = b.binary(BinaryOp::Eq, sum, three);
        let not = b.unary(UnaryOp::Not, cmp);
        let ast = b.finish();
        assert_eq!(fold_plain(&ast, sum), Some(ConstValue::Int(3)));
        assert_eq!(fold_plain(&ast, cmp), Some(ConstValue::Bool(true)));
        assert_eq!(fold_plain(&ast, not), Some(ConstValue::Bool(false)));
    }

    #[test]
    fn test_undecidable() {
        let mut b = AstBuilder::new();
        let zero = b.int(0);
        let one = b.int(1);
        let div = b.binary(BinaryOp::Div, one, zero);
        let name = b.name("runtime_flag");
        let truthy = b.boolean(true);
        let or = b.binary(BinaryOp::Or, truthy, name);
        let and = b.binary(BinaryOp::And, name, truthy);
        let ast = b.finish();
        assert_eq!(fold_plain(&ast, div), None);
        // Short-circuit decides without looking at the name.
        assert_eq!(fold_plain(&ast, or), Some(ConstValue::Bool(true)));
        assert_eq!(fold_plain(&ast, and), None);

        let (linked, constants) = (HashMap::new(), HashMap::new());
        let env = ComptimeEnv {
            ast: &ast,
            linked: &linked,
            constants: &constants,
        };
        assert_eq!(NoComptime.evaluate(or, &env), None);
    }

    #[test]
    fn test_reads_comptime_bindings() {
        let mut b = AstBuilder::new();
        let init = b.int(8);
        let (_, width) = b.comptime_let("WIDTH", init);
        let name = b.name("WIDTH");
        let eight = b.int(8);
        let cmp = b.binary(BinaryOp::Ge, name, eight);
        let ast = b.finish();
        let constants = HashMap::from([(width, ConstValue::Int(8))]);
        let linked = HashMap::from([(name, width)]);
        assert_eq!(
            eval(&ast, cmp, &constants, &linked),
            Some(ConstValue::Bool(true))
        );
    }
}
