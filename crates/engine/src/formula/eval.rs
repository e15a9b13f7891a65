// Formula evaluation - walks the AST with a variable binding table.

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use super::parser::{self, Expr, Op, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,
}

/// A parsed formula plus the numeric bindings for its cell references.
///
/// Built fresh on every text edit; nothing is cached across edits. The
/// caller binds each referenced cell's value with `set_variable` once the
/// reference has passed validation, then calls `evaluate`. Unbound
/// variables evaluate as 0.0, which is what an empty referenced cell
/// contributes.
#[derive(Debug, Clone)]
pub struct FormulaTree {
    ast: Expr,
    variables: FxHashMap<String, f64>,
}

impl FormulaTree {
    /// Parse formula source (leading '=' already stripped).
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        Ok(Self {
            ast: parser::parse(source)?,
            variables: FxHashMap::default(),
        })
    }

    /// Distinct cell names referenced by the formula, uppercase normalized.
    /// No order guarantee.
    pub fn variable_names(&self) -> FxHashSet<String> {
        let mut names = FxHashSet::default();
        collect_variables(&self.ast, &mut names);
        names
    }

    /// Bind a numeric value to a referenced cell name.
    pub fn set_variable(&mut self, name: &str, value: f64) {
        self.variables.insert(name.to_ascii_uppercase(), value);
    }

    pub fn evaluate(&self) -> Result<f64, EvalError> {
        evaluate(&self.ast, &self.variables)
    }
}

fn collect_variables(expr: &Expr, names: &mut FxHashSet<String>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Variable(name) => {
            names.insert(name.clone());
        }
        Expr::BinaryOp { left, right, .. } => {
            collect_variables(left, names);
            collect_variables(right, names);
        }
    }
}

fn evaluate(expr: &Expr, variables: &FxHashMap<String, f64>) -> Result<f64, EvalError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Variable(name) => Ok(variables.get(name).copied().unwrap_or(0.0)),
        Expr::BinaryOp { op, left, right } => {
            let left = evaluate(left, variables)?;
            let right = evaluate(right, variables)?;
            match op {
                Op::Add => Ok(left + right),
                Op::Sub => Ok(left - right),
                Op::Mul => Ok(left * right),
                Op::Div => {
                    if right == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    Ok(left / right)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_arithmetic() {
        let tree = FormulaTree::parse("1+2*3").unwrap();
        assert_eq!(tree.evaluate().unwrap(), 7.0);

        let tree = FormulaTree::parse("(1+2)*3").unwrap();
        assert_eq!(tree.evaluate().unwrap(), 9.0);

        let tree = FormulaTree::parse("10-4/2").unwrap();
        assert_eq!(tree.evaluate().unwrap(), 8.0);
    }

    #[test]
    fn test_evaluate_with_bindings() {
        let mut tree = FormulaTree::parse("A1+B2*2").unwrap();
        tree.set_variable("A1", 5.0);
        tree.set_variable("B2", 3.0);
        assert_eq!(tree.evaluate().unwrap(), 11.0);
    }

    #[test]
    fn test_set_variable_case_insensitive() {
        let mut tree = FormulaTree::parse("A1").unwrap();
        tree.set_variable("a1", 4.0);
        assert_eq!(tree.evaluate().unwrap(), 4.0);
    }

    #[test]
    fn test_unbound_variable_is_zero() {
        let tree = FormulaTree::parse("A1+3").unwrap();
        assert_eq!(tree.evaluate().unwrap(), 3.0);
    }

    #[test]
    fn test_variable_names_distinct() {
        let tree = FormulaTree::parse("a1+A1+B2").unwrap();
        let names = tree.variable_names();
        assert_eq!(names.len(), 2);
        assert!(names.contains("A1"));
        assert!(names.contains("B2"));
    }

    #[test]
    fn test_division_by_zero() {
        let tree = FormulaTree::parse("1/0").unwrap();
        assert_eq!(tree.evaluate(), Err(EvalError::DivisionByZero));

        // Reached through an unbound variable too
        let tree = FormulaTree::parse("1/A1").unwrap();
        assert_eq!(tree.evaluate(), Err(EvalError::DivisionByZero));
    }
}
