//! Statement lowering
//!
//! Each statement is generated between two labels: `before`, where its code
//! starts, and `after`, where control continues once it is done. A label is
//! only placed in the output when some branch targets it, which is what
//! [`Statement::needs_before_label`] and [`Statement::needs_after_label`]
//! report:
//!
//! | statement  | before | after |
//! |------------|--------|-------|
//! | `if`       | no     | yes   |
//! | `while`    | yes    | yes   |
//! | `do while` | yes    | yes   |
//! | sequence   | head's | last statement's |
//! | others     | no     | no    |
//!
//! Whoever generates a statement places `before` first if it is needed and
//! `after` once the statement is done.

use super::generator::{Generator, Label};
use crate::errors::CompileError;
use crate::parser::ast::{Statement, StmtKind};

impl Statement {
    /// Whether something branches back to the start of this statement
    pub fn needs_before_label(&self) -> bool {
        match &self.kind {
            StmtKind::Sequence { head, .. } => head.needs_before_label(),
            StmtKind::While { .. } | StmtKind::DoWhile { .. } => true,
            _ => false,
        }
    }

    /// Whether something branches to the point after this statement
    pub fn needs_after_label(&self) -> bool {
        match &self.kind {
            StmtKind::Sequence { head, tail } => match tail {
                Some(tail) => tail.needs_after_label(),
                None => head.needs_after_label(),
            },
            StmtKind::If { .. } | StmtKind::While { .. } | StmtKind::DoWhile { .. } => true,
            _ => false,
        }
    }
}

impl Generator {
    /// Generate `statement`, which starts at `before` and continues at `after`
    pub fn statement(
        &mut self,
        statement: &Statement,
        before: Label,
        after: Label,
    ) -> Result<(), CompileError> {
        match &statement.kind {
            StmtKind::Empty => Ok(()),

            StmtKind::Sequence { head, tail } => {
                let Some(tail) = tail else {
                    return self.statement(head, before, after);
                };
                let between = self.reserve_label();
                self.statement(head, before, between)?;
                if head.needs_after_label() || tail.needs_before_label() {
                    self.append_label(between);
                }
                self.statement(tail, between, after)
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch: None,
            } => {
                let then_label = self.reserve_label();
                self.generate_branches(condition, Some(then_label), Some(after))?;
                self.append_label(then_label);
                self.statement(then_branch, then_label, after)
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch: Some(else_branch),
            } => {
                let then_label = self.reserve_label();
                let else_label = self.reserve_label();
                self.generate_branches(condition, Some(then_label), Some(else_label))?;
                self.append_label(then_label);
                self.statement(then_branch, then_label, after)?;
                // the else branch follows; it must not be entered by falling through
                self.jump_to(after);
                self.append_label(else_label);
                self.statement(else_branch, else_label, after)
            }

            StmtKind::While { condition, body } => {
                let body_label = self.reserve_label();
                self.generate_branches(condition, Some(body_label), Some(after))?;
                self.append_label(body_label);
                self.loop_exits.push(after);
                let result = self.statement(body, body_label, before);
                self.loop_exits.pop();
                result?;
                self.jump_to(before);
                Ok(())
            }

            StmtKind::DoWhile { body, condition } => {
                let condition_label = self.reserve_label();
                self.loop_exits.push(after);
                let result = self.statement(body, before, condition_label);
                self.loop_exits.pop();
                result?;
                self.append_label(condition_label);
                self.generate_branches(condition, Some(before), Some(after))
            }

            StmtKind::Assignment { target, value } => {
                let value = self.convert(value, target.ty())?;
                let address = self.address(target)?;
                self.append(format!(
                    "store {}, {}* {}",
                    value.typed(),
                    value.ty,
                    address
                ));
                Ok(())
            }

            StmtKind::Return { value, return_type } => {
                match value {
                    Some(value) => {
                        let value = self.convert(value, return_type)?;
                        self.append(format!("ret {}", value.typed()));
                    }
                    None => self.append("ret void"),
                }
                Ok(())
            }

            StmtKind::Break => {
                if let Some(&exit) = self.loop_exits.last() {
                    self.jump_to(exit);
                    Ok(())
                } else {
                    Err(CompileError::MisplacedBreak {
                        line: statement.line,
                    })
                }
            }

            StmtKind::Expression(expression) => {
                self.reduce(expression)?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Expression;
    use crate::parser::types::Type;

    fn ret() -> Statement {
        Statement::new(
            StmtKind::Return {
                value: None,
                return_type: Type::Void,
            },
            1,
        )
    }

    fn while_false() -> Statement {
        Statement::new(
            StmtKind::While {
                condition: Expression::boolean(false, 1),
                body: Box::new(Statement::new(StmtKind::Empty, 1)),
            },
            1,
        )
    }

    #[test]
    fn test_label_requirements() {
        assert!(!ret().needs_before_label());
        assert!(!ret().needs_after_label());
        assert!(while_false().needs_before_label());
        assert!(while_false().needs_after_label());

        let sequence = Statement::sequence(vec![ret(), while_false()], 1);
        assert!(!sequence.needs_before_label());
        assert!(sequence.needs_after_label());

        let sequence = Statement::sequence(vec![while_false(), ret()], 1);
        assert!(sequence.needs_before_label());
        assert!(!sequence.needs_after_label());
    }

    #[test]
    fn test_while_false_skips_body() {
        let mut gen = Generator::new();
        let before = gen.reserve_label();
        let after = gen.reserve_label();
        gen.append_label(before);
        gen.statement(&while_false(), before, after).unwrap();
        gen.append_label(after);

        // L3 (the body) is only placed after the jump to L2
        assert_eq!(
            gen.output(),
            "  br label %L1\nL1:\n  br label %L2\nL3:\n  br label %L1\nL2:\n"
        );
    }

    #[test]
    fn test_break_jumps_to_loop_exit() {
        let mut gen = Generator::new();
        let before = gen.reserve_label();
        let after = gen.reserve_label();
        let body = Statement::new(StmtKind::Break, 1);
        let do_while = Statement::new(
            StmtKind::DoWhile {
                body: Box::new(body),
                condition: Expression::boolean(true, 1),
            },
            1,
        );
        gen.append_label(before);
        gen.statement(&do_while, before, after).unwrap();

        assert!(gen.output().contains("L1:\n  br label %L2\n"));
        assert!(gen.loop_exits.is_empty());
    }
}
