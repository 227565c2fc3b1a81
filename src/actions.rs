//! Code generation performed when the parser reaches an [Action].

use slog::trace;

use crate::compiler::CompileTarget;
use crate::emit::{
    frame_offset, BEGIN_LABEL_PREFIX, END_LABEL_PREFIX, INTEGER_FORMAT, LOCAL_VAR_OFFSET,
    STRING_FORMAT,
};
use crate::error::CompileError;
use crate::grammar::Action;
use crate::parser::Parser;
use crate::token::Operator;

type Result = std::result::Result<(), CompileError>;

impl Action {
    /// Runs the code generation of this action against the parser state.
    pub(crate) fn execute<T: CompileTarget>(self, p: &mut Parser<T>) -> Result {
        trace!(p.logger(), "action"; "action" => %self);

        match self {
            Action::Prologue => prologue(p),
            Action::Epilogue => epilogue(p),
            Action::Declare => declare(p),
            Action::Store => store(p),
            Action::Compute => compute(p),
            Action::Sign => sign(p),
            Action::PrintIfmt => {
                p.emit(format!("ldr r0, ={}", INTEGER_FORMAT));
                Ok(())
            }
            Action::PrintSfmt => {
                p.emit(format!("ldr r0, ={}", STRING_FORMAT));
                Ok(())
            }
            Action::PrintPrintf => print_printf(p),
            Action::GenLabels => {
                p.push_label();
                Ok(())
            }
            Action::PopLabels => p.pop_label().map(|_| ()),
            Action::BeginLabel => {
                let label = p.current_label()?;
                p.emit_label(format!("{}{}", BEGIN_LABEL_PREFIX, label));
                Ok(())
            }
            Action::EndLabel => {
                let label = p.current_label()?;
                p.emit_label(format!("{}{}", END_LABEL_PREFIX, label));
                Ok(())
            }
            Action::GotoBegin => {
                let label = p.current_label()?;
                p.emit(format!("b {}{}", BEGIN_LABEL_PREFIX, label));
                Ok(())
            }
            Action::GotoEnd => {
                let label = p.current_label()?;
                p.emit(format!("b {}{}", END_LABEL_PREFIX, label));
                Ok(())
            }
            Action::ClearRegs => {
                p.release_all_registers();
                Ok(())
            }
            Action::PushOp => Ok(()),
        }
    }
}

fn prologue<T: CompileTarget>(p: &mut Parser<T>) -> Result {
    p.emit_data("\t.global main");
    p.emit_data("\t.extern printf");
    p.emit_data("\t.data");
    p.emit_data(format!("{}:\t.asciz \"%d\"", INTEGER_FORMAT));
    p.emit_data(format!("{}:\t.asciz \"%s\"", STRING_FORMAT));

    p.emit(".text");
    p.emit_label("main");
    p.emit("push {fp, lr}");
    p.emit("mov fp, sp");

    Ok(())
}

fn epilogue<T: CompileTarget>(p: &mut Parser<T>) -> Result {
    if !p.is_drained() {
        return Err(CompileError::internal("values left on the parser stacks"));
    }

    p.emit("mov r0, #0");
    p.emit("mov sp, fp");
    p.emit("pop {fp, pc}");

    Ok(())
}

fn declare<T: CompileTarget>(p: &mut Parser<T>) -> Result {
    let variable = p.pop_operand()?;
    let slot = p.declare(&variable)?;

    trace!(p.logger(), "declare"; "slot" => slot, "offset" => frame_offset(slot));

    p.emit(format!("sub sp, sp, #{}", -LOCAL_VAR_OFFSET));

    Ok(())
}

fn store<T: CompileTarget>(p: &mut Parser<T>) -> Result {
    let value = p.pop_operand()?;
    let target = p.pop_operand()?;

    if p.pop_operator()? != Operator::Assign {
        return Err(CompileError::internal("store without an assignment"));
    }

    let slot = match p.symbol(target.symbol).slot() {
        Some(slot) => slot,
        None => return Err(p.undefined(&target)),
    };

    let register = p.acquire_register(&value)?;
    p.emit(format!("str {}, [fp, #{}]", register, frame_offset(slot)));

    p.release_register(value.symbol);
    p.release_register(target.symbol);

    Ok(())
}

/// Branch taken when the comparison `op` is false.
fn negated_branch(op: Operator) -> Option<&'static str> {
    let branch = match op {
        Operator::Equal => "bne",
        Operator::NotEqual => "beq",
        Operator::Less => "bge",
        Operator::LessEqual => "bgt",
        Operator::Greater => "ble",
        Operator::GreaterEqual => "blt",
        _ => return None,
    };

    Some(branch)
}

fn arithmetic(op: Operator) -> Option<&'static str> {
    let mnemonic = match op {
        Operator::Add => "add",
        Operator::Subtract => "sub",
        Operator::Multiply => "mul",
        Operator::Divide => "sdiv",
        _ => return None,
    };

    Some(mnemonic)
}

fn compute<T: CompileTarget>(p: &mut Parser<T>) -> Result {
    let op = p.pop_operator()?;
    let right = p.pop_operand()?;
    let left = p.pop_operand()?;

    let lhs = p.acquire_register(&left)?;
    let rhs = p.acquire_register(&right)?;

    p.release_register(left.symbol);
    p.release_register(right.symbol);

    if let Some(branch) = negated_branch(op) {
        let label = p.current_label()?;

        p.emit(format!("cmp {}, {}", lhs, rhs));
        p.emit(format!("{} {}{}", branch, END_LABEL_PREFIX, label));

        return Ok(());
    }

    let mnemonic = arithmetic(op)
        .ok_or_else(|| CompileError::internal("assignment used as a binary operator"))?;

    let result = p.temporary();
    let register = p.acquire_register(&result)?;

    p.emit(format!("{} {}, {}, {}", mnemonic, register, lhs, rhs));
    p.push_operand(result);

    Ok(())
}

fn sign<T: CompileTarget>(p: &mut Parser<T>) -> Result {
    let op = p.pop_operator()?;
    let operand = p.pop_operand()?;

    match op {
        Operator::Add => p.push_operand(operand),
        Operator::Subtract => {
            let source = p.acquire_register(&operand)?;
            p.release_register(operand.symbol);

            let result = p.temporary();
            let register = p.acquire_register(&result)?;

            p.emit(format!("rsb {}, {}, #0", register, source));
            p.push_operand(result);
        }
        _ => return Err(CompileError::internal("sign applied with a non-additive operator")),
    }

    Ok(())
}

fn print_printf<T: CompileTarget>(p: &mut Parser<T>) -> Result {
    let value = p.pop_operand()?;
    let register = p.acquire_register(&value)?;

    p.emit("push {r1-r3, r12}");
    p.emit(format!("mov r1, {}", register));
    p.emit("bl printf");
    p.emit("pop {r1-r3, r12}");

    p.release_register(value.symbol);

    Ok(())
}
