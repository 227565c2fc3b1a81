//! Allocation of the general purpose registers used for computation.
//!
//! The bank has a fixed number of registers and no spilling. Values are
//! materialized lazily: a symbol is loaded when a register is first acquired
//! for it.

use std::fmt;

use slog::{trace, Logger};

use crate::compiler::CompileTarget;
use crate::emit::{frame_offset, Emitter};
use crate::error::{CompileError, ErrorKind};
use crate::parsing::Position;
use crate::symbol_table::{SymbolId, SymbolTable};
use crate::token::Terminal;

/// Number of the first register of the bank.
pub const FIRST_REGISTER: u8 = 4;
/// Number of registers in the bank, `r4` to `r9`.
pub const REGISTER_COUNT: usize = 6;

/// A physical register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register(pub u8);

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterAllocator {
    slots: [Option<SymbolId>; REGISTER_COUNT],
}

impl RegisterAllocator {
    pub fn new() -> RegisterAllocator {
        RegisterAllocator::default()
    }

    fn register(index: usize) -> Register {
        Register(FIRST_REGISTER + index as u8)
    }

    /// Returns the register holding `id`, binding the first free register if it has none.
    ///
    /// Binding a number, a string constant or a variable emits the load of its value.
    /// `position` is the source location the symbol was used at.
    pub fn acquire<T: CompileTarget>(
        &mut self,
        id: SymbolId,
        position: Position,
        symbols: &mut SymbolTable,
        emitter: &mut Emitter<T>,
        logger: &Logger,
    ) -> Result<Register, CompileError> {
        if let Some(register) = symbols.get_symbol(id).register() {
            return Ok(register);
        }

        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or_else(|| {
                CompileError::new(
                    ErrorKind::RegisterExhausted {
                        available: REGISTER_COUNT,
                    },
                    position,
                )
            })?;

        let register = RegisterAllocator::register(index);
        let symbol = symbols.get_symbol(id);

        let load = match symbol.lexeme() {
            None => None,
            Some(lexeme) if lexeme.kind == Terminal::Number => {
                Some(format!("ldr {}, ={}", register, lexeme.text))
            }
            Some(lexeme) if lexeme.kind == Terminal::StringConst => {
                let label = emitter.intern_string(&lexeme.text);
                Some(format!("ldr {}, ={}", register, label))
            }
            Some(_) => match symbol.slot() {
                Some(slot) => Some(format!("ldr {}, [fp, #{}]", register, frame_offset(slot))),
                None => return Err(symbols.undefined(id, position)),
            },
        };

        trace!(logger, "bind register"; "register" => %register, "symbol" => ?id);

        self.slots[index] = Some(id);
        symbols.set_register(id, Some(register));

        if let Some(load) = load {
            emitter.instruction(load);
        }

        Ok(register)
    }

    /// Frees the register holding `id`, if any.
    pub fn release(&mut self, id: SymbolId, symbols: &mut SymbolTable) {
        for slot in self.slots.iter_mut() {
            if *slot == Some(id) {
                *slot = None;
            }
        }

        symbols.set_register(id, None);
    }

    /// Frees every register.
    pub fn release_all(&mut self, symbols: &mut SymbolTable) {
        for slot in self.slots.iter_mut() {
            if let Some(id) = slot.take() {
                symbols.set_register(id, None);
            }
        }
    }

    /// Number of registers currently bound.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
