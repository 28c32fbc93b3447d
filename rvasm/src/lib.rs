use rvisa::Isa;

pub mod debuginfo;
pub mod diag;
pub mod directive;
pub mod expr;
pub mod lexer;
pub mod line;
mod pass_one;
mod pass_three;
mod pass_two;
mod pass_zero;
pub mod program;
pub mod symbols;

pub use diag::{Diagnostic, Diagnostics, ErrorKind};
pub use line::SourceLine;
pub use program::{ProgramImage, Section};

/// The pass driver. Holds a reference to the instruction set description and
/// nothing else; every `assemble` call is independent.
pub struct Assembler<'a> {
    isa: &'a Isa,
}

impl<'a> Assembler<'a> {
    pub fn new(isa: &'a Isa) -> Self {
        Assembler { isa }
    }

    /// Run the four passes in order. Each pass returns either its artifact
    /// or the errors it collected; the first pass to fail stops the
    /// pipeline, so later passes never see the fallout of earlier mistakes.
    pub fn assemble(&self, source: &str) -> Result<ProgramImage, Diagnostics> {
        let program = pass_zero::pass_zero(source)?;
        let program = pass_one::pass_one(self.isa, program)?;
        let layout = pass_two::pass_two(self.isa, &program)?;
        pass_three::pass_three(self.isa, &program, layout)
    }
}

/// Assemble a program with the built-in RV32IM instruction set.
///
/// # Errors
///
/// The diagnostics collected by the first pass that failed, each keyed to a
/// 1-based source line number.
pub fn assemble(source: &str) -> Result<ProgramImage, Diagnostics> {
    Assembler::new(rvisa::rv32i::rv32im()).assemble(source)
}
