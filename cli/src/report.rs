//! Human-readable rendering of a failed compilation, built on top of
//! [`rv32im_compiler::diagnostics`].

use rv32im_compiler::diagnostics::Diagnostics;
use rv32im_compiler::CompileError;

/// Prints the most specific message available for `error` to stderr: the
/// offending word and position for an unsupported opcode, the memory
/// breakdown for a constraint violation, or the error's own `Display` for
/// everything else.
pub fn print_compile_failure(error: &CompileError) {
    if let Some(report) = Diagnostics::unsupported_opcode_report(error) {
        eprintln!("{report}");
        return;
    }
    if let Some(report) = Diagnostics::memory_constraint_report(error, None) {
        eprintln!("{report}");
        return;
    }
    eprintln!("{error}");
}
