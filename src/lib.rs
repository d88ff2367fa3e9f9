#![forbid(unsafe_code)]

use std::{fs, path::Path};

pub mod codewriter;
pub mod command;
pub mod error;
pub mod parser;
pub mod segment;
pub(crate) mod symbol;

pub use codewriter::CodeWriter;
pub use command::{Command, Op};
pub use error::{ParseError, ParseErrorKind};
pub use parser::Parser;
pub use segment::Segment;

/// A path is translatable input iff it is a regular file with a `.vm`
/// extension (case-insensitive), matching the textbook convention.
pub fn is_vm_file<P: AsRef<Path>>(p: P) -> bool {
    let path = p.as_ref();
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("vm"))
}

pub fn read_vm_file<P: AsRef<Path>>(path: P) -> anyhow::Result<String> {
    assert!(is_vm_file(path.as_ref()));
    Ok(fs::read_to_string(path)?)
}

/// The file stem is also the VM source unit's name, used to namespace
/// `static` symbols and in diagnostics.
pub fn extract_vm_name(path: &Path) -> anyhow::Result<&str> {
    path.file_stem()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow::anyhow!("could not derive a unit name from {}", path.display()))
}

/// Translates one already-parsed command stream into assembly, reporting the
/// source line via `anyhow::Context` on failure so the orchestrator can
/// attach file/line information uniformly to both syntax and codegen errors.
pub fn translate_command<W: std::io::Write>(
    cw: &mut codewriter::CodeWriter<W>,
    command: &Command,
) -> anyhow::Result<()> {
    use Command::*;
    match command {
        Arithmetic(op) => cw.arithmetic(*op),
        Push(segment, index) => cw.push(*segment, *index),
        Pop(segment, index) => cw.pop(*segment, *index),
        Label(name) => cw.label(name),
        Goto(name) => cw.goto(name),
        IfGoto(name) => cw.if_goto(name),
        Function(name, n_locals) => cw.function(name, *n_locals),
        Call(name, n_args) => cw.call(name, *n_args),
        Return => cw.ret(),
    }
}
