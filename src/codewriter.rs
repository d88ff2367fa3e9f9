//! Code generation: translates classified VM commands into Hack assembly.
use std::io;

use rustc_hash::FxHashSet;

use crate::command::Op;
use crate::segment::Segment;
use crate::symbol::LabelAllocator;

/// Push the value in `D` onto the top of the stack.
/// - load `@SP` into `A`
/// - store `D` at the new top of stack
/// - increment `SP`
#[doc(hidden)]
static PUSH: &str = "\
@SP
A=M
M=D
@SP
M=M+1";

/// Pop the top of the stack into `D`.
/// - decrement `SP`, load the freed address into `A` (and `M`)
/// - load the value at that address into `D`
#[doc(hidden)]
static POP: &str = "\
@SP
AM=M-1
D=M";

fn segment_register(segment: Segment) -> &'static str {
    use Segment::*;
    match segment {
        Local => "LCL",
        Argument => "ARG",
        This => "THIS",
        That => "THAT",
        Constant | Static | Pointer | Temp => {
            unreachable!("{segment} does not have a segment-pointer register")
        }
    }
}

/// Emits Hack assembly for every VM command against a single output stream.
///
/// Holds the translator state from the data model: the current source unit
/// (for `static` namespacing), the current function (for label scoping), and
/// a [`LabelAllocator`] shared by `call`, `eq`, `gt` and `lt`.
pub struct CodeWriter<W: io::Write> {
    w: W,
    current_unit: String,
    current_function: String,
    labels: LabelAllocator,
    #[cfg(debug_assertions)]
    declared: FxHashSet<String>,
}

impl<W: io::Write> CodeWriter<W> {
    /// Creates the writer and emits the bootstrap sequence immediately.
    pub fn new(writer: W) -> anyhow::Result<Self> {
        let mut cw = CodeWriter {
            w: writer,
            current_unit: String::new(),
            current_function: String::new(),
            labels: LabelAllocator::new(),
            #[cfg(debug_assertions)]
            declared: FxHashSet::default(),
        };
        cw.bootstrap()?;
        Ok(cw)
    }

    /// Namespaces `static` symbols to the file currently being translated.
    /// Must be called before translating each source file.
    pub fn set_unit(&mut self, unit: impl Into<String>) {
        self.current_unit = unit.into();
    }

    pub fn finish(mut self) -> anyhow::Result<()> {
        self.w.flush()?;
        Ok(())
    }

    /// Writes `(label)`, asserting in debug builds that no symbol is
    /// declared twice — the live form of the "Uniqueness" testable property.
    fn declare_label(&mut self, label: &str) -> anyhow::Result<()> {
        #[cfg(debug_assertions)]
        {
            anyhow::ensure!(
                self.declared.insert(label.to_string()),
                "duplicate label declaration: {label}"
            );
        }
        writeln!(self.w, "({label})")?;
        Ok(())
    }

    fn static_symbol(&self, index: u16) -> String {
        format!("{}.{}", self.current_unit, index)
    }

    /// Scopes a user label/jump-target to the enclosing function, per the
    /// `<function>$<label>` convention.
    fn scoped_label(&self, name: &str) -> String {
        if self.current_function.is_empty() {
            name.to_string()
        } else {
            format!("{}${}", self.current_function, name)
        }
    }

    /// Allocates the next `<currentFunction>.<n>` generated label base.
    fn next_label(&mut self) -> String {
        format!("{}.{}", self.current_function, self.labels.alloc())
    }

    fn bootstrap(&mut self) -> anyhow::Result<()> {
        // SP = 256
        writeln!(self.w, "@256\nD=A\n@SP\nM=D")?;
        // pseudo-call Sys.init: advance SP by 5 words, LCL = new SP, jump.
        // There is no caller frame to save because Sys.init never returns.
        writeln!(self.w, "@SP\nD=M\n@5\nD=D+A\n@SP\nM=D")?;
        writeln!(self.w, "@SP\nD=M\n@LCL\nM=D")?;
        writeln!(self.w, "@Sys.init\n0;JMP")?;
        Ok(())
    }

    pub fn push(&mut self, segment: Segment, index: u16) -> anyhow::Result<()> {
        use Segment::*;
        match segment {
            Constant => writeln!(self.w, "@{index}\nD=A\n{PUSH}")?,
            Static => writeln!(self.w, "@{}\nD=M\n{PUSH}", self.static_symbol(index))?,
            Pointer if index == 0 => writeln!(self.w, "@THIS\nD=M\n{PUSH}")?,
            Pointer => writeln!(self.w, "@THAT\nD=M\n{PUSH}")?,
            Temp => writeln!(self.w, "@R{}\nD=M\n{PUSH}", 5 + index)?,
            Local | Argument | This | That => {
                let base = segment_register(segment);
                writeln!(self.w, "@{index}\nD=A\n@{base}\nA=D+M\nD=M\n{PUSH}")?;
            }
        }
        Ok(())
    }

    pub fn pop(&mut self, segment: Segment, index: u16) -> anyhow::Result<()> {
        use Segment::*;
        match segment {
            Constant => unreachable!("`pop constant` is rejected by the parser"),
            Static => writeln!(self.w, "{POP}\n@{}\nM=D", self.static_symbol(index))?,
            Pointer if index == 0 => writeln!(self.w, "{POP}\n@THIS\nM=D")?,
            Pointer => writeln!(self.w, "{POP}\n@THAT\nM=D")?,
            Temp => writeln!(self.w, "{POP}\n@R{}\nM=D", 5 + index)?,
            Local | Argument | This | That => {
                let base = segment_register(segment);
                writeln!(
                    self.w,
                    "@{index}\nD=A\n@{base}\nD=D+M\n@R13\nM=D\n{POP}\n@R13\nA=M\nM=D"
                )?;
            }
        }
        Ok(())
    }

    pub fn arithmetic(&mut self, op: Op) -> anyhow::Result<()> {
        match op {
            Op::Add | Op::Sub | Op::And | Op::Or => self.binary(op.comp())?,
            Op::Neg | Op::Not => self.unary(op.comp())?,
            Op::Eq => self.eq()?,
            Op::Gt => self.compare(Op::Gt)?,
            Op::Lt => self.compare(Op::Lt)?,
        }
        Ok(())
    }

    fn binary(&mut self, comp: &str) -> anyhow::Result<()> {
        writeln!(self.w, "{POP}\n@SP\nA=M-1\nM=M{comp}D")?;
        Ok(())
    }

    fn unary(&mut self, comp: &str) -> anyhow::Result<()> {
        writeln!(self.w, "@SP\nA=M-1\nM={comp}M")?;
        Ok(())
    }

    /// 16-bit subtraction is modular, so `x - y ≡ 0 (mod 2^16)` iff `x = y`
    /// regardless of signed overflow — `eq` needs no sign dispatch.
    fn eq(&mut self) -> anyhow::Result<()> {
        let base = self.next_label();
        let (true_l, false_l, append_l) = (
            format!("{base}$IF_TRUE"),
            format!("{base}$IF_FALSE"),
            format!("{base}$APPEND_TO_STACK"),
        );

        // D = y, A -> x (M = x)
        writeln!(self.w, "{POP}\nA=A-1\nD=M-D")?;
        writeln!(self.w, "@{true_l}\nD;JEQ\n@{false_l}\n0;JMP")?;
        self.declare_label(&true_l)?;
        writeln!(self.w, "D=-1\n@{append_l}\n0;JMP")?;
        self.declare_label(&false_l)?;
        writeln!(self.w, "D=0")?;
        self.declare_label(&append_l)?;
        writeln!(self.w, "@SP\nA=M-1\nM=D")?;
        Ok(())
    }

    /// Overflow-safe `gt`/`lt`: pop `y` into `D`, leave `x` addressable via
    /// `SP` (SP is not touched again until the result is stored, so both
    /// operands can be reloaded from it at will). A pair with mismatched
    /// signs resolves immediately without subtracting; a pair with matching
    /// signs subtracts safely, since `x - y` cannot overflow when `x` and
    /// `y` have the same sign.
    ///
    /// The comp field and the jump target share the `A` register on the
    /// Hack platform, so every RAM operand a jump's comp needs (`M`) must be
    /// moved into `D` *before* the `@label` that sets up that jump's target
    /// is emitted — never test `M` right after loading a label address.
    fn compare(&mut self, op: Op) -> anyhow::Result<()> {
        let base = self.next_label();
        let sign_check_l = format!("{base}$SIGN_CHECK");
        let second_check_l = format!("{base}$SECOND_CHECK");
        let compare_by_value_l = format!("{base}$COMPARE_BY_VALUE");
        let true_l = format!("{base}$IF_TRUE");
        let false_l = format!("{base}$IF_FALSE");
        let append_l = format!("{base}$APPEND_TO_STACK");

        // D = y
        writeln!(self.w, "{POP}")?;

        match op {
            Op::Gt => {
                // y < 0: defer to x's sign at sign_check.
                writeln!(self.w, "@{sign_check_l}\nD;JLT")?;
                // y >= 0: x <= 0 => false; x > 0 => same sign, safe subtract.
                writeln!(self.w, "@SP\nA=M-1\nD=M")?;
                writeln!(self.w, "@{false_l}\nD;JLE")?;
                writeln!(self.w, "@{second_check_l}\n0;JMP")?;
                self.declare_label(&sign_check_l)?;
                // y < 0: x >= 0 => true; x < 0 => same sign, safe subtract.
                writeln!(self.w, "@SP\nA=M-1\nD=M")?;
                writeln!(self.w, "@{true_l}\nD;JGE")?;
                writeln!(self.w, "@{second_check_l}\n0;JMP")?;
            }
            Op::Lt => {
                // y > 0: defer to x's sign at sign_check.
                writeln!(self.w, "@{sign_check_l}\nD;JGT")?;
                // y <= 0: x >= 0 => false; x < 0 => same sign, safe subtract.
                writeln!(self.w, "@SP\nA=M-1\nD=M")?;
                writeln!(self.w, "@{false_l}\nD;JGE")?;
                writeln!(self.w, "@{second_check_l}\n0;JMP")?;
                self.declare_label(&sign_check_l)?;
                // y > 0: x <= 0 => true; x > 0 => same sign, safe subtract.
                writeln!(self.w, "@SP\nA=M-1\nD=M")?;
                writeln!(self.w, "@{true_l}\nD;JLE")?;
                writeln!(self.w, "@{second_check_l}\n0;JMP")?;
            }
            Op::Add | Op::Sub | Op::Neg | Op::Eq | Op::And | Op::Or | Op::Not => {
                unreachable!("compare only handles gt/lt")
            }
        }

        self.declare_label(&second_check_l)?;
        self.declare_label(&compare_by_value_l)?;
        // D = x - y: reload x into R13, reload y into D, then subtract.
        writeln!(self.w, "@SP\nA=M-1\nD=M\n@R13\nM=D")?;
        writeln!(self.w, "@SP\nA=M\nD=M\n@R13\nD=M-D")?;
        match op {
            Op::Gt => writeln!(self.w, "@{true_l}\nD;JGT")?,
            Op::Lt => writeln!(self.w, "@{true_l}\nD;JLT")?,
            _ => unreachable!(),
        }
        writeln!(self.w, "@{false_l}\n0;JMP")?;

        self.declare_label(&true_l)?;
        writeln!(self.w, "D=-1\n@{append_l}\n0;JMP")?;
        self.declare_label(&false_l)?;
        writeln!(self.w, "D=0")?;
        self.declare_label(&append_l)?;
        writeln!(self.w, "@SP\nA=M-1\nM=D")?;
        Ok(())
    }

    pub fn label(&mut self, name: &str) -> anyhow::Result<()> {
        let full = self.scoped_label(name);
        self.declare_label(&full)
    }

    pub fn goto(&mut self, name: &str) -> anyhow::Result<()> {
        let full = self.scoped_label(name);
        writeln!(self.w, "@{full}\n1;JNE")?;
        Ok(())
    }

    pub fn if_goto(&mut self, name: &str) -> anyhow::Result<()> {
        let full = self.scoped_label(name);
        writeln!(self.w, "{POP}\n@{full}\nD;JNE")?;
        Ok(())
    }

    pub fn function(&mut self, name: &str, n_locals: u16) -> anyhow::Result<()> {
        self.current_function = name.to_string();
        self.labels.reset();
        self.declare_label(name)?;

        match n_locals {
            0 => {}
            1 => writeln!(self.w, "@SP\nA=M\nM=0\n@SP\nM=M+1")?,
            k => {
                let loop_l = format!("{name}$LOCALS_INIT");
                let done_l = format!("{name}$LOCALS_DONE");

                // R14 = cursor = old SP, R13 = remaining = k, SP += k.
                writeln!(self.w, "@SP\nD=M\n@R14\nM=D")?;
                writeln!(self.w, "@{k}\nD=A\n@R13\nM=D")?;
                writeln!(self.w, "@R14\nD=M\n@{k}\nD=D+A\n@SP\nM=D")?;

                self.declare_label(&loop_l)?;
                writeln!(self.w, "@R13\nD=M\n@{done_l}\nD;JLE")?;
                writeln!(self.w, "@R14\nA=M\nM=0")?;
                writeln!(self.w, "@R14\nM=M+1\n@R13\nM=M-1")?;
                writeln!(self.w, "@{loop_l}\n0;JMP")?;
                self.declare_label(&done_l)?;
            }
        }
        Ok(())
    }

    pub fn call(&mut self, name: &str, n_args: u16) -> anyhow::Result<()> {
        let base = self.next_label();
        let ret = format!("RET_ADDR${base}");

        writeln!(self.w, "@{ret}\nD=A\n{PUSH}")?;
        writeln!(self.w, "@LCL\nD=M\n{PUSH}")?;
        writeln!(self.w, "@ARG\nD=M\n{PUSH}")?;
        writeln!(self.w, "@THIS\nD=M\n{PUSH}")?;
        writeln!(self.w, "@THAT\nD=M\n{PUSH}")?;
        // ARG = SP - 5 - n_args
        writeln!(self.w, "@{}\nD=A\n@SP\nD=M-D\n@ARG\nM=D", n_args as u32 + 5)?;
        // LCL = SP
        writeln!(self.w, "@SP\nD=M\n@LCL\nM=D")?;
        writeln!(self.w, "@{name}\n0;JMP")?;
        self.declare_label(&ret)?;
        Ok(())
    }

    pub fn ret(&mut self) -> anyhow::Result<()> {
        // R13 = FRAME = LCL; R15 = retAddr = RAM[FRAME - 5]
        writeln!(self.w, "@LCL\nD=M\n@R13\nM=D")?;
        writeln!(self.w, "@5\nA=D-A\nD=M\n@R15\nM=D")?;
        // RAM[ARG] = pop()
        writeln!(self.w, "{POP}\n@ARG\nA=M\nM=D")?;
        // SP = ARG + 1
        writeln!(self.w, "@ARG\nD=M+1\n@SP\nM=D")?;
        // R14 descends from FRAME - 1 through FRAME - 4, restoring
        // THAT, THIS, ARG, LCL in that order.
        writeln!(self.w, "@R13\nD=M-1\n@R14\nM=D")?;
        writeln!(self.w, "@R14\nA=M\nD=M\n@THAT\nM=D\n@R14\nM=M-1")?;
        writeln!(self.w, "@R14\nA=M\nD=M\n@THIS\nM=D\n@R14\nM=M-1")?;
        writeln!(self.w, "@R14\nA=M\nD=M\n@ARG\nM=D\n@R14\nM=M-1")?;
        writeln!(self.w, "@R14\nA=M\nD=M\n@LCL\nM=D")?;
        writeln!(self.w, "@R15\nA=M\n0;JMP")?;
        Ok(())
    }
}
