use std::fmt;

use crate::error::{ParseErrorKind, ParseErrorKind::*};
use crate::segment::Segment;

pub type Symbol<'a> = &'a str;

/// One of the nine arithmetic/logical VM operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl Op {
    /// The Hack comp operator this op maps to, for the unary/binary ops that
    /// translate directly (`eq`/`gt`/`lt` need the fuller sign-dispatch
    /// sequence in the code writer and are not representable as a single
    /// comp operator).
    pub fn comp(self) -> &'static str {
        use Op::*;
        match self {
            Add => "+",
            Sub | Neg => "-",
            And => "&",
            Or => "|",
            Not => "!",
            Eq | Gt | Lt => unreachable!("comparisons are not single comp operators"),
        }
    }

    pub fn is_unary(self) -> bool {
        matches!(self, Op::Neg | Op::Not)
    }
}

/// A single classified VM instruction. Holds its arguments by value, in place
/// of the original parser's `arg1`/`arg2` accessors over hidden match state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'s> {
    Arithmetic(Op),
    Push(Segment, u16),
    Pop(Segment, u16),
    Label(Symbol<'s>),
    Goto(Symbol<'s>),
    IfGoto(Symbol<'s>),
    /// function name, number of local variables
    Function(Symbol<'s>, u16),
    /// function name, number of arguments
    Call(Symbol<'s>, u16),
    Return,
}

impl<'s> Command<'s> {
    /// Classify one already-trimmed, comment-stripped, non-empty line.
    pub fn parse(line: &'s str) -> Result<Self, ParseErrorKind> {
        use Command::*;

        let mut tokens = line.split_whitespace();
        let mnemonic = tokens.next().ok_or(MissingOperand("a VM instruction"))?;

        let command = match mnemonic {
            "add" => Arithmetic(Op::Add),
            "sub" => Arithmetic(Op::Sub),
            "neg" => Arithmetic(Op::Neg),
            "eq" => Arithmetic(Op::Eq),
            "gt" => Arithmetic(Op::Gt),
            "lt" => Arithmetic(Op::Lt),
            "and" => Arithmetic(Op::And),
            "or" => Arithmetic(Op::Or),
            "not" => Arithmetic(Op::Not),
            "push" | "pop" => {
                let segment = parse_segment(&mut tokens)?;
                let index = parse_index(&mut tokens)?;
                validate_segment_index(segment, index)?;

                if mnemonic == "push" {
                    Push(segment, index)
                } else {
                    if segment == Segment::Constant {
                        return Err(PopIntoConstant);
                    }
                    Pop(segment, index)
                }
            }
            "label" | "goto" | "if-goto" => {
                let name = parse_symbol(&mut tokens)?;
                match mnemonic {
                    "label" => Label(name),
                    "goto" => Goto(name),
                    _ => IfGoto(name),
                }
            }
            "function" => {
                let name = parse_symbol(&mut tokens)?;
                let n_locals = parse_index(&mut tokens)?;
                Function(name, n_locals)
            }
            "call" => {
                let name = parse_symbol(&mut tokens)?;
                let n_args = parse_index(&mut tokens)?;
                Call(name, n_args)
            }
            "return" => Return,
            _ => return Err(UnknownInstruction(mnemonic.to_string())),
        };

        Ok(command)
    }
}

fn parse_segment<'s>(tokens: &mut impl Iterator<Item = &'s str>) -> Result<Segment, ParseErrorKind> {
    let token = tokens.next().ok_or(MissingOperand("a segment name"))?;
    Segment::try_from(token).map_err(|_| UnknownSegment(token.to_string()))
}

fn parse_index<'s>(tokens: &mut impl Iterator<Item = &'s str>) -> Result<u16, ParseErrorKind> {
    let token = tokens.next().ok_or(MissingOperand("a non-negative index"))?;
    token
        .parse()
        .map_err(|_| InvalidIndex(token.to_string()))
}

fn parse_symbol<'s>(tokens: &mut impl Iterator<Item = &'s str>) -> Result<&'s str, ParseErrorKind> {
    let token = tokens.next().ok_or(MissingOperand("a label or function name"))?;
    if is_valid_symbol(token) {
        Ok(token)
    } else {
        Err(InvalidSymbol(token.to_string()))
    }
}

fn validate_segment_index(segment: Segment, index: u16) -> Result<(), ParseErrorKind> {
    match segment {
        Segment::Pointer if index > 1 => Err(PointerOutOfRange(index)),
        Segment::Temp if index > 7 => Err(TempOutOfRange(index)),
        _ => Ok(()),
    }
}

fn is_valid_symbol(symbol: &str) -> bool {
    let mut chars = symbol.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    !first.is_ascii_digit()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':'))
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Op::*;
        let s = match self {
            Add => "add",
            Sub => "sub",
            Neg => "neg",
            Eq => "eq",
            Gt => "gt",
            Lt => "lt",
            And => "and",
            Or => "or",
            Not => "not",
        };
        write!(f, "{s}")
    }
}
