use std::fmt;

/// A VM memory segment addressed by a non-negative index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// base address of the `local` segment in the current function, `RAM[1]`
    Local,
    /// base address of the `argument` segment in the current function, `RAM[2]`
    Argument,
    /// `<unit>.<index>`, allocated by the assembler
    Static,
    /// no runtime address, the index itself is the value
    Constant,
    /// `RAM[3]`
    This,
    /// `RAM[4]`
    That,
    /// `RAM[3]` for index 0, `RAM[4]` for index 1
    Pointer,
    /// `RAM[5..=12]`
    Temp,
}

impl TryFrom<&str> for Segment {
    type Error = ();

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        use Segment::*;

        let segment = match s {
            "local" => Local,
            "argument" => Argument,
            "static" => Static,
            "constant" => Constant,
            "this" => This,
            "that" => That,
            "pointer" => Pointer,
            "temp" => Temp,
            _ => return Err(()),
        };

        Ok(segment)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Segment::*;

        let seg = match self {
            Local => "local",
            Argument => "argument",
            Static => "static",
            Constant => "constant",
            This => "this",
            That => "that",
            Pointer => "pointer",
            Temp => "temp",
        };

        write!(f, "{seg}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display() {
        for seg in [
            Segment::Local,
            Segment::Argument,
            Segment::Static,
            Segment::Constant,
            Segment::This,
            Segment::That,
            Segment::Pointer,
            Segment::Temp,
        ] {
            let rendered = seg.to_string();
            assert_eq!(Segment::try_from(rendered.as_str()).unwrap(), seg);
        }
    }

    #[test]
    fn rejects_unknown_segment() {
        assert!(Segment::try_from("heap").is_err());
    }
}
