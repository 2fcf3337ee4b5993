use std::fmt;

/// Method access flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// One line of Jasmin output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    MethodBegin {
        visibility: Visibility,
        name: String,
        signature: String,
    },
    Var {
        slot: u32,
        name: String,
        descriptor: String,
        from: String,
        to: String,
    },
    LimitStack(u32),
    LimitLocals(u32),
    Label(String),
    Insn {
        op: String,
        operand: Option<String>,
        comment: Option<String>,
    },
    Catch {
        class: String,
        from: String,
        to: String,
        using: String,
    },
    MethodEnd,
}

impl Line {
    pub fn insn(op: impl Into<String>) -> Self {
        Line::Insn {
            op: op.into(),
            operand: None,
            comment: None,
        }
    }

    pub fn insn_with(op: impl Into<String>, operand: impl Into<String>) -> Self {
        Line::Insn {
            op: op.into(),
            operand: Some(operand.into()),
            comment: None,
        }
    }

    /// Attach a trailing `; comment` to an instruction line.
    #[must_use]
    pub fn with_comment(self, text: Option<String>) -> Self {
        match self {
            Line::Insn { op, operand, .. } => Line::Insn {
                op,
                operand,
                comment: text,
            },
            other => other,
        }
    }

    /// Mnemonic of an instruction line.
    #[must_use]
    pub fn op(&self) -> Option<&str> {
        match self {
            Line::Insn { op, .. } => Some(op),
            _ => None,
        }
    }

    #[must_use]
    pub fn operand(&self) -> Option<&str> {
        match self {
            Line::Insn { operand, .. } => operand.as_deref(),
            _ => None,
        }
    }

    /// `op operand` without the comment, for instruction lines.
    #[must_use]
    pub fn insn_text(&self) -> Option<String> {
        match self {
            Line::Insn {
                op,
                operand: Some(operand),
                ..
            } => Some(format!("{op} {operand}")),
            Line::Insn { op, .. } => Some(op.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::MethodBegin {
                visibility,
                name,
                signature,
            } => write!(f, ".method {visibility} static {name}{signature}"),
            Line::Var {
                slot,
                name,
                descriptor,
                from,
                to,
            } => write!(f, "\t.var {slot} is {name} {descriptor} from {from} to {to}"),
            Line::LimitStack(n) => write!(f, "\t.limit stack {n}"),
            Line::LimitLocals(n) => write!(f, "\t.limit locals {n}"),
            Line::Label(name) => write!(f, "{name}:"),
            Line::Insn {
                op,
                operand,
                comment,
            } => {
                write!(f, "\t{op}")?;
                if let Some(operand) = operand {
                    write!(f, " {operand}")?;
                }
                if let Some(comment) = comment {
                    write!(f, " ; {comment}")?;
                }
                Ok(())
            }
            Line::Catch {
                class,
                from,
                to,
                using,
            } => write!(f, "\t.catch {class} from {from} to {to} using {using}"),
            Line::MethodEnd => write!(f, ".end method"),
        }
    }
}

/// A complete method body, ready to be written into a `.j` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Method {
    pub lines: Vec<Line>,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Turn an IR name into a Jasmin identifier (`[A-Za-z0-9_$]`).
#[must_use]
pub fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
