// Operand-stack accounting for emitted Jasmin.
//
// Walks a method's lines in order, tracking the depth in stack words. Jumps
// record the depth at their target; a label reached only by jumps resumes
// from the recorded depth, exception handlers start at one word (the
// thrown object).

use std::collections::{HashMap, HashSet};

use super::Line;
use crate::{Error, Result};

/// Stack words taken by the arguments and the result of a method
/// descriptor such as `(IJ)D`.
pub fn descriptor_words(descriptor: &str) -> Result<(u32, u32)> {
    let malformed = || Error::Internal(format!("malformed method descriptor `{descriptor}`"));
    let open = descriptor.find('(').ok_or_else(malformed)?;
    let close = descriptor.find(')').ok_or_else(malformed)?;
    let args = field_list_words(&descriptor[open + 1..close]).ok_or_else(malformed)?;
    let ret = match &descriptor[close + 1..] {
        "V" => 0,
        other => field_list_words(other).ok_or_else(malformed)?,
    };
    Ok((args, ret))
}

/// Total stack words of a concatenation of field descriptors.
fn field_list_words(list: &str) -> Option<u32> {
    let mut words = 0;
    let mut chars = list.chars();
    while let Some(c) = chars.next() {
        match c {
            'J' | 'D' => words += 2,
            'Z' | 'B' | 'S' | 'C' | 'I' | 'F' => words += 1,
            'L' => {
                chars.by_ref().find(|&c| c == ';')?;
                words += 1;
            }
            '[' => {
                // element type follows; the array reference is one word
                let mut elem = chars.next()?;
                while elem == '[' {
                    elem = chars.next()?;
                }
                if elem == 'L' {
                    chars.by_ref().find(|&c| c == ';')?;
                }
                words += 1;
            }
            _ => return None,
        }
    }
    Some(words)
}

/// Change in stack depth caused by one instruction.
pub fn stack_delta(op: &str, operand: Option<&str>) -> Result<i32> {
    let base = op.split('_').next().unwrap_or(op);
    let delta = match base {
        "iconst" | "fconst" | "bipush" | "sipush" | "ldc" | "aconst" => 1,
        "lconst" | "dconst" | "ldc2" => 2,
        "iload" | "fload" | "aload" => 1,
        "lload" | "dload" => 2,
        "istore" | "fstore" | "astore" => -1,
        "lstore" | "dstore" => -2,
        "dup" => 1,
        "dup2" => 2,
        "pop" => -1,
        "pop2" => -2,
        "swap" | "nop" | "ineg" | "fneg" | "lneg" | "dneg" => 0,
        "iadd" | "isub" | "imul" | "idiv" | "irem" | "iand" | "ior" | "ixor" | "ishl" | "ishr"
        | "iushr" => -1,
        "fadd" | "fsub" | "fmul" | "fdiv" | "frem" => -1,
        "ladd" | "lsub" | "lmul" | "ldiv" | "lrem" | "land" | "lor" | "lxor" => -2,
        "dadd" | "dsub" | "dmul" | "ddiv" | "drem" => -2,
        "lshl" | "lshr" | "lushr" => -1,
        "i2b" | "i2s" | "i2c" | "i2f" | "f2i" | "l2d" | "d2l" => 0,
        "i2l" | "i2d" | "f2l" | "f2d" => 1,
        "l2i" | "l2f" | "d2i" | "d2f" => -1,
        "lcmp" | "dcmpl" | "dcmpg" => -3,
        "fcmpl" | "fcmpg" => -1,
        "ifeq" | "ifne" | "iflt" | "ifge" | "ifgt" | "ifle" | "ifnull" | "ifnonnull" => -1,
        "goto" | "return" => 0,
        "ireturn" | "freturn" | "areturn" | "athrow" => -1,
        "lreturn" | "dreturn" => -2,
        "getstatic" | "putstatic" => {
            let operand = operand.ok_or_else(|| Error::Internal(format!("{op} without operand")))?;
            let desc = operand.rsplit(' ').next().unwrap_or_default();
            let words = field_list_words(desc)
                .ok_or_else(|| Error::Internal(format!("malformed field descriptor `{desc}`")))?
                as i32;
            if base == "getstatic" { words } else { -words }
        }
        "invokestatic" => {
            let operand = operand.ok_or_else(|| Error::Internal(format!("{op} without operand")))?;
            let (args, ret) = descriptor_words(operand)?;
            ret as i32 - args as i32
        }
        _ if op.starts_with("if_icmp") => -2,
        _ => return Err(Error::Internal(format!("no stack effect known for `{op}`"))),
    };
    Ok(delta)
}

fn is_jump(op: &str) -> bool {
    op == "goto" || op.starts_with("if")
}

fn is_terminal(op: &str) -> bool {
    matches!(
        op,
        "goto" | "return" | "ireturn" | "lreturn" | "freturn" | "dreturn" | "areturn" | "athrow"
    )
}

/// Highest operand-stack depth, in words, reached by a method body.
pub fn peak_depth(lines: &[Line]) -> Result<u32> {
    let handlers: HashSet<&str> = lines
        .iter()
        .filter_map(|l| match l {
            Line::Catch { using, .. } => Some(using.as_str()),
            _ => None,
        })
        .collect();

    let mut at_label: HashMap<&str, i32> = HashMap::new();
    let mut depth = 0i32;
    let mut peak = 0i32;
    let mut reachable = true;

    for line in lines {
        match line {
            Line::Label(name) => {
                if handlers.contains(name.as_str()) {
                    depth = 1;
                } else if !reachable {
                    depth = at_label.get(name.as_str()).copied().unwrap_or(0);
                }
                reachable = true;
                peak = peak.max(depth);
            }
            Line::Insn { op, operand, .. } => {
                depth += stack_delta(op, operand.as_deref())?;
                if depth < 0 {
                    return Err(Error::Internal(format!("operand stack underflow at `{line}`")));
                }
                peak = peak.max(depth);
                if is_jump(op)
                    && let Some(target) = operand.as_deref()
                {
                    at_label.insert(target, depth);
                }
                if is_terminal(op) {
                    reachable = false;
                    depth = 0;
                }
            }
            _ => {}
        }
    }
    Ok(peak as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_descriptor_words() {
        assert_eq!(descriptor_words("(II)I").unwrap(), (2, 1));
        assert_eq!(descriptor_words("(IJ)D").unwrap(), (3, 2));
        assert_eq!(descriptor_words("()V").unwrap(), (0, 0));
        assert_eq!(descriptor_words("([ILjava/lang/String;)V").unwrap(), (2, 0));
        assert!(descriptor_words("II").is_err());
    }

    #[test]
    fn call_sequence_peak() {
        let lines = vec![
            Line::insn("iload_0"),
            Line::insn("lload_1"),
            Line::insn_with("invokestatic", "Module/f(IJ)J"),
            Line::insn("lstore_3"),
        ];
        assert_eq!(peak_depth(&lines).unwrap(), 3);
    }

    #[test]
    fn handler_starts_with_exception_on_stack() {
        let lines = vec![
            Line::insn_with("goto", "out"),
            Line::Label("h".into()),
            Line::insn("pop"),
            Line::insn_with("goto", "out"),
            Line::Label("out".into()),
            Line::insn("return"),
            Line::Catch {
                class: "E".into(),
                from: "a".into(),
                to: "b".into(),
                using: "h".into(),
            },
        ];
        assert_eq!(peak_depth(&lines).unwrap(), 1);
    }

    #[test]
    fn underflow_is_reported() {
        let lines = vec![Line::insn("pop")];
        assert!(peak_depth(&lines).is_err());
    }
}
