//! Turns a raw `Instruction` into three canonical forms of increasing
//! fidelity (spec §4.1): opcode-only, equivalence-class, and exact.
//!
//! Each form is a flat string; the hasher folds a sequence of these
//! strings into a single 64-bit fingerprint. Keeping the forms as plain
//! strings (rather than, say, an enum of tokens) keeps the hash function
//! in one place and the canonicalization logic in another, matching how
//! the rest of this engine keeps extraction and fingerprinting separate.

use crate::instruction::Instruction;

/// Sentinel substituted for any numeric immediate literal in the
/// equivalence-class form.
const SENTINEL_IMMEDIATE: &str = "#IMM";
/// Sentinel substituted for a branch target's concrete address.
const SENTINEL_BRANCH: &str = "#BR";
/// Sentinel substituted for a symbolic reference (name + addend dropped).
const SENTINEL_SYMBOL: &str = "#SYM";

/// Opcode-only canonical form: the mnemonic alone. Maximally permissive —
/// two instructions with the same opcode always match here regardless of
/// operands.
pub fn canonical_opcode(insn: &Instruction) -> String {
    insn.opcode.clone()
}

/// Equivalence canonical form: opcode plus an abstracted argument shape.
///
/// - Registers keep their identity (two different registers are distinct).
/// - Numeric immediate literals collapse to [`SENTINEL_IMMEDIATE`].
/// - Branch targets collapse to [`SENTINEL_BRANCH`] (is-branch / is-not,
///   nothing about the destination survives).
/// - Symbolic references collapse to [`SENTINEL_SYMBOL`]; addends are
///   dropped entirely.
pub fn canonical_equivalence(insn: &Instruction) -> String {
    let mut out = String::with_capacity(insn.opcode.len() + insn.arguments.len() * 6);
    out.push_str(&insn.opcode);

    if insn.symbol.is_some() {
        out.push(' ');
        out.push_str(SENTINEL_SYMBOL);
    }

    // The branch destination is conventionally the last operand (e.g.
    // `beq r4, r5, dest`); only that argument collapses to the branch
    // sentinel, so condition registers ahead of it keep their identity.
    let branch_arg_idx = if insn.is_branch() && !insn.arguments.is_empty() {
        Some(insn.arguments.len() - 1)
    } else {
        None
    };

    for (i, arg) in insn.arguments.iter().enumerate() {
        out.push(' ');
        if Some(i) == branch_arg_idx {
            out.push_str(SENTINEL_BRANCH);
        } else if is_numeric_literal(arg) {
            out.push_str(SENTINEL_IMMEDIATE);
        } else {
            out.push_str(arg);
        }
    }

    // A branch with no argument list still carries a destination (e.g.
    // resolved purely through `branch_dest`); collapse it explicitly so
    // is-branch/is-not is still preserved.
    if insn.is_branch() && insn.arguments.is_empty() {
        out.push(' ');
        out.push_str(SENTINEL_BRANCH);
    }

    out
}

/// Exact canonical form: opcode and arguments verbatim, including numeric
/// immediates and symbol names. Two instructions only share this form if
/// they are identical modulo nothing.
pub fn canonical_exact(insn: &Instruction) -> String {
    let mut out = String::with_capacity(insn.opcode.len() + insn.arguments.len() * 6 + 16);
    out.push_str(&insn.opcode);
    if let Some(sym) = &insn.symbol {
        out.push(' ');
        out.push_str(sym);
        if let Some(addend) = insn.addend {
            out.push('+');
            out.push_str(&addend.to_string());
        }
    }
    for arg in &insn.arguments {
        out.push(' ');
        out.push_str(arg);
    }
    out
}

/// Heuristic check for whether an operand string is a bare numeric literal
/// (decimal or `0x`-prefixed hex, optionally signed) as opposed to a
/// register name or other symbolic token.
fn is_numeric_literal(arg: &str) -> bool {
    let s = arg.strip_prefix('-').unwrap_or(arg);
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Canonicalize an entire instruction stream at a given fidelity.
pub fn canonical_stream(
    instructions: &[Instruction],
    form: fn(&Instruction) -> String,
) -> Vec<String> {
    instructions.iter().map(form).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insn(opcode: &str, args: &[&str]) -> Instruction {
        Instruction::new(opcode, args.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn opcode_form_ignores_arguments() {
        let a = insn("add", &["r1", "r2", "5"]);
        let b = insn("add", &["r3", "r4", "9"]);
        assert_eq!(canonical_opcode(&a), canonical_opcode(&b));
    }

    #[test]
    fn equivalence_form_collapses_immediates_but_keeps_registers() {
        let a = insn("add", &["r1", "r2", "5"]);
        let b = insn("add", &["r1", "r2", "9"]);
        let c = insn("add", &["r1", "r3", "5"]);
        assert_eq!(canonical_equivalence(&a), canonical_equivalence(&b));
        assert_ne!(canonical_equivalence(&a), canonical_equivalence(&c));
    }

    #[test]
    fn equivalence_form_collapses_symbol_and_addend() {
        let mut a = insn("lui", &["r1"]);
        a.symbol = Some("foo".to_string());
        a.addend = Some(4);
        let mut b = insn("lui", &["r1"]);
        b.symbol = Some("bar".to_string());
        b.addend = Some(8);
        assert_eq!(canonical_equivalence(&a), canonical_equivalence(&b));
        // Exact form must still distinguish them.
        assert_ne!(canonical_exact(&a), canonical_exact(&b));
    }

    #[test]
    fn equivalence_form_collapses_branch_dest_but_preserves_is_branch() {
        let mut a = insn("b", &["0x1000"]);
        a.branch_dest = Some(0x1000);
        let mut b = insn("b", &["0x2000"]);
        b.branch_dest = Some(0x2000);
        assert_eq!(canonical_equivalence(&a), canonical_equivalence(&b));

        let non_branch = insn("b", &["0x1000"]);
        assert_ne!(canonical_equivalence(&a), canonical_equivalence(&non_branch));
    }

    #[test]
    fn equivalence_form_preserves_registers_on_conditional_branch() {
        // A conditional branch's condition registers are ordinary
        // arguments, not part of the destination -- only the last
        // (destination) argument should collapse.
        let mut a = insn("beq", &["r4", "r5", "0x2000"]);
        a.branch_dest = Some(0x2000);
        let mut b = insn("beq", &["r4", "r5", "0x3000"]);
        b.branch_dest = Some(0x3000);
        assert_eq!(canonical_equivalence(&a), canonical_equivalence(&b));

        let mut different_registers = insn("beq", &["r6", "r7", "0x2000"]);
        different_registers.branch_dest = Some(0x2000);
        assert_ne!(
            canonical_equivalence(&a),
            canonical_equivalence(&different_registers)
        );
    }

    #[test]
    fn exact_form_distinguishes_immediates() {
        let a = insn("add", &["r1", "r2", "5"]);
        let b = insn("add", &["r1", "r2", "9"]);
        assert_ne!(canonical_exact(&a), canonical_exact(&b));
    }

    #[test]
    fn numeric_literal_detection() {
        assert!(is_numeric_literal("5"));
        assert!(is_numeric_literal("-5"));
        assert!(is_numeric_literal("0x1A"));
        assert!(!is_numeric_literal("r1"));
        assert!(!is_numeric_literal(""));
    }
}
