//! Formula text helpers: Unicode subscripts, charge suffixes, and salt
//! composition by charge cross-multiplication.

const SUBSCRIPT_DIGITS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];
const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

/// Render `n` with Unicode subscript digits.
pub fn to_subscript(n: u32) -> String {
    n.to_string()
        .chars()
        .map(|c| {
            c.to_digit(10)
                .map(|d| SUBSCRIPT_DIGITS[d as usize])
                .unwrap_or(c)
        })
        .collect()
}

pub fn is_subscript_digit(c: char) -> bool {
    SUBSCRIPT_DIGITS.contains(&c)
}

/// Superscript digits and the superscript plus/minus signs.
pub fn is_charge_char(c: char) -> bool {
    SUPERSCRIPT_DIGITS.contains(&c) || c == '⁺' || c == '⁻'
}

/// Strip a trailing Unicode charge suffix: `NH₄⁺` → `NH₄`, `PO₄³⁻` → `PO₄`.
pub fn strip_charge_suffix(formula: &str) -> &str {
    formula.trim_end_matches(is_charge_char)
}

/// Remove every subscript digit: `Ca₃(PO₄)₂` → `Ca(PO)`.
pub fn strip_subscripts(formula: &str) -> String {
    formula.chars().filter(|c| !is_subscript_digit(*c)).collect()
}

/// A base counts as polyatomic when it has more than one uppercase letter.
pub fn is_polyatomic(base: &str) -> bool {
    base.chars().filter(char::is_ascii_uppercase).count() > 1
}

pub fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

pub fn lcm(a: u32, b: u32) -> u32 {
    if a == 0 || b == 0 {
        return 0;
    }
    a / gcd(a, b) * b
}

fn with_multiplicity(base: &str, count: u32) -> String {
    match count {
        0 | 1 => base.to_string(),
        n if is_polyatomic(base) => format!("({base}){}", to_subscript(n)),
        n => format!("{base}{}", to_subscript(n)),
    }
}

/// Compose a neutral salt formula from two ion bases and their charges.
///
/// The subscripts are `lcm(|qc|, |qa|) / |q|` for each ion, so
/// `Ca²⁺ + PO₄³⁻` gives `Ca₃(PO₄)₂`.
pub fn compose_salt(cation_base: &str, cation_charge: u32, anion_base: &str, anion_charge: u32) -> String {
    let total = lcm(cation_charge.max(1), anion_charge.max(1));
    let cation_count = total / cation_charge.max(1);
    let anion_count = total / anion_charge.max(1);
    format!(
        "{}{}",
        with_multiplicity(cation_base, cation_count),
        with_multiplicity(anion_base, anion_count)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscripts_render_multi_digit() {
        assert_eq!(to_subscript(2), "₂");
        assert_eq!(to_subscript(12), "₁₂");
    }

    #[test]
    fn charge_suffix_stripping() {
        assert_eq!(strip_charge_suffix("Na⁺"), "Na");
        assert_eq!(strip_charge_suffix("SO₄²⁻"), "SO₄");
        assert_eq!(strip_charge_suffix("NH₄⁺"), "NH₄");
        assert_eq!(strip_charge_suffix("Cl"), "Cl");
    }

    #[test]
    fn lcm_and_gcd() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(lcm(2, 3), 6);
        assert_eq!(lcm(3, 3), 3);
    }

    #[test]
    fn salt_composition() {
        assert_eq!(compose_salt("Na", 1, "Cl", 1), "NaCl");
        assert_eq!(compose_salt("Ca", 2, "Cl", 1), "CaCl₂");
        assert_eq!(compose_salt("Al", 3, "PO₄", 3), "AlPO₄");
        assert_eq!(compose_salt("Ca", 2, "PO₄", 3), "Ca₃(PO₄)₂");
        assert_eq!(compose_salt("NH₄", 1, "SO₄", 2), "(NH₄)₂SO₄");
        assert_eq!(compose_salt("Fe", 3, "OH", 1), "Fe(OH)₃");
        assert_eq!(compose_salt("Al", 3, "O", 2), "Al₂O₃");
    }

    #[test]
    fn subscript_removal() {
        assert_eq!(strip_subscripts("Ca₃(PO₄)₂"), "Ca(PO)");
        assert!(is_polyatomic("NO₃"));
        assert!(!is_polyatomic("Cl"));
    }
}
