//! Unicode superscript notation for charges and electron counts.

const DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

/// Render a non-negative number in superscript digits.
pub fn superscript_number(n: u32) -> String {
    n.to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| DIGITS[d as usize])
        .collect()
}

/// Ion-style charge notation: magnitude first, then the sign.
///
/// A magnitude of one is written as the bare sign (`Na⁺`, `Cl⁻`); zero is `⁰`.
pub fn charge_superscript(charge: i32) -> String {
    let sign = match charge.signum() {
        1 => '⁺',
        -1 => '⁻',
        _ => return DIGITS[0].to_string(),
    };
    let magnitude = charge.unsigned_abs();
    if magnitude == 1 {
        sign.to_string()
    } else {
        format!("{}{sign}", superscript_number(magnitude))
    }
}
