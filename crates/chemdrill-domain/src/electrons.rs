//! Ground-state electron configurations by the Madelung (n + l) rule.

use std::fmt;

use crate::notation::superscript_number;

/// One subshell in filling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subshell {
    pub n: u32,
    pub l: u32,
}

impl Subshell {
    const fn new(n: u32, l: u32) -> Self {
        Self { n, l }
    }

    /// Electrons the subshell holds when full.
    pub fn capacity(self) -> u32 {
        2 * (2 * self.l + 1)
    }

    pub fn letter(self) -> char {
        match self.l {
            0 => 's',
            1 => 'p',
            2 => 'd',
            _ => 'f',
        }
    }
}

impl fmt::Display for Subshell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.n, self.letter())
    }
}

/// Subshells up to 7p, enough for Z ≤ 118.
pub const FILLING_ORDER: [Subshell; 19] = [
    Subshell::new(1, 0),
    Subshell::new(2, 0),
    Subshell::new(2, 1),
    Subshell::new(3, 0),
    Subshell::new(3, 1),
    Subshell::new(4, 0),
    Subshell::new(3, 2),
    Subshell::new(4, 1),
    Subshell::new(5, 0),
    Subshell::new(4, 2),
    Subshell::new(5, 1),
    Subshell::new(6, 0),
    Subshell::new(4, 3),
    Subshell::new(5, 2),
    Subshell::new(6, 1),
    Subshell::new(7, 0),
    Subshell::new(5, 3),
    Subshell::new(6, 2),
    Subshell::new(7, 1),
];

/// Fill subshells in [`FILLING_ORDER`] and render them space-separated,
/// e.g. `1s² 2s² 2p⁶ 3s¹` for sodium.
///
/// Electrons beyond 7p are dropped; `z == 0` renders as an empty string.
pub fn aufbau_config(z: u32) -> String {
    let mut remaining = z;
    let mut parts = Vec::new();
    for shell in FILLING_ORDER {
        if remaining == 0 {
            break;
        }
        let count = remaining.min(shell.capacity());
        parts.push(format!("{shell}{}", superscript_number(count)));
        remaining -= count;
    }
    if remaining > 0 {
        tracing::warn!(z, remaining, "atomic number exceeds the filling table");
    }
    parts.join(" ")
}
