//! Color representation

use std::fmt;

/// A cell color packed as ARGB into a `u32`
///
/// All bits set ([`Color::NONE`]) means no color has been assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color(pub u32);

impl Color {
    /// No color set
    pub const NONE: Color = Color(0xFFFF_FFFF);

    /// Create a color from its channels
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Color((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Create an opaque color from its RGB channels
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::from_argb(0xFF, r, g, b)
    }

    /// Create from a hex string (e.g., "#FF0000" or "80FF0000")
    ///
    /// Six digits give an opaque color; eight digits carry the alpha channel first.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        match hex.len() {
            6 => u32::from_str_radix(hex, 16).ok().map(|rgb| Color(0xFF00_0000 | rgb)),
            8 => u32::from_str_radix(hex, 16).ok().map(Color),
            _ => None,
        }
    }

    /// Convert to an 8-digit ARGB hex string (without # prefix)
    pub fn to_hex(&self) -> String {
        format!("{:08X}", self.0)
    }

    /// Packed ARGB value
    pub const fn argb(&self) -> u32 {
        self.0
    }

    /// Alpha, red, green and blue channels
    pub const fn channels(&self) -> (u8, u8, u8, u8) {
        (
            (self.0 >> 24) as u8,
            (self.0 >> 16) as u8,
            (self.0 >> 8) as u8,
            self.0 as u8,
        )
    }

    /// Check if a color other than [`Color::NONE`] is assigned
    pub fn is_set(&self) -> bool {
        *self != Self::NONE
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}
