//! Colors for cell attributes.

#[cfg(feature = "use_serde")]
use serde::{Deserialize, Serialize};

#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
#[repr(u8)]
/// These correspond to the classic ANSI color indices and are
/// used for convenience/readability here in the code
pub enum AnsiColor {
    Black = 0,
    Maroon,
    Green,
    Olive,
    Navy,
    Purple,
    Teal,
    Silver,
    Grey,
    Red,
    Lime,
    Yellow,
    Blue,
    Fuschia,
    Aqua,
    White,
}

#[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct RgbColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbColor {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// A cell's foreground or background color: either the current
/// theme's default for that role, an indexed palette entry, or a
/// direct RGB triple.
#[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CharacterColor {
    Foreground,
    Background,
    PaletteIndex(u8),
    Rgb(RgbColor),
}

impl Default for CharacterColor {
    fn default() -> Self {
        CharacterColor::Foreground
    }
}

/// Resolves `CharacterColor` values to concrete RGB. Glyph rendering
/// itself is out of scope for this core; this is the small piece of
/// color math every consumer of the cell grid still needs.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: [RgbColor; 256],
    foreground: RgbColor,
    background: RgbColor,
}

impl ColorPalette {
    pub fn resolve(&self, color: CharacterColor) -> RgbColor {
        match color {
            CharacterColor::Foreground => self.foreground,
            CharacterColor::Background => self.background,
            CharacterColor::PaletteIndex(idx) => self.colors[idx as usize],
            CharacterColor::Rgb(rgb) => rgb,
        }
    }
}

impl Default for ColorPalette {
    fn default() -> ColorPalette {
        let mut colors = [RgbColor::default(); 256];

        // The XTerm ansi color set
        static ANSI: [RgbColor; 16] = [
            RgbColor::new(0x00, 0x00, 0x00), // Black
            RgbColor::new(0xcc, 0x55, 0x55), // Maroon
            RgbColor::new(0x55, 0xcc, 0x55), // Green
            RgbColor::new(0xcd, 0xcd, 0x55), // Olive
            RgbColor::new(0x54, 0x55, 0xcb), // Navy
            RgbColor::new(0xcc, 0x55, 0xcc), // Purple
            RgbColor::new(0x7a, 0xca, 0xca), // Teal
            RgbColor::new(0xcc, 0xcc, 0xcc), // Silver
            RgbColor::new(0x55, 0x55, 0x55), // Grey
            RgbColor::new(0xff, 0x55, 0x55), // Red
            RgbColor::new(0x55, 0xff, 0x55), // Lime
            RgbColor::new(0xff, 0xff, 0x55), // Yellow
            RgbColor::new(0x55, 0x55, 0xff), // Blue
            RgbColor::new(0xff, 0x55, 0xff), // Fuschia
            RgbColor::new(0x55, 0xff, 0xff), // Aqua
            RgbColor::new(0xff, 0xff, 0xff), // White
        ];
        colors[0..16].copy_from_slice(&ANSI);

        // 216 color cube
        static RAMP6: [u8; 6] = [0x00, 0x33, 0x66, 0x99, 0xCC, 0xFF];
        for idx in 0..216 {
            let red = RAMP6[idx % 6];
            let green = RAMP6[idx / 6 % 6];
            let blue = RAMP6[idx / 6 / 6 % 6];
            colors[16 + idx] = RgbColor::new(red, green, blue);
        }

        // 24 grey scales
        static GREYS: [u8; 24] = [
            0x08, 0x12, 0x1c, 0x26, 0x30, 0x3a, 0x44, 0x4e, 0x58, 0x62, 0x6c, 0x76, 0x80, 0x8a,
            0x94, 0x9e, 0xa8, 0xb2, 0xbc, 0xc6, 0xd0, 0xda, 0xe4, 0xee,
        ];
        for idx in 0..24 {
            let grey = GREYS[idx];
            colors[232 + idx] = RgbColor::new(grey, grey, grey);
        }

        let foreground = colors[249]; // Grey70
        let background = colors[AnsiColor::Black as usize];

        ColorPalette {
            colors,
            foreground,
            background,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resolves_named_roles() {
        let pal = ColorPalette::default();
        assert_eq!(pal.resolve(CharacterColor::Foreground), pal.foreground);
        assert_eq!(pal.resolve(CharacterColor::Background), pal.background);
    }

    #[test]
    fn resolves_palette_index() {
        let pal = ColorPalette::default();
        assert_eq!(
            pal.resolve(CharacterColor::PaletteIndex(1)),
            RgbColor::new(0xcc, 0x55, 0x55)
        );
    }

    #[test]
    fn resolves_rgb_passthrough() {
        let pal = ColorPalette::default();
        let rgb = RgbColor::new(1, 2, 3);
        assert_eq!(pal.resolve(CharacterColor::Rgb(rgb)), rgb);
    }
}
