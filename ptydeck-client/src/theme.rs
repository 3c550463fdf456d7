use anstyle::RgbColor;
use ptydeck_config::ThemeMode;

/// Colors pushed to display surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemePalette {
    pub mode: ThemeMode,
    pub background: RgbColor,
    pub foreground: RgbColor,
    pub cursor: RgbColor,
    pub selection: RgbColor,
    /// Standard and bright ANSI colors, indices 0-15.
    pub ansi: [RgbColor; 16],
}

impl ThemePalette {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    pub fn dark() -> Self {
        Self {
            mode: ThemeMode::Dark,
            background: RgbColor(0x1e, 0x1e, 0x1e),
            foreground: RgbColor(0xcc, 0xcc, 0xcc),
            cursor: RgbColor(0xff, 0xff, 0xff),
            selection: RgbColor(0x26, 0x4f, 0x78),
            ansi: [
                RgbColor(0x00, 0x00, 0x00),
                RgbColor(0xcd, 0x31, 0x31),
                RgbColor(0x0d, 0xbc, 0x79),
                RgbColor(0xe5, 0xe5, 0x10),
                RgbColor(0x24, 0x72, 0xc8),
                RgbColor(0xbc, 0x3f, 0xbc),
                RgbColor(0x11, 0xa8, 0xcd),
                RgbColor(0xe5, 0xe5, 0xe5),
                RgbColor(0x66, 0x66, 0x66),
                RgbColor(0xf1, 0x4c, 0x4c),
                RgbColor(0x23, 0xd1, 0x8b),
                RgbColor(0xf5, 0xf5, 0x43),
                RgbColor(0x3b, 0x8e, 0xea),
                RgbColor(0xd6, 0x70, 0xd6),
                RgbColor(0x29, 0xb8, 0xdb),
                RgbColor(0xff, 0xff, 0xff),
            ],
        }
    }

    pub fn light() -> Self {
        Self {
            mode: ThemeMode::Light,
            background: RgbColor(0xff, 0xff, 0xff),
            foreground: RgbColor(0x33, 0x33, 0x33),
            cursor: RgbColor(0x00, 0x00, 0x00),
            selection: RgbColor(0xad, 0xd6, 0xff),
            ansi: [
                RgbColor(0x00, 0x00, 0x00),
                RgbColor(0xcd, 0x31, 0x31),
                RgbColor(0x00, 0xbc, 0x00),
                RgbColor(0x94, 0x98, 0x00),
                RgbColor(0x04, 0x51, 0xa5),
                RgbColor(0xbc, 0x05, 0xbc),
                RgbColor(0x05, 0x98, 0xbc),
                RgbColor(0x55, 0x55, 0x55),
                RgbColor(0x66, 0x66, 0x66),
                RgbColor(0xcd, 0x31, 0x31),
                RgbColor(0x14, 0xce, 0x14),
                RgbColor(0xb5, 0xba, 0x00),
                RgbColor(0x04, 0x51, 0xa5),
                RgbColor(0xbc, 0x05, 0xbc),
                RgbColor(0x05, 0x98, 0xbc),
                RgbColor(0xa5, 0xa5, 0xa5),
            ],
        }
    }

    /// OSC 4/10/11/12 sequences that apply this palette to an xterm-compatible
    /// terminal.
    pub fn osc_sequences(&self) -> String {
        let mut out = String::new();
        for (index, color) in self.ansi.iter().enumerate() {
            out.push_str(&format!("\x1b]4;{index};{}\x07", hex(*color)));
        }
        out.push_str(&format!("\x1b]10;{}\x07", hex(self.foreground)));
        out.push_str(&format!("\x1b]11;{}\x07", hex(self.background)));
        out.push_str(&format!("\x1b]12;{}\x07", hex(self.cursor)));
        out
    }
}

pub fn hex(color: RgbColor) -> String {
    let RgbColor(r, g, b) = color;
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_follow_mode() {
        assert_eq!(ThemePalette::for_mode(ThemeMode::Light).mode, ThemeMode::Light);
        assert_eq!(hex(ThemePalette::dark().background), "#1e1e1e");
    }

    #[test]
    fn osc_sequences_cover_every_slot() {
        let osc = ThemePalette::light().osc_sequences();
        assert_eq!(osc.matches("\x1b]4;").count(), 16);
        assert!(osc.contains("\x1b]11;#ffffff\x07"));
    }
}
