/// One terminal cell: an upper-half block whose foreground is the top pixel
/// and background the bottom pixel.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CellData {
    pub char: char,
    pub fg: (u8, u8, u8),
    pub bg: (u8, u8, u8),
}

impl Default for CellData {
    fn default() -> Self {
        Self {
            char: ' ',
            fg: (0, 0, 0),
            bg: (0, 0, 0),
        }
    }
}

impl CellData {
    /// Perceived brightness (0-255) of the cell, averaged over both halves.
    pub fn brightness(&self) -> u8 {
        let luma = |(r, g, b): (u8, u8, u8)| r as u32 * 299 + g as u32 * 587 + b as u32 * 114;
        ((luma(self.fg) + luma(self.bg)) / 2000) as u8
    }
}
