use rayon::prelude::*;
use super::cell::CellData;

/// Converts RGB24 pixel buffers into half-block terminal cells.
pub struct FrameProcessor {
    pub width: usize,
    pub height: usize,
}

impl FrameProcessor {
    /// `height` is in pixels; the cell grid has `height / 2` rows.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn cell_count(&self) -> usize {
        self.width * (self.height / 2)
    }

    pub fn process_frame(&self, pixel_data: &[u8]) -> Vec<CellData> {
        let mut cells = vec![CellData::default(); self.cell_count()];
        self.process_frame_into(pixel_data, &mut cells);
        cells
    }

    pub fn process_frame_into(&self, pixel_data: &[u8], cells: &mut [CellData]) {
        let w = self.width;
        if w == 0 || cells.len() != self.cell_count() {
            return;
        }

        let get_pixel = |x: usize, y: usize| -> (u8, u8, u8) {
            let offset = (y * w + x) * 3;
            match pixel_data.get(offset..offset + 3) {
                Some(px) => (px[0], px[1], px[2]),
                None => (0, 0, 0),
            }
        };

        // One cell row per task.
        cells.par_chunks_mut(w).enumerate().for_each(|(cy, row)| {
            for (cx, cell) in row.iter_mut().enumerate() {
                *cell = CellData {
                    char: '▀',
                    fg: get_pixel(cx, cy * 2),
                    bg: get_pixel(cx, cy * 2 + 1),
                };
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_of_rows_become_one_cell_row() {
        let proc = FrameProcessor::new(2, 4);
        let mut frame = vec![0u8; 2 * 4 * 3];
        // row 0 red, row 1 green, row 2 blue, row 3 yellow
        for x in 0..2 {
            frame[x * 3] = 255;
            frame[(2 + x) * 3 + 1] = 255;
            frame[(4 + x) * 3 + 2] = 255;
            frame[(6 + x) * 3] = 255;
            frame[(6 + x) * 3 + 1] = 255;
        }

        let cells = proc.process_frame(&frame);
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].fg, (255, 0, 0));
        assert_eq!(cells[0].bg, (0, 255, 0));
        assert_eq!(cells[3].fg, (0, 0, 255));
        assert_eq!(cells[3].bg, (255, 255, 0));
    }

    #[test]
    fn short_buffer_pads_black() {
        let proc = FrameProcessor::new(2, 2);
        let cells = proc.process_frame(&[9, 9, 9]);
        assert_eq!(cells[0].fg, (9, 9, 9));
        assert_eq!(cells[1].bg, (0, 0, 0));
    }
}
