//! Axes placement in figure pixels, following matplotlib's `subplots_adjust` rules.

/// Figure-fraction margins plus spacing between axes as a fraction of the average axes size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub wspace: f64,
    pub hspace: f64,
}

/// Pixel rectangle of one axes box: upper-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxesBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct GridLayout {
    pub figure: (u32, u32),
    pub rows: usize,
    pub cols: usize,
    pub margins: Margins,
}

impl GridLayout {
    fn cell_sizes(&self) -> (f64, f64) {
        let (w, h) = (self.figure.0 as f64, self.figure.1 as f64);
        let span_w = (self.margins.right - self.margins.left) * w;
        let span_h = (self.margins.top - self.margins.bottom) * h;
        let cols = self.cols as f64;
        let rows = self.rows as f64;
        let cell_w = span_w / (cols + self.margins.wspace * (cols - 1.0));
        let cell_h = span_h / (rows + self.margins.hspace * (rows - 1.0));
        (cell_w, cell_h)
    }

    /// Axes box for `(row, col)`, row 0 at the top.
    pub fn axes_box(&self, row: usize, col: usize) -> AxesBox {
        let (cell_w, cell_h) = self.cell_sizes();
        let (w, h) = (self.figure.0 as f64, self.figure.1 as f64);
        let x = self.margins.left * w + col as f64 * cell_w * (1.0 + self.margins.wspace);
        let y = (1.0 - self.margins.top) * h + row as f64 * cell_h * (1.0 + self.margins.hspace);
        AxesBox {
            x: x.round() as i32,
            y: y.round() as i32,
            width: cell_w.round().max(1.0) as u32,
            height: cell_h.round().max(1.0) as u32,
        }
    }

    /// Row-major boxes, matching the order panels are filled in.
    pub fn boxes(&self) -> Vec<AxesBox> {
        (0..self.rows)
            .flat_map(|r| (0..self.cols).map(move |c| (r, c)))
            .map(|(r, c)| self.axes_box(r, c))
            .collect()
    }
}

/// Points to pixels at the given dpi, never thinner than one pixel.
pub fn pt_to_px(points: f64, dpi: f64) -> u32 {
    (points * dpi / 72.0).round().max(1.0) as u32
}

/// Font size in pixels for a size given in points.
pub fn font_px(points: f64, dpi: f64) -> f64 {
    points * dpi / 72.0
}
