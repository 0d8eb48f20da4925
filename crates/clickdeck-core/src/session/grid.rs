use clickdeck_types::{Point, Size};

/// Border and padding drawn around an icon, per side.
pub const TILE_CHROME: f64 = 5.0;

/// Icon-size and spacing derived grid geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub icon_size: f64,
    pub spacing: f64,
    /// Grid origin offset from the canvas edge
    pub padding: f64,
}

impl GridMetrics {
    #[must_use]
    pub const fn new(icon_size: f64, spacing: f64, padding: f64) -> Self {
        Self {
            icon_size,
            spacing,
            padding,
        }
    }

    /// Edge length of one item tile on the canvas.
    #[must_use]
    pub fn tile_extent(&self) -> f64 {
        self.icon_size + 2.0 * TILE_CHROME
    }

    #[must_use]
    pub fn tile_size(&self) -> Size {
        Size::square(self.tile_extent())
    }

    /// Distance between neighbouring grid cells.
    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.tile_extent() + self.spacing
    }

    #[must_use]
    pub fn half_step(&self) -> f64 {
        (self.cell_size() / 2.0).max(f64::EPSILON)
    }

    /// Nearest half-cell boundary to `v`, measured from the padding origin.
    #[must_use]
    pub fn snap_coord(&self, v: f64) -> f64 {
        let half = self.half_step();
        self.padding + ((v - self.padding) / half).round() * half
    }
}

/// A realized canvas together with the grid drawn on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasBounds {
    pub canvas: Size,
    pub metrics: GridMetrics,
}

impl CanvasBounds {
    #[must_use]
    pub const fn new(canvas: Size, metrics: GridMetrics) -> Self {
        Self { canvas, metrics }
    }

    fn axis_max(&self, extent: f64) -> f64 {
        (extent - self.metrics.tile_extent()).max(0.0)
    }

    /// Allowed top-left range on each axis.
    ///
    /// With `snapping`, the range is inset by the padding when the canvas is
    /// large enough for that.
    #[must_use]
    pub fn range(&self, snapping: bool) -> (Point, Point) {
        let max_x = self.axis_max(self.canvas.width);
        let max_y = self.axis_max(self.canvas.height);
        let lo = Point::new(0.0, 0.0);
        let hi = Point::new(max_x, max_y);
        if !snapping {
            return (lo, hi);
        }

        let pad = self.metrics.padding;
        let inset = |max: f64| if max - pad >= pad { (pad, max - pad) } else { (0.0, max) };
        let (lo_x, hi_x) = inset(max_x);
        let (lo_y, hi_y) = inset(max_y);
        (Point::new(lo_x, lo_y), Point::new(hi_x, hi_y))
    }

    /// Clamp a top-left position into `[0, canvas - tile]` on both axes.
    #[must_use]
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(0.0, self.axis_max(self.canvas.width)),
            p.y.clamp(0.0, self.axis_max(self.canvas.height)),
        )
    }

    /// Snap to the half-cell grid, then clamp to the grid points that keep
    /// the padding clear of every edge.
    ///
    /// The result is a fixed point: snapping it again returns it unchanged.
    #[must_use]
    pub fn snap(&self, p: Point) -> Point {
        Point::new(
            self.snap_axis(p.x, self.canvas.width),
            self.snap_axis(p.y, self.canvas.height),
        )
    }

    fn snap_axis(&self, v: f64, extent: f64) -> f64 {
        let m = &self.metrics;
        let half = m.half_step();
        let max = self.axis_max(extent);
        let lo = m.padding;
        let hi = m.padding + ((max - m.padding - m.padding) / half).floor() * half;

        if hi < lo {
            // Canvas too small for a padded grid
            return m.padding.min(max);
        }
        m.snap_coord(v).clamp(lo, hi)
    }
}
