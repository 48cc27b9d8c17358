//! Collision-aware placement on the fixed-column grid
//!
//! Placement is a greedy first-fit scan, rows top-to-bottom then columns
//! left-to-right. Optimality is not required; zero overlap with unlocked
//! entries is.

use gridboard_core::{ComponentType, LayoutEntry, Rect, DEFAULT_GRID_COLUMNS};

/// Grid layout engine for one dashboard
///
/// Stateless apart from the column count; callers pass the latest layout
/// snapshot into every operation.
#[derive(Debug, Clone, Copy)]
pub struct GridEngine {
    columns: u32,
}

impl GridEngine {
    /// Create engine for a grid with the given column count
    #[inline]
    #[must_use]
    pub fn new(columns: u32) -> Self {
        Self {
            columns: columns.max(1),
        }
    }

    /// Column count
    #[inline]
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Place a component of the given type using its default size
    ///
    /// The returned rectangle does not overlap any `locked == false` entry
    /// in `existing`. Rows grow downward without bound, so placement always
    /// succeeds.
    #[must_use]
    pub fn place(&self, component_type: ComponentType, existing: &[LayoutEntry]) -> Rect {
        let (w, h) = component_type.default_size();
        self.place_sized(w, h, existing)
    }

    /// Place a rectangle of explicit size (duplicate keeps the source size)
    #[must_use]
    pub fn place_sized(&self, w: u32, h: u32, existing: &[LayoutEntry]) -> Rect {
        let w = w.clamp(1, self.columns);
        let h = h.max(1);
        let occupancy = Occupancy::from_entries(self.columns, existing);
        occupancy.first_fit(w, h)
    }

    /// Overwrite an entry's rectangle in place
    ///
    /// Manual drags and resizes are accepted as-is; the client enforces
    /// collision rules interactively. Only automated placement goes through
    /// [`GridEngine::place`].
    #[inline]
    pub fn move_or_resize(entry: &mut LayoutEntry, new_rect: Rect) {
        entry.set_rect(new_rect);
    }
}

impl Default for GridEngine {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_COLUMNS)
    }
}

/// Cell-occupancy map built once per placement from the unlocked entries
///
/// Rows past `rows()` are implicitly free, which is what makes first-fit
/// total: a candidate below everything always fits.
#[derive(Debug)]
struct Occupancy {
    columns: u32,
    rows: u32,
    cells: Vec<bool>,
}

impl Occupancy {
    fn from_entries(columns: u32, entries: &[LayoutEntry]) -> Self {
        let obstacles: Vec<Rect> = entries
            .iter()
            .filter(|e| !e.locked)
            .map(LayoutEntry::rect)
            .collect();
        let rows = obstacles.iter().map(Rect::bottom).max().unwrap_or(0);
        let mut occupancy = Self {
            columns,
            rows,
            cells: vec![false; (columns * rows) as usize],
        };
        for rect in &obstacles {
            occupancy.mark(rect);
        }
        occupancy
    }

    fn mark(&mut self, rect: &Rect) {
        for y in rect.y..rect.bottom().min(self.rows) {
            for x in rect.x..rect.right().min(self.columns) {
                self.cells[(y * self.columns + x) as usize] = true;
            }
        }
    }

    fn is_free(&self, x: u32, y: u32, w: u32, h: u32) -> bool {
        for cy in y..y + h {
            if cy >= self.rows {
                // Everything below the lowest obstacle is free.
                return true;
            }
            for cx in x..x + w {
                if self.cells[(cy * self.columns + cx) as usize] {
                    return false;
                }
            }
        }
        true
    }

    fn first_fit(&self, w: u32, h: u32) -> Rect {
        for y in 0..=self.rows {
            for x in 0..=self.columns - w {
                if self.is_free(x, y, w, h) {
                    return Rect::new(x, y, w, h);
                }
            }
        }
        // Unreachable: row `self.rows` is entirely free.
        Rect::new(0, self.rows, w, h)
    }
}
