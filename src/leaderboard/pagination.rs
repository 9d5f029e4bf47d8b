use serde::{Deserialize, Serialize};

/// Bounds for the auto-fit page size and the page-number strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationLimits {
    pub min_items_per_page: usize,
    pub max_items_per_page: usize,
    /// Smallest change in a re-measured page size that gets committed.
    pub relayout_threshold: usize,
    pub max_page_buttons: usize,
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            min_items_per_page: 3,
            max_items_per_page: 20,
            relayout_threshold: 2,
            max_page_buttons: 5,
        }
    }
}

/// One auto-fit measurement of the rendered panel, in CSS pixels.
///
/// `available_height` is the space between the panel header and the pagination
/// controls; `row_height` is the rendered height of the first row and
/// `row_gap` the vertical spacing between rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutMeasurement {
    pub available_height: f64,
    pub row_height: f64,
    pub row_gap: f64,
}

impl LayoutMeasurement {
    pub fn is_valid(&self) -> bool {
        self.available_height.is_finite()
            && self.row_height.is_finite()
            && self.row_gap.is_finite()
            && self.row_gap >= 0.0
            && self.row_height + self.row_gap > 0.0
    }

    /// How many rows fit, clamped into the configured bounds.
    pub fn fit(&self, limits: &PaginationLimits) -> usize {
        let rows = (self.available_height / (self.row_height + self.row_gap)).floor();
        let rows = if rows.is_sign_negative() { 0 } else { rows as usize };
        rows.clamp(limits.min_items_per_page, limits.max_items_per_page)
    }
}

/// Page position over a server-ranked list whose length is only known as `total`.
///
/// After every mutation `1 <= current_page <= total_pages()` holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    current_page: usize,
    items_per_page: usize,
    total: u64,
    measured: bool,
    limits: PaginationLimits,
}

impl Pagination {
    /// The initial page size is held to the same bounds as a measured one.
    pub fn new(initial_items_per_page: usize, limits: PaginationLimits) -> Self {
        let items_per_page = initial_items_per_page
            .max(limits.min_items_per_page)
            .min(limits.max_items_per_page)
            .max(1);

        Self {
            current_page: 1,
            items_per_page,
            total: 0,
            measured: false,
            limits,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn limits(&self) -> &PaginationLimits {
        &self.limits
    }

    pub fn total_pages(&self) -> usize {
        let pages = self.total.div_ceil(self.items_per_page as u64);
        usize::try_from(pages).unwrap_or(usize::MAX).max(1)
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    /// Returns true when the current page moved.
    pub fn set_total(&mut self, total: u64) -> bool {
        self.total = total;
        self.clamp_current_page()
    }

    /// Moves to `page`, clamped into range. Returns true when the page changed.
    pub fn set_current_page(&mut self, page: usize) -> bool {
        let page = page.clamp(1, self.total_pages());
        let changed = page != self.current_page;
        self.current_page = page;
        changed
    }

    pub fn next_page(&mut self) -> bool {
        self.set_current_page(self.current_page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> bool {
        self.set_current_page(self.current_page.saturating_sub(1))
    }

    /// Applies a freshly measured page size.
    ///
    /// The first measurement always commits; later ones only when they differ
    /// from the current size by at least `relayout_threshold`. Returns true
    /// when the page size changed.
    pub fn propose_items_per_page(&mut self, candidate: usize) -> bool {
        let candidate = candidate.clamp(
            self.limits.min_items_per_page,
            self.limits.max_items_per_page,
        );

        let first = !self.measured;
        self.measured = true;

        if !first && candidate.abs_diff(self.items_per_page) < self.limits.relayout_threshold {
            return false;
        }
        if candidate == self.items_per_page {
            return false;
        }

        self.items_per_page = candidate;
        self.clamp_current_page();
        true
    }

    pub fn apply_measurement(&mut self, measurement: &LayoutMeasurement) -> bool {
        let candidate = measurement.fit(&self.limits);
        self.propose_items_per_page(candidate)
    }

    /// Page buttons to show: at most `max_page_buttons`, centred on the current
    /// page where the range allows.
    pub fn page_numbers(&self) -> Vec<usize> {
        let max_buttons = self.limits.max_page_buttons.max(1);
        let total_pages = self.total_pages();

        let mut start = self.current_page.saturating_sub(max_buttons / 2).max(1);
        let end = (start + max_buttons - 1).min(total_pages);
        if end + 1 - start < max_buttons {
            start = (end + 1).saturating_sub(max_buttons).max(1);
        }

        (start..=end).collect()
    }

    /// Absolute rank of the row at `index` on the current page.
    pub fn rank_of(&self, index: usize) -> usize {
        (self.current_page - 1) * self.items_per_page + index + 1
    }

    fn clamp_current_page(&mut self) -> bool {
        let total_pages = self.total_pages();
        if self.current_page > total_pages {
            self.current_page = total_pages;
            true
        } else {
            false
        }
    }
}
