//! Computes the pagination window shown under every post listing. Given the
//! current page, the total number of pages, and a neighbor span, [`compute`]
//! decides which page links sit on either side of the current page, whether an
//! ellipsis separates them from the first or last page, and whether the first
//! or last page needs a link of its own.
//!
//! For example, page 5 of 10 with a span of 2 renders as
//! `1 … 3 4 [5] 6 7 … 10`.

use std::fmt;

/// The number of page links shown on each side of the current page unless a
/// caller asks for something else.
pub const DEFAULT_NEIGHBOR_SPAN: usize = 2;

/// The inputs to [`compute`]. Page numbers are 1-indexed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationRequest {
    pub current_page: usize,
    pub total_pages: usize,
    pub neighbor_span: usize,
}

impl PaginationRequest {
    /// Builds a request with the [`DEFAULT_NEIGHBOR_SPAN`].
    pub fn new(current_page: usize, total_pages: usize) -> PaginationRequest {
        PaginationRequest {
            current_page,
            total_pages,
            neighbor_span: DEFAULT_NEIGHBOR_SPAN,
        }
    }

    pub fn with_neighbor_span(mut self, neighbor_span: usize) -> PaginationRequest {
        self.neighbor_span = neighbor_span;
        self
    }

    /// Pulls `current_page` into `[1, total_pages]` and raises a zero
    /// `neighbor_span` to 1, so that [`PaginationRequest::compute`] cannot
    /// fail on the result.
    pub fn clamped(self) -> PaginationRequest {
        PaginationRequest {
            current_page: self.current_page.max(1).min(self.total_pages.max(1)),
            total_pages: self.total_pages,
            neighbor_span: self.neighbor_span.max(1),
        }
    }

    /// Classifies the current page. A `total_pages` of zero is treated as a
    /// collection that needs no pagination.
    pub fn position(&self) -> Result<Position> {
        if self.neighbor_span < 1 {
            return Err(Error::InvalidArgument(String::from(
                "neighbor span must be at least 1",
            )));
        }
        if self.total_pages < 1 {
            return Ok(Position::Trivial);
        }
        if self.current_page < 1 || self.current_page > self.total_pages {
            return Err(Error::InvalidArgument(format!(
                "current page {} is outside of [1, {}]",
                self.current_page, self.total_pages
            )));
        }

        Ok(match (self.current_page, self.total_pages) {
            (_, 1) => Position::Trivial,
            (1, _) => Position::First,
            (current, total) if current == total => Position::Last,
            _ => Position::Interior,
        })
    }

    /// Computes the [`PaginationDisplay`] for this request.
    pub fn compute(&self) -> Result<PaginationDisplay> {
        let current = self.current_page;
        let total = self.total_pages;
        let span = self.neighbor_span;

        let display = PaginationDisplay::default();
        Ok(match self.position()? {
            Position::Trivial => display,
            Position::First => display.with_right(window_after(current, total, span), total),
            Position::Last => display.with_left(window_before(current, span)),
            Position::Interior => display
                .with_left(window_before(current, span))
                .with_right(window_after(current, total, span), total),
        })
    }
}

/// Where the current page sits in the page range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    /// There is only one page, so there is nothing to navigate.
    Trivial,

    /// The current page is page 1.
    First,

    /// The current page is the last page.
    Last,

    /// The current page has pages on both sides.
    Interior,
}

/// The navigation controls to render around the current page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaginationDisplay {
    /// Page links immediately before the current page, ascending.
    pub left: Vec<usize>,

    /// Page links immediately after the current page, ascending.
    pub right: Vec<usize>,

    /// Pages are hidden between page 1 and `left`.
    pub left_has_more: bool,

    /// Pages are hidden between `right` and the last page.
    pub right_has_more: bool,

    /// Page 1 needs its own link because `left` doesn't reach it.
    pub show_first: bool,

    /// The last page needs its own link because `right` doesn't reach it.
    pub show_last: bool,
}

impl PaginationDisplay {
    fn with_left(mut self, left: Vec<usize>) -> PaginationDisplay {
        if let Some(&first) = left.first() {
            self.left_has_more = first > 2;
            self.show_first = first > 1;
        }
        self.left = left;
        self
    }

    fn with_right(mut self, right: Vec<usize>, total_pages: usize) -> PaginationDisplay {
        if let Some(&last) = right.last() {
            self.right_has_more = last + 1 < total_pages;
            self.show_last = last < total_pages;
        }
        self.right = right;
        self
    }
}

/// Computes the pagination window for `current_page` of `total_pages`,
/// showing up to `neighbor_span` page links on each side.
///
/// ```
/// use timenotes::pagination::compute;
///
/// let display = compute(5, 10, 2).unwrap();
/// assert_eq!(display.left, vec![3, 4]);
/// assert_eq!(display.right, vec![6, 7]);
/// assert!(display.show_first && display.left_has_more);
/// assert!(display.show_last && display.right_has_more);
/// ```
pub fn compute(
    current_page: usize,
    total_pages: usize,
    neighbor_span: usize,
) -> Result<PaginationDisplay> {
    PaginationRequest::new(current_page, total_pages)
        .with_neighbor_span(neighbor_span)
        .compute()
}

/// Up to `span` pages immediately before `current`, never below page 1.
fn window_before(current: usize, span: usize) -> Vec<usize> {
    let start = current.saturating_sub(span).max(1);
    (start..current).collect()
}

/// Up to `span` pages immediately after `current`, never past `total`. The
/// window is shorter than `span` when fewer pages remain; it is never padded.
fn window_after(current: usize, total: usize, span: usize) -> Vec<usize> {
    let stop = current.saturating_add(span).min(total);
    (current + 1..=stop).collect()
}

/// Represents the result of a pagination operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a pagination request that violates its preconditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Returned when a page number, page count, or span is out of range.
    InvalidArgument(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;

    fn display(
        left: &[usize],
        right: &[usize],
        left_has_more: bool,
        right_has_more: bool,
        show_first: bool,
        show_last: bool,
    ) -> PaginationDisplay {
        PaginationDisplay {
            left: left.to_vec(),
            right: right.to_vec(),
            left_has_more,
            right_has_more,
            show_first,
            show_last,
        }
    }

    #[test]
    fn test_first_page() -> Result<()> {
        assert_eq!(
            display(&[], &[2, 3], false, true, false, true),
            compute(1, 10, 2)?
        );
        Ok(())
    }

    #[test]
    fn test_last_page() -> Result<()> {
        assert_eq!(
            display(&[8, 9], &[], true, false, true, false),
            compute(10, 10, 2)?
        );
        Ok(())
    }

    #[test]
    fn test_interior_page() -> Result<()> {
        assert_eq!(
            display(&[3, 4], &[6, 7], true, true, true, true),
            compute(5, 10, 2)?
        );
        Ok(())
    }

    #[test]
    fn test_windows_touching_both_ends() -> Result<()> {
        assert_eq!(
            display(&[1], &[3], false, false, false, false),
            compute(2, 3, 2)?
        );
        Ok(())
    }

    #[test]
    fn test_single_page_is_trivial() -> Result<()> {
        assert_eq!(PaginationDisplay::default(), compute(1, 1, 2)?);
        assert_eq!(
            Position::Trivial,
            PaginationRequest::new(1, 1).position()?
        );
        Ok(())
    }

    #[test]
    fn test_zero_pages_is_trivial() -> Result<()> {
        assert_eq!(PaginationDisplay::default(), compute(1, 0, 2)?);
        assert_eq!(PaginationDisplay::default(), compute(0, 0, 2)?);
        Ok(())
    }

    #[test]
    fn test_right_window_is_not_padded() -> Result<()> {
        // Only one page remains after page 3 of 4.
        assert_eq!(
            display(&[1, 2], &[4], false, false, false, false),
            compute(3, 4, 2)?
        );
        Ok(())
    }

    #[test]
    fn test_ellipsis_only_when_pages_are_hidden() -> Result<()> {
        // Page 4 is adjacent to the last shown page 3, so no ellipsis, but
        // page 4 still needs its own link.
        assert_eq!(
            display(&[], &[2, 3], false, false, false, true),
            compute(1, 4, 2)?
        );
        assert_eq!(
            display(&[2, 3], &[], false, false, true, false),
            compute(4, 4, 2)?
        );
        Ok(())
    }

    #[test]
    fn test_custom_neighbor_span() -> Result<()> {
        assert_eq!(
            display(&[4], &[6], true, true, true, true),
            compute(5, 10, 1)?
        );
        assert_eq!(
            display(&[2, 3, 4], &[6, 7, 8], false, true, true, true),
            compute(5, 10, 3)?
        );
        assert_eq!(
            display(&[1, 2, 3, 4], &[6, 7, 8, 9, 10], false, false, false, false),
            compute(5, 10, 5)?
        );
        Ok(())
    }

    #[test]
    fn test_default_neighbor_span() -> Result<()> {
        assert_eq!(compute(5, 10, 2)?, PaginationRequest::new(5, 10).compute()?);
        Ok(())
    }

    #[test]
    fn test_positions() -> Result<()> {
        assert_eq!(Position::First, PaginationRequest::new(1, 2).position()?);
        assert_eq!(Position::Last, PaginationRequest::new(2, 2).position()?);
        assert_eq!(Position::Interior, PaginationRequest::new(2, 3).position()?);
        Ok(())
    }

    #[test]
    fn test_rejects_out_of_range_current_page() {
        assert!(matches!(compute(0, 10, 2), Err(Error::InvalidArgument(_))));
        assert!(matches!(compute(11, 10, 2), Err(Error::InvalidArgument(_))));
        assert!(matches!(compute(2, 1, 2), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_zero_neighbor_span() {
        assert!(matches!(compute(5, 10, 0), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_clamped() -> Result<()> {
        let request = PaginationRequest::new(42, 10).with_neighbor_span(0).clamped();
        assert_eq!(PaginationRequest::new(10, 10).with_neighbor_span(1), request);
        assert_eq!(display(&[9], &[], true, false, true, false), request.compute()?);

        let request = PaginationRequest::new(0, 10).clamped();
        assert_eq!(1, request.current_page);

        let request = PaginationRequest::new(3, 0).clamped();
        assert_eq!(PaginationDisplay::default(), request.compute()?);
        Ok(())
    }

    #[test]
    fn test_window_invariants() -> Result<()> {
        for total in 1..=25 {
            for span in 1..=5 {
                for current in 1..=total {
                    let d = compute(current, total, span)?;
                    assert!(d.left.len() <= span && d.right.len() <= span);
                    for page in d.left.iter().chain(d.right.iter()) {
                        assert!(*page >= 1 && *page <= total);
                        assert_ne!(current, *page);
                    }
                    assert!(d.left.iter().all(|p| *p < current));
                    assert!(d.right.iter().all(|p| *p > current));
                    if d.left.contains(&1) {
                        assert!(!d.show_first && !d.left_has_more);
                    }
                    if d.right.contains(&total) {
                        assert!(!d.show_last && !d.right_has_more);
                    }
                    assert!(!d.left_has_more || d.show_first);
                    assert!(!d.right_has_more || d.show_last);
                    assert_eq!(d, compute(current, total, span)?);
                }
            }
        }
        Ok(())
    }
}
