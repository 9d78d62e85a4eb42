//! Splits an ordered collection (all posts, a category, a tag, a month) into
//! listing pages and attaches a [`PaginationDisplay`] to each one.

use crate::pagination::{Error, PaginationDisplay, PaginationRequest, Result};

/// One page of a collection.
#[derive(Debug, PartialEq)]
pub struct Listing<'a, T> {
    /// This page's number, starting at 1.
    pub number: usize,

    /// The number of pages in the collection. Always at least 1; an empty
    /// collection has a single empty page.
    pub total_pages: usize,

    /// The items shown on this page.
    pub items: &'a [T],

    /// The navigation around this page. Trivial when the collection fits on
    /// one page.
    pub pagination: PaginationDisplay,
}

impl<T> Listing<'_, T> {
    pub fn is_paginated(&self) -> bool {
        self.total_pages > 1
    }

    pub fn previous(&self) -> Option<usize> {
        match self.number > 1 {
            true => Some(self.number - 1),
            false => None,
        }
    }

    pub fn next(&self) -> Option<usize> {
        match self.number < self.total_pages {
            true => Some(self.number + 1),
            false => None,
        }
    }
}

/// The number of pages needed to show `count` items `page_size` at a time.
pub fn total_pages(count: usize, page_size: usize) -> Result<usize> {
    if page_size < 1 {
        return Err(Error::InvalidArgument(String::from(
            "page size must be at least 1",
        )));
    }
    Ok(match count % page_size {
        0 => count / page_size,
        _ => count / page_size + 1,
    })
}

/// Returns page `number` of `items`. Returns an error if the page doesn't
/// exist.
pub fn page<T>(
    items: &[T],
    number: usize,
    page_size: usize,
    neighbor_span: usize,
) -> Result<Listing<'_, T>> {
    let total = total_pages(items.len(), page_size)?.max(1);
    if number < 1 || number > total {
        return Err(Error::InvalidArgument(format!(
            "page {} is outside of [1, {}]",
            number, total
        )));
    }

    let start = (number - 1) * page_size;
    let stop = (start + page_size).min(items.len());
    Ok(Listing {
        number,
        total_pages: total,
        items: &items[start..stop],
        pagination: PaginationRequest::new(number, total)
            .with_neighbor_span(neighbor_span)
            .compute()?,
    })
}

/// Returns every page of `items`, in order.
pub fn paginate<T>(
    items: &[T],
    page_size: usize,
    neighbor_span: usize,
) -> Result<Vec<Listing<'_, T>>> {
    let total = total_pages(items.len(), page_size)?.max(1);
    (1..=total)
        .map(|number| page(items, number, page_size, neighbor_span))
        .collect()
}

/// The file name of listing page `number`: `index.html` for the first page,
/// `{number}.html` for the rest.
pub fn file_name(number: usize) -> String {
    match number {
        1 => String::from("index.html"),
        n => format!("{}.html", n),
    }
}
