//! Cursor based pagination.
//!
//! List endpoints hand back an opaque page key while more data is available.
//! [`collect_all`] follows that key until it disappears. There is no page cap,
//! so an unbounded result set means an unbounded number of requests.
use std::future::Future;

use tracing::trace;

/// One page of results plus the cursor of the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next: Option<String>) -> Self {
        Self { items, next }
    }
}

/// Requests pages, starting without a cursor, and concatenates their items in
/// arrival order.
pub async fn collect_all<T, E, F, Fut>(mut request_page: F) -> Result<Vec<T>, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut items = Vec::new();
    let mut cursor = None;
    let mut pages = 0usize;
    loop {
        let page = request_page(cursor.take()).await?;
        pages += 1;
        trace!(pages, page_items = page.items.len(), "Fetched page");
        items.extend(page.items);
        match page.next {
            Some(next) => cursor = Some(next),
            None => return Ok(items),
        }
    }
}
