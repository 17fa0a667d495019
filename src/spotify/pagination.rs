use std::future::Future;

use futures::{Stream, TryStreamExt, stream};

use crate::{error::UpstreamError, types::Page};

/// Lazily walks a cursor-paginated listing, yielding one page per fetch.
///
/// `fetch_page` is called with `start` first and then with every `next`
/// cursor the previous page carried. The stream ends once a page comes back
/// without a cursor; a page with zero items does not end it. A fetch that
/// produces no page object at all ends the stream with
/// [`UpstreamError::EmptyResponse`].
///
/// The stream holds no state beyond the current cursor, so calling this
/// again with the same start cursor replays the listing.
pub fn pages<T, F, Fut>(
    start: impl Into<String>,
    fetch_page: F,
) -> impl Stream<Item = Result<Page<T>, UpstreamError>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Option<Page<T>>, UpstreamError>>,
{
    stream::try_unfold(
        (Some(start.into()), fetch_page),
        |(cursor, mut fetch_page)| async move {
            let Some(cursor) = cursor else {
                return Ok(None);
            };

            let page = fetch_page(cursor)
                .await?
                .ok_or(UpstreamError::EmptyResponse)?;
            let next = page.next.clone();

            Ok::<_, UpstreamError>(Some((page, (next, fetch_page))))
        },
    )
}

/// Collects every item of a cursor-paginated listing, in listing order.
///
/// # Errors
///
/// Fails with [`UpstreamError::EmptyResponse`] when a fetch yields no page
/// object, and with whatever error `fetch_page` itself reports.
///
/// # Example
///
/// ```
/// let playlists = traverse(start_url, |cursor| client.fetch_page(token, cursor)).await?;
/// ```
pub async fn traverse<T, F, Fut>(
    start: impl Into<String>,
    fetch_page: F,
) -> Result<Vec<T>, UpstreamError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Option<Page<T>>, UpstreamError>>,
{
    pages(start, fetch_page)
        .try_fold(Vec::new(), |mut items, page| async move {
            items.extend(page.items);
            Ok(items)
        })
        .await
}
