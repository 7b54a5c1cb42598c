use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::future::Future;

/// Runs every future concurrently and joins them all-or-nothing.
///
/// All futures are driven to completion even after a failure, so no
/// in-flight call is abandoned halfway. If any future fails, the first
/// failure to complete is returned and all successes are discarded;
/// otherwise the outputs are returned in input order.
pub async fn join_all_or_first_error<I, F, T, E>(futures: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let mut pending: FuturesUnordered<_> = futures
        .into_iter()
        .enumerate()
        .map(|(index, fut)| async move { (index, fut.await) })
        .collect();

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(pending.len()).collect();
    let mut first_error = None;

    while let Some((index, outcome)) = pending.next().await {
        match outcome {
            Ok(value) if first_error.is_none() => slots[index] = Some(value),
            Ok(_) => {}
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                    slots.clear();
                }
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(slots.into_iter().flatten().collect()),
    }
}
