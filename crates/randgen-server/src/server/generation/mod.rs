//! Concurrent unique random number generation.
//!
//! A generation for `countNumbers = n` on `countThreads = t` is made of:
//!
//! - `t` [`random_worker`] tasks drawing values in `0..n` into one bounded
//!   channel (capacity `t`).
//! - One [`unique_filter`] task that drops duplicates and forwards first
//!   occurrences until `n` unique values were seen, then cancels the workers.
//!
//! Since exactly `n` distinct values exist below `n`, a completed generation
//! is a random permutation of `0..n`.

pub mod filter;
pub mod source;
pub mod worker;

use filter::unique_filter;
use randgen_core::types::GenerationRequest;
use source::RandSource;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use worker::random_worker;

/// Spawns the worker and filter tasks for `request` and returns the channel
/// on which unique numbers arrive.
///
/// The channel closes once the generation completes, when `parent` is
/// cancelled, or after the receiver is dropped (which also stops the tasks).
///
/// `request` is assumed to have passed [`GenerationRequest::check_limits`].
pub fn spawn_unique<R: RandSource>(
    request: GenerationRequest,
    rand: R,
    parent: &CancellationToken,
    buffer: usize,
) -> mpsc::Receiver<u32> {
    let quit = parent.child_token();
    let span = tracing::debug_span!(
        "generation",
        count_numbers = request.count_numbers,
        count_threads = request.count_threads
    );

    let workers = request.count_threads as usize;
    let (numbers_tx, numbers_rx) = mpsc::channel(workers);
    for worker_id in 0..workers {
        tokio::spawn(
            random_worker(
                worker_id,
                numbers_tx.clone(),
                quit.clone(),
                request.count_numbers,
                rand.clone(),
            )
            .instrument(span.clone()),
        );
    }
    drop(numbers_tx);

    let (output_tx, output_rx) = mpsc::channel(buffer.max(1));
    tokio::spawn(
        async move {
            let emitted = unique_filter(numbers_rx, output_tx, request.count_numbers, quit).await;
            tracing::debug!("Emitted {emitted} unique numbers");
        }
        .instrument(span),
    );

    output_rx
}

/// Drains a generation into a vector, preserving emission order.
pub async fn collect_unique(mut numbers: mpsc::Receiver<u32>) -> Vec<u32> {
    let mut out = Vec::new();
    while let Some(number) = numbers.recv().await {
        out.push(number);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::source::{ScriptedRandom, ThreadRandom};
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn request(count_numbers: u32, count_threads: u32) -> GenerationRequest {
        GenerationRequest::new(count_numbers, count_threads).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn produces_a_permutation() {
        let token = CancellationToken::new();
        let rx = spawn_unique(request(1_000, 4), ThreadRandom, &token, 16);
        let mut numbers = collect_unique(rx).await;

        assert_eq!(numbers.len(), 1_000);
        numbers.sort_unstable();
        assert_eq!(numbers, (0..1_000).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn single_number_is_zero() {
        let token = CancellationToken::new();
        let rx = spawn_unique(request(1, 1), ThreadRandom, &token, 1);
        assert_eq!(collect_unique(rx).await, vec![0]);
    }

    #[tokio::test]
    async fn duplicates_are_dropped_in_draw_order() {
        let token = CancellationToken::new();
        let rand = ScriptedRandom::new(&[3, 3, 1, 1, 0, 3, 2]);
        let rx = spawn_unique(request(4, 1), rand, &token, 8);
        assert_eq!(collect_unique(rx).await, vec![3, 1, 0, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn parent_cancellation_closes_the_channel() {
        let token = CancellationToken::new();
        // Only ever draws 0, so the generation can never complete on its own.
        let rand = ScriptedRandom::new(&[0]);
        let mut rx = spawn_unique(request(10, 2), rand, &token, 8);

        assert_eq!(rx.recv().await, Some(0));
        token.cancel();

        let closed = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("channel should close after cancellation");
        assert_eq!(closed, None);
    }

    #[tokio::test]
    async fn dropping_the_receiver_stops_generation() {
        let rand = ScriptedRandom::new(&[0, 1, 2, 3, 4]);
        let quit = CancellationToken::new();
        let (numbers_tx, numbers_rx) = mpsc::channel(1);
        let (output_tx, mut output_rx) = mpsc::channel(1);
        let worker = tokio::spawn(random_worker(0, numbers_tx, quit.clone(), 5, rand));
        let filter = tokio::spawn(unique_filter(numbers_rx, output_tx, 5, quit.clone()));

        assert_eq!(output_rx.recv().await, Some(0));
        drop(output_rx);

        let emitted = timeout(Duration::from_secs(2), filter).await.unwrap().unwrap();
        assert!(emitted < 5);
        assert!(quit.is_cancelled());
        timeout(Duration::from_secs(2), worker).await.unwrap().unwrap();
    }
}
