use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Upper bound on the slots reserved up front for seen numbers. Larger
/// generations grow the set as values arrive.
const MAX_INITIAL_SEEN: usize = 64 * 1024;

fn initial_seen_capacity(count: u32) -> usize {
    (count as usize).min(MAX_INITIAL_SEEN)
}

/// Forwards the first occurrence of each drawn number until `count` unique
/// values were emitted.
///
/// Duplicates are dropped silently. Whatever way the filter exits (quota
/// reached, consumer gone, parent cancelled) it cancels `quit`, which stops
/// every worker of the generation.
///
/// # Behavior
///
/// - Emits at most `count` values, in the order they were first drawn.
/// - Returns early if `output` is closed or `quit` is cancelled from above.
/// - Returns the number of values emitted.
pub async fn unique_filter(
    mut numbers: mpsc::Receiver<u32>,
    output: mpsc::Sender<u32>,
    count: u32,
    quit: CancellationToken,
) -> u32 {
    let _stop_workers = quit.clone().drop_guard();
    let mut seen = HashSet::with_capacity(initial_seen_capacity(count));
    let mut emitted = 0;

    while emitted < count {
        let number = tokio::select! {
            biased;
            () = quit.cancelled() => {
                tracing::debug!("Generation cancelled after {emitted} numbers");
                break;
            }
            number = numbers.recv() => match number {
                Some(number) => number,
                None => break,
            },
        };

        if !seen.insert(number) {
            continue;
        }

        tokio::select! {
            biased;
            () = quit.cancelled() => {
                tracing::debug!("Generation cancelled after {emitted} numbers");
                break;
            }
            sent = output.send(number) => {
                if sent.is_err() {
                    tracing::debug!("Consumer went away after {emitted} numbers");
                    break;
                }
            }
        }

        emitted += 1;
    }

    emitted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seen_capacity_is_capped() {
        assert_eq!(initial_seen_capacity(10), 10);
        assert_eq!(initial_seen_capacity(u32::MAX), MAX_INITIAL_SEEN);
    }

    #[tokio::test]
    async fn large_counts_stop_on_cancel() {
        let (numbers_tx, numbers_rx) = mpsc::channel(4);
        let (output_tx, mut output_rx) = mpsc::channel(4);
        let quit = CancellationToken::new();
        let filter = tokio::spawn(unique_filter(numbers_rx, output_tx, i32::MAX as u32, quit.clone()));

        numbers_tx.send(7).await.unwrap();
        numbers_tx.send(7).await.unwrap();
        numbers_tx.send(1).await.unwrap();
        assert_eq!(output_rx.recv().await, Some(7));
        assert_eq!(output_rx.recv().await, Some(1));

        quit.cancel();
        assert_eq!(filter.await.unwrap(), 2);
    }
}
