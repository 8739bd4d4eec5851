use super::source::RandSource;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Worker task drawing random numbers for one generation.
///
/// Pushes values in `0..limit` into the shared `numbers` channel until the
/// `quit` token is cancelled or the receiving side goes away. The channel is
/// bounded, so a worker parks whenever the unique filter falls behind.
///
/// # Arguments
///
/// - `worker_id`: Index of this worker within the generation (used for logs).
/// - `numbers`: Channel shared by all workers of the generation.
/// - `quit`: Cancelled by the filter once enough unique values were seen.
/// - `limit`: Exclusive upper bound of the drawn values.
/// - `rand`: Random source owned by this worker.
pub async fn random_worker<R: RandSource>(
    worker_id: usize,
    numbers: mpsc::Sender<u32>,
    quit: CancellationToken,
    limit: u32,
    rand: R,
) {
    tracing::trace!("Worker {worker_id} started");

    loop {
        let number = rand.rand_below(limit);
        tokio::select! {
            biased;
            () = quit.cancelled() => break,
            sent = numbers.send(number) => {
                if sent.is_err() {
                    tracing::trace!("Worker {worker_id} lost its filter");
                    break;
                }
            }
        }
    }

    tracing::trace!("Worker {worker_id} stopped");
}
