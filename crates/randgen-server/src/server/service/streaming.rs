use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use randgen_core::types::join_numbers;
use tokio::sync::mpsc;

/// Frames a running generation into plain-text socket messages.
///
/// Numbers are grouped `per_message` at a time and each group is sent as one
/// text frame of space-separated values; the final, possibly shorter, group is
/// flushed when the generation channel closes. Returns the amount of numbers
/// sent.
///
/// # Errors
///
/// Fails as soon as a frame cannot be written, which usually means the client
/// disconnected. Dropping `numbers` on return stops the generation.
pub async fn feed_messages<S>(
    mut numbers: mpsc::Receiver<u32>,
    sink: &mut S,
    per_message: usize,
) -> Result<usize, S::Error>
where
    S: Sink<Message> + Unpin,
{
    let per_message = per_message.max(1);
    let mut chunk = Vec::with_capacity(per_message);
    let mut sent = 0;

    loop {
        let room = per_message - chunk.len();
        if numbers.recv_many(&mut chunk, room).await == 0 {
            break;
        }
        if chunk.len() == per_message {
            sent += flush(&mut chunk, sink).await?;
        }
    }

    if !chunk.is_empty() {
        sent += flush(&mut chunk, sink).await?;
    }

    Ok(sent)
}

async fn flush<S>(chunk: &mut Vec<u32>, sink: &mut S) -> Result<usize, S::Error>
where
    S: Sink<Message> + Unpin,
{
    let count = chunk.len();
    let text = join_numbers(chunk.drain(..));
    sink.send(Message::Text(text.into())).await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(messages: &[Message]) -> Vec<&str> {
        messages
            .iter()
            .map(|m| match m {
                Message::Text(text) => text.as_str(),
                other => panic!("unexpected frame {other:?}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn groups_numbers_per_message() {
        let (tx, rx) = mpsc::channel(16);
        for n in [4, 0, 3, 1, 2] {
            tx.send(n).await.unwrap();
        }
        drop(tx);

        let mut sink: Vec<Message> = Vec::new();
        let sent = feed_messages(rx, &mut sink, 2).await.unwrap();

        assert_eq!(sent, 5);
        assert_eq!(texts(&sink), vec!["4 0", "3 1", "2"]);
    }

    #[tokio::test]
    async fn partial_reads_fill_a_frame_before_sending() {
        let (tx, rx) = mpsc::channel(1);
        let producer = tokio::spawn(async move {
            for n in 0..7 {
                tx.send(n).await.unwrap();
                tokio::task::yield_now().await;
            }
        });

        let mut sink: Vec<Message> = Vec::new();
        let sent = feed_messages(rx, &mut sink, 3).await.unwrap();
        producer.await.unwrap();

        assert_eq!(sent, 7);
        assert_eq!(texts(&sink), vec!["0 1 2", "3 4 5", "6"]);
    }

    #[tokio::test]
    async fn empty_generation_sends_nothing() {
        let (tx, rx) = mpsc::channel::<u32>(1);
        drop(tx);

        let mut sink: Vec<Message> = Vec::new();
        assert_eq!(feed_messages(rx, &mut sink, 3).await.unwrap(), 0);
        assert!(sink.is_empty());
    }
}
