//! Mock contactless reader driven through a handle.

use crate::error::{ReaderError, Result};
use crate::mock::tag::MockTag;
use crate::traits::NfcReader;
use std::time::Duration;
use tokio::sync::mpsc;

/// Mock reader: tags presented through the handle show up in
/// `wait_for_tag`, one per call, in presentation order.
#[derive(Debug)]
pub struct MockReader {
    tag_rx: mpsc::Receiver<MockTag>,
}

impl MockReader {
    pub fn new() -> (Self, MockReaderHandle) {
        let (tag_tx, tag_rx) = mpsc::channel(32);
        (Self { tag_rx }, MockReaderHandle { tag_tx })
    }
}

impl NfcReader for MockReader {
    type Tag = MockTag;

    async fn wait_for_tag(&mut self, timeout: Duration) -> Result<Option<MockTag>> {
        match tokio::time::timeout(timeout, self.tag_rx.recv()).await {
            // No tag entered the field within the cycle window.
            Err(_) => Ok(None),
            Ok(Some(tag)) => Ok(Some(tag)),
            Ok(None) => Err(ReaderError::disconnected("mock reader")),
        }
    }
}

/// Handle for presenting tags to a [`MockReader`].
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    tag_tx: mpsc::Sender<MockTag>,
}

impl MockReaderHandle {
    /// Present a tag to the reader.
    ///
    /// # Errors
    /// Returns an error if the reader has been dropped.
    pub async fn present_tag(&self, tag: MockTag) -> Result<()> {
        self.tag_tx
            .send(tag)
            .await
            .map_err(|_| ReaderError::disconnected("mock reader"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_present_and_wait() {
        let (mut reader, handle) = MockReader::new();
        handle.present_tag(MockTag::new(vec![0x01])).await.unwrap();

        let tag = reader
            .wait_for_tag(Duration::from_millis(100))
            .await
            .unwrap();
        assert!(tag.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_to_none() {
        let (mut reader, _handle) = MockReader::new();
        let tag = reader.wait_for_tag(Duration::from_secs(2)).await.unwrap();
        assert!(tag.is_none());
    }

    #[tokio::test]
    async fn test_dropped_reader_side_errors() {
        let (mut reader, handle) = MockReader::new();
        drop(handle);
        let result = reader.wait_for_tag(Duration::from_secs(2)).await;
        assert!(matches!(result, Err(ReaderError::Disconnected { .. })));
    }

    #[tokio::test]
    async fn test_tags_arrive_in_presentation_order() {
        let (mut reader, handle) = MockReader::new();
        handle.present_tag(MockTag::new(vec![0x01])).await.unwrap();
        handle.present_tag(MockTag::new(vec![0x02])).await.unwrap();

        let first = reader
            .wait_for_tag(Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();
        let second = reader
            .wait_for_tag(Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(crate::NfcTag::identifier(&first), &[0x01]);
        assert_eq!(crate::NfcTag::identifier(&second), &[0x02]);
    }
}
