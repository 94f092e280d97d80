//! Upload progress reporting for streamed request bodies.

use std::{io, sync::Arc};

use futures::{stream, Stream, StreamExt};

pub const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Receives whole upload percentages (0..=100).
pub type ProgressSink = Arc<dyn Fn(u8) + Send + Sync>;

pub fn percent_complete(sent: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (sent as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Splits `bytes` into body chunks, reporting progress as each chunk is
/// handed to the transport. Repeated percentages are not re-reported.
pub fn progress_body_stream(
    bytes: Vec<u8>,
    chunk_size: usize,
    sink: ProgressSink,
) -> impl Stream<Item = Result<Vec<u8>, io::Error>> + Send + 'static {
    let total = bytes.len();
    let mut chunks: Vec<Vec<u8>> = bytes
        .chunks(chunk_size.max(1))
        .map(<[u8]>::to_vec)
        .collect();
    // An empty file still has to complete the bar.
    if chunks.is_empty() {
        chunks.push(Vec::new());
    }
    let mut sent = 0usize;
    let mut last_reported: Option<u8> = None;

    stream::iter(chunks).map(move |chunk| {
        sent += chunk.len();
        let pct = percent_complete(sent, total);
        if last_reported != Some(pct) {
            last_reported = Some(pct);
            sink(pct);
        }
        Ok(chunk)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn rounds_to_whole_percent() {
        assert_eq!(percent_complete(0, 200), 0);
        assert_eq!(percent_complete(1, 200), 1);
        assert_eq!(percent_complete(199, 200), 100);
        assert_eq!(percent_complete(0, 0), 100);
    }

    #[tokio::test]
    async fn stream_reports_monotonic_progress_ending_at_100() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: ProgressSink = Arc::new(move |pct| sink_seen.lock().expect("lock").push(pct));

        let chunks: Vec<Vec<u8>> = progress_body_stream(vec![7u8; 1000], 300, sink)
            .map(|chunk| chunk.expect("chunk"))
            .collect()
            .await;

        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks.iter().map(Vec::len).sum::<usize>(), 1000);
        let seen = seen.lock().expect("lock").clone();
        assert_eq!(seen, vec![30, 60, 90, 100]);
    }

    #[tokio::test]
    async fn empty_file_still_reports_completion() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: ProgressSink = Arc::new(move |pct| sink_seen.lock().expect("lock").push(pct));

        let chunks: Vec<Vec<u8>> = progress_body_stream(Vec::new(), UPLOAD_CHUNK_BYTES, sink)
            .map(|chunk| chunk.expect("chunk"))
            .collect()
            .await;

        assert!(chunks.iter().all(Vec::is_empty));
        assert_eq!(*seen.lock().expect("lock"), vec![100]);
    }
}
