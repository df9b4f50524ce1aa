//! Upload tracker: the bounded OCR queue and its sequential processor.
//!
//! Owns the ordered candidate set, admits and removes files, and drives each
//! candidate through the relay one at a time. Emits events for progress
//! tracking; rendering is a pure projection of the current state.

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::{CandidateFile, CandidateRow, CandidateStatus, SelectedFile};
use crate::relay::TextRecognition;
use crate::utils::is_image_upload;

/// Admission failures, reported as user-facing messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdmissionError {
    /// The batch would push the queue past its cap; nothing was admitted.
    #[error("at most {capacity} files can be queued ({queued} queued, {requested} more requested)")]
    CapacityExceeded {
        capacity: usize,
        queued: usize,
        requested: usize,
    },

    /// A file with this name is already queued; this file was skipped.
    #[error("{name} is already in the queue")]
    DuplicateName { name: String },

    /// The file is not an image; it was skipped.
    #[error("{name} is not an image file")]
    NotAnImage { name: String },
}

/// Outcome of admitting a batch.
#[derive(Debug, Default)]
pub struct AdmissionReport {
    /// Names admitted, in batch order.
    pub admitted: Vec<String>,
    /// Per-file skips (duplicates, non-images).
    pub skipped: Vec<AdmissionError>,
}

/// Events emitted while a batch is processed.
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    /// Batch run started.
    BatchStarted { total: usize },
    /// Candidate submission started.
    CandidateStarted { index: usize, name: String },
    /// Candidate completed; text and timing stored.
    CandidateCompleted {
        index: usize,
        name: String,
        elapsed_ms: u64,
    },
    /// Candidate submission failed; queue continues.
    CandidateFailed {
        index: usize,
        name: String,
        error: String,
    },
    /// Candidate was already completed and kept its stored result.
    CandidateSkipped { index: usize, name: String },
    /// Batch run finished.
    BatchFinished {
        completed: usize,
        failed: usize,
        skipped: usize,
    },
}

/// Summary of one `process_all` run.
#[derive(Debug, Clone)]
pub struct ProcessReport {
    /// Candidates freshly submitted this run.
    pub processed: usize,
    /// Fresh submissions that completed.
    pub completed: usize,
    /// Fresh submissions that failed.
    pub failed: usize,
    /// Candidates skipped because they were already completed.
    pub skipped: usize,
    /// Mean wall time across freshly completed candidates.
    pub average: Option<Duration>,
    /// Concatenated result view, present when any candidate has text.
    pub aggregate: Option<String>,
}

/// The upload queue. Single writer; never mutated concurrently.
#[derive(Debug)]
pub struct UploadTracker {
    capacity: usize,
    candidates: Vec<CandidateFile>,
}

impl UploadTracker {
    /// Create an empty tracker with the given queue cap.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            candidates: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Admitted candidates, in queue order.
    pub fn candidates(&self) -> &[CandidateFile] {
        &self.candidates
    }

    /// Admit a batch of selected files.
    ///
    /// A batch that would exceed the queue cap is rejected wholesale and the
    /// queue is left unchanged. Within an admissible batch, non-image files
    /// and names already queued are skipped individually; the rest are
    /// appended in Pending status.
    pub fn admit(&mut self, batch: Vec<SelectedFile>) -> Result<AdmissionReport, AdmissionError> {
        if self.candidates.len() + batch.len() > self.capacity {
            return Err(AdmissionError::CapacityExceeded {
                capacity: self.capacity,
                queued: self.candidates.len(),
                requested: batch.len(),
            });
        }

        let mut report = AdmissionReport::default();
        for file in batch {
            if !is_image_upload(&file.name, file.content_type.as_deref(), &file.bytes) {
                report.skipped.push(AdmissionError::NotAnImage {
                    name: file.name,
                });
                continue;
            }
            if self.candidates.iter().any(|c| c.name == file.name) {
                report.skipped.push(AdmissionError::DuplicateName {
                    name: file.name,
                });
                continue;
            }
            report.admitted.push(file.name.clone());
            self.candidates.push(CandidateFile::new(file.name, file.bytes));
        }
        Ok(report)
    }

    /// Remove the candidate at `index`. Returns its name, or None when the
    /// index is out of range. Relative order of the rest is preserved.
    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index < self.candidates.len() {
            Some(self.candidates.remove(index).name)
        } else {
            None
        }
    }

    /// Drop every candidate.
    pub fn clear(&mut self) {
        self.candidates.clear();
    }

    /// Process the queue strictly sequentially.
    ///
    /// Iterates candidates in queue order, one submission completing before
    /// the next begins. Already-completed candidates keep their stored result
    /// and are not resubmitted; pending and errored candidates go through
    /// Processing and end Completed or Error. A failure never aborts the
    /// remaining queue. Every transition is announced on `events` before the
    /// next submission starts.
    pub async fn process_all(
        &mut self,
        recognizer: &dyn TextRecognition,
        languages: &str,
        events: mpsc::Sender<TrackerEvent>,
    ) -> ProcessReport {
        let mut report = ProcessReport {
            processed: 0,
            completed: 0,
            failed: 0,
            skipped: 0,
            average: None,
            aggregate: None,
        };

        if self.candidates.is_empty() {
            return report;
        }

        let _ = events
            .send(TrackerEvent::BatchStarted {
                total: self.candidates.len(),
            })
            .await;

        let mut fresh_times: Vec<Duration> = Vec::new();

        for index in 0..self.candidates.len() {
            let name = self.candidates[index].name.clone();

            if self.candidates[index].status.is_completed() {
                report.skipped += 1;
                let _ = events
                    .send(TrackerEvent::CandidateSkipped {
                        index,
                        name,
                    })
                    .await;
                continue;
            }

            self.candidates[index].status = CandidateStatus::Processing;
            let _ = events
                .send(TrackerEvent::CandidateStarted {
                    index,
                    name: name.clone(),
                })
                .await;

            report.processed += 1;
            let started = Instant::now();
            let outcome = recognizer
                .recognize(&self.candidates[index].content, &name, languages)
                .await;
            let elapsed = started.elapsed();

            match outcome {
                Ok(output) => {
                    report.completed += 1;
                    fresh_times.push(elapsed);
                    self.candidates[index].status = CandidateStatus::Completed {
                        text: output.text,
                        artifact: artifact_link(&name),
                        elapsed,
                    };
                    let _ = events
                        .send(TrackerEvent::CandidateCompleted {
                            index,
                            name,
                            elapsed_ms: elapsed.as_millis() as u64,
                        })
                        .await;
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("OCR failed for {}: {}", name, e);
                    self.candidates[index].status = CandidateStatus::Error {
                        message: e.to_string(),
                    };
                    let _ = events
                        .send(TrackerEvent::CandidateFailed {
                            index,
                            name,
                            error: e.to_string(),
                        })
                        .await;
                }
            }
        }

        report.average = mean_elapsed(&fresh_times);
        report.aggregate = self.aggregate();

        let _ = events
            .send(TrackerEvent::BatchFinished {
                completed: report.completed,
                failed: report.failed,
                skipped: report.skipped,
            })
            .await;

        report
    }

    /// Concatenated result view across the queue, in queue order.
    ///
    /// One block per candidate with non-empty text; None when no candidate
    /// has produced any.
    pub fn aggregate(&self) -> Option<String> {
        let blocks: Vec<String> = self
            .candidates
            .iter()
            .filter_map(|candidate| match &candidate.status {
                CandidateStatus::Completed { text, elapsed, .. } if !text.is_empty() => {
                    Some(format!(
                        "--- {} ({:.2}s) ---\n{}\n",
                        candidate.name,
                        elapsed.as_secs_f64(),
                        text
                    ))
                }
                _ => None,
            })
            .collect();

        if blocks.is_empty() {
            None
        } else {
            Some(blocks.join("\n"))
        }
    }

    /// Pure projection of the queue into display rows.
    pub fn render(&self) -> Vec<CandidateRow> {
        self.candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| CandidateRow::from_candidate(index, candidate))
            .collect()
    }
}

/// Convenience link to the OCR PDF the engine generates for an image name.
/// Not guaranteed to resolve.
fn artifact_link(name: &str) -> String {
    let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
    format!("/pdf/{}_ocr.pdf", stem)
}

/// Arithmetic mean of the given durations.
fn mean_elapsed(times: &[Duration]) -> Option<Duration> {
    if times.is_empty() {
        return None;
    }
    let total: Duration = times.iter().sum();
    Some(total / times.len() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::models::OcrOutput;
    use crate::relay::RelayError;

    // Minimal valid PNG signature; enough for content sniffing.
    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    /// Scripted recognizer that records call order and concurrency.
    #[derive(Default)]
    struct StubRecognizer {
        /// Filenames that should fail.
        failures: HashMap<String, String>,
        /// Text returned per filename; defaults to "text:{filename}".
        texts: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl StubRecognizer {
        fn failing(names: &[&str]) -> Self {
            Self {
                failures: names
                    .iter()
                    .map(|n| (n.to_string(), "engine exploded".to_string()))
                    .collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextRecognition for StubRecognizer {
        async fn recognize(
            &self,
            _image: &[u8],
            filename: &str,
            _languages: &str,
        ) -> Result<OcrOutput, RelayError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            self.calls.lock().unwrap().push(filename.to_string());

            // Yield so overlapping submissions would be observable.
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if let Some(message) = self.failures.get(filename) {
                return Err(RelayError::MalformedResponse(message.clone()));
            }
            let text = self
                .texts
                .get(filename)
                .cloned()
                .unwrap_or_else(|| format!("text:{}", filename));
            Ok(OcrOutput {
                text,
                details: Vec::new(),
            })
        }
    }

    fn image(name: &str) -> SelectedFile {
        SelectedFile {
            name: name.to_string(),
            content_type: Some("image/png".to_string()),
            bytes: PNG_MAGIC.to_vec(),
        }
    }

    fn events() -> (mpsc::Sender<TrackerEvent>, mpsc::Receiver<TrackerEvent>) {
        mpsc::channel(64)
    }

    #[test]
    fn over_capacity_batch_is_rejected_wholesale() {
        let mut tracker = UploadTracker::new(5);
        tracker
            .admit(vec![image("a.png"), image("b.png"), image("c.png")])
            .unwrap();

        let err = tracker
            .admit(vec![image("d.png"), image("e.png"), image("f.png")])
            .unwrap_err();

        assert!(matches!(err, AdmissionError::CapacityExceeded { .. }));
        // The whole batch was refused, including files that would have fit.
        assert_eq!(tracker.len(), 3);
        let names: Vec<_> = tracker.candidates().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, ["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn duplicate_name_skips_only_that_file() {
        let mut tracker = UploadTracker::new(5);
        tracker.admit(vec![image("a.png")]).unwrap();

        let report = tracker.admit(vec![image("a.png"), image("b.png")]).unwrap();

        assert_eq!(report.admitted, ["b.png"]);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(
            report.skipped[0],
            AdmissionError::DuplicateName { .. }
        ));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn non_image_is_skipped_with_message() {
        let mut tracker = UploadTracker::new(5);
        let report = tracker
            .admit(vec![
                SelectedFile {
                    name: "notes.txt".to_string(),
                    content_type: Some("text/plain".to_string()),
                    bytes: b"hello".to_vec(),
                },
                image("a.png"),
            ])
            .unwrap();

        assert_eq!(report.admitted, ["a.png"]);
        assert!(matches!(
            report.skipped[0],
            AdmissionError::NotAnImage { .. }
        ));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn remove_preserves_relative_order() {
        let mut tracker = UploadTracker::new(5);
        tracker
            .admit(vec![image("a.png"), image("b.png"), image("c.png")])
            .unwrap();

        assert_eq!(tracker.remove(1).as_deref(), Some("b.png"));
        assert_eq!(tracker.len(), 2);
        let names: Vec<_> = tracker.candidates().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, ["a.png", "c.png"]);

        assert_eq!(tracker.remove(7), None);
        assert_eq!(tracker.len(), 2);
    }

    #[tokio::test]
    async fn processes_in_insertion_order_without_overlap() {
        let mut tracker = UploadTracker::new(5);
        tracker
            .admit(vec![image("a.png"), image("b.png"), image("c.png")])
            .unwrap();

        let stub = StubRecognizer::default();
        let (tx, _rx) = events();
        let report = tracker.process_all(&stub, "en", tx).await;

        assert_eq!(report.processed, 3);
        assert_eq!(report.completed, 3);
        assert_eq!(stub.calls(), ["a.png", "b.png", "c.png"]);
        assert_eq!(stub.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_does_not_abort_the_queue() {
        let mut tracker = UploadTracker::new(5);
        tracker
            .admit(vec![image("a.png"), image("b.png"), image("c.png")])
            .unwrap();

        let stub = StubRecognizer::failing(&["b.png"]);
        let (tx, _rx) = events();
        let report = tracker.process_all(&stub, "en", tx).await;

        assert_eq!(report.processed, 3);
        assert_eq!(report.completed, 2);
        assert_eq!(report.failed, 1);
        // All three were attempted, in order.
        assert_eq!(stub.calls(), ["a.png", "b.png", "c.png"]);

        let rows = tracker.render();
        assert_eq!(rows[0].status, "completed");
        assert_eq!(rows[1].status, "error");
        assert_eq!(rows[2].status, "completed");
    }

    #[tokio::test]
    async fn rerun_resubmits_only_non_completed() {
        let mut tracker = UploadTracker::new(5);
        tracker.admit(vec![image("a.png"), image("b.png")]).unwrap();

        let stub = StubRecognizer::failing(&["b.png"]);
        let (tx, _rx) = events();
        tracker.process_all(&stub, "en", tx).await;

        // Second run: everything succeeds, but a.png keeps its stored text.
        let retry = StubRecognizer::default();
        let (tx, _rx) = events();
        let report = tracker.process_all(&retry, "en", tx).await;

        assert_eq!(retry.calls(), ["b.png"]);
        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped, 1);

        let aggregate = report.aggregate.unwrap();
        // a.png still contributes its first-run text to the aggregate.
        assert!(aggregate.contains("text:a.png"));
        assert!(aggregate.contains("text:b.png"));
        let a_pos = aggregate.find("--- a.png").unwrap();
        let b_pos = aggregate.find("--- b.png").unwrap();
        assert!(a_pos < b_pos);
    }

    #[tokio::test]
    async fn empty_queue_is_a_noop() {
        let mut tracker = UploadTracker::new(5);
        let stub = StubRecognizer::default();
        let (tx, mut rx) = events();
        let report = tracker.process_all(&stub, "en", tx).await;

        assert_eq!(report.processed, 0);
        assert!(report.aggregate.is_none());
        assert!(report.average.is_none());
        assert!(stub.calls().is_empty());
        // Not even a BatchStarted event.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn events_trace_every_transition() {
        let mut tracker = UploadTracker::new(5);
        tracker.admit(vec![image("a.png"), image("b.png")]).unwrap();

        let stub = StubRecognizer::failing(&["b.png"]);
        let (tx, mut rx) = events();
        tracker.process_all(&stub, "en", tx).await;

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(match event {
                TrackerEvent::BatchStarted { .. } => "start",
                TrackerEvent::CandidateStarted { .. } => "file-start",
                TrackerEvent::CandidateCompleted { .. } => "file-done",
                TrackerEvent::CandidateFailed { .. } => "file-fail",
                TrackerEvent::CandidateSkipped { .. } => "file-skip",
                TrackerEvent::BatchFinished { .. } => "finish",
            });
        }
        assert_eq!(
            kinds,
            ["start", "file-start", "file-done", "file-start", "file-fail", "finish"]
        );
    }

    #[test]
    fn aggregate_blocks_and_average() {
        let mut tracker = UploadTracker::new(5);
        tracker.admit(vec![image("a.png"), image("b.png")]).unwrap();

        // Two completed candidates with 1.0s and 3.0s timings.
        tracker.candidates[0].status = CandidateStatus::Completed {
            text: "A".to_string(),
            artifact: artifact_link("a.png"),
            elapsed: Duration::from_secs(1),
        };
        tracker.candidates[1].status = CandidateStatus::Completed {
            text: "B".to_string(),
            artifact: artifact_link("b.png"),
            elapsed: Duration::from_secs(3),
        };

        let aggregate = tracker.aggregate().unwrap();
        assert_eq!(
            aggregate,
            "--- a.png (1.00s) ---\nA\n\n--- b.png (3.00s) ---\nB\n"
        );

        let average =
            mean_elapsed(&[Duration::from_secs(1), Duration::from_secs(3)]).unwrap();
        assert_eq!(format!("{:.2}", average.as_secs_f64()), "2.00");
    }

    #[test]
    fn aggregate_skips_empty_text() {
        let mut tracker = UploadTracker::new(5);
        tracker.admit(vec![image("a.png")]).unwrap();
        tracker.candidates[0].status = CandidateStatus::Completed {
            text: String::new(),
            artifact: artifact_link("a.png"),
            elapsed: Duration::from_secs(1),
        };
        assert!(tracker.aggregate().is_none());
    }

    #[test]
    fn artifact_link_strips_last_extension() {
        assert_eq!(artifact_link("scan.png"), "/pdf/scan_ocr.pdf");
        assert_eq!(artifact_link("a.b.png"), "/pdf/a.b_ocr.pdf");
        assert_eq!(artifact_link("noext"), "/pdf/noext_ocr.pdf");
    }

    #[test]
    fn mean_elapsed_of_nothing_is_none() {
        assert!(mean_elapsed(&[]).is_none());
    }
}
