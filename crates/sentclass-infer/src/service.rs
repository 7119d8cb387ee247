//! Classifier service facade: per-text and per-sentence classification.

use futures::stream::{self, StreamExt, TryStreamExt};
use sentclass_core::{ClassificationResult, ClassifyError, DocumentResult, ModelIo, ModelRef};
use tracing::{debug, info, warn};

use crate::assembler::assemble;
use crate::backend::{InferRequest, InferenceInvoker, Readiness, SentenceSegmenter};
use crate::codec::{decode_predictions, encode_input};
use crate::grouper::group;

/// Batches in flight at once when no limit is configured.
pub const DEFAULT_MAX_CONCURRENT_BATCHES: usize = 4;

/// Which classification model to call and how to batch requests to it.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub model: ModelRef,
    pub io: ModelIo,
    /// Maximum texts per inference request. `None` sends everything at once.
    pub batch_size: Option<usize>,
    /// Upper bound on batch requests in flight. Zero is treated as one.
    pub max_concurrent_batches: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            model: ModelRef::default(),
            io: ModelIo::default(),
            batch_size: None,
            max_concurrent_batches: DEFAULT_MAX_CONCURRENT_BATCHES,
        }
    }
}

/// Classifies texts against a remote model, optionally per sentence.
///
/// Holds no mutable state; concurrent calls are independent.
pub struct ClassifierService<S, P> {
    segmenter: S,
    predictor: P,
    options: ServiceOptions,
}

impl<S, P> ClassifierService<S, P>
where
    S: SentenceSegmenter,
    P: InferenceInvoker + Readiness,
{
    pub fn new(segmenter: S, predictor: P, options: ServiceOptions) -> Self {
        Self {
            segmenter,
            predictor,
            options,
        }
    }

    /// Classify each text. `result[i]` is the classification of `texts[i]`.
    ///
    /// With a batch size, chunks are sent as concurrent requests, at most
    /// `max_concurrent_batches` at a time, and the results concatenated in
    /// chunk order.
    pub async fn get_preds(
        &self,
        texts: &[String],
    ) -> Result<Vec<ClassificationResult>, ClassifyError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let chunk_size = match self.options.batch_size {
            Some(n) if n > 0 => n,
            _ => texts.len(),
        };
        let batches: Vec<Vec<ClassificationResult>> = stream::iter(texts.chunks(chunk_size))
            .map(|chunk| self.classify_batch(chunk))
            .buffered(self.options.max_concurrent_batches.max(1))
            .try_collect()
            .await?;

        let results: Vec<ClassificationResult> = batches.into_iter().flatten().collect();
        info!(
            model = %self.options.model.name,
            count = results.len(),
            "classified texts"
        );
        Ok(results)
    }

    async fn classify_batch(
        &self,
        texts: &[String],
    ) -> Result<Vec<ClassificationResult>, ClassifyError> {
        let io = &self.options.io;
        let input = encode_input(&io.input_name, &io.input_datatype, texts)?;
        debug!(texts = texts.len(), bytes = input.data.len(), "sending inference request");

        let outputs = self
            .predictor
            .infer(InferRequest {
                model: self.options.model.clone(),
                input,
                outputs: io.output_names(),
            })
            .await?;

        let (predicts, scores) = decode_predictions(&outputs, io)?;
        let results = assemble(predicts, scores)?;
        if results.len() != texts.len() {
            return Err(ClassifyError::LengthMismatch {
                what: "input/result",
                left: texts.len(),
                right: results.len(),
            });
        }
        Ok(results)
    }

    /// Segment each document into sentences, classify every sentence, and
    /// return one [`DocumentResult`] per document in input order.
    pub async fn get_preds_per_sent(
        &self,
        documents: &[String],
    ) -> Result<Vec<DocumentResult>, ClassifyError> {
        let units = self.segmenter.segment(documents).await?;
        let texts: Vec<String> = units.iter().map(|u| u.text.clone()).collect();
        let results = self.get_preds(&texts).await?;
        group(documents.len(), &units, &results)
    }

    /// Single snapshot of server liveness and readiness. Probe failures are
    /// logged and reported as not ready.
    pub async fn is_ready(&self) -> bool {
        match self.ensure_ready().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "inference server not ready");
                false
            }
        }
    }

    /// Like [`is_ready`](Self::is_ready), but keeps the reason.
    pub async fn ensure_ready(&self) -> Result<(), ClassifyError> {
        if self.predictor.live().await? && self.predictor.ready().await? {
            Ok(())
        } else {
            Err(ClassifyError::NotReady)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use sentclass_core::SentenceUnit;

    use super::*;
    use crate::codec::tests::{bytes_output, f32_output};
    use crate::codec::{RawOutput, decode_strings};

    /// Labels a text `POS` if it contains "good", else `NEG`; the score is
    /// the text's byte length divided by 100.
    struct FakePredictor {
        live: bool,
        ready: bool,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
        delay: Option<Duration>,
        drop_last_score: bool,
    }

    impl FakePredictor {
        fn healthy() -> Self {
            Self {
                live: true,
                ready: true,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
                delay: None,
                drop_last_score: false,
            }
        }
    }

    #[async_trait]
    impl InferenceInvoker for FakePredictor {
        async fn infer(&self, request: InferRequest) -> Result<Vec<RawOutput>, ClassifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
            }
            let texts = decode_strings(&request.input.name, &request.input.data)?;
            let labels: Vec<&str> = texts
                .iter()
                .map(|t| if t.contains("good") { "POS" } else { "NEG" })
                .collect();
            let mut scores: Vec<f32> = texts.iter().map(|t| t.len() as f32 / 100.0).collect();
            if self.drop_last_score {
                scores.pop();
            }
            Ok(vec![
                f32_output("score", &scores),
                bytes_output("predict", &labels),
            ])
        }
    }

    #[async_trait]
    impl Readiness for FakePredictor {
        async fn live(&self) -> Result<bool, ClassifyError> {
            Ok(self.live)
        }

        async fn ready(&self) -> Result<bool, ClassifyError> {
            Ok(self.ready)
        }
    }

    /// Splits on '.' and tags each piece with its document index.
    struct DotSegmenter;

    #[async_trait]
    impl SentenceSegmenter for DotSegmenter {
        async fn segment(&self, documents: &[String]) -> Result<Vec<SentenceUnit>, ClassifyError> {
            let mut units = Vec::new();
            for (group_index, doc) in documents.iter().enumerate() {
                let sentences = doc.split('.').map(str::trim).filter(|s| !s.is_empty());
                for (sentence_index, text) in sentences.enumerate() {
                    units.push(SentenceUnit {
                        text: format!("{text}."),
                        sentence_index: sentence_index as i64,
                        group_index: group_index as i64,
                    });
                }
            }
            Ok(units)
        }
    }

    /// Returns a fixed set of units regardless of input.
    struct FixedSegmenter(Mutex<Vec<SentenceUnit>>);

    #[async_trait]
    impl SentenceSegmenter for FixedSegmenter {
        async fn segment(&self, _: &[String]) -> Result<Vec<SentenceUnit>, ClassifyError> {
            Ok(self.0.lock().unwrap().clone())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl Readiness for Unreachable {
        async fn live(&self) -> Result<bool, ClassifyError> {
            Err(ClassifyError::Transport("connection refused".into()))
        }

        async fn ready(&self) -> Result<bool, ClassifyError> {
            Err(ClassifyError::Transport("connection refused".into()))
        }
    }

    #[async_trait]
    impl InferenceInvoker for Unreachable {
        async fn infer(&self, _: InferRequest) -> Result<Vec<RawOutput>, ClassifyError> {
            Err(ClassifyError::Transport("connection refused".into()))
        }
    }

    fn service<P: InferenceInvoker + Readiness>(
        predictor: P,
        batch_size: Option<usize>,
    ) -> ClassifierService<DotSegmenter, P> {
        ClassifierService::new(
            DotSegmenter,
            predictor,
            ServiceOptions {
                model: ModelRef::new("sentiment", "1"),
                io: ModelIo::default(),
                batch_size,
                max_concurrent_batches: DEFAULT_MAX_CONCURRENT_BATCHES,
            },
        )
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn get_preds_preserves_order() {
        let svc = service(FakePredictor::healthy(), None);
        let results = svc
            .get_preds(&strings(&["good day", "bad", "so good"]))
            .await
            .unwrap();
        let labels: Vec<&str> = results.iter().map(|r| r.predict.as_str()).collect();
        assert_eq!(labels, ["POS", "NEG", "POS"]);
        assert_eq!(results[1].score, 0.03);
    }

    #[tokio::test]
    async fn batching_splits_requests_and_keeps_order() {
        let svc = service(FakePredictor::healthy(), Some(2));
        let texts = strings(&["good", "no", "nope", "good one", "x"]);

        let results = svc.get_preds(&texts).await.unwrap();

        assert_eq!(svc.predictor.calls.load(Ordering::SeqCst), 3);
        let labels: Vec<&str> = results.iter().map(|r| r.predict.as_str()).collect();
        assert_eq!(labels, ["POS", "NEG", "NEG", "POS", "NEG"]);
    }

    #[tokio::test]
    async fn batches_in_flight_are_bounded() {
        let predictor = FakePredictor {
            delay: Some(Duration::from_millis(5)),
            ..FakePredictor::healthy()
        };
        let svc = ClassifierService::new(
            DotSegmenter,
            predictor,
            ServiceOptions {
                batch_size: Some(1),
                max_concurrent_batches: 3,
                ..ServiceOptions::default()
            },
        );
        let texts: Vec<String> = (0..40)
            .map(|i| if i % 2 == 0 { format!("good {i}") } else { format!("bad {i}") })
            .collect();

        let results = svc.get_preds(&texts).await.unwrap();

        assert_eq!(svc.predictor.calls.load(Ordering::SeqCst), 40);
        let peak = svc.predictor.peak_in_flight.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak in flight {peak} exceeds limit");
        assert!(peak > 1, "batches were not sent concurrently");
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.predict, if i % 2 == 0 { "POS" } else { "NEG" });
        }
    }

    #[tokio::test]
    async fn zero_concurrency_limit_still_classifies() {
        let svc = ClassifierService::new(
            DotSegmenter,
            FakePredictor::healthy(),
            ServiceOptions {
                batch_size: Some(2),
                max_concurrent_batches: 0,
                ..ServiceOptions::default()
            },
        );
        let results = svc.get_preds(&strings(&["good", "no", "good"])).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(svc.predictor.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_input_skips_backend() {
        let svc = service(FakePredictor::healthy(), None);
        assert!(svc.get_preds(&[]).await.unwrap().is_empty());
        assert_eq!(svc.predictor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn short_score_output_is_length_mismatch() {
        let predictor = FakePredictor {
            drop_last_score: true,
            ..FakePredictor::healthy()
        };
        let svc = service(predictor, None);
        let err = svc.get_preds(&strings(&["a", "b"])).await.unwrap_err();
        assert!(matches!(err, ClassifyError::LengthMismatch { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn per_sentence_groups_by_document() {
        let svc = service(FakePredictor::healthy(), None);
        let docs = strings(&["a good start. then bad.", "", "good."]);

        let results = svc.get_preds_per_sent(&docs).await.unwrap();

        assert_eq!(results.len(), 3);
        let first = &results[0].sentence_predictions;
        assert_eq!(first.len(), 2);
        assert_eq!((first[0].index, first[0].predict.as_str()), (0, "POS"));
        assert_eq!(first[0].text, "a good start.");
        assert_eq!((first[1].index, first[1].predict.as_str()), (1, "NEG"));
        assert!(results[1].is_empty());
        assert_eq!(results[2].sentence_predictions[0].text, "good.");
    }

    #[tokio::test]
    async fn per_sentence_rejects_out_of_range_group() {
        let units = vec![SentenceUnit {
            text: "stray.".into(),
            sentence_index: 0,
            group_index: 5,
        }];
        let svc = ClassifierService::new(
            FixedSegmenter(Mutex::new(units)),
            FakePredictor::healthy(),
            ServiceOptions::default(),
        );
        let err = svc
            .get_preds_per_sent(&strings(&["one doc"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifyError::GroupIndexOutOfRange { group_index: 5, .. }));
    }

    #[tokio::test]
    async fn ready_requires_live_and_ready() {
        assert!(service(FakePredictor::healthy(), None).is_ready().await);

        let not_ready = FakePredictor {
            ready: false,
            ..FakePredictor::healthy()
        };
        let svc = service(not_ready, None);
        assert!(!svc.is_ready().await);
        assert!(matches!(svc.ensure_ready().await, Err(ClassifyError::NotReady)));

        let not_live = FakePredictor {
            live: false,
            ..FakePredictor::healthy()
        };
        assert!(!service(not_live, None).is_ready().await);
    }

    #[tokio::test]
    async fn unreachable_backend_is_retryable() {
        let svc = service(Unreachable, None);
        assert!(!svc.is_ready().await);

        let err = svc.get_preds(&strings(&["hello"])).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, ClassifyError::Transport(_)));
    }
}
