use std::time::Duration;

use gemini_client::{BackendError, EditBackend, GenerateRequest, InlineImage};

use crate::{
    config::RetryPolicy,
    error::{CanvasError, Result},
    prompt::build_prompt,
};

/// Everything sent to the remote service for one edit.
#[derive(Debug, Clone)]
pub struct EditPayload {
    pub image: InlineImage,
    pub mask: Option<InlineImage>,
    pub instruction: String,
    pub invert: bool,
    pub feather: f32,
}

/// Submits edits to an [`EditBackend`] and applies the retry policy.
///
/// Performs no storage or persistence; the caller owns the returned bytes.
pub struct EditInvoker<B> {
    backend: B,
    retry: RetryPolicy,
    temperature: f32,
    timeout: Duration,
}

impl<B: EditBackend> EditInvoker<B> {
    pub fn new(backend: B, retry: RetryPolicy, temperature: f32, timeout: Duration) -> Self {
        Self { backend, retry, temperature, timeout }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn request(&self, payload: &EditPayload) -> GenerateRequest {
        let prompt = build_prompt(&payload.instruction, payload.mask.is_some(), payload.invert, payload.feather);
        let mut images = Vec::with_capacity(2);
        images.push(payload.image.clone());
        images.extend(payload.mask.clone());
        GenerateRequest { prompt, images, temperature: self.temperature }
    }

    /// Run the edit, returning the first image the service produced.
    #[tracing::instrument(level = "debug", skip_all, fields(masked = payload.mask.is_some()))]
    pub async fn invoke(&self, payload: &EditPayload) -> Result<InlineImage> {
        let request = self.request(payload);
        let mut attempt: u32 = 1;

        loop {
            let outcome = match tokio::time::timeout(self.timeout, self.backend.generate(&request)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(BackendError::Timeout(self.timeout.as_secs())),
            };

            match outcome {
                Ok(response) => {
                    let finish_reason = response.finish_reason.clone();
                    return match response.into_first_image() {
                        Some(image) => {
                            tracing::debug!(attempt, bytes = image.bytes.len(), mime = %image.mime_type, "remote edit returned image");
                            Ok(image)
                        }
                        None => {
                            tracing::warn!(attempt, ?finish_reason, "remote edit returned no image");
                            Err(CanvasError::NoImageProduced { finish_reason })
                        }
                    };
                }
                Err(err) if self.retry.should_retry(&err, attempt) => {
                    tracing::warn!(
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = self.retry.delay_ms,
                        error = %err,
                        "remote edit rejected, retrying"
                    );
                    tokio::time::sleep(self.retry.delay()).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "remote edit failed");
                    return Err(CanvasError::from_backend(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, atomic::{AtomicUsize, Ordering}};
    use gemini_client::{GenerateResponse, ResponsePart};

    /// Replies from a fixed script, then repeats the last entry.
    struct Scripted {
        calls: AtomicUsize,
        script: Vec<fn() -> gemini_client::Result<GenerateResponse>>,
        seen: Mutex<Vec<GenerateRequest>>,
    }

    impl Scripted {
        fn new(script: Vec<fn() -> gemini_client::Result<GenerateResponse>>) -> Self {
            Self { calls: AtomicUsize::new(0), script, seen: Mutex::new(Vec::new()) }
        }
    }

    impl EditBackend for Scripted {
        async fn generate(&self, request: &GenerateRequest) -> gemini_client::Result<GenerateResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.clone());
            let reply = self.script[n.min(self.script.len() - 1)];
            reply()
        }
    }

    fn image_reply() -> gemini_client::Result<GenerateResponse> {
        Ok(GenerateResponse {
            parts: vec![
                ResponsePart::Text("done".to_string()),
                ResponsePart::Image(InlineImage::new(vec![9, 9], "image/png")),
            ],
            finish_reason: Some("STOP".to_string()),
        })
    }

    fn text_reply() -> gemini_client::Result<GenerateResponse> {
        Ok(GenerateResponse { parts: vec![ResponsePart::Text("sorry".to_string())], finish_reason: None })
    }

    fn invalid() -> gemini_client::Result<GenerateResponse> {
        Err(BackendError::InvalidArgument("Unable to process input image.".to_string()))
    }

    fn unavailable() -> gemini_client::Result<GenerateResponse> {
        Err(BackendError::Status { code: 503, status: Some("UNAVAILABLE".to_string()), message: "overloaded".to_string() })
    }

    fn invoker(script: Vec<fn() -> gemini_client::Result<GenerateResponse>>) -> EditInvoker<Scripted> {
        let retry = RetryPolicy { max_retries: 1, delay_ms: 1 };
        EditInvoker::new(Scripted::new(script), retry, 0.1, Duration::from_secs(5))
    }

    fn payload(with_mask: bool) -> EditPayload {
        EditPayload {
            image: InlineImage::new(vec![1], "image/png"),
            mask: with_mask.then(|| InlineImage::new(vec![2], "image/png")),
            instruction: "make it pop".to_string(),
            invert: false,
            feather: 4.0,
        }
    }

    #[tokio::test]
    async fn test_mask_is_sent_as_second_image() {
        let invoker = invoker(vec![image_reply]);
        let image = invoker.invoke(&payload(true)).await.unwrap();
        assert_eq!(image.bytes, vec![9, 9]);

        let seen = invoker.backend().seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].images.len(), 2);
        assert_eq!(seen[0].images[1].bytes, vec![2]);
        assert!(seen[0].prompt.contains("SECOND image"));
    }

    #[tokio::test]
    async fn test_invalid_argument_is_retried_once() {
        let invoker = invoker(vec![invalid, image_reply]);
        assert!(invoker.invoke(&payload(false)).await.is_ok());
        assert_eq!(invoker.backend().calls.load(Ordering::SeqCst), 2);

        let invoker = self::invoker(vec![invalid]);
        let err = invoker.invoke(&payload(false)).await.unwrap_err();
        assert!(matches!(err, CanvasError::RemoteInvalidArgument(_)));
        assert_eq!(invoker.backend().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_other_failures_are_not_retried() {
        let invoker = invoker(vec![unavailable, image_reply]);
        let err = invoker.invoke(&payload(false)).await.unwrap_err();
        assert!(matches!(err, CanvasError::Remote(BackendError::Status { code: 503, .. })));
        assert_eq!(invoker.backend().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_text_only_reply_is_no_image_produced() {
        let invoker = invoker(vec![text_reply, image_reply]);
        let err = invoker.invoke(&payload(true)).await.unwrap_err();
        assert!(matches!(err, CanvasError::NoImageProduced { .. }));
        assert_eq!(invoker.backend().calls.load(Ordering::SeqCst), 1);
    }

    struct Stalled;

    impl EditBackend for Stalled {
        async fn generate(&self, _request: &GenerateRequest) -> gemini_client::Result<GenerateResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(GenerateResponse::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_call_times_out() {
        let invoker = EditInvoker::new(Stalled, RetryPolicy::default(), 0.1, Duration::from_secs(30));
        let err = invoker.invoke(&payload(false)).await.unwrap_err();
        assert!(matches!(err, CanvasError::Remote(BackendError::Timeout(30))));
    }
}
