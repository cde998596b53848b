use crate::errors::ProviderError;
use crate::progress::ConsoleProgress;

/// One generation backend: prompt text in, raw text out, or a classified
/// failure. Implementations hold their own credentials and HTTP plumbing;
/// the orchestrator never looks inside.
pub trait GenBackend {
    fn name(&self) -> &str;
    fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Try each configured backend in priority order and return the first
/// non-empty response. Every failure is logged with its classification and
/// the next backend is tried; when all fail, the last error propagates.
/// No backend is retried here: retry/cooldown policy lives in the pipeline.
pub fn generate_with_fallback(
    backends: &[Box<dyn GenBackend>],
    prompt: &str,
    progress: &ConsoleProgress,
) -> Result<String, ProviderError> {
    let mut last_err: Option<ProviderError> = None;
    for backend in backends {
        match backend.generate(prompt) {
            Ok(text) if !text.trim().is_empty() => return Ok(text),
            Ok(_) => {
                progress.log(
                    "FALLBACK",
                    format!("رد فارغ من {} — التجربة بالمزود التالي...", backend.name()),
                );
                last_err = Some(ProviderError::Transient(format!(
                    "empty response from {}",
                    backend.name()
                )));
            }
            Err(err) => {
                progress.log(
                    "FALLBACK",
                    format!(
                        "{} على {} — التجربة بالمزود التالي...",
                        err.fallback_label(),
                        backend.name()
                    ),
                );
                last_err = Some(err);
            }
        }
    }
    Err(last_err
        .unwrap_or_else(|| ProviderError::Transient("لا يوجد مزود متاح".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Scripted {
        name: &'static str,
        result: fn() -> Result<String, ProviderError>,
        calls: Cell<usize>,
    }

    impl GenBackend for Scripted {
        fn name(&self) -> &str {
            self.name
        }
        fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            self.calls.set(self.calls.get() + 1);
            (self.result)()
        }
    }

    fn boxed(
        name: &'static str,
        result: fn() -> Result<String, ProviderError>,
    ) -> Box<dyn GenBackend> {
        Box::new(Scripted {
            name,
            result,
            calls: Cell::new(0),
        })
    }

    #[test]
    fn first_success_short_circuits() {
        let backends = vec![
            boxed("a", || Ok("[1]".to_string())),
            boxed("b", || panic!("must not be called")),
        ];
        let progress = ConsoleProgress::new(false);
        let out = generate_with_fallback(&backends, "p", &progress).expect("text");
        assert_eq!(out, "[1]");
    }

    #[test]
    fn rate_limited_falls_through_to_next_backend() {
        let backends = vec![
            boxed("a", || Err(ProviderError::RateLimited("429".to_string()))),
            boxed("b", || Ok("[2]".to_string())),
        ];
        let progress = ConsoleProgress::new(false);
        let out = generate_with_fallback(&backends, "p", &progress).expect("text");
        assert_eq!(out, "[2]");
    }

    #[test]
    fn empty_text_is_not_a_success() {
        let backends = vec![
            boxed("a", || Ok("   ".to_string())),
            boxed("b", || Ok("[3]".to_string())),
        ];
        let progress = ConsoleProgress::new(false);
        let out = generate_with_fallback(&backends, "p", &progress).expect("text");
        assert_eq!(out, "[3]");
    }

    #[test]
    fn last_error_wins_when_all_fail() {
        let backends = vec![
            boxed("a", || Err(ProviderError::RateLimited("429".to_string()))),
            boxed("b", || Err(ProviderError::Transient("boom".to_string()))),
        ];
        let progress = ConsoleProgress::new(false);
        let err = generate_with_fallback(&backends, "p", &progress).unwrap_err();
        assert!(matches!(err, ProviderError::Transient(_)));
    }
}
