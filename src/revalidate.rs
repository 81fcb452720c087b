use std::sync::Mutex;

/// Cache-invalidation seam.
///
/// Mutating actions carry the path of the page they originated from and
/// signal it here so whatever rendering layer sits in front of this service
/// can drop its cached copy. The signal is fire-and-forget; it never fails
/// the action that triggered it.
pub trait Revalidator: Send + Sync {
    fn revalidate(&self, path: &str);
}

/// Default revalidator: emits the signal to the log.
pub struct LogRevalidator;

impl Revalidator for LogRevalidator {
    fn revalidate(&self, path: &str) {
        tracing::debug!("revalidate: {}", path);
    }
}

/// Records revalidated paths; used by tests to assert the signal fired.
#[derive(Default)]
pub struct RecordingRevalidator {
    paths: Mutex<Vec<String>>,
}

impl RecordingRevalidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Revalidator for RecordingRevalidator {
    fn revalidate(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}
