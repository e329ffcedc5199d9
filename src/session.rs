use std::path::Path;

use tracing::{info, warn};

use crate::archive::{load_archive, Progress};
use crate::error::Result;
use crate::models::Dataset;
use crate::qa::{self, CompletionService};
use crate::summary::summarize;

/// In-memory state of one run. Holds at most one dataset, replaced wholesale
/// by each successful load.
#[derive(Debug, Default)]
pub struct Session {
    dataset: Option<Dataset>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Load an archive. On failure the previously loaded dataset is kept.
    pub fn load(&mut self, path: &Path, progress: &mut dyn Progress) -> Result<&Dataset> {
        let fresh = load_archive(path, progress).map_err(|e| {
            if self.dataset.is_some() {
                warn!("load failed, keeping previous data: {e}");
            }
            e
        })?;
        if let Some(prev) = &self.dataset {
            if prev.checksum == fresh.checksum {
                info!("reloaded archive is identical to the current one");
            }
        }
        Ok(self.dataset.insert(fresh))
    }

    pub fn summary(&self) -> String {
        summarize(self.dataset.as_ref())
    }

    pub fn ask(&self, service: &dyn CompletionService, question: &str) -> Result<String> {
        qa::ask(service, &self.summary(), question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::{write_archive, write_zip};
    use crate::archive::Silent;
    use crate::qa::test_support::Canned;
    use crate::summary::NO_DATA;

    #[test]
    fn test_no_data_until_first_successful_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new();
        assert_eq!(session.summary(), NO_DATA);

        let bogus = write_zip(dir.path(), "empty.zip", &[]);
        assert!(session.load(&bogus, &mut Silent).is_err());
        assert_eq!(session.summary(), NO_DATA);

        let good = write_archive(dir.path(), &[("A", "ACME", "VENDA", "SP", "RJ", "1.00")], &[]);
        session.load(&good, &mut Silent).unwrap();
        assert_ne!(session.summary(), NO_DATA);
    }

    #[test]
    fn test_failed_load_keeps_previous_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new();
        let good = write_archive(dir.path(), &[("A", "ACME", "VENDA", "SP", "RJ", "1.00")], &[]);
        session.load(&good, &mut Silent).unwrap();
        let before = session.summary();

        let bogus = dir.path().join("missing.zip");
        assert!(session.load(&bogus, &mut Silent).is_err());
        assert_eq!(session.summary(), before);
        assert_eq!(session.dataset().unwrap().source, good);
    }

    #[test]
    fn test_reload_replaces_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new();
        let first = write_archive(dir.path(), &[("A", "ACME", "VENDA", "SP", "RJ", "1.00")], &[]);
        session.load(&first, &mut Silent).unwrap();

        let second_dir = tempfile::tempdir().unwrap();
        let second = write_archive(
            second_dir.path(),
            &[
                ("X", "OUTRA", "DEVOLUÇÃO", "MG", "MG", "9.00"),
                ("Y", "OUTRA", "DEVOLUÇÃO", "MG", "MG", "1.00"),
            ],
            &[],
        );
        let ds = session.load(&second, &mut Silent).unwrap();
        assert_eq!(ds.headers.len(), 2);
        assert!(session.summary().contains("{'DEVOLUÇÃO': 2}"));
    }

    #[test]
    fn test_ask_sends_current_summary() {
        let svc = Canned::answering("ok");
        let session = Session::new();
        assert_eq!(session.ask(&svc, "tem dados?").unwrap(), "ok");
        assert!(svc.prompts.borrow()[0].contains(NO_DATA));
    }
}
