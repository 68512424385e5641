use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::{Id, JoinSet};

use crate::{CollisionSafeWriter, Error, Result, ShooterClient, SubtitleCandidate};

/// What happened to one candidate of a batch.
#[derive(Debug)]
pub struct FetchResult {
    pub candidate: SubtitleCandidate,
    pub outcome: Result<PathBuf>,
}

/// One [`FetchResult`] per candidate, in the order the candidates were given.
#[derive(Debug, Default)]
pub struct BatchReport {
    results: Vec<FetchResult>,
}

impl BatchReport {
    pub fn results(&self) -> &[FetchResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn saved(&self) -> impl Iterator<Item = (&SubtitleCandidate, &Path)> {
        self.results.iter().filter_map(|result| match &result.outcome {
            Ok(path) => Some((&result.candidate, path.as_path())),
            Err(_) => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&SubtitleCandidate, &Error)> {
        self.results.iter().filter_map(|result| match &result.outcome {
            Ok(_) => None,
            Err(e) => Some((&result.candidate, e)),
        })
    }

    pub fn into_results(self) -> Vec<FetchResult> {
        self.results
    }
}

impl IntoIterator for BatchReport {
    type Item = FetchResult;
    type IntoIter = std::vec::IntoIter<FetchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl ShooterClient {
    /// Downloads a single candidate into `directory`, which must already exist.
    /// An empty `directory` means the current working directory.
    pub async fn fetch(
        &self,
        candidate: &SubtitleCandidate,
        directory: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let directory = directory.as_ref();
        if !directory.as_os_str().is_empty() && !tokio::fs::metadata(directory).await?.is_dir() {
            return Err(Error::NotADirectory(directory.to_path_buf()));
        }
        let writer = CollisionSafeWriter::new(directory, self.config.max_collision_attempts);
        self.fetch_and_save(candidate, &writer).await
    }

    /// Downloads every candidate concurrently into `directory`.
    ///
    /// Each candidate gets its own task. A failing task doesn't stop the others, and this only
    /// returns once all of them are done. If the returned future is dropped early, the remaining
    /// tasks are aborted.
    pub async fn fetch_all(
        &self,
        candidates: Vec<SubtitleCandidate>,
        directory: impl Into<PathBuf>,
    ) -> BatchReport {
        let writer = Arc::new(CollisionSafeWriter::new(
            directory,
            self.config.max_collision_attempts,
        ));

        let mut tasks = JoinSet::new();
        let mut slots = HashMap::with_capacity(candidates.len());
        for (index, candidate) in candidates.iter().cloned().enumerate() {
            let client = self.clone();
            let writer = Arc::clone(&writer);
            let handle =
                tasks.spawn(async move { client.fetch_and_save(&candidate, &writer).await });
            slots.insert(handle.id(), index);
        }

        let outcomes = join_in_order(tasks, &slots, candidates.len()).await;

        let results = candidates
            .into_iter()
            .zip(outcomes)
            .map(|(candidate, outcome)| {
                if let Err(e) = &outcome {
                    log::warn!("Failed to fetch {}: {e}", candidate.download_link());
                }
                FetchResult { candidate, outcome }
            })
            .collect();

        BatchReport { results }
    }

    async fn fetch_and_save(
        &self,
        candidate: &SubtitleCandidate,
        writer: &CollisionSafeWriter,
    ) -> Result<PathBuf> {
        let content = self.fetch_content(candidate).await?;
        let filename = content.filename().to_string();
        writer.save(content.into_stream(), &filename).await
    }
}

/// Waits for every task and returns their outcomes ordered by the index `slots` maps them to.
/// A panicked or cancelled task yields `Error::Join` in its slot.
async fn join_in_order(
    mut tasks: JoinSet<Result<PathBuf>>,
    slots: &HashMap<Id, usize>,
    len: usize,
) -> Vec<Result<PathBuf>> {
    let mut outcomes: Vec<Option<Result<PathBuf>>> =
        std::iter::repeat_with(|| None).take(len).collect();
    while let Some(joined) = tasks.join_next_with_id().await {
        let (id, outcome) = match joined {
            Ok((id, outcome)) => (id, outcome),
            Err(e) => (e.id(), Err(Error::Join(e))),
        };
        if let Some(&index) = slots.get(&id) {
            outcomes[index] = Some(outcome);
        }
    }

    outcomes
        .into_iter()
        .map(|outcome| {
            outcome.unwrap_or_else(|| {
                Err(Error::Io(std::io::Error::other("download task was lost")))
            })
        })
        .collect()
}
