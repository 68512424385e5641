use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures::{Stream, StreamExt};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::filename::with_suffix;
use crate::{Error, Result};

/// Saves files into one directory without ever replacing a file that is already there.
///
/// When `Film.srt` exists the file goes to `Film-1.srt`, then `Film-2.srt` and so on, up to
/// `max_attempts` alternatives. Picking and creating a name is serialised per writer, so one
/// writer shared by a whole batch never hands out the same name twice. Other processes writing
/// to the same directory are not coordinated with.
#[derive(Debug)]
pub struct CollisionSafeWriter {
    directory: PathBuf,
    max_attempts: u32,
    reservation: Mutex<()>,
}

impl CollisionSafeWriter {
    /// An empty `directory` means the current working directory.
    pub fn new(directory: impl Into<PathBuf>, max_attempts: u32) -> Self {
        Self {
            directory: directory.into(),
            max_attempts,
            reservation: Mutex::new(()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Writes `stream` to `filename` (or the first free alternative) and returns the path used.
    pub async fn save<S, B>(&self, stream: S, filename: &str) -> Result<PathBuf>
    where
        S: Stream<Item = Result<B>>,
        B: AsRef<[u8]>,
    {
        let (path, mut file) = self.create_unique(filename).await?;

        match copy(stream, &mut file).await {
            Ok(bytes) => {
                log::info!("Saved {} ({bytes} bytes)", path.display());
                Ok(path)
            }
            Err(e) => {
                drop(file);
                if let Err(remove_err) = fs::remove_file(&path).await {
                    log::warn!(
                        "Failed to remove partial file {}: {remove_err}",
                        path.display()
                    );
                }
                Err(e)
            }
        }
    }

    async fn create_unique(&self, filename: &str) -> Result<(PathBuf, File)> {
        let _guard = self.reservation.lock().await;

        for attempt in 0..=self.max_attempts {
            let name = match attempt {
                0 => filename.to_string(),
                n => with_suffix(filename, n),
            };
            let path = self.directory.join(&name);

            match fs::symlink_metadata(&path).await {
                Ok(_) => {
                    log::debug!("{} already exists", path.display());
                    continue;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }

            // Something may still appear between the check and here; never open it for writing.
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    if attempt > 0 {
                        log::warn!("{filename} is taken, saving as {name}");
                    }
                    return Ok((path, file));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::CollisionExhausted {
            path: self.directory.join(filename),
            attempts: self.max_attempts,
        })
    }
}

async fn copy<S, B>(stream: S, file: &mut File) -> Result<u64>
where
    S: Stream<Item = Result<B>>,
    B: AsRef<[u8]>,
{
    let mut stream = std::pin::pin!(stream);
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(chunk.as_ref()).await?;
        written += chunk.as_ref().len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
