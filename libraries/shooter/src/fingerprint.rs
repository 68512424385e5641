use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use std::str::FromStr;

use crate::{Error, Result};

/// Size of each sampled block.
pub const BLOCK_SIZE: u64 = 4096;

/// Anything smaller can't be a film, and the last offset would underflow.
pub const MIN_FILE_SIZE: u64 = BLOCK_SIZE * 4;

const SEGMENTS: usize = 4;

/// Four lowercase hex MD5 digests joined by `;`, in sampling order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(';')
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let segments: Vec<&str> = s.split(';').collect();
        let well_formed = segments.len() == SEGMENTS
            && segments.iter().all(|segment| {
                segment.len() == 32
                    && segment
                        .bytes()
                        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
            });
        if well_formed {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::InvalidFingerprint(s.to_string()))
        }
    }
}

/// Offsets of the sampled blocks for a file of `size` bytes.
///
/// The order (start, two thirds, one third, end) and the divide-then-multiply rounding are what
/// the service computes on its side, so they must stay exactly like this.
pub fn sample_offsets(size: u64) -> [u64; SEGMENTS] {
    [BLOCK_SIZE, size / 3 * 2, size / 3, size - 2 * BLOCK_SIZE]
}

/// Computes the fingerprint the service uses to identify a film file.
pub fn compute_fingerprint(path: impl AsRef<Path>) -> Result<Fingerprint> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    if size < MIN_FILE_SIZE {
        return Err(Error::FileTooSmall { size });
    }

    let mut block = [0u8; BLOCK_SIZE as usize];
    let mut digests = Vec::with_capacity(SEGMENTS);
    for offset in sample_offsets(size) {
        read_block(&mut file, offset, &mut block)?;
        digests.push(format!("{:x}", md5::compute(block)));
    }

    let fingerprint = Fingerprint(digests.join(";"));
    log::debug!("Fingerprint of {}: {fingerprint}", path.display());
    Ok(fingerprint)
}

fn read_block(file: &mut File, offset: u64, block: &mut [u8]) -> Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    let mut filled = 0;
    while filled < block.len() {
        match file.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    if filled < block.len() {
        return Err(Error::PartialRead {
            offset,
            read: filled,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn film_with_size(size: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        let content: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        file.write_all(&content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_too_small() {
        let film = film_with_size(MIN_FILE_SIZE as usize - 1);
        match compute_fingerprint(film.path()) {
            Err(Error::FileTooSmall { size }) => assert_eq!(size, MIN_FILE_SIZE - 1),
            other => panic!("expected FileTooSmall, got {other:?}"),
        }

        let empty = NamedTempFile::new().unwrap();
        assert!(matches!(
            compute_fingerprint(empty.path()),
            Err(Error::FileTooSmall { size: 0 })
        ));
    }

    #[test]
    fn test_format() {
        for size in [MIN_FILE_SIZE as usize, 16385, 1_000_003] {
            let film = film_with_size(size);
            let fingerprint = compute_fingerprint(film.path()).unwrap();

            let segments: Vec<&str> = fingerprint.segments().collect();
            assert_eq!(segments.len(), 4);
            for segment in segments {
                assert_eq!(segment.len(), 32);
                assert!(
                    segment
                        .chars()
                        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
                );
            }
            // Round-trips through the validating parser
            assert_eq!(fingerprint.as_str().parse::<Fingerprint>().unwrap(), fingerprint);
        }
    }

    #[test]
    fn test_deterministic() {
        let film = film_with_size(200_000);
        let first = compute_fingerprint(film.path()).unwrap();
        let second = compute_fingerprint(film.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_samples_in_service_order() {
        // Every block gets its own fill byte so each digest identifies where it was read from.
        let size = 30_000usize;
        let content: Vec<u8> = (0..size).map(|i| (i / 4096) as u8 + 1).collect();
        let mut film = NamedTempFile::new().unwrap();
        film.write_all(&content).unwrap();
        film.flush().unwrap();

        let expected: Vec<String> = sample_offsets(size as u64)
            .iter()
            .map(|&offset| {
                let offset = offset as usize;
                format!("{:x}", md5::compute(&content[offset..offset + 4096]))
            })
            .collect();

        let fingerprint = compute_fingerprint(film.path()).unwrap();
        assert_eq!(fingerprint.as_str(), expected.join(";"));
    }

    #[test]
    fn test_sample_offsets() {
        assert_eq!(sample_offsets(16384), [4096, 10922, 5461, 8192]);
        // Divides before multiplying
        assert_eq!(sample_offsets(16385), [4096, 10922, 5461, 8193]);
        assert_eq!(sample_offsets(30_000), [4096, 20000, 10000, 21808]);
    }

    #[test]
    fn test_partial_read() {
        let film = film_with_size(5000);
        let mut file = File::open(film.path()).unwrap();
        let mut block = [0u8; BLOCK_SIZE as usize];
        match read_block(&mut file, 4000, &mut block) {
            Err(Error::PartialRead { offset, read }) => {
                assert_eq!(offset, 4000);
                assert_eq!(read, 1000);
            }
            other => panic!("expected PartialRead, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("abc".parse::<Fingerprint>().is_err());
        let three = ["0".repeat(32), "1".repeat(32), "2".repeat(32)].join(";");
        assert!(three.parse::<Fingerprint>().is_err());
        let upper = ["A".repeat(32), "1".repeat(32), "2".repeat(32), "3".repeat(32)].join(";");
        assert!(upper.parse::<Fingerprint>().is_err());
    }

    #[test]
    #[ignore] // Needs the film file, which isn't checked in
    fn test_known_film() {
        let fingerprint = compute_fingerprint("Eva.2011.720p.BluRay.x264-DON.mkv").unwrap();
        assert_eq!(
            fingerprint.as_str(),
            "66781fc73341bf357500505ad7de1ede;e75e7b0e54b37e3ca511523314e3f1e2;454a5bcb53654a08b2345a606e0cafe6;3f2af6eab10caa9909c0a54652400dd9"
        );
    }
}
