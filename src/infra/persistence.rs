use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::info;

use crate::chess::{GameRecord, PgnReader};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to write game archive {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("archive lock poisoned")]
    Poisoned,
}

/// Куда складываются завершённые партии.
///
/// Хранилище только дописывается: одна запись на партию, без транзакций.
pub trait GameArchive {
    fn save_game(&mut self, record: &GameRecord) -> Result<(), ArchiveError>;
}

/// Append-only PGN файл. Каждая запись сразу сбрасывается на диск.
#[derive(Debug)]
pub struct PgnFileArchive {
    path: PathBuf,
    file: File,
}

impl PgnFileArchive {
    /// Открыть (или создать) файл на дозапись.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ArchiveError::Io {
                path: path.display().to_string(),
                source,
            })?;
        info!(path = %path.display(), "game archive opened");
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GameArchive for PgnFileArchive {
    fn save_game(&mut self, record: &GameRecord) -> Result<(), ArchiveError> {
        let io_err = |source| ArchiveError::Io {
            path: self.path.display().to_string(),
            source,
        };
        self.file
            .write_all(record.to_pgn().as_bytes())
            .map_err(io_err)?;
        self.file.flush().map_err(io_err)
    }
}

/// Открыть архив для реплея. Файла нет -> `None` (первый запуск).
pub fn open_history(path: impl AsRef<Path>) -> io::Result<Option<PgnReader<BufReader<File>>>> {
    match File::open(path) {
        Ok(file) => Ok(Some(PgnReader::new(BufReader::new(file)))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// In-memory архив для тестов. Клоны делят один список записей.
#[derive(Clone, Debug, Default)]
pub struct InMemoryGameArchive {
    records: Arc<Mutex<Vec<GameRecord>>>,
}

impl InMemoryGameArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Снимок сохранённых записей.
    pub fn records(&self) -> Vec<GameRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl GameArchive for InMemoryGameArchive {
    fn save_game(&mut self, record: &GameRecord) -> Result<(), ArchiveError> {
        self.records
            .lock()
            .map_err(|_| ArchiveError::Poisoned)?
            .push(record.clone());
        Ok(())
    }
}
