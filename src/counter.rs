use log::error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::CounterError;

pub const COUNTER_FILE: &str = "tickets.json";

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct CounterDocument {
    #[serde(default)]
    pub counter: u64,
}

/// Where the last issued ticket number lives.
///
/// `load` returns `None` only when nothing has been stored yet.
pub trait CounterStorage: Send {
    fn load(&self) -> Result<Option<u64>, CounterError>;
    fn store(&self, value: u64) -> Result<(), CounterError>;
}

/// `<data dir>/tickets.json`, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Creates the data directory and an initial `{ "counter": 0 }` document when they are
    /// missing or the file is blank. Existing content is validated, not overwritten.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, CounterError> {
        let data_dir = data_dir.as_ref();
        if !data_dir.exists() {
            fs::create_dir_all(data_dir)?;
        }
        let storage = Self {
            path: data_dir.join(COUNTER_FILE),
        };
        if storage.load()?.is_none() {
            storage.store(0)?;
        }
        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CounterStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<u64>, CounterError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let document: CounterDocument =
            serde_json::from_str(&raw).map_err(|source| CounterError::Corrupt {
                path: self.path.display().to_string(),
                source,
            })?;
        Ok(Some(document.counter))
    }

    fn store(&self, value: u64) -> Result<(), CounterError> {
        let json = serde_json::to_string_pretty(&CounterDocument { counter: value }).map_err(
            |source| CounterError::Corrupt {
                path: self.path.display().to_string(),
                source,
            },
        )?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Keeps the counter in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    value: StdMutex<Option<u64>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(value: u64) -> Self {
        Self {
            value: StdMutex::new(Some(value)),
        }
    }

    pub fn current(&self) -> Option<u64> {
        *self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CounterStorage for MemoryStorage {
    fn load(&self) -> Result<Option<u64>, CounterError> {
        Ok(self.current())
    }

    fn store(&self, value: u64) -> Result<(), CounterError> {
        *self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(value);
        Ok(())
    }
}

/// Hands out ticket numbers. The read-increment-write runs under one async lock, so two
/// interactions handled at the same time never see the same number.
pub struct TicketCounter {
    storage: Mutex<Box<dyn CounterStorage>>,
}

impl TicketCounter {
    pub fn new<S: CounterStorage + 'static>(storage: S) -> Self {
        Self {
            storage: Mutex::new(Box::new(storage)),
        }
    }

    /// Locks the store and persists the next number before handing it out, so a number
    /// that reaches a channel is always on disk. Dropping the reservation without
    /// [`Reservation::commit`] writes the previous value back.
    pub async fn reserve(&self) -> Result<Reservation<'_>, CounterError> {
        let storage = self.storage.lock().await;
        let previous = storage.load()?.unwrap_or(0);
        let number = previous.checked_add(1).ok_or(CounterError::Overflow)?;
        storage.store(number)?;
        Ok(Reservation {
            storage,
            previous,
            number,
            committed: false,
        })
    }

    /// Reserves and commits in one step.
    pub async fn next(&self) -> Result<u64, CounterError> {
        Ok(self.reserve().await?.commit())
    }

    pub async fn current(&self) -> Result<u64, CounterError> {
        Ok(self.storage.lock().await.load()?.unwrap_or(0))
    }
}

#[must_use = "a reservation that is never committed is rolled back"]
pub struct Reservation<'a> {
    storage: MutexGuard<'a, Box<dyn CounterStorage>>,
    previous: u64,
    number: u64,
    committed: bool,
}

impl Reservation<'_> {
    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn commit(mut self) -> u64 {
        self.committed = true;
        self.number
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // the lock is still held, nobody can have moved past `number`
        if let Err(e) = self.storage.store(self.previous) {
            error!(
                "🛑 Could not release ticket #{}, it will be skipped: {}",
                self.number, e
            );
        }
    }
}

/// Memory store whose next `failures` writes fail like a full disk.
#[cfg(test)]
pub(crate) struct FailingStorage {
    inner: MemoryStorage,
    failures: StdMutex<usize>,
}

#[cfg(test)]
impl FailingStorage {
    pub(crate) fn new(failures: usize) -> Self {
        Self {
            inner: MemoryStorage::new(),
            failures: StdMutex::new(failures),
        }
    }
}

#[cfg(test)]
impl CounterStorage for FailingStorage {
    fn load(&self) -> Result<Option<u64>, CounterError> {
        self.inner.load()
    }

    fn store(&self, value: u64) -> Result<(), CounterError> {
        let mut failures = self.failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(std::io::Error::other("disk full").into());
        }
        self.inner.store(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_first_number_is_one() {
        let counter = TicketCounter::new(MemoryStorage::new());
        assert_eq!(counter.next().await.unwrap(), 1);
        assert_eq!(counter.current().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sequence_has_no_gaps() {
        let counter = TicketCounter::new(MemoryStorage::new());
        let mut issued = Vec::new();
        for _ in 0..25 {
            issued.push(counter.next().await.unwrap());
        }
        assert_eq!(issued, (1..=25).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_dropped_reservation_does_not_advance() {
        let counter = TicketCounter::new(MemoryStorage::starting_at(4));
        {
            let reservation = counter.reserve().await.unwrap();
            assert_eq!(reservation.number(), 5);
        }
        assert_eq!(counter.current().await.unwrap(), 4);
        assert_eq!(counter.next().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_reserved_number_is_stored_before_commit() {
        let counter = TicketCounter::new(MemoryStorage::new());
        let reservation = counter.reserve().await.unwrap();
        assert_eq!(reservation.storage.load().unwrap(), Some(1));
        assert_eq!(reservation.commit(), 1);
        assert_eq!(counter.current().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_hands_out_nothing() {
        let counter = TicketCounter::new(FailingStorage::new(1));
        assert!(matches!(counter.reserve().await, Err(CounterError::Io(_))));
        assert_eq!(counter.current().await.unwrap(), 0);
        assert_eq!(counter.next().await.unwrap(), 1);
        assert_eq!(counter.next().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_get_distinct_numbers() {
        let counter = std::sync::Arc::new(TicketCounter::new(MemoryStorage::new()));
        let mut handles = Vec::new();
        for _ in 0..16 {
            let counter = counter.clone();
            handles.push(tokio::spawn(async move { counter.next().await.unwrap() }));
        }
        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap());
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=16).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_overflow_is_an_error() {
        let counter = TicketCounter::new(MemoryStorage::starting_at(u64::MAX));
        assert!(matches!(
            counter.next().await,
            Err(CounterError::Overflow)
        ));
    }

    #[test]
    fn test_open_creates_directory_and_file() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("nested").join("data");
        let storage = JsonFileStorage::open(&data_dir).unwrap();
        assert!(storage.path().exists());
        assert_eq!(storage.load().unwrap(), Some(0));
    }

    #[test]
    fn test_blank_file_is_reinitialised() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(COUNTER_FILE), "  \n").unwrap();
        let storage = JsonFileStorage::open(dir.path()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(0));
    }

    #[test]
    fn test_existing_value_is_kept() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(COUNTER_FILE), r#"{ "counter": 41 }"#).unwrap();
        let storage = JsonFileStorage::open(dir.path()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(41));
    }

    #[test]
    fn test_corrupt_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(COUNTER_FILE);
        fs::write(&path, "{ counter: ").unwrap();
        assert!(matches!(
            JsonFileStorage::open(dir.path()),
            Err(CounterError::Corrupt { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ counter: ");
    }

    #[tokio::test]
    async fn test_file_counter_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        {
            let counter = TicketCounter::new(JsonFileStorage::open(dir.path()).unwrap());
            assert_eq!(counter.next().await.unwrap(), 1);
            assert_eq!(counter.next().await.unwrap(), 2);
        }
        let counter = TicketCounter::new(JsonFileStorage::open(dir.path()).unwrap());
        assert_eq!(counter.next().await.unwrap(), 3);

        let raw = fs::read_to_string(dir.path().join(COUNTER_FILE)).unwrap();
        let document: CounterDocument = serde_json::from_str(&raw).unwrap();
        assert_eq!(document, CounterDocument { counter: 3 });
        assert!(!dir.path().join("tickets.json.tmp").exists());
    }
}
