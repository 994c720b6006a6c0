//! JSONL (JSON Lines) files.
//!
//! Each non-empty line is one JSON object.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use super::StorageError;

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Write entities, replacing the entire file.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        let mut count = 0;

        for entity in entities {
            let json = serde_json::to_string(entity)?;
            writeln!(writer, "{}", json)?;
            count += 1;
        }

        writer.flush()?;
        info!("Wrote {} entities to {:?}", count, self.path);

        Ok(count)
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read every entity, failing on the first line that does not parse.
    ///
    /// A missing file reads as empty.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let entity = serde_json::from_str(&line).map_err(|e| StorageError::MalformedLine {
                path: self.path.clone(),
                line: idx + 1,
                reason: e.to_string(),
            })?;
            entities.push(entity);
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }
}
