//! Loading and saving quest definition files.
//!
//! One quest per JSON file, in a single folder, with a fixed extension.
//! Loaded quests are auto-repaired before they are handed out.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::book::QuestBook;
use crate::core::{EngineConfig, EntityId};
use crate::error::{QuestError, Result};
use crate::quests::Quest;

/// Reads and writes the quest folder.
#[derive(Clone, Debug)]
pub struct QuestLoader {
    folder: PathBuf,
    extension: String,
}

impl QuestLoader {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            folder: config.quest_folder.clone(),
            extension: config.extension.clone(),
        }
    }

    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Read, parse and repair one quest file.
    pub fn load_file(path: &Path) -> Result<Quest> {
        let content = fs::read_to_string(path).map_err(|source| QuestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut quest: Quest = serde_json::from_str(&content).map_err(|source| QuestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let fixes = quest.auto_repair();
        if fixes > 0 {
            warn!("Repaired {} problem(s) in {:?}", fixes, path);
        }
        Ok(quest)
    }

    /// Quest files in the folder, sorted by file name.
    pub fn quest_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.folder.is_dir() {
            warn!("Quest folder does not exist: {:?}", self.folder);
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.folder).map_err(|source| QuestError::Io {
            path: self.folder.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| QuestError::Io {
                    path: self.folder.clone(),
                    source,
                })?
                .path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == self.extension.as_str()) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Every quest in the folder. Files that fail to load are logged and
    /// skipped.
    pub fn load_all(&self) -> Result<Vec<Quest>> {
        let mut quests = Vec::new();
        for path in self.quest_paths()? {
            match Self::load_file(&path) {
                Ok(quest) => quests.push(quest),
                Err(err) => warn!("Skipping quest file {:?}: {}", path, err),
            }
        }
        info!("Loaded {} quest(s) from {:?}", quests.len(), self.folder);
        Ok(quests)
    }

    /// Load the folder into `book`. Returns the new ids.
    pub fn load_into(&self, book: &mut QuestBook) -> Result<Vec<EntityId>> {
        self.load_all()?
            .iter()
            .map(|quest| book.import(quest))
            .collect()
    }

    /// File a quest would be saved to.
    #[must_use]
    pub fn path_for(&self, quest: &Quest) -> PathBuf {
        let stem: String = quest
            .title
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.folder.join(format!("{stem}.{}", self.extension))
    }

    /// Write `quest` to the folder. Returns the path written.
    pub fn save_quest(&self, quest: &Quest) -> Result<PathBuf> {
        let path = self.path_for(quest);
        let json = serde_json::to_string_pretty(quest).map_err(|source| QuestError::Parse {
            path: path.clone(),
            source,
        })?;
        fs::create_dir_all(&self.folder).map_err(|source| QuestError::Io {
            path: self.folder.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| QuestError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
