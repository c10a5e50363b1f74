use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use super::Action;
use crate::error::Result;

/// One debug record per step
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord<'a> {
    pub timestamp: DateTime<Local>,
    pub episode: u64,
    pub step: u64,
    pub action: &'a Action,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
}

/// Appends step records as JSON lines to `<dir>/YYYY-MM-DD/steps_HHMMSS.jsonl`
pub struct StepLog {
    base_dir: PathBuf,
    current: Option<PathBuf>,
}

impl StepLog {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            current: None,
        }
    }

    pub fn start(&mut self) -> Result<PathBuf> {
        let now: DateTime<Local> = Local::now();
        let dir = self.base_dir.join(now.format("%Y-%m-%d").to_string());
        fs::create_dir_all(&dir)?;

        let file = dir.join(format!("steps_{}.jsonl", now.format("%H%M%S")));
        self.current = Some(file.clone());
        Ok(file)
    }

    pub fn append(&self, record: &StepRecord<'_>) -> Result<()> {
        if let Some(ref path) = self.current {
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            writeln!(file, "{}", serde_json::to_string(record)?)?;
        }
        Ok(())
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_append_writes_json_lines() {
        let dir = tempdir().unwrap();
        let mut log = StepLog::new(dir.path());
        let path = log.start().unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(log.current_path(), Some(path.as_path()));

        let action = Action::Discrete(7);
        for step in 1..=2 {
            log.append(&StepRecord {
                timestamp: Local::now(),
                episode: 1,
                step,
                action: &action,
                reward: 0.5,
                terminated: false,
                truncated: false,
            })
            .unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["step"], 2);
        assert_eq!(lines[0]["action"]["discrete"], 7);
        assert_eq!(lines[0]["reward"], 0.5);
    }

    #[test]
    fn test_append_before_start_is_noop() {
        let dir = tempdir().unwrap();
        let log = StepLog::new(dir.path());
        let action = Action::Discrete(0);
        log.append(&StepRecord {
            timestamp: Local::now(),
            episode: 0,
            step: 0,
            action: &action,
            reward: 0.0,
            terminated: false,
            truncated: false,
        })
        .unwrap();
        assert!(log.current_path().is_none());
    }
}
