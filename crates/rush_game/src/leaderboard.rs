//! Score sinks available to the runner.
//!
//! `LocalLeaderboard` keeps every submitted score in a JSON file and applies
//! the same acceptance rules as the hosted score API. `UnconfiguredSink`
//! stands in when no leaderboard is set up, so runs still end with a
//! visible "not saved" status instead of silently dropping the score.

use rush_sim::{ScoreSink, ScoreSubmission, SubmitError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_TOP_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub anon_id: String,
    pub score: u32,
    /// Milliseconds since the unix epoch.
    pub created_at: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LeaderboardFile {
    rows: Vec<ScoreRow>,
}

#[derive(Debug)]
pub struct LocalLeaderboard {
    path: PathBuf,
    max_score: u32,
    rows: Mutex<Vec<ScoreRow>>,
}

impl LocalLeaderboard {
    /// Open the leaderboard at `path`. A missing file starts empty.
    pub fn open(path: &Path, max_score: u32) -> Result<Self, String> {
        let rows = if path.exists() {
            let raw = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
            let file: LeaderboardFile = serde_json::from_str(&raw)
                .map_err(|e| format!("Failed to parse leaderboard JSON {}: {e}", path.display()))?;
            file.rows
        } else {
            Vec::new()
        };
        log::info!(
            "Leaderboard {} opened with {} rows",
            path.display(),
            rows.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            max_score,
            rows: Mutex::new(rows),
        })
    }

    /// Best rows first; ties go to the most recent.
    pub fn top(&self, limit: usize) -> Vec<ScoreRow> {
        let mut rows = match self.rows.lock() {
            Ok(rows) => rows.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        sort_rows(&mut rows);
        rows.truncate(limit);
        rows
    }

    fn persist(&self, rows: &[ScoreRow]) -> Result<(), SubmitError> {
        let file = LeaderboardFile {
            rows: rows.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| SubmitError::Io(format!("serialize leaderboard: {e}")))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| SubmitError::Io(format!("create {}: {e}", parent.display())))?;
        }
        fs::write(&self.path, json)
            .map_err(|e| SubmitError::Io(format!("write {}: {e}", self.path.display())))
    }
}

impl ScoreSink for LocalLeaderboard {
    fn submit(&self, submission: &ScoreSubmission) -> Result<(), SubmitError> {
        if submission.anon_id.trim().is_empty() {
            return Err(SubmitError::Rejected("anon_id is empty".to_string()));
        }
        if submission.score > self.max_score {
            return Err(SubmitError::Rejected(format!(
                "score {} outside 0..={}",
                submission.score, self.max_score
            )));
        }

        let mut rows = self
            .rows
            .lock()
            .map_err(|_| SubmitError::Io("leaderboard lock poisoned".to_string()))?;
        rows.push(ScoreRow {
            anon_id: submission.anon_id.clone(),
            score: submission.score,
            created_at: now_millis(),
        });
        if let Err(err) = self.persist(&rows) {
            rows.pop();
            return Err(err);
        }
        log::debug!("Stored score {} for {}", submission.score, submission.anon_id);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct UnconfiguredSink;

impl ScoreSink for UnconfiguredSink {
    fn submit(&self, _submission: &ScoreSubmission) -> Result<(), SubmitError> {
        Err(SubmitError::Unavailable(
            "leaderboard not configured".to_string(),
        ))
    }
}

fn sort_rows(rows: &mut [ScoreRow]) {
    rows.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "rush_leaderboard_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn submission(anon_id: &str, score: u32) -> ScoreSubmission {
        ScoreSubmission {
            anon_id: anon_id.to_string(),
            score,
        }
    }

    #[test]
    fn scores_persist_across_opens() {
        let path = temp_file_path("persist");
        let board = LocalLeaderboard::open(&path, 50_000).expect("open");
        board.submit(&submission("a", 12)).expect("submit");
        board.submit(&submission("b", 40)).expect("submit");

        let reopened = LocalLeaderboard::open(&path, 50_000).expect("reopen");
        let top = reopened.top(DEFAULT_TOP_LIMIT);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].anon_id, "b");
        assert_eq!(top[1].score, 12);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn invalid_submissions_are_rejected() {
        let path = temp_file_path("reject");
        let board = LocalLeaderboard::open(&path, 50_000).expect("open");
        assert!(matches!(
            board.submit(&submission("  ", 5)),
            Err(SubmitError::Rejected(_))
        ));
        assert!(matches!(
            board.submit(&submission("a", 50_001)),
            Err(SubmitError::Rejected(_))
        ));
        board.submit(&submission("a", 50_000)).expect("max is accepted");
        assert_eq!(board.top(10).len(), 1);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn ordering_is_score_then_newest() {
        let mut rows = vec![
            ScoreRow {
                anon_id: "old".to_string(),
                score: 30,
                created_at: 1,
            },
            ScoreRow {
                anon_id: "low".to_string(),
                score: 10,
                created_at: 5,
            },
            ScoreRow {
                anon_id: "new".to_string(),
                score: 30,
                created_at: 9,
            },
        ];
        sort_rows(&mut rows);
        let order: Vec<&str> = rows.iter().map(|r| r.anon_id.as_str()).collect();
        assert_eq!(order, vec!["new", "old", "low"]);
    }

    #[test]
    fn top_respects_limit() {
        let path = temp_file_path("limit");
        let board = LocalLeaderboard::open(&path, 50_000).expect("open");
        for score in 0..5 {
            board.submit(&submission("a", score)).expect("submit");
        }
        let top = board.top(3);
        assert_eq!(top.iter().map(|r| r.score).collect::<Vec<_>>(), vec![4, 3, 2]);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn corrupt_file_fails_to_open() {
        let path = temp_file_path("corrupt");
        fs::write(&path, "not json").expect("write");
        let err = LocalLeaderboard::open(&path, 50_000).expect_err("corrupt file");
        assert!(err.contains("Failed to parse leaderboard JSON"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unconfigured_sink_always_fails() {
        let err = UnconfiguredSink
            .submit(&submission("a", 1))
            .expect_err("never configured");
        assert_eq!(err.to_string(), "leaderboard unavailable: leaderboard not configured");
    }
}
