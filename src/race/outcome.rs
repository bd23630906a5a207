//! Race status and statistics

use std::time::Duration;

/// Lifecycle of a single race. `Won` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RaceStatus {
    #[default]
    Running,
    Won,
    Failed,
}

impl RaceStatus {
    /// Whether the race has reached a terminal state.
    pub fn is_terminal(self) -> bool {
        !matches!(self, RaceStatus::Running)
    }
}

impl std::fmt::Display for RaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RaceStatus::Running => write!(f, "running"),
            RaceStatus::Won => write!(f, "won"),
            RaceStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Snapshot of the counters kept by a race's coordination state.
#[derive(Debug, Clone, Default)]
pub struct RaceStats {
    /// Current status of the race
    pub status: RaceStatus,
    /// Worker whose candidate won, if any
    pub winner: Option<usize>,
    /// Candidates handed to `end`, including ones arriving after the race ended
    pub candidates_reported: u64,
    /// Candidates that failed verification
    pub candidates_rejected: u64,
    /// Workers whose task has not returned yet
    pub active_workers: usize,
    /// Time since the race was started
    pub elapsed: Duration,
}

impl RaceStats {
    /// Fraction of reported candidates that were rejected (0.0 to 1.0)
    pub fn rejection_rate(&self) -> f64 {
        if self.candidates_reported == 0 {
            0.0
        } else {
            self.candidates_rejected as f64 / self.candidates_reported as f64
        }
    }

    /// Candidates reported per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.candidates_reported as f64 / secs
        }
    }

    /// Format statistics as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Status: {}\n", self.status));
        if let Some(winner) = self.winner {
            s.push_str(&format!("Winner: worker {}\n", winner));
        }
        s.push_str(&format!("Time: {:.2?}\n", self.elapsed));
        s.push_str(&format!(
            "Candidates reported: {}\n",
            self.candidates_reported
        ));
        s.push_str(&format!(
            "Candidates rejected: {} ({:.1}%)\n",
            self.candidates_rejected,
            self.rejection_rate() * 100.0
        ));
        s.push_str(&format!(
            "Throughput: {:.0} candidates/sec\n",
            self.throughput()
        ));
        s
    }
}
