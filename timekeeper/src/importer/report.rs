use std::fmt;

use sysinfo::{ProcessesToUpdate, System};

/// Resident memory of this process in bytes; `None` where the platform
/// does not expose it.
pub fn memory_usage() -> Option<u64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    sys.process(pid).map(|process| process.memory())
}

pub fn bytes_human_readable(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["b", "kB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut exp = 0;
    while value >= 1024.0 && exp < UNITS.len() - 1 {
        value /= 1024.0;
        exp += 1;
    }
    let value = (value * 100.0).round() / 100.0;
    format!("{value} {}", UNITS[exp])
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    pub start: Option<u64>,
    pub after_fetch: Option<u64>,
    pub after_import: Option<u64>,
}

/// Outcome of an import run. Aborted runs carry the counts reached so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub legacy_rows: usize,
    pub users: usize,
    pub customers: usize,
    pub projects: usize,
    pub global_activities: usize,
    pub scoped_activities: usize,
    pub timesheets: usize,
    /// Placeholder owners created for records of unknown users.
    pub synthesized_users: usize,
    /// Activities created while importing timesheet records.
    pub synthesized_activities: usize,
    /// Timesheet records that could not be imported.
    pub failed: usize,
    /// Entities dropped under `ValidationPolicy::Skip`.
    pub skipped: usize,
    /// Legacy ids of records whose activity belongs to another project.
    pub mismatched: Vec<i64>,
    pub warnings: Vec<String>,
    pub memory: MemoryUsage,
}

impl RunReport {
    pub fn activities(&self) -> usize {
        self.global_activities + self.scoped_activities
    }

    pub fn total_imported(&self) -> usize {
        self.users
            + self.customers
            + self.projects
            + self.activities()
            + self.timesheets
            + self.synthesized_users
            + self.synthesized_activities
    }

    pub(crate) fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Imported users: {}", self.users)?;
        writeln!(f, "Imported customers: {}", self.customers)?;
        writeln!(f, "Imported projects: {}", self.projects)?;
        writeln!(
            f,
            "Imported activities: {} ({} global, {} project specific)",
            self.activities(),
            self.global_activities,
            self.scoped_activities
        )?;
        writeln!(f, "Imported timesheet records: {}", self.timesheets)?;
        if self.synthesized_users > 0 {
            writeln!(
                f,
                "Created users during timesheet import: {}",
                self.synthesized_users
            )?;
        }
        if self.synthesized_activities > 0 {
            writeln!(
                f,
                "Created activities during timesheet import: {}",
                self.synthesized_activities
            )?;
        }
        if self.failed > 0 {
            writeln!(f, "Failed timesheet records: {}", self.failed)?;
        }
        if self.skipped > 0 {
            writeln!(f, "Skipped invalid entities: {}", self.skipped)?;
        }
        if !self.mismatched.is_empty() {
            let ids = self
                .mismatched
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                f,
                "Found {} timesheets with activity and project mismatch: {ids}",
                self.mismatched.len()
            )?;
        }
        if !self.warnings.is_empty() {
            writeln!(f, "Warnings: {}", self.warnings.len())?;
        }

        let human = |v: Option<u64>| v.map(bytes_human_readable).unwrap_or_else(|| "n/a".into());
        writeln!(f, "Memory usage:")?;
        writeln!(f, "  Start: {}", human(self.memory.start))?;
        writeln!(f, "  After caching: {}", human(self.memory.after_fetch))?;
        writeln!(f, "  After import: {}", human(self.memory.after_import))?;
        if let (Some(start), Some(end)) = (self.memory.start, self.memory.after_import) {
            write!(
                f,
                "  Total consumption for importing {} new database entries: {}",
                self.total_imported(),
                bytes_human_readable(end.saturating_sub(start))
            )?;
        } else {
            write!(
                f,
                "  Total new database entries: {}",
                self.total_imported()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_human_readable() {
        assert_eq!(bytes_human_readable(0), "0 b");
        assert_eq!(bytes_human_readable(512), "512 b");
        assert_eq!(bytes_human_readable(1536), "1.5 kB");
        assert_eq!(bytes_human_readable(5 * 1024 * 1024), "5 MB");
        assert_eq!(bytes_human_readable(3 * 1024 * 1024 * 1024 * 1024), "3072 GB");
    }

    #[test]
    fn test_display_lists_mismatches() {
        let report = RunReport {
            timesheets: 4,
            failed: 1,
            mismatched: vec![7, 9],
            ..Default::default()
        };
        let text = report.to_string();
        assert!(text.contains("Imported timesheet records: 4"));
        assert!(text.contains("Failed timesheet records: 1"));
        assert!(text.contains("Found 2 timesheets with activity and project mismatch: 7, 9"));
        assert!(!text.contains("Created users"));
    }

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    #[test]
    fn test_memory_usage_reports_resident_bytes() {
        // Touch a few MB so the page-size scaling is visible in the total.
        let buffer = vec![1u8; 8 * 1024 * 1024];
        let resident = memory_usage().unwrap_or(0);
        assert_eq!(buffer[buffer.len() - 1], 1);
        assert!(resident >= 8 * 1024 * 1024);
    }
}
