use crate::error::HistoryError;

/// Separator between fields, both in `atuin search --format` output and in
/// the records handed to fzf.
pub const FIELD_DELIMITER: &str = "\t:::\t";

/// Directory value atuin reports when the cwd was not recorded.
pub const UNKNOWN_DIR: &str = "unknown";

/// Exit value atuin reports when the command never finished.
pub const UNKNOWN_EXIT: &str = "-1";

const ATUIN_FIELDS: usize = 6;

/// One recorded command execution, as reported by `atuin search`.
///
/// Every field is kept as the text atuin printed. Equality covers all fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HistoryEntry {
    pub time: String,
    pub relative_time: String,
    pub duration: String,
    pub exit: String,
    pub directory: String,
    pub command: String,
}

impl HistoryEntry {
    /// The `--format` template passed to atuin. The command goes last so it
    /// may itself contain the delimiter.
    pub fn atuin_format() -> String {
        [
            "{time}",
            "{relativetime}",
            "{duration}",
            "{exit}",
            "{directory}",
            "{command}",
        ]
        .join(FIELD_DELIMITER)
    }

    /// Parse one NUL-separated chunk of `atuin search` output.
    pub fn parse_atuin(text: &str) -> Result<Self, HistoryError> {
        let parts: Vec<&str> = text.splitn(ATUIN_FIELDS, FIELD_DELIMITER).collect();
        let [time, relative_time, duration, exit, directory, command] = parts[..] else {
            return Err(HistoryError::Format {
                record: text.to_string(),
                found: parts.len(),
                expected: ATUIN_FIELDS,
            });
        };

        Ok(Self {
            time: time.to_string(),
            relative_time: relative_time.to_string(),
            duration: duration.to_string(),
            exit: exit.to_string(),
            directory: directory.to_string(),
            command: command.to_string(),
        })
    }

    /// Copy of this entry with the relative time blanked.
    ///
    /// The relative time drifts with the wall clock, so two queries can report
    /// the same execution with different text there.
    pub fn without_relative_time(&self) -> Self {
        Self {
            relative_time: String::new(),
            ..self.clone()
        }
    }

    pub fn has_unknown_exit(&self) -> bool {
        self.exit == UNKNOWN_EXIT
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_atuin_keeps_delimiter_inside_command() {
        let line = [
            "2024-01-01 10:00:00",
            "3h",
            "15ms",
            "0",
            "/home/user",
            "echo a\t:::\tb",
        ]
        .join(FIELD_DELIMITER);

        let entry = HistoryEntry::parse_atuin(&line).unwrap();
        assert_eq!(entry.time, "2024-01-01 10:00:00");
        assert_eq!(entry.relative_time, "3h");
        assert_eq!(entry.duration, "15ms");
        assert_eq!(entry.exit, "0");
        assert_eq!(entry.directory, "/home/user");
        assert_eq!(entry.command, "echo a\t:::\tb");
    }

    #[test]
    fn parse_atuin_rejects_short_records() {
        let err = HistoryEntry::parse_atuin("2024\t:::\t3h\t:::\tls").unwrap_err();
        match err {
            HistoryError::Format {
                found, expected, ..
            } => {
                assert_eq!(found, 3);
                assert_eq!(expected, 6);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn format_template_puts_command_last() {
        let format = HistoryEntry::atuin_format();
        assert!(format.starts_with("{time}"));
        assert!(format.ends_with("{command}"));
        assert_eq!(format.matches(FIELD_DELIMITER).count(), 5);
    }

    #[test]
    fn relative_time_is_ignored_after_normalizing() {
        let a = HistoryEntry {
            relative_time: "1m".into(),
            command: "ls".into(),
            ..Default::default()
        };
        let b = HistoryEntry {
            relative_time: "2m".into(),
            ..a.clone()
        };

        assert_ne!(a, b);
        assert_eq!(a.without_relative_time(), b.without_relative_time());
    }
}
