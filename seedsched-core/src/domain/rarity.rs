//! Rarity log records
//!
//! The edge and path rarity filters append one line per interesting input
//! to their logs, in the form `<score>,<filename>,<tag>`. The tag selects
//! which companion directory the filename resolves under.

use thiserror::Error;

/// Result type alias for record parsing
pub type Result<T> = std::result::Result<T, RecordParseError>;

/// Errors for a single rarity log line
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordParseError {
    /// Line did not split into exactly three comma-separated fields
    #[error("expected 3 comma-separated fields, found {0}")]
    FieldCount(usize),

    /// First field was not a parseable float
    #[error("invalid score: {0:?}")]
    InvalidScore(String),

    /// Third field matched neither the queue nor the crash tag
    #[error("unknown tag: {0:?}")]
    UnknownTag(String),
}

/// Whether a record's filename lives in the source's queue or crash directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RarityTag {
    Queue,
    Crash,
}

/// One parsed rarity log line
#[derive(Debug, Clone, PartialEq)]
pub struct RarityRecord {
    pub score: f64,
    pub filename: String,
    pub tag: RarityTag,
}

impl RarityRecord {
    /// Parses one log line against a source's tag pair (`eq`/`ec` for the
    /// edge log, `pq`/`pc` for the path log).
    ///
    /// A trailing line terminator is tolerated; the caller is responsible
    /// for only handing over complete lines.
    pub fn parse(line: &str, queue_tag: &str, crash_tag: &str) -> Result<Self> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 3 {
            return Err(RecordParseError::FieldCount(fields.len()));
        }

        let score = fields[0]
            .trim()
            .parse::<f64>()
            .map_err(|_| RecordParseError::InvalidScore(fields[0].to_string()))?;

        let tag = if fields[2] == queue_tag {
            RarityTag::Queue
        } else if fields[2] == crash_tag {
            RarityTag::Crash
        } else {
            return Err(RecordParseError::UnknownTag(fields[2].to_string()));
        };

        Ok(Self {
            score,
            filename: fields[1].to_string(),
            tag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_queue_record() {
        let record = RarityRecord::parse("0.5,seed-001,eq", "eq", "ec").unwrap();
        assert_eq!(record.score, 0.5);
        assert_eq!(record.filename, "seed-001");
        assert_eq!(record.tag, RarityTag::Queue);
    }

    #[test]
    fn test_parse_crash_record() {
        let record = RarityRecord::parse("12.25,crash-7,pc", "pq", "pc").unwrap();
        assert_eq!(record.score, 12.25);
        assert_eq!(record.tag, RarityTag::Crash);
    }

    #[test]
    fn test_parse_tolerates_line_terminators() {
        let unix = RarityRecord::parse("0.9,b,eq\n", "eq", "ec").unwrap();
        let dos = RarityRecord::parse("0.9,b,eq\r\n", "eq", "ec").unwrap();
        assert_eq!(unix, dos);
        assert_eq!(unix.filename, "b");
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        assert_eq!(
            RarityRecord::parse("0.5,seed-001", "eq", "ec"),
            Err(RecordParseError::FieldCount(2))
        );
        assert_eq!(
            RarityRecord::parse("0.5,seed,001,eq", "eq", "ec"),
            Err(RecordParseError::FieldCount(4))
        );
    }

    #[test]
    fn test_parse_rejects_bad_score() {
        assert!(matches!(
            RarityRecord::parse("not-a-float,seed,eq", "eq", "ec"),
            Err(RecordParseError::InvalidScore(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_tag() {
        assert_eq!(
            RarityRecord::parse("0.5,seed,xx", "eq", "ec"),
            Err(RecordParseError::UnknownTag("xx".to_string()))
        );
        // Tags from the other log variant are unknown here.
        assert!(matches!(
            RarityRecord::parse("0.5,seed,pq", "eq", "ec"),
            Err(RecordParseError::UnknownTag(_))
        ));
    }
}
