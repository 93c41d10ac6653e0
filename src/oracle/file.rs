//! File-backed value tables.
//!
//! Text format: a header line `n_agents n_tasks`, followed by `n_tasks`
//! rows of `2^n_agents` whitespace-separated reals in mask order. Tokens
//! may be split across lines arbitrarily; only the count and numeric
//! validity matter. Malformed or truncated input is a load error and the
//! oracle is not constructed.

use std::fs;
use std::path::Path;

use crate::core::{Coalition, Value, MAX_TABLE_AGENTS};

use super::{OracleError, ValueOracle};

/// Oracle whose dense table was parsed from a file.
#[derive(Debug)]
pub struct FileOracle {
    n_agents: u32,
    n_tasks: u32,
    table: Vec<Vec<Value>>,
}

impl FileOracle {
    /// Parse a value-table file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OracleError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Parse value-table text.
    pub fn parse(input: &str) -> Result<Self, OracleError> {
        let mut tokens = input.split_whitespace();

        let n_agents: u32 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or(OracleError::MalformedHeader)?;
        let n_tasks: u32 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or(OracleError::MalformedHeader)?;

        if n_agents > MAX_TABLE_AGENTS {
            return Err(OracleError::TableTooWide { n_agents });
        }

        let n_coalitions = 1usize << n_agents;
        let expected = n_coalitions * n_tasks as usize;

        let mut table = vec![Vec::with_capacity(n_coalitions); n_tasks as usize];
        let mut found = 0usize;
        for row in &mut table {
            for _ in 0..n_coalitions {
                let token = tokens.next().ok_or(OracleError::Truncated {
                    expected,
                    found,
                })?;
                let value: Value = token.parse().map_err(|_| OracleError::BadToken {
                    token: token.to_string(),
                })?;
                row.push(value);
                found += 1;
            }
        }

        Ok(Self {
            n_agents,
            n_tasks,
            table,
        })
    }
}

impl ValueOracle for FileOracle {
    fn generate(&mut self, n_agents: u32, n_tasks: u32, _seed: i64) -> Result<(), OracleError> {
        // Values come from the file; only the requested size can be checked.
        if n_agents != self.n_agents || n_tasks != self.n_tasks {
            return Err(OracleError::FixedSize {
                n_agents: self.n_agents,
                n_tasks: self.n_tasks,
            });
        }
        Ok(())
    }

    fn value(&self, coalition: &Coalition, task: u32) -> Value {
        self.table[task as usize][coalition.mask() as usize]
    }

    fn mask_value(&self, mask: u32, task: u32) -> Value {
        self.table[task as usize][mask as usize]
    }

    fn n_agents(&self) -> u32 {
        self.n_agents
    }

    fn n_tasks(&self) -> u32 {
        self.n_tasks
    }

    fn table(&self) -> Option<&[Vec<Value>]> {
        Some(&self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_table() {
        let oracle = FileOracle::parse("2 2\n0 1 1 3\n0 2 0 1\n").unwrap();
        assert_eq!(oracle.n_agents(), 2);
        assert_eq!(oracle.n_tasks(), 2);
        assert_eq!(oracle.mask_value(0b11, 0), 3.0);
        assert_eq!(oracle.mask_value(0b01, 1), 2.0);
    }

    #[test]
    fn test_parse_ignores_line_structure() {
        let oracle = FileOracle::parse("1 2 0.5 1.5 2.5 3.5").unwrap();
        assert_eq!(oracle.mask_value(0, 0), 0.5);
        assert_eq!(oracle.mask_value(1, 1), 3.5);
    }

    #[test]
    fn test_parse_rejects_bad_header() {
        assert!(matches!(
            FileOracle::parse("two 2\n0 0"),
            Err(OracleError::MalformedHeader)
        ));
        assert!(matches!(
            FileOracle::parse(""),
            Err(OracleError::MalformedHeader)
        ));
    }

    #[test]
    fn test_parse_rejects_truncation() {
        let err = FileOracle::parse("2 2\n0 1 1").unwrap_err();
        match err {
            OracleError::Truncated { expected, found } => {
                assert_eq!(expected, 8);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_token() {
        assert!(matches!(
            FileOracle::parse("1 1\n0.0 oops"),
            Err(OracleError::BadToken { .. })
        ));
    }

    #[test]
    fn test_generate_checks_size_only() {
        let mut oracle = FileOracle::parse("2 1\n0 1 1 3").unwrap();
        assert!(oracle.generate(2, 1, 42).is_ok());
        assert!(oracle.generate(3, 1, 42).is_err());
        // Values untouched by generate.
        assert_eq!(oracle.mask_value(0b11, 0), 3.0);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        assert!(matches!(
            FileOracle::load("/nonexistent/values.table"),
            Err(OracleError::Io(_))
        ));
    }
}
