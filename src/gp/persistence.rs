//! Persistence for the hall of fame.
//!
//! Members are written as pretty JSON records carrying the program in its
//! text form, so a saved hall can be read and edited by hand. The text
//! form is not a stable format across versions of the grammar.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::GpError;
use crate::gp::grammar::SemanticType;
use crate::gp::population::{HallOfFame, Individual};
use crate::gp::text::parse_program;

/// One saved hall-of-fame member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallOfFameRecord {
    /// Position in the hall, 1 for the best.
    pub rank: usize,
    /// Fitness when the member entered the hall.
    pub fitness: Option<f64>,
    /// Tree height.
    pub height: usize,
    /// Node count.
    pub size: usize,
    /// Program text.
    pub program: String,
}

impl HallOfFameRecord {
    fn from_member(rank: usize, member: &Individual) -> Self {
        Self {
            rank,
            fitness: member.fitness,
            height: member.tree.height(),
            size: member.tree.size(),
            program: member.tree.to_string(),
        }
    }
}

/// Error while saving or loading a hall of fame.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PersistenceError {
    /// File I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not valid JSON for a hall of fame.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record's program text did not parse.
    #[error("record {rank}: {source}")]
    Program {
        /// Rank of the offending record.
        rank: usize,
        /// Parse failure.
        source: GpError,
    },
}

/// Records for every member, best first.
#[must_use]
pub fn hall_of_fame_records(hall_of_fame: &HallOfFame) -> Vec<HallOfFameRecord> {
    hall_of_fame
        .members()
        .iter()
        .enumerate()
        .map(|(i, member)| HallOfFameRecord::from_member(i + 1, member))
        .collect()
}

/// Save a hall of fame as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or file I/O fails.
pub fn save_hall_of_fame(hall_of_fame: &HallOfFame, path: &Path) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(&hall_of_fame_records(hall_of_fame))?;
    fs::write(path, json)?;
    Ok(())
}

/// Load saved members, best first, with their recorded fitness.
///
/// # Errors
///
/// Returns an error if the file is unreadable, is not a record list, or
/// holds a program that does not parse as a statement.
pub fn load_hall_of_fame(path: &Path) -> Result<Vec<Individual>, PersistenceError> {
    let json = fs::read_to_string(path)?;
    let mut records: Vec<HallOfFameRecord> = serde_json::from_str(&json)?;
    records.sort_by_key(|r| r.rank);
    records
        .into_iter()
        .map(|record| {
            let tree = parse_program(&record.program, SemanticType::Statement).map_err(|source| {
                PersistenceError::Program {
                    rank: record.rank,
                    source,
                }
            })?;
            Ok(Individual {
                tree,
                fitness: record.fitness,
            })
        })
        .collect()
}
