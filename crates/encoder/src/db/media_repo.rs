//! Rows of the `media` table.

use std::path::PathBuf;

use rusqlite::{params, Connection, Row};

use super::{format_timestamp, parse_timestamp, DatabaseError};
use crate::domain::Media;

/// A raw media row from the database.
#[derive(Debug, Clone)]
pub struct MediaRow {
    pub id: String,
    pub resource_locator: String,
    pub local_path: Option<String>,
    pub created_at: String,
}

impl MediaRow {
    pub(crate) fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            resource_locator: row.get("resource_locator")?,
            local_path: row.get("local_path")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn from_media(media: &Media) -> Self {
        Self {
            id: media.id.clone(),
            resource_locator: media.resource_locator.clone(),
            local_path: media
                .local_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            created_at: format_timestamp(&media.created_at),
        }
    }

    pub fn into_media(self) -> Result<Media, DatabaseError> {
        let created_at = parse_timestamp("media", &self.id, &self.created_at)?;
        Ok(Media {
            id: self.id,
            resource_locator: self.resource_locator,
            local_path: self.local_path.map(PathBuf::from),
            created_at,
        })
    }
}

pub(crate) fn insert_row(conn: &Connection, row: &MediaRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO media (id, resource_locator, local_path, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![row.id, row.resource_locator, row.local_path, row.created_at],
    )?;
    Ok(())
}

pub(crate) fn update_local_path(
    conn: &Connection,
    id: &str,
    local_path: Option<&str>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE media SET local_path = ?2 WHERE id = ?1",
        params![id, local_path],
    )?;
    Ok(())
}
