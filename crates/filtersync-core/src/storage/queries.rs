//! Database query implementations

use crate::error::Result;
use crate::types::*;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

const ENGINE_STATE_KEY: &str = "engine";

// ===== Preset Queries =====

/// Insert a new preset
pub fn insert_preset(conn: &Connection, preset: &Preset) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO presets (id, name, name_key, filters, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
        params![
            preset.id.as_str(),
            preset.name,
            preset.name_key(),
            serde_json::to_string(&preset.value)?,
            preset.created_at.to_rfc3339(),
        ],
    )?;

    Ok(())
}

/// List presets, newest first
pub fn list_presets(conn: &Connection) -> Result<Vec<Preset>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, name, filters, created_at
        FROM presets
        ORDER BY created_at DESC, id
        "#,
    )?;

    let presets = stmt
        .query_map([], preset_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(presets)
}

/// Find presets whose case-folded name matches
pub fn find_presets_by_name(conn: &Connection, name: &str) -> Result<Vec<Preset>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, name, filters, created_at
        FROM presets
        WHERE name_key = ?
        ORDER BY created_at DESC, id
        "#,
    )?;

    let presets = stmt
        .query_map(params![normalize_name(name)], preset_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(presets)
}

/// Delete a preset. Returns whether a row was removed.
pub fn delete_preset(conn: &Connection, id: &PresetId) -> Result<bool> {
    let affected = conn.execute("DELETE FROM presets WHERE id = ?", params![id.as_str()])?;
    Ok(affected > 0)
}

fn preset_from_row(row: &Row<'_>) -> rusqlite::Result<Preset> {
    let filters: String = row.get(2)?;
    let created_at: String = row.get(3)?;

    Ok(Preset {
        id: PresetId::from(row.get::<_, String>(0)?),
        name: row.get(1)?,
        value: serde_json::from_str(&filters)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?
            .with_timezone(&chrono::Utc),
    })
}

// ===== Engine State Queries =====

/// Save the committed engine state, replacing any previous one
pub fn save_engine_state(conn: &Connection, state: &EngineState) -> Result<()> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO engine_state (key, value, updated_at)
        VALUES (?, ?, ?)
        "#,
        params![
            ENGINE_STATE_KEY,
            serde_json::to_string(state)?,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;

    Ok(())
}

/// Load the committed engine state, if one was saved
pub fn load_engine_state(conn: &Connection) -> Result<Option<EngineState>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM engine_state WHERE key = ?",
            params![ENGINE_STATE_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}
