//! Research task CRUD, listing, and status counts.

use rusqlite::{params, Connection, OptionalExtension};

use scout_core::errors::{ScoutError, ScoutResult, StorageError};
use scout_core::models::{ResearchDepth, ResearchTask, TaskStats, TaskStatus, TriggerSource};

use super::{fmt_dt, parse_dt};
use crate::to_storage_err;

const TASK_COLUMNS: &str = "id, query, context, depth, status, trigger_source, session_id,
    priority, attempts, project_path, created_at, started_at, completed_at, result, error";

pub fn insert_task(conn: &Connection, task: &ResearchTask) -> ScoutResult<()> {
    conn.execute(
        "INSERT INTO research_tasks (
            id, query, context, depth, status, trigger_source, session_id,
            priority, attempts, project_path, created_at, started_at, completed_at,
            result, error
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            task.id,
            task.query,
            task.context,
            task.depth.as_str(),
            task.status.as_str(),
            task.trigger.as_str(),
            task.session_id,
            task.priority,
            task.attempts,
            task.project_path,
            fmt_dt(&task.created_at),
            task.started_at.as_ref().map(fmt_dt),
            task.completed_at.as_ref().map(fmt_dt),
            task.result,
            task.error,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Overwrite the mutable fields of an existing task.
pub fn update_task(conn: &Connection, task: &ResearchTask) -> ScoutResult<()> {
    let rows = conn
        .execute(
            "UPDATE research_tasks SET
                status = ?2, priority = ?3, attempts = ?4, started_at = ?5,
                completed_at = ?6, result = ?7, error = ?8
             WHERE id = ?1",
            params![
                task.id,
                task.status.as_str(),
                task.priority,
                task.attempts,
                task.started_at.as_ref().map(fmt_dt),
                task.completed_at.as_ref().map(fmt_dt),
                task.result,
                task.error,
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if rows == 0 {
        return Err(ScoutError::TaskNotFound {
            id: task.id.clone(),
        });
    }
    Ok(())
}

pub fn get_task(conn: &Connection, id: &str) -> ScoutResult<Option<ResearchTask>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {TASK_COLUMNS} FROM research_tasks WHERE id = ?1"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    stmt.query_row(params![id], |row| Ok(row_to_task(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?
        .transpose()
}

pub fn list_tasks(
    conn: &Connection,
    status: Option<TaskStatus>,
    limit: usize,
) -> ScoutResult<Vec<ResearchTask>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM research_tasks
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY created_at DESC LIMIT ?2"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![status.map(|s| s.as_str()), limit as i64], |row| {
            Ok(row_to_task(row))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(tasks)
}

pub fn task_stats(conn: &Connection) -> ScoutResult<TaskStats> {
    let mut stmt = conn
        .prepare("SELECT status, COUNT(*) FROM research_tasks GROUP BY status")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut stats = TaskStats::default();
    for row in rows {
        let (status, count) = row.map_err(|e| to_storage_err(e.to_string()))?;
        let count = count as usize;
        match TaskStatus::parse(&status) {
            Some(TaskStatus::Queued) => stats.queued = count,
            Some(TaskStatus::Running) => stats.running = count,
            Some(TaskStatus::Completed) => stats.completed = count,
            Some(TaskStatus::Failed) => stats.failed = count,
            Some(TaskStatus::Injected) => stats.injected = count,
            None => tracing::warn!(status = %status, "unknown task status in store"),
        }
    }
    Ok(stats)
}

fn row_to_task(row: &rusqlite::Row<'_>) -> ScoutResult<ResearchTask> {
    let get_str = |idx: usize| -> ScoutResult<String> {
        row.get::<_, String>(idx)
            .map_err(|e| to_storage_err(e.to_string()))
    };
    let get_opt = |idx: usize| -> ScoutResult<Option<String>> {
        row.get::<_, Option<String>>(idx)
            .map_err(|e| to_storage_err(e.to_string()))
    };
    let corrupt = |details: String| -> ScoutError {
        StorageError::CorruptRow {
            table: "research_tasks".to_string(),
            details,
        }
        .into()
    };

    let depth_str = get_str(3)?;
    let status_str = get_str(4)?;
    let trigger_str = get_str(5)?;

    Ok(ResearchTask {
        id: get_str(0)?,
        query: get_str(1)?,
        context: get_opt(2)?,
        depth: ResearchDepth::parse(&depth_str)
            .ok_or_else(|| corrupt(format!("depth '{depth_str}'")))?,
        status: TaskStatus::parse(&status_str)
            .ok_or_else(|| corrupt(format!("status '{status_str}'")))?,
        trigger: TriggerSource::parse(&trigger_str)
            .ok_or_else(|| corrupt(format!("trigger_source '{trigger_str}'")))?,
        session_id: get_opt(6)?,
        priority: row
            .get::<_, i64>(7)
            .map_err(|e| to_storage_err(e.to_string()))?
            .clamp(1, 10) as u8,
        attempts: row
            .get::<_, i64>(8)
            .map_err(|e| to_storage_err(e.to_string()))?
            .max(0) as u32,
        project_path: get_opt(9)?,
        created_at: parse_dt(&get_str(10)?)?,
        started_at: get_opt(11)?.as_deref().map(parse_dt).transpose()?,
        completed_at: get_opt(12)?.as_deref().map(parse_dt).transpose()?,
        result: get_opt(13)?,
        error: get_opt(14)?,
    })
}
