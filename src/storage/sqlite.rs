//! SQLite storage backend for analyses and conversations

use super::traits::{
    AnalysisListing, AnalysisLookup, AnalysisRecord, AnalysisStore, ChatSessionSummary,
    ConversationTurn, OpenStore, StorageError, StorageResult, StoredAnalysis,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed analysis store
///
/// Uses a single SQLite database file with tables for analysis results and
/// conversation turns. Thread-safe via internal mutex on the connection.
///
/// Profiles, summaries and peer tables are stored as JSON text; timestamps
/// as RFC 3339 UTC with fixed microsecond precision so that text order is
/// time order.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

type AnalysisRow = (i64, String, String, String, String, String, i64, String, String);
type TurnRow = (i64, String, Option<String>, String, String, String);

const ANALYSIS_COLUMNS: &str = "id, path_id, startup_name, extracted_data, analysis_summary, \
     peer_comparison_table, files_processed, created_at, updated_at";

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- One analysis per (path, startup); rewritten in place on re-analysis
            CREATE TABLE IF NOT EXISTS analysis_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path_id TEXT NOT NULL,
                startup_name TEXT NOT NULL,
                extracted_data TEXT NOT NULL,
                analysis_summary TEXT NOT NULL,
                peer_comparison_table TEXT NOT NULL,
                files_processed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (path_id, startup_name)
            );

            CREATE INDEX IF NOT EXISTS idx_analysis_startup
                ON analysis_results(startup_name);
            CREATE INDEX IF NOT EXISTS idx_analysis_created
                ON analysis_results(created_at);

            -- Conversation turns; session_id is the analysis path identifier
            CREATE TABLE IF NOT EXISTS conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                startup_name TEXT,
                path_id TEXT NOT NULL,
                user_message TEXT NOT NULL,
                model_response TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_conversations_session
                ON conversations(session_id, created_at);

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn timestamp(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_timestamp(text: &str) -> StorageResult<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(text)
            .map_err(|e| StorageError::DateParse(e.to_string()))?
            .with_timezone(&Utc))
    }

    fn read_analysis_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnalysisRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
        ))
    }

    /// Deserialize an analysis from database columns
    fn row_to_analysis(row: AnalysisRow) -> StorageResult<StoredAnalysis> {
        let (id, path_id, startup_name, data, summary, peers, files, created, updated) = row;
        Ok(StoredAnalysis {
            id,
            path_id,
            startup_name,
            extracted_data: serde_json::from_str(&data)?,
            analysis_summary: serde_json::from_str(&summary)?,
            peer_comparison_table: serde_json::from_str(&peers)?,
            files_processed: files.max(0) as usize,
            created_at: Self::parse_timestamp(&created)?,
            updated_at: Self::parse_timestamp(&updated)?,
        })
    }

    fn read_turn_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TurnRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }

    fn row_to_turn(row: TurnRow) -> StorageResult<ConversationTurn> {
        let (id, session_id, startup_name, user_message, model_response, created) = row;
        Ok(ConversationTurn {
            id,
            session_id,
            startup_name,
            user_message,
            model_response,
            created_at: Self::parse_timestamp(&created)?,
        })
    }

    fn query_analysis(
        conn: &Connection,
        lookup: &AnalysisLookup,
    ) -> StorageResult<Option<StoredAnalysis>> {
        let sql = format!(
            "SELECT {ANALYSIS_COLUMNS} FROM analysis_results
             WHERE (?1 IS NULL OR path_id = ?1) AND (?2 IS NULL OR startup_name = ?2)
             ORDER BY updated_at DESC, id DESC
             LIMIT 1"
        );
        let row = conn
            .query_row(
                &sql,
                params![lookup.path_id, lookup.startup_name],
                Self::read_analysis_row,
            )
            .optional()?;
        row.map(Self::row_to_analysis).transpose()
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl AnalysisStore for SqliteStore {
    // === Analysis Operations ===

    fn upsert_analysis(&self, record: &AnalysisRecord) -> StorageResult<StoredAnalysis> {
        let conn = self.conn()?;
        let now = Self::timestamp(Utc::now());

        conn.execute(
            r#"
            INSERT INTO analysis_results (path_id, startup_name, extracted_data, analysis_summary,
                                          peer_comparison_table, files_processed, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT(path_id, startup_name) DO UPDATE SET
                extracted_data = excluded.extracted_data,
                analysis_summary = excluded.analysis_summary,
                peer_comparison_table = excluded.peer_comparison_table,
                files_processed = excluded.files_processed,
                updated_at = excluded.updated_at
            "#,
            params![
                record.path_id,
                record.startup_name,
                serde_json::to_string(&record.extracted_data)?,
                serde_json::to_string(&record.analysis_summary)?,
                serde_json::to_string(&record.peer_comparison_table)?,
                record.files_processed as i64,
                now,
            ],
        )?;

        let lookup = AnalysisLookup::by_path(&record.path_id).with_startup(&record.startup_name);
        Self::query_analysis(&conn, &lookup)?.ok_or(StorageError::Database(
            rusqlite::Error::QueryReturnedNoRows,
        ))
    }

    fn get_analysis(&self, lookup: &AnalysisLookup) -> StorageResult<Option<StoredAnalysis>> {
        lookup.validate()?;
        let conn = self.conn()?;
        Self::query_analysis(&conn, lookup)
    }

    fn list_analyses(&self, limit: usize) -> StorageResult<Vec<AnalysisListing>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT path_id, startup_name, created_at, files_processed
             FROM analysis_results
             ORDER BY created_at DESC, id DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut listings = Vec::new();
        for row in rows {
            let (path_id, startup_name, created, files) = row?;
            listings.push(AnalysisListing {
                path_id,
                startup_name,
                created_at: Self::parse_timestamp(&created)?,
                files_processed: files.max(0) as usize,
            });
        }
        Ok(listings)
    }

    // === Conversation Operations ===

    fn append_turn(
        &self,
        session_id: &str,
        user_message: &str,
        model_response: &str,
        startup_name: Option<&str>,
    ) -> StorageResult<ConversationTurn> {
        let conn = self.conn()?;
        let created_at = Utc::now();

        conn.execute(
            r#"
            INSERT INTO conversations (session_id, startup_name, path_id, user_message, model_response, created_at)
            VALUES (?1, ?2, ?1, ?3, ?4, ?5)
            "#,
            params![
                session_id,
                startup_name,
                user_message,
                model_response,
                Self::timestamp(created_at),
            ],
        )?;

        Ok(ConversationTurn {
            id: conn.last_insert_rowid(),
            session_id: session_id.to_string(),
            startup_name: startup_name.map(str::to_string),
            user_message: user_message.to_string(),
            model_response: model_response.to_string(),
            created_at: Self::parse_timestamp(&Self::timestamp(created_at))?,
        })
    }

    fn list_turns(&self, session_id: &str, limit: usize) -> StorageResult<Vec<ConversationTurn>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, session_id, startup_name, user_message, model_response, created_at
            FROM (
                SELECT * FROM conversations
                WHERE session_id = ?1
                ORDER BY created_at DESC, id DESC
                LIMIT ?2
            )
            ORDER BY created_at ASC, id ASC
            "#,
        )?;

        let rows = stmt.query_map(params![session_id, limit as i64], Self::read_turn_row)?;

        let mut turns = Vec::new();
        for row in rows {
            turns.push(Self::row_to_turn(row?)?);
        }
        Ok(turns)
    }

    fn list_chat_sessions(&self, limit: usize) -> StorageResult<Vec<ChatSessionSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT session_id, startup_name, MIN(created_at), MAX(created_at), COUNT(*)
            FROM conversations
            GROUP BY session_id, startup_name
            ORDER BY MAX(created_at) DESC, MAX(id) DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (session_id, startup_name, first, last, count) = row?;
            sessions.push(ChatSessionSummary {
                session_id,
                startup_name,
                first_chat: Self::parse_timestamp(&first)?,
                last_chat: Self::parse_timestamp(&last)?,
                message_count: count.max(0) as usize,
            });
        }
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{AnalysisSummary, PeerComparisonTable};
    use crate::profile::{normalize_profile, ExtractedProfile};
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn create_test_record(path_id: &str, startup_name: &str, company: &str) -> AnalysisRecord {
        let raw = json!({"company_name": company, "industry": "tech"});
        AnalysisRecord {
            path_id: path_id.to_string(),
            startup_name: startup_name.to_string(),
            extracted_data: normalize_profile(raw.as_object().unwrap()),
            analysis_summary: AnalysisSummary {
                short_summary: format!("{company} in brief"),
                detailed_analysis_summary: "Details.".to_string(),
            },
            peer_comparison_table: PeerComparisonTable::from(
                json!({"comparison": {"columns": ["Company Name"], "companies": []}}),
            ),
            files_processed: 3,
        }
    }

    // ========================================================================
    // Analyses
    // ========================================================================

    #[test]
    fn test_upsert_and_get_by_path() {
        let store = create_test_store();
        let saved = store
            .upsert_analysis(&create_test_record("acme/seed", "acme", "Acme"))
            .unwrap();

        let loaded = store
            .get_analysis(&AnalysisLookup::by_path("acme/seed"))
            .unwrap()
            .unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.extracted_data.get("company_name"), Some("Acme"));
        assert_eq!(loaded.analysis_summary.short_summary, "Acme in brief");
        assert_eq!(loaded.peer_comparison_table.columns(), vec!["Company Name"]);
        assert_eq!(loaded.files_processed, 3);
    }

    #[test]
    fn test_upsert_overwrites_same_pair() {
        let store = create_test_store();
        let first = store
            .upsert_analysis(&create_test_record("acme/seed", "acme", "Acme"))
            .unwrap();

        let mut second_record = create_test_record("acme/seed", "acme", "Acme Corp");
        second_record.files_processed = 7;
        second_record.extracted_data = ExtractedProfile::placeholder();
        let second = store.upsert_analysis(&second_record).unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(second.files_processed, 7);
        assert_eq!(second.extracted_data, ExtractedProfile::placeholder());
        assert_eq!(store.list_analyses(100).unwrap().len(), 1);
    }

    #[test]
    fn test_distinct_startup_names_are_distinct_rows() {
        let store = create_test_store();
        store
            .upsert_analysis(&create_test_record("acme/seed", "acme", "Acme"))
            .unwrap();
        store
            .upsert_analysis(&create_test_record("acme/seed", "beta", "Beta"))
            .unwrap();

        let beta = store
            .get_analysis(&AnalysisLookup::by_startup("beta"))
            .unwrap()
            .unwrap();
        assert_eq!(beta.extracted_data.get("company_name"), Some("Beta"));

        let both = AnalysisLookup::by_path("acme/seed").with_startup("acme");
        let acme = store.get_analysis(&both).unwrap().unwrap();
        assert_eq!(acme.startup_name, "acme");
    }

    #[test]
    fn test_get_missing_and_invalid_lookup() {
        let store = create_test_store();
        assert!(store
            .get_analysis(&AnalysisLookup::by_path("none/here"))
            .unwrap()
            .is_none());
        assert!(matches!(
            store.get_analysis(&AnalysisLookup::default()),
            Err(StorageError::InvalidLookup(_))
        ));
    }

    #[test]
    fn test_list_analyses_newest_first_with_limit() {
        let store = create_test_store();
        for i in 0..3 {
            store
                .upsert_analysis(&create_test_record(&format!("s/{i}"), "x", "X"))
                .unwrap();
        }
        let all = store.list_analyses(100).unwrap();
        assert_eq!(
            all.iter().map(|a| a.path_id.as_str()).collect::<Vec<_>>(),
            vec!["s/2", "s/1", "s/0"]
        );
        assert_eq!(store.list_analyses(2).unwrap().len(), 2);
    }

    // ========================================================================
    // Conversations
    // ========================================================================

    #[test]
    fn test_turns_are_listed_oldest_first() {
        let store = create_test_store();
        for i in 0..3 {
            store
                .append_turn("acme/seed", &format!("q{i}"), &format!("a{i}"), Some("acme"))
                .unwrap();
        }
        store.append_turn("other/path", "x", "y", None).unwrap();

        let turns = store.list_turns("acme/seed", 20).unwrap();
        assert_eq!(
            turns.iter().map(|t| t.user_message.as_str()).collect::<Vec<_>>(),
            vec!["q0", "q1", "q2"]
        );
        assert_eq!(turns[0].startup_name.as_deref(), Some("acme"));
    }

    #[test]
    fn test_turn_limit_keeps_most_recent() {
        let store = create_test_store();
        for i in 0..5 {
            store
                .append_turn("acme/seed", &format!("q{i}"), "a", None)
                .unwrap();
        }
        let turns = store.list_turns("acme/seed", 2).unwrap();
        assert_eq!(
            turns.iter().map(|t| t.user_message.as_str()).collect::<Vec<_>>(),
            vec!["q3", "q4"]
        );
    }

    #[test]
    fn test_chat_sessions_grouped() {
        let store = create_test_store();
        store.append_turn("a/1", "q", "a", Some("alpha")).unwrap();
        store.append_turn("a/1", "q", "a", Some("alpha")).unwrap();
        store.append_turn("b/2", "q", "a", Some("beta")).unwrap();

        let sessions = store.list_chat_sessions(50).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, "b/2");
        assert_eq!(sessions[0].message_count, 1);
        assert_eq!(sessions[1].message_count, 2);
        assert!(sessions[1].first_chat <= sessions[1].last_chat);
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    #[test]
    fn test_reopen_file_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/analyses.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .upsert_analysis(&create_test_record("acme/seed", "acme", "Acme"))
                .unwrap();
            store.append_turn("acme/seed", "hi", "hello", Some("acme")).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert!(store
            .get_analysis(&AnalysisLookup::by_path("acme/seed"))
            .unwrap()
            .is_some());
        assert_eq!(store.list_turns("acme/seed", 10).unwrap().len(), 1);
    }
}
