// Phase 7: SQLite永続化: 4テーブルへの一括挿入（単一トランザクション）

use std::path::Path;
use std::time::Duration;

use rusqlite::{
    Connection, ErrorCode, OptionalExtension, Row, ToSql, Transaction, TransactionBehavior, ffi,
    params,
};
use tracing::debug;

use super::RecordSink;
use crate::config::layout::{DynamicVariable, KinematicVariable};
use crate::error::GaitError;
use crate::record::{Demographics, Dynamics, Kinematics, PatientRecord, Sex, SpatioTemporal};

const PATIENTS: &str = "patients";
const SPATIO_TEMPORAL: &str = "parametres_spatio_temporels";
const KINEMATICS: &str = "parametres_cinematiques";
const DYNAMICS: &str = "parametres_dynamiques";

const PATIENT_COLUMNS: [&str; 4] = ["Age", "Sexe", "Taille", "Poids"];

const SPATIO_TEMPORAL_COLUMNS: [&str; 8] = [
    "Vitesse",
    "Step_Length_Gauche",
    "Step_Length_Droite",
    "Cycle_Time_Gauche",
    "Cycle_Time_Droite",
    "Steps_per_min_Gauche",
    "Steps_per_min_Droite",
    "Double_Support_Time",
];

/// How long a writer waits on a locked database before reporting a conflict.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed [`RecordSink`].
pub struct SqliteStore {
    conn: Connection,
}

fn create_table_sql(table: &str, columns: &[&str], column_type: &str) -> String {
    let cols: String = columns
        .iter()
        .map(|c| format!(",\n    {c} {column_type}"))
        .collect();
    format!("CREATE TABLE IF NOT EXISTS {table} (\n    ID_Sujet TEXT PRIMARY KEY{cols}\n);\n")
}

fn insert_sql(table: &str, columns: &[&str]) -> String {
    let placeholders = vec!["?"; columns.len() + 1].join(", ");
    format!(
        "INSERT INTO {table} (ID_Sujet, {}) VALUES ({placeholders})",
        columns.join(", ")
    )
}

fn select_sql(table: &str, columns: &[&str]) -> String {
    format!("SELECT {} FROM {table} WHERE ID_Sujet = ?1", columns.join(", "))
}

fn kinematic_columns() -> Vec<&'static str> {
    KinematicVariable::ALL.iter().map(|v| v.column()).collect()
}

fn dynamic_columns() -> Vec<&'static str> {
    DynamicVariable::ALL.iter().map(|v| v.column()).collect()
}

/// SQLiteのエラーを重複・競合・その他に分類する。
///
/// 重複とみなすのは主キー・一意制約の違反だけ。CHECK制約などの違反は
/// 通常のストアエラーになる。
fn classify_error(e: rusqlite::Error, subject_id: &str) -> GaitError {
    if let rusqlite::Error::SqliteFailure(err, _) = &e
        && matches!(
            err.extended_code,
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    {
        return GaitError::duplicate_subject(subject_id);
    }
    match e.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            GaitError::store_conflict(e.to_string())
        }
        _ => GaitError::store(e.to_string()),
    }
}

fn optional_f64s(row: &Row<'_>, n: usize) -> rusqlite::Result<Vec<Option<f64>>> {
    (0..n).map(|i| row.get(i)).collect()
}

/// 数値列だけのテーブルに1行挿入する。
fn insert_values(
    tx: &Transaction<'_>,
    table: &str,
    columns: &[&str],
    subject_id: &str,
    values: &[Option<f64>],
) -> rusqlite::Result<usize> {
    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(values.len() + 1);
    params.push(&subject_id);
    params.extend(values.iter().map(|v| v as &dyn ToSql));
    tx.execute(&insert_sql(table, columns), params.as_slice())
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> crate::error::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> crate::error::Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = Self { conn };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> crate::error::Result<()> {
        let sql = [
            format!(
                "CREATE TABLE IF NOT EXISTS {PATIENTS} (\n    ID_Sujet TEXT PRIMARY KEY,\n    Age INTEGER,\n    Sexe TEXT CHECK (Sexe IN ('H', 'F')),\n    Taille REAL,\n    Poids REAL\n);\n"
            ),
            create_table_sql(SPATIO_TEMPORAL, &SPATIO_TEMPORAL_COLUMNS, "REAL"),
            create_table_sql(KINEMATICS, &kinematic_columns(), "REAL"),
            create_table_sql(DYNAMICS, &dynamic_columns(), "REAL"),
        ]
        .concat();
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    /// Raw connection, for inspection in tests and tooling.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// BEGIN IMMEDIATE で書き込みロックを先に取得してから `f` を実行する。
    ///
    /// `f` がエラーを返した場合は `Transaction` のdropでロールバックされる。
    fn with_immediate_transaction<F>(&self, subject_id: &str, f: F) -> crate::error::Result<()>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<()>,
    {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(|e| classify_error(e, subject_id))?;

        f(&tx).map_err(|e| classify_error(e, subject_id))?;
        tx.commit().map_err(|e| classify_error(e, subject_id))
    }

    /// Read a stored record back. `Ok(None)` if the subject is unknown.
    pub fn load(&self, subject_id: &str) -> crate::error::Result<Option<PatientRecord>> {
        let patient = self
            .conn
            .query_row(
                &select_sql(PATIENTS, &PATIENT_COLUMNS),
                params![subject_id],
                |row| {
                    let sex: Option<String> = row.get(1)?;
                    Ok(Demographics {
                        age: row.get(0)?,
                        sex: sex.as_deref().and_then(Sex::from_code),
                        height: row.get(2)?,
                        weight: row.get(3)?,
                    })
                },
            )
            .optional()?;
        let Some(patient) = patient else {
            return Ok(None);
        };

        let st = self
            .load_group(SPATIO_TEMPORAL, &SPATIO_TEMPORAL_COLUMNS, subject_id)?
            .unwrap_or_else(|| vec![None; SPATIO_TEMPORAL_COLUMNS.len()]);
        let spatio_temporal = SpatioTemporal {
            speed: st[0],
            step_length_left: st[1],
            step_length_right: st[2],
            cycle_time_left: st[3],
            cycle_time_right: st[4],
            steps_per_min_left: st[5],
            steps_per_min_right: st[6],
            double_support_time: st[7],
        };

        let mut kinematics = Kinematics::default();
        if let Some(values) = self.load_group(KINEMATICS, &kinematic_columns(), subject_id)? {
            for (var, value) in KinematicVariable::ALL.into_iter().zip(values) {
                kinematics.set(var, value);
            }
        }

        let mut dynamics = Dynamics::default();
        if let Some(values) = self.load_group(DYNAMICS, &dynamic_columns(), subject_id)? {
            for (var, value) in DynamicVariable::ALL.into_iter().zip(values) {
                dynamics.set(var, value);
            }
        }

        Ok(Some(PatientRecord {
            subject_id: subject_id.to_string(),
            patient,
            spatio_temporal,
            kinematics,
            dynamics,
        }))
    }

    fn load_group(
        &self,
        table: &str,
        columns: &[&str],
        subject_id: &str,
    ) -> crate::error::Result<Option<Vec<Option<f64>>>> {
        let values = self
            .conn
            .query_row(&select_sql(table, columns), params![subject_id], |row| {
                optional_f64s(row, columns.len())
            })
            .optional()?;
        Ok(values)
    }

    /// Identifiers of every stored subject, sorted.
    pub fn subject_ids(&self) -> crate::error::Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT ID_Sujet FROM patients ORDER BY ID_Sujet")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }
}

impl RecordSink for SqliteStore {
    /// Insert the four groups of `record` in one transaction.
    ///
    /// # Errors
    /// - `GaitError::DuplicateSubject` if any table already holds the subject
    /// - `GaitError::StoreConflict` if the database stays locked past the busy timeout
    /// - `GaitError::StoreError` for any other database failure
    ///
    /// Nothing is written when an error is returned.
    fn insert_record(&mut self, record: &PatientRecord) -> crate::error::Result<()> {
        let id = record.subject_id.as_str();
        let p = &record.patient;

        let spatio_temporal: Vec<Option<f64>> =
            record.spatio_temporal.columns().iter().map(|&(_, v)| v).collect();
        let kinematics: Vec<Option<f64>> = KinematicVariable::ALL
            .iter()
            .map(|&v| record.kinematics.get(v))
            .collect();
        let dynamics: Vec<Option<f64>> = DynamicVariable::ALL
            .iter()
            .map(|&v| record.dynamics.get(v))
            .collect();

        self.with_immediate_transaction(id, |tx| {
            tx.execute(
                &insert_sql(PATIENTS, &PATIENT_COLUMNS),
                params![id, p.age, p.sex.map(Sex::as_str), p.height, p.weight],
            )?;
            insert_values(tx, SPATIO_TEMPORAL, &SPATIO_TEMPORAL_COLUMNS, id, &spatio_temporal)?;
            insert_values(tx, KINEMATICS, &kinematic_columns(), id, &kinematics)?;
            insert_values(tx, DYNAMICS, &dynamic_columns(), id, &dynamics)?;
            Ok(())
        })?;

        debug!(subject = id, "stored record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_sql() {
        let sql = create_table_sql("t", &["A", "B"], "REAL");
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS t (\n    ID_Sujet TEXT PRIMARY KEY,\n    A REAL,\n    B REAL\n);\n"
        );
    }

    #[test]
    fn test_insert_sql_placeholders() {
        assert_eq!(
            insert_sql("t", &["A", "B"]),
            "INSERT INTO t (ID_Sujet, A, B) VALUES (?, ?, ?)"
        );
    }

    #[test]
    fn test_schema_has_four_tables() {
        let store = SqliteStore::open_in_memory().unwrap();
        let n: i64 = store
            .connection()
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(n, 4);
    }

    fn insert_patient_row(store: &SqliteStore, sql: &str) -> rusqlite::Error {
        store
            .connection()
            .execute(sql, [])
            .expect_err("insert should violate a constraint")
    }

    #[test]
    fn test_primary_key_violation_is_duplicate() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sql = "INSERT INTO patients (ID_Sujet, Sexe) VALUES ('S1', 'H')";
        store.connection().execute(sql, []).unwrap();

        let err = classify_error(insert_patient_row(&store, sql), "S1");
        assert!(matches!(err, GaitError::DuplicateSubject(ref id) if id == "S1"), "got {err}");
    }

    #[test]
    fn test_check_violation_is_store_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        let e = insert_patient_row(
            &store,
            "INSERT INTO patients (ID_Sujet, Sexe) VALUES ('S2', 'X')",
        );
        assert_eq!(e.sqlite_error_code(), Some(ErrorCode::ConstraintViolation));

        let err = classify_error(e, "S2");
        assert!(matches!(err, GaitError::StoreError(_)), "got {err}");
    }
}
