//! [`SqliteStore`]: the SQLite implementation of the Kintai store traits.

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use kintai_core::{
  attendance::{AttendancePatch, AttendanceRecord, NewAttendance},
  employee::{Employee, EmployeeId},
  rule::{NewRule, RecurrenceRule},
  store::{AttendanceStore, Backend, EmployeeDirectory, RecordQuery, RuleStore},
};

use crate::{
  Error, Result,
  encode::{
    RECORD_COLUMNS, RULE_COLUMNS, RawEmployee, RawRecord, RawRule, encode_date, encode_dt,
    encode_kind, encode_uuid, encode_weekdays,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Kintai store backed by a single SQLite file.
///
/// Clones share one connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("sqlite schema ready");
    Ok(())
  }

  /// Write every column of `record` over the row with the same id.
  async fn write_record(&self, record: &AttendanceRecord) -> Result<()> {
    let id_str         = encode_uuid(record.id);
    let date_str       = encode_date(record.date);
    let start          = record.start.clone();
    let hours          = record.hours;
    let kind_str       = encode_kind(record.kind);
    let note           = record.note.clone();
    let updated_at_str = encode_dt(record.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE records
           SET date = ?2, start = ?3, hours = ?4, kind = ?5, note = ?6, updated_at = ?7
           WHERE record_id = ?1",
          rusqlite::params![id_str, date_str, start, hours, kind_str, note, updated_at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Trait impls ─────────────────────────────────────────────────────────────

impl Backend for SqliteStore {
  type Error = Error;
}

impl AttendanceStore for SqliteStore {
  async fn create_record(&self, input: NewAttendance) -> Result<AttendanceRecord> {
    let now = Utc::now();
    let record = AttendanceRecord {
      id:             Uuid::new_v4(),
      employee_id:    input.employee_id,
      employee_name:  input.employee_name,
      date:           input.date,
      start:          input.start,
      hours:          input.kind.normalize_hours(input.hours),
      kind:           input.kind,
      note:           input.note,
      via_rule:       input.via_rule,
      source_rule_id: input.source_rule_id,
      created_at:     now,
      updated_at:     now,
    };

    let id_str          = encode_uuid(record.id);
    let employee_id     = record.employee_id.0.clone();
    let employee_name   = record.employee_name.clone();
    let date_str        = encode_date(record.date);
    let start           = record.start.clone();
    let hours           = record.hours;
    let kind_str        = encode_kind(record.kind);
    let note            = record.note.clone();
    let via_rule        = record.via_rule;
    let source_rule_str = record.source_rule_id.map(encode_uuid);
    let at_str          = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO records (
             record_id, employee_id, employee_name, date, start, hours,
             kind, note, via_rule, source_rule_id, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
          rusqlite::params![
            id_str,
            employee_id,
            employee_name,
            date_str,
            start,
            hours,
            kind_str,
            note,
            via_rule,
            source_rule_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn get_record(&self, id: Uuid) -> Result<Option<AttendanceRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {RECORD_COLUMNS} FROM records WHERE record_id = ?1"),
              rusqlite::params![id_str],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn update_record(
    &self,
    id:    Uuid,
    patch: AttendancePatch,
  ) -> Result<Option<AttendanceRecord>> {
    let Some(mut record) = self.get_record(id).await? else {
      return Ok(None);
    };
    record.apply(patch, Utc::now());
    self.write_record(&record).await?;
    Ok(Some(record))
  }

  async fn delete_record(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM records WHERE record_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    tracing::debug!(record_id = %id, affected, "record delete");
    Ok(affected > 0)
  }

  async fn list_records(&self, query: &RecordQuery) -> Result<Vec<AttendanceRecord>> {
    let employee_id     = query.employee_id.as_ref().map(|e| e.0.clone());
    let from_str        = query.from.map(encode_date);
    let to_str          = query.to.map(encode_date);
    let kind_str        = query.kind.map(encode_kind);
    let source_rule_str = query.source_rule_id.map(encode_uuid);
    let via_rule        = query.via_rule;
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val       = query.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let offset_val      = query.offset.map_or(0, |o| i64::try_from(o).unwrap_or(i64::MAX));

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECORD_COLUMNS} FROM records
           WHERE (?1 IS NULL OR employee_id    = ?1)
             AND (?2 IS NULL OR date          >= ?2)
             AND (?3 IS NULL OR date          <= ?3)
             AND (?4 IS NULL OR kind           = ?4)
             AND (?5 IS NULL OR source_rule_id = ?5)
             AND (?6 IS NULL OR via_rule       = ?6)
           ORDER BY date, created_at, rowid
           LIMIT ?7 OFFSET ?8"
        ))?;

        let rows = stmt
          .query_map(
            rusqlite::params![
              employee_id,
              from_str,
              to_str,
              kind_str,
              source_rule_str,
              via_rule,
              limit_val,
              offset_val,
            ],
            RawRecord::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }
}

impl RuleStore for SqliteStore {
  async fn create_rule(&self, input: NewRule) -> Result<RecurrenceRule> {
    let rule = RecurrenceRule {
      id:            Uuid::new_v4(),
      employee_id:   input.employee_id,
      employee_name: input.employee_name,
      weekdays:      input.weekdays,
      start_date:    input.start_date,
      end_date:      input.end_date,
      hours:         input.hours,
      kind:          input.kind,
      note:          input.note,
      created_at:    Utc::now(),
    };

    let id_str        = encode_uuid(rule.id);
    let employee_id   = rule.employee_id.0.clone();
    let employee_name = rule.employee_name.clone();
    let weekdays_str  = encode_weekdays(rule.weekdays)?;
    let start_str     = encode_date(rule.start_date);
    let end_str       = encode_date(rule.end_date);
    let hours         = rule.hours;
    let kind_str      = encode_kind(rule.kind);
    let note          = rule.note.clone();
    let at_str        = encode_dt(rule.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO rules (
             rule_id, employee_id, employee_name, weekdays,
             start_date, end_date, hours, kind, note, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            employee_id,
            employee_name,
            weekdays_str,
            start_str,
            end_str,
            hours,
            kind_str,
            note,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(rule)
  }

  async fn get_rule(&self, id: Uuid) -> Result<Option<RecurrenceRule>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawRule> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {RULE_COLUMNS} FROM rules WHERE rule_id = ?1"),
              rusqlite::params![id_str],
              RawRule::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRule::into_rule).transpose()
  }

  async fn delete_rule(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM rules WHERE rule_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    Ok(affected > 0)
  }

  async fn list_rules(&self) -> Result<Vec<RecurrenceRule>> {
    let raws: Vec<RawRule> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RULE_COLUMNS} FROM rules ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawRule::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRule::into_rule).collect()
  }
}

impl EmployeeDirectory for SqliteStore {
  async fn add_employee(&self, id: EmployeeId, name: String) -> Result<Employee> {
    let at_str = encode_dt(Utc::now());

    let raw: RawEmployee = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO employees (employee_id, name, created_at) VALUES (?1, ?2, ?3)
           ON CONFLICT (employee_id) DO UPDATE SET name = excluded.name
           RETURNING employee_id, name, created_at",
          rusqlite::params![id.0, name, at_str],
          RawEmployee::from_row,
        )?)
      })
      .await?;

    raw.into_employee()
  }

  async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>> {
    let raw: Option<RawEmployee> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT employee_id, name, created_at FROM employees WHERE employee_id = ?1",
              rusqlite::params![id.0],
              RawEmployee::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEmployee::into_employee).transpose()
  }

  async fn list_employees(&self) -> Result<Vec<Employee>> {
    let raws: Vec<RawEmployee> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT employee_id, name, created_at FROM employees ORDER BY employee_id")?;
        let rows = stmt
          .query_map([], RawEmployee::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEmployee::into_employee).collect()
  }
}
