// Schedule and video storage.
//
// SQLite keeps the schedule table and the video library in one file. The
// connection is shared behind a mutex; callers on the async side go through
// `tokio::task::spawn_blocking` since rusqlite is synchronous.
//
// Invariants enforced here, before anything is written:
//   - at most one schedule per date
//   - subuh_time strictly earlier than maghrib_time
//   - dates/times parse in the formats the engine reads back

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;
use time::macros::format_description;
use time::Date;
use uuid::Uuid;

use crate::model::{ScheduleRecord, Video, VideoCategory};
use crate::schedule::{resolve, validate_fields, ScheduleError};

pub const DEFAULT_LOCATION: &str = "Bekasi";
pub const DEFAULT_BERBUKA_DURATION: u32 = 300;

/// Uniform failure signal for every store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("schedule for {0} already exists")]
    DuplicateDate(String),

    #[error(transparent)]
    InvalidSchedule(#[from] ScheduleError),

    #[error("{0}")]
    Invalid(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("storage backend error: {0}")]
    Backend(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSchedule {
    pub date: String,
    pub subuh_time: String,
    pub maghrib_time: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchedulePatch {
    pub date: Option<String>,
    pub subuh_time: Option<String>,
    pub maghrib_time: Option<String>,
    pub location: Option<String>,
}

impl SchedulePatch {
    fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.subuh_time.is_none()
            && self.maghrib_time.is_none()
            && self.location.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVideo {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub is_active: Option<bool>,
    pub order: Option<i64>,
    pub duration_seconds: Option<u32>,
}

impl VideoPatch {
    /// Only fields that apply to `category` count; the admin UI sends
    /// whole objects back on edit.
    fn is_empty_for(&self, category: VideoCategory) -> bool {
        let specific = match category {
            VideoCategory::Tvc => self.order.is_none(),
            VideoCategory::Berbuka => self.duration_seconds.is_none(),
        };
        self.name.is_none() && self.url.is_none() && self.is_active.is_none() && specific
    }
}

pub trait ScheduleStore {
    /// All schedules, by date.
    fn list_schedules(&self) -> Result<Vec<ScheduleRecord>, StoreError>;

    fn get_schedule(&self, date: Date) -> Result<Option<ScheduleRecord>, StoreError> {
        let records = self.list_schedules()?;
        Ok(resolve(date, &records).cloned())
    }

    fn create_schedule(&self, new: NewSchedule) -> Result<ScheduleRecord, StoreError>;

    /// Insert many at once. Dates that already exist are skipped; any invalid
    /// entry rejects the whole batch.
    fn create_schedules(&self, batch: Vec<NewSchedule>) -> Result<Vec<ScheduleRecord>, StoreError>;

    fn update_schedule(&self, id: Uuid, patch: SchedulePatch) -> Result<ScheduleRecord, StoreError>;

    fn delete_schedule(&self, id: Uuid) -> Result<(), StoreError>;
}

pub trait VideoLibrary {
    /// Every video in `category`, active or not, in playlist order.
    fn list_videos(&self, category: VideoCategory) -> Result<Vec<Video>, StoreError>;

    /// Active videos in `category`, ordered by `order` then insertion.
    fn list_active_videos(&self, category: VideoCategory) -> Result<Vec<Video>, StoreError>;

    fn create_video(&self, category: VideoCategory, new: NewVideo) -> Result<Video, StoreError>;

    fn update_video(
        &self,
        category: VideoCategory,
        id: Uuid,
        patch: VideoPatch,
    ) -> Result<Video, StoreError>;

    fn delete_video(&self, category: VideoCategory, id: Uuid) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct Database {
    inner: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        db_init(&conn)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave SQLite half-written
        // (writes are transactional), so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn db_init(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;

        CREATE TABLE IF NOT EXISTS schedules (
            id            TEXT PRIMARY KEY,
            date          TEXT NOT NULL UNIQUE,
            subuh_time    TEXT NOT NULL,
            maghrib_time  TEXT NOT NULL,
            location      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS videos (
            id                TEXT PRIMARY KEY,
            category          TEXT NOT NULL,
            name              TEXT NOT NULL,
            url               TEXT NOT NULL,
            is_active         INTEGER NOT NULL,
            sort_order        INTEGER,
            duration_seconds  INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_videos_category ON videos(category, sort_order);
        "#,
    )?;
    Ok(())
}

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn schedule_from_row(row: &Row<'_>) -> rusqlite::Result<ScheduleRecord> {
    Ok(ScheduleRecord {
        id: uuid_column(row, 0)?,
        date: row.get(1)?,
        subuh_time: row.get(2)?,
        maghrib_time: row.get(3)?,
        location: row.get(4)?,
    })
}

const SCHEDULE_COLUMNS: &str = "id, date, subuh_time, maghrib_time, location";

fn date_taken(conn: &Connection, date: &str, except: Option<Uuid>) -> rusqlite::Result<bool> {
    let except = except.map(|id| id.to_string()).unwrap_or_default();
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM schedules WHERE date = ?1 AND id <> ?2",
        params![date, except],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn normalized(new: NewSchedule) -> Result<ScheduleRecord, StoreError> {
    let record = ScheduleRecord {
        id: Uuid::new_v4(),
        date: new.date.trim().to_string(),
        subuh_time: new.subuh_time.trim().to_string(),
        maghrib_time: new.maghrib_time.trim().to_string(),
        location: new
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
    };
    validate_fields(&record.date, &record.subuh_time, &record.maghrib_time)?;
    Ok(record)
}

fn insert_schedule(conn: &Connection, record: &ScheduleRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO schedules (id, date, subuh_time, maghrib_time, location)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.id.to_string(),
            record.date,
            record.subuh_time,
            record.maghrib_time,
            record.location
        ],
    )?;
    Ok(())
}

impl ScheduleStore for Database {
    fn list_schedules(&self) -> Result<Vec<ScheduleRecord>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules ORDER BY date ASC"
        ))?;
        let rows = stmt
            .query_map([], schedule_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Dates are stored as validated `YYYY-MM-DD`, so this is a keyed lookup.
    fn get_schedule(&self, date: Date) -> Result<Option<ScheduleRecord>, StoreError> {
        let key = date
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        let conn = self.conn();
        let record = conn
            .query_row(
                &format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE date = ?1"),
                params![key],
                schedule_from_row,
            )
            .optional()?;
        Ok(record.filter(|r| resolve(date, std::slice::from_ref(r)).is_some()))
    }

    fn create_schedule(&self, new: NewSchedule) -> Result<ScheduleRecord, StoreError> {
        let record = normalized(new)?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        if date_taken(&tx, &record.date, None)? {
            return Err(StoreError::DuplicateDate(record.date));
        }
        insert_schedule(&tx, &record)?;
        tx.commit()?;
        Ok(record)
    }

    fn create_schedules(&self, batch: Vec<NewSchedule>) -> Result<Vec<ScheduleRecord>, StoreError> {
        let records = batch
            .into_iter()
            .map(normalized)
            .collect::<Result<Vec<_>, _>>()?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut created = Vec::with_capacity(records.len());
        for record in records {
            if date_taken(&tx, &record.date, None)? {
                continue;
            }
            insert_schedule(&tx, &record)?;
            created.push(record);
        }
        tx.commit()?;
        Ok(created)
    }

    fn update_schedule(
        &self,
        id: Uuid,
        patch: SchedulePatch,
    ) -> Result<ScheduleRecord, StoreError> {
        if patch.is_empty() {
            return Err(StoreError::Invalid("no data to update".into()));
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut record = tx
            .query_row(
                &format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ?1"),
                params![id.to_string()],
                schedule_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound("schedule"))?;

        if let Some(date) = patch.date {
            record.date = date.trim().to_string();
        }
        if let Some(subuh) = patch.subuh_time {
            record.subuh_time = subuh.trim().to_string();
        }
        if let Some(maghrib) = patch.maghrib_time {
            record.maghrib_time = maghrib.trim().to_string();
        }
        if let Some(location) = patch.location {
            record.location = location.trim().to_string();
        }
        validate_fields(&record.date, &record.subuh_time, &record.maghrib_time)?;

        if date_taken(&tx, &record.date, Some(id))? {
            return Err(StoreError::DuplicateDate(record.date));
        }

        tx.execute(
            "UPDATE schedules SET date = ?2, subuh_time = ?3, maghrib_time = ?4, location = ?5
             WHERE id = ?1",
            params![
                id.to_string(),
                record.date,
                record.subuh_time,
                record.maghrib_time,
                record.location
            ],
        )?;
        tx.commit()?;
        Ok(record)
    }

    fn delete_schedule(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = self.conn();
        let n = conn.execute("DELETE FROM schedules WHERE id = ?1", params![id.to_string()])?;
        if n == 0 {
            return Err(StoreError::NotFound("schedule"));
        }
        Ok(())
    }
}

fn video_from_row(category: VideoCategory) -> impl Fn(&Row<'_>) -> rusqlite::Result<Video> {
    move |row| {
        let sort_order: Option<i64> = row.get(4)?;
        let duration: Option<u32> = row.get(5)?;
        Ok(Video {
            id: uuid_column(row, 0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            is_active: row.get(3)?,
            category,
            order: match category {
                VideoCategory::Tvc => Some(sort_order.unwrap_or(0)),
                VideoCategory::Berbuka => None,
            },
            duration_seconds: match category {
                VideoCategory::Tvc => None,
                VideoCategory::Berbuka => Some(duration.unwrap_or(DEFAULT_BERBUKA_DURATION)),
            },
        })
    }
}

const VIDEO_COLUMNS: &str = "id, name, url, is_active, sort_order, duration_seconds";

fn required(field: &str, value: &str) -> Result<String, StoreError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(StoreError::Invalid(format!("{field} must not be empty")));
    }
    Ok(v.to_string())
}

fn get_video(conn: &Connection, category: VideoCategory, id: Uuid) -> Result<Video, StoreError> {
    conn.query_row(
        &format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = ?1 AND category = ?2"),
        params![id.to_string(), category.as_str()],
        video_from_row(category),
    )
    .optional()?
    .ok_or(StoreError::NotFound("video"))
}

impl Database {
    fn query_videos(
        &self,
        category: VideoCategory,
        active_only: bool,
    ) -> Result<Vec<Video>, StoreError> {
        let conn = self.conn();
        let filter = if active_only { "AND is_active = 1" } else { "" };
        let mut stmt = conn.prepare(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE category = ?1 {filter}
             ORDER BY sort_order ASC, rowid ASC"
        ))?;
        let rows = stmt
            .query_map(params![category.as_str()], video_from_row(category))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

impl VideoLibrary for Database {
    fn list_videos(&self, category: VideoCategory) -> Result<Vec<Video>, StoreError> {
        self.query_videos(category, false)
    }

    fn list_active_videos(&self, category: VideoCategory) -> Result<Vec<Video>, StoreError> {
        self.query_videos(category, true)
    }

    fn create_video(&self, category: VideoCategory, new: NewVideo) -> Result<Video, StoreError> {
        let video = Video {
            id: Uuid::new_v4(),
            name: required("name", &new.name)?,
            url: required("url", &new.url)?,
            is_active: new.is_active.unwrap_or(true),
            category,
            order: match category {
                VideoCategory::Tvc => Some(new.order.unwrap_or(0)),
                VideoCategory::Berbuka => None,
            },
            duration_seconds: match category {
                VideoCategory::Tvc => None,
                VideoCategory::Berbuka => {
                    Some(new.duration_seconds.unwrap_or(DEFAULT_BERBUKA_DURATION))
                }
            },
        };

        let conn = self.conn();
        conn.execute(
            "INSERT INTO videos (id, category, name, url, is_active, sort_order, duration_seconds)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                video.id.to_string(),
                category.as_str(),
                video.name,
                video.url,
                video.is_active,
                video.order,
                video.duration_seconds
            ],
        )?;
        Ok(video)
    }

    fn update_video(
        &self,
        category: VideoCategory,
        id: Uuid,
        patch: VideoPatch,
    ) -> Result<Video, StoreError> {
        if patch.is_empty_for(category) {
            return Err(StoreError::Invalid("no data to update".into()));
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut video = get_video(&tx, category, id)?;

        if let Some(name) = patch.name {
            video.name = required("name", &name)?;
        }
        if let Some(url) = patch.url {
            video.url = required("url", &url)?;
        }
        if let Some(active) = patch.is_active {
            video.is_active = active;
        }
        match category {
            VideoCategory::Tvc => {
                if let Some(order) = patch.order {
                    video.order = Some(order);
                }
            }
            VideoCategory::Berbuka => {
                if let Some(duration) = patch.duration_seconds {
                    video.duration_seconds = Some(duration);
                }
            }
        }

        tx.execute(
            "UPDATE videos SET name = ?2, url = ?3, is_active = ?4, sort_order = ?5, duration_seconds = ?6
             WHERE id = ?1",
            params![
                id.to_string(),
                video.name,
                video.url,
                video.is_active,
                video.order,
                video.duration_seconds
            ],
        )?;
        tx.commit()?;
        Ok(video)
    }

    fn delete_video(&self, category: VideoCategory, id: Uuid) -> Result<(), StoreError> {
        let conn = self.conn();
        let n = conn.execute(
            "DELETE FROM videos WHERE id = ?1 AND category = ?2",
            params![id.to_string(), category.as_str()],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound("video"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn new_schedule(date: &str, subuh: &str, maghrib: &str) -> NewSchedule {
        NewSchedule {
            date: date.to_string(),
            subuh_time: subuh.to_string(),
            maghrib_time: maghrib.to_string(),
            location: None,
        }
    }

    fn new_video(name: &str, order: Option<i64>) -> NewVideo {
        NewVideo {
            name: name.to_string(),
            url: format!("https://cdn.example/{name}.mp4"),
            is_active: None,
            order,
            duration_seconds: None,
        }
    }

    #[test]
    fn test_init() {
        let db = Database::memory().unwrap();
        assert!(db.list_schedules().unwrap().is_empty());
        assert!(db.list_videos(VideoCategory::Tvc).unwrap().is_empty());
    }

    #[test]
    fn schedule_defaults_and_lookup() {
        let db = Database::memory().unwrap();
        let created = db
            .create_schedule(new_schedule("2026-03-01", "04:30", "18:00"))
            .unwrap();
        assert_eq!(created.location, DEFAULT_LOCATION);

        assert_eq!(db.get_schedule(date!(2026 - 03 - 01)).unwrap(), Some(created));
        assert_eq!(db.get_schedule(date!(2026 - 03 - 02)).unwrap(), None);
    }

    #[test]
    fn keyed_lookup_matches_only_its_day() {
        let db = Database::memory().unwrap();
        let batch = ["2026-02-28", "2026-03-01", "2026-03-02"]
            .into_iter()
            .map(|d| new_schedule(d, "04:30", "18:00"))
            .collect();
        db.create_schedules(batch).unwrap();

        let hit = db.get_schedule(date!(2026 - 03 - 01)).unwrap().unwrap();
        assert_eq!(hit.date, "2026-03-01");
        let listed = db.list_schedules().unwrap();
        assert_eq!(
            resolve(date!(2026 - 03 - 01), &listed).map(|r| r.id),
            Some(hit.id)
        );
        assert_eq!(db.get_schedule(date!(2026 - 03 - 10)).unwrap(), None);
    }

    #[test]
    fn second_schedule_for_a_date_is_rejected() {
        let db = Database::memory().unwrap();
        db.create_schedule(new_schedule("2026-03-01", "04:30", "18:00"))
            .unwrap();

        let err = db
            .create_schedule(new_schedule("2026-03-01", "04:31", "18:01"))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateDate(d) if d == "2026-03-01"));
        assert_eq!(db.list_schedules().unwrap().len(), 1);
    }

    #[test]
    fn inverted_times_are_rejected_before_insert() {
        let db = Database::memory().unwrap();
        let err = db
            .create_schedule(new_schedule("2026-03-01", "18:00", "04:30"))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidSchedule(ScheduleError::InvalidRange { .. })
        ));
        assert!(db.list_schedules().unwrap().is_empty());
    }

    #[test]
    fn bulk_import_skips_existing_dates() {
        let db = Database::memory().unwrap();
        db.create_schedule(new_schedule("2026-03-02", "04:30", "18:00"))
            .unwrap();

        let created = db
            .create_schedules(vec![
                new_schedule("2026-03-01", "04:31", "18:01"),
                new_schedule("2026-03-02", "04:29", "17:59"),
                new_schedule("2026-03-03", "04:28", "17:58"),
                new_schedule("2026-03-03", "04:27", "17:57"),
            ])
            .unwrap();
        let dates: Vec<&str> = created.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2026-03-01", "2026-03-03"]);

        let all: Vec<String> = db.list_schedules().unwrap().into_iter().map(|r| r.date).collect();
        assert_eq!(all, vec!["2026-03-01", "2026-03-02", "2026-03-03"]);
    }

    #[test]
    fn bulk_import_with_an_invalid_entry_writes_nothing() {
        let db = Database::memory().unwrap();
        let err = db
            .create_schedules(vec![
                new_schedule("2026-03-01", "04:31", "18:01"),
                new_schedule("2026-03-02", "19:00", "18:00"),
            ])
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidSchedule(_)));
        assert!(db.list_schedules().unwrap().is_empty());
    }

    #[test]
    fn schedule_update_is_partial_and_revalidated() {
        let db = Database::memory().unwrap();
        let a = db
            .create_schedule(new_schedule("2026-03-01", "04:30", "18:00"))
            .unwrap();
        db.create_schedule(new_schedule("2026-03-02", "04:30", "18:00"))
            .unwrap();

        let updated = db
            .update_schedule(
                a.id,
                SchedulePatch {
                    maghrib_time: Some("17:58".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.maghrib_time, "17:58");
        assert_eq!(updated.subuh_time, "04:30");

        let clash = db.update_schedule(
            a.id,
            SchedulePatch {
                date: Some("2026-03-02".into()),
                ..Default::default()
            },
        );
        assert!(matches!(clash, Err(StoreError::DuplicateDate(_))));

        let inverted = db.update_schedule(
            a.id,
            SchedulePatch {
                subuh_time: Some("18:30".into()),
                ..Default::default()
            },
        );
        assert!(matches!(inverted, Err(StoreError::InvalidSchedule(_))));

        let empty = db.update_schedule(a.id, SchedulePatch::default());
        assert!(matches!(empty, Err(StoreError::Invalid(_))));

        let missing = db.update_schedule(
            Uuid::new_v4(),
            SchedulePatch {
                location: Some("Jakarta".into()),
                ..Default::default()
            },
        );
        assert!(matches!(missing, Err(StoreError::NotFound("schedule"))));
    }

    #[test]
    fn delete_schedule_reports_missing_rows() {
        let db = Database::memory().unwrap();
        let a = db
            .create_schedule(new_schedule("2026-03-01", "04:30", "18:00"))
            .unwrap();
        db.delete_schedule(a.id).unwrap();
        assert!(matches!(db.delete_schedule(a.id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn active_reel_is_ordered_with_insertion_tie_break() {
        let db = Database::memory().unwrap();
        let c = db.create_video(VideoCategory::Tvc, new_video("c", Some(2))).unwrap();
        let a = db.create_video(VideoCategory::Tvc, new_video("a", Some(1))).unwrap();
        let b = db.create_video(VideoCategory::Tvc, new_video("b", Some(1))).unwrap();
        let hidden = db.create_video(VideoCategory::Tvc, new_video("hidden", Some(0))).unwrap();
        db.update_video(
            VideoCategory::Tvc,
            hidden.id,
            VideoPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        let names: Vec<String> = db
            .list_active_videos(VideoCategory::Tvc)
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec![a.name, b.name, c.name]);
        assert_eq!(db.list_videos(VideoCategory::Tvc).unwrap().len(), 4);
    }

    #[test]
    fn categories_are_kept_apart() {
        let db = Database::memory().unwrap();
        let buka = db
            .create_video(VideoCategory::Berbuka, new_video("buka", Some(5)))
            .unwrap();
        assert_eq!(buka.order, None);
        assert_eq!(buka.duration_seconds, Some(DEFAULT_BERBUKA_DURATION));

        assert!(db.list_active_videos(VideoCategory::Tvc).unwrap().is_empty());
        assert!(matches!(
            db.delete_video(VideoCategory::Tvc, buka.id),
            Err(StoreError::NotFound("video"))
        ));

        // An order-only patch means nothing for a berbuka clip.
        let patch = VideoPatch {
            order: Some(3),
            ..Default::default()
        };
        assert!(matches!(
            db.update_video(VideoCategory::Berbuka, buka.id, patch),
            Err(StoreError::Invalid(_))
        ));

        db.delete_video(VideoCategory::Berbuka, buka.id).unwrap();
        assert!(db.list_videos(VideoCategory::Berbuka).unwrap().is_empty());
    }

    #[test]
    fn blank_names_are_rejected() {
        let db = Database::memory().unwrap();
        let err = db
            .create_video(VideoCategory::Tvc, new_video("  ", None))
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }
}
