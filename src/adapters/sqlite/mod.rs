//! SQLite adapter: Implementation of `EntityStore` and `LeadSink`.
//!
//! Provides local persistence for the clinic data model.
//!
//! # Integrity
//!
//! Uniqueness and referential integrity are enforced by SQLite itself
//! (UNIQUE indexes, FOREIGN KEY clauses with `foreign_keys = ON`, CHECK
//! constraints). Constraint failures are translated into typed
//! [`StoreError`] variants, so two racing writers that would break a unique
//! rule get exactly one success.
//!
//! # Mutex Behavior
//!
//! The connection is protected by a `Mutex`. A poisoned mutex surfaces as
//! [`StoreError::LockPoisoned`] instead of a panic.
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{ffi, params, types::Type, Connection, ErrorCode, OptionalExtension, Row};

use crate::domain::{
    credentials, Appointment, AppointmentStatus, CredentialError, Department, Doctor, Lead,
    Medicine, PasswordHash, PurchaseHistory, Role, User,
};
use crate::ports::{EntityStore, LeadSink};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Duplicate key: {field} already in use")]
    DuplicateKey { field: String },

    #[error("Unique constraint violated on {table}.{column}")]
    UniqueConstraintViolation { table: String, column: String },

    #[error("Foreign key violation: {table} row references a missing record")]
    ForeignKeyViolation { table: &'static str },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database connection lock poisoned")]
    LockPoisoned,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role";
const DOCTOR_COLUMNS: &str = "id, name, department_id, user_id";
const APPOINTMENT_COLUMNS: &str = "id, patient_id, doctor_id, appointment_date, status";
const MEDICINE_COLUMNS: &str = "id, name, quantity, low_stock_threshold";
const PURCHASE_COLUMNS: &str = "id, medicine_id, quantity_purchased, date";

/// SQLite storage adapter.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;

        conn.execute_batch(
            r"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE CHECK (length(username) > 0),
                email TEXT NOT NULL UNIQUE CHECK (length(email) > 0),
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'patient'
                    CHECK (role IN ('patient', 'staff', 'admin'))
            );

            CREATE TABLE IF NOT EXISTS departments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE CHECK (length(name) > 0)
            );

            CREATE TABLE IF NOT EXISTS doctors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL CHECK (length(name) > 0),
                department_id INTEGER NOT NULL REFERENCES departments(id),
                user_id INTEGER UNIQUE REFERENCES users(id)
            );

            CREATE INDEX IF NOT EXISTS idx_doctors_department
                ON doctors(department_id);

            CREATE TABLE IF NOT EXISTS appointments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id INTEGER NOT NULL REFERENCES users(id),
                doctor_id INTEGER NOT NULL REFERENCES doctors(id),
                appointment_date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'Pending'
                    CHECK (status IN ('Pending', 'Confirmed', 'Completed'))
            );

            CREATE INDEX IF NOT EXISTS idx_appointments_doctor
                ON appointments(doctor_id);
            CREATE INDEX IF NOT EXISTS idx_appointments_patient
                ON appointments(patient_id);

            CREATE TABLE IF NOT EXISTS medicines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL CHECK (length(name) > 0),
                quantity INTEGER NOT NULL CHECK (quantity >= 0),
                low_stock_threshold INTEGER NOT NULL CHECK (low_stock_threshold >= 0)
            );

            CREATE TABLE IF NOT EXISTS purchase_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                medicine_id INTEGER NOT NULL REFERENCES medicines(id),
                quantity_purchased INTEGER NOT NULL,
                date TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_purchase_history_medicine
                ON purchase_history(medicine_id);

            CREATE TABLE IF NOT EXISTS leads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                email TEXT,
                message TEXT,
                received_at TEXT NOT NULL
            );
            ",
        )?;

        Ok(())
    }

    /// Number of captured leads.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn count_leads(&self) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), StoreError> {
    if value.is_empty() {
        return Err(StoreError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: i64) -> Result<(), StoreError> {
    if value < 0 {
        return Err(StoreError::InvalidInput(format!(
            "{field} must not be negative (got {value})"
        )));
    }
    Ok(())
}

/// Translate a failed write on `table` into a typed error.
///
/// Unique violations on `users` are duplicate keys; on any other table they
/// are unique-constraint violations.
fn write_error(table: &'static str, err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            let detail = message.as_deref().unwrap_or_default();
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE => {
                    let (tbl, column) = unique_target(detail).unwrap_or((table, "unknown"));
                    return if tbl == "users" {
                        StoreError::DuplicateKey {
                            field: column.to_string(),
                        }
                    } else {
                        StoreError::UniqueConstraintViolation {
                            table: tbl.to_string(),
                            column: column.to_string(),
                        }
                    };
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return StoreError::ForeignKeyViolation { table };
                }
                ffi::SQLITE_CONSTRAINT_CHECK | ffi::SQLITE_CONSTRAINT_NOTNULL => {
                    return StoreError::InvalidInput(detail.to_string());
                }
                _ => {}
            }
        }
    }
    StoreError::Database(err)
}

/// Parse `"UNIQUE constraint failed: users.email"` into `("users", "email")`.
fn unique_target(detail: &str) -> Option<(&str, &str)> {
    let target = detail.strip_prefix("UNIQUE constraint failed: ")?;
    // Composite indexes list several columns; the first one names the table.
    let first = target.split(',').next()?.trim();
    first.split_once('.')
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parsed<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let hash: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::from_stored(hash),
        role: parsed(row, 4)?,
    })
}

fn department_from_row(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        department_id: row.get(2)?,
        user_id: row.get(3)?,
    })
}

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        appointment_date: timestamp(row, 3)?,
        status: parsed(row, 4)?,
    })
}

fn medicine_from_row(row: &Row<'_>) -> rusqlite::Result<Medicine> {
    Ok(Medicine {
        id: row.get(0)?,
        name: row.get(1)?,
        quantity: row.get(2)?,
        low_stock_threshold: row.get(3)?,
    })
}

fn purchase_from_row(row: &Row<'_>) -> rusqlite::Result<PurchaseHistory> {
    Ok(PurchaseHistory {
        id: row.get(0)?,
        medicine_id: row.get(1)?,
        quantity_purchased: row.get(2)?,
        date: timestamp(row, 3)?,
    })
}

fn lead_from_row(row: &Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        name: row.get(0)?,
        email: row.get(1)?,
        message: row.get(2)?,
        received_at: timestamp(row, 3)?,
    })
}

/// Fetch one row by primary key, mapping absence to `NotFound`.
fn fetch_by_id<T>(
    conn: &Connection,
    entity: &'static str,
    sql: &str,
    id: i64,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<T, StoreError> {
    conn.query_row(sql, params![id], map)
        .optional()?
        .ok_or(StoreError::NotFound { entity, id })
}

/// Fetch all rows matching a single integer parameter.
fn fetch_all<T>(
    conn: &Connection,
    sql: &str,
    param: Option<i64>,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = match param {
        Some(value) => stmt.query_map(params![value], map)?,
        None => stmt.query_map([], map)?,
    };
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

impl EntityStore for SqliteStore {
    type Error = StoreError;

    fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, Self::Error> {
        require_non_empty("username", username)?;
        require_non_empty("email", email)?;

        let password_hash = credentials::hash(password)?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO users (username, email, password_hash, role) VALUES (?1, ?2, ?3, ?4)",
            params![username, email, password_hash.as_str(), role.as_str()],
        )
        .map_err(|e| write_error("users", e))?;

        let user = User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role,
        };

        tracing::info!(user_id = user.id, role = %user.role, "Created user");
        Ok(user)
    }

    fn get_user(&self, id: i64) -> Result<User, Self::Error> {
        let conn = self.conn()?;
        fetch_by_id(
            &conn,
            "User",
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            id,
            user_from_row,
        )
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, Self::Error> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn list_users(&self) -> Result<Vec<User>, Self::Error> {
        let conn = self.conn()?;
        fetch_all(
            &conn,
            &format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"),
            None,
            user_from_row,
        )
    }

    fn create_department(&self, name: &str) -> Result<Department, Self::Error> {
        require_non_empty("department name", name)?;
        let conn = self.conn()?;

        conn.execute("INSERT INTO departments (name) VALUES (?1)", params![name])
            .map_err(|e| write_error("departments", e))?;

        let department = Department {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        };
        tracing::info!(department_id = department.id, "Created department {}", department.name);
        Ok(department)
    }

    fn get_department(&self, id: i64) -> Result<Department, Self::Error> {
        let conn = self.conn()?;
        fetch_by_id(
            &conn,
            "Department",
            "SELECT id, name FROM departments WHERE id = ?1",
            id,
            department_from_row,
        )
    }

    fn list_departments(&self) -> Result<Vec<Department>, Self::Error> {
        let conn = self.conn()?;
        fetch_all(
            &conn,
            "SELECT id, name FROM departments ORDER BY id",
            None,
            department_from_row,
        )
    }

    fn create_doctor(
        &self,
        name: &str,
        department_id: i64,
        user_id: Option<i64>,
    ) -> Result<Doctor, Self::Error> {
        require_non_empty("doctor name", name)?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO doctors (name, department_id, user_id) VALUES (?1, ?2, ?3)",
            params![name, department_id, user_id],
        )
        .map_err(|e| write_error("doctors", e))?;

        let doctor = Doctor {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            department_id,
            user_id,
        };
        tracing::info!(doctor_id = doctor.id, department_id, "Created doctor");
        Ok(doctor)
    }

    fn get_doctor(&self, id: i64) -> Result<Doctor, Self::Error> {
        let conn = self.conn()?;
        fetch_by_id(
            &conn,
            "Doctor",
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1"),
            id,
            doctor_from_row,
        )
    }

    fn doctors_in_department(&self, department_id: i64) -> Result<Vec<Doctor>, Self::Error> {
        let conn = self.conn()?;
        fetch_all(
            &conn,
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE department_id = ?1 ORDER BY id"),
            Some(department_id),
            doctor_from_row,
        )
    }

    fn doctor_for_user(&self, user_id: i64) -> Result<Option<Doctor>, Self::Error> {
        let conn = self.conn()?;
        let doctor = conn
            .query_row(
                &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE user_id = ?1"),
                params![user_id],
                doctor_from_row,
            )
            .optional()?;
        Ok(doctor)
    }

    fn create_appointment(
        &self,
        patient_id: i64,
        doctor_id: i64,
        appointment_date: Option<DateTime<Utc>>,
        status: AppointmentStatus,
    ) -> Result<Appointment, Self::Error> {
        let appointment_date = appointment_date.unwrap_or_else(Utc::now);
        let conn = self.conn()?;

        conn.execute(
            r"
            INSERT INTO appointments (patient_id, doctor_id, appointment_date, status)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![
                patient_id,
                doctor_id,
                appointment_date.to_rfc3339(),
                status.as_str(),
            ],
        )
        .map_err(|e| write_error("appointments", e))?;

        let appointment = Appointment {
            id: conn.last_insert_rowid(),
            patient_id,
            doctor_id,
            appointment_date,
            status,
        };
        tracing::info!(appointment_id = appointment.id, doctor_id, %status, "Booked appointment");
        Ok(appointment)
    }

    fn get_appointment(&self, id: i64) -> Result<Appointment, Self::Error> {
        let conn = self.conn()?;
        fetch_by_id(
            &conn,
            "Appointment",
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            id,
            appointment_from_row,
        )
    }

    fn appointments_for_doctor(&self, doctor_id: i64) -> Result<Vec<Appointment>, Self::Error> {
        let conn = self.conn()?;
        fetch_all(
            &conn,
            &format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE doctor_id = ?1 ORDER BY id"
            ),
            Some(doctor_id),
            appointment_from_row,
        )
    }

    fn appointments_for_patient(
        &self,
        patient_id: i64,
    ) -> Result<Vec<Appointment>, Self::Error> {
        let conn = self.conn()?;
        fetch_all(
            &conn,
            &format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE patient_id = ?1 ORDER BY id"
            ),
            Some(patient_id),
            appointment_from_row,
        )
    }

    fn update_appointment_status(
        &self,
        id: i64,
        status: AppointmentStatus,
    ) -> Result<Appointment, Self::Error> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE appointments SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "Appointment",
                id,
            });
        }

        tracing::info!(appointment_id = id, %status, "Updated appointment status");
        fetch_by_id(
            &conn,
            "Appointment",
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            id,
            appointment_from_row,
        )
    }

    fn create_medicine(
        &self,
        name: &str,
        quantity: i64,
        low_stock_threshold: i64,
    ) -> Result<Medicine, Self::Error> {
        require_non_empty("medicine name", name)?;
        require_non_negative("quantity", quantity)?;
        require_non_negative("low_stock_threshold", low_stock_threshold)?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO medicines (name, quantity, low_stock_threshold) VALUES (?1, ?2, ?3)",
            params![name, quantity, low_stock_threshold],
        )
        .map_err(|e| write_error("medicines", e))?;

        let medicine = Medicine {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            quantity,
            low_stock_threshold,
        };
        tracing::info!(medicine_id = medicine.id, quantity, "Added medicine {}", medicine.name);
        Ok(medicine)
    }

    fn get_medicine(&self, id: i64) -> Result<Medicine, Self::Error> {
        let conn = self.conn()?;
        fetch_by_id(
            &conn,
            "Medicine",
            &format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = ?1"),
            id,
            medicine_from_row,
        )
    }

    fn list_medicines(&self) -> Result<Vec<Medicine>, Self::Error> {
        let conn = self.conn()?;
        fetch_all(
            &conn,
            &format!("SELECT {MEDICINE_COLUMNS} FROM medicines ORDER BY id"),
            None,
            medicine_from_row,
        )
    }

    fn set_medicine_quantity(&self, id: i64, quantity: i64) -> Result<Medicine, Self::Error> {
        require_non_negative("quantity", quantity)?;
        let conn = self.conn()?;

        let changed = conn
            .execute(
                "UPDATE medicines SET quantity = ?1 WHERE id = ?2",
                params![quantity, id],
            )
            .map_err(|e| write_error("medicines", e))?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "Medicine",
                id,
            });
        }

        tracing::debug!(medicine_id = id, quantity, "Set medicine quantity");
        fetch_by_id(
            &conn,
            "Medicine",
            &format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = ?1"),
            id,
            medicine_from_row,
        )
    }

    fn create_purchase(
        &self,
        medicine_id: i64,
        quantity_purchased: i64,
        date: Option<DateTime<Utc>>,
    ) -> Result<PurchaseHistory, Self::Error> {
        let date = date.unwrap_or_else(Utc::now);
        let conn = self.conn()?;

        conn.execute(
            r"
            INSERT INTO purchase_history (medicine_id, quantity_purchased, date)
            VALUES (?1, ?2, ?3)
            ",
            params![medicine_id, quantity_purchased, date.to_rfc3339()],
        )
        .map_err(|e| write_error("purchase_history", e))?;

        let purchase = PurchaseHistory {
            id: conn.last_insert_rowid(),
            medicine_id,
            quantity_purchased,
            date,
        };
        tracing::info!(purchase_id = purchase.id, medicine_id, quantity_purchased, "Recorded purchase");
        Ok(purchase)
    }

    fn get_purchase(&self, id: i64) -> Result<PurchaseHistory, Self::Error> {
        let conn = self.conn()?;
        fetch_by_id(
            &conn,
            "PurchaseHistory",
            &format!("SELECT {PURCHASE_COLUMNS} FROM purchase_history WHERE id = ?1"),
            id,
            purchase_from_row,
        )
    }

    fn purchases_for_medicine(
        &self,
        medicine_id: i64,
    ) -> Result<Vec<PurchaseHistory>, Self::Error> {
        let conn = self.conn()?;
        fetch_all(
            &conn,
            &format!(
                "SELECT {PURCHASE_COLUMNS} FROM purchase_history WHERE medicine_id = ?1 ORDER BY id"
            ),
            Some(medicine_id),
            purchase_from_row,
        )
    }

    fn restock(
        &self,
        medicine_id: i64,
        quantity_purchased: i64,
    ) -> Result<(Medicine, PurchaseHistory), Self::Error> {
        let date = Utc::now();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r"
            INSERT INTO purchase_history (medicine_id, quantity_purchased, date)
            VALUES (?1, ?2, ?3)
            ",
            params![medicine_id, quantity_purchased, date.to_rfc3339()],
        )
        .map_err(|e| write_error("purchase_history", e))?;

        let purchase = PurchaseHistory {
            id: tx.last_insert_rowid(),
            medicine_id,
            quantity_purchased,
            date,
        };

        tx.execute(
            "UPDATE medicines SET quantity = quantity + ?1 WHERE id = ?2",
            params![quantity_purchased, medicine_id],
        )
        .map_err(|e| write_error("medicines", e))?;

        let medicine = fetch_by_id(
            &tx,
            "Medicine",
            &format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = ?1"),
            medicine_id,
            medicine_from_row,
        )?;
        tx.commit()?;

        tracing::info!(
            medicine_id,
            quantity_purchased,
            quantity = medicine.quantity,
            "Restocked medicine"
        );
        Ok((medicine, purchase))
    }
}

impl LeadSink for SqliteStore {
    type Error = StoreError;

    fn record_lead(&self, lead: &Lead) -> Result<(), Self::Error> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO leads (name, email, message, received_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                lead.name,
                lead.email,
                lead.message,
                lead.received_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!(lead_id = conn.last_insert_rowid(), "Saved lead to storage");
        Ok(())
    }

    fn leads(&self) -> Result<Vec<Lead>, Self::Error> {
        let conn = self.conn()?;
        fetch_all(
            &conn,
            "SELECT name, email, message, received_at FROM leads ORDER BY id",
            None,
            lead_from_row,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn store() -> SqliteStore {
        SqliteStore::in_memory().expect("Should create db")
    }

    #[test]
    fn test_user_roundtrip() {
        let store = store();

        let created = store
            .create_user("alice", "alice@example.com", "s3cret!", Role::default())
            .expect("Should create");
        let loaded = store.get_user(created.id).expect("Should load");

        assert_eq!(loaded.username, "alice");
        assert_eq!(loaded.email, "alice@example.com");
        assert_eq!(loaded.role, Role::Patient);
        assert!(loaded.check_password("s3cret!"));
        assert!(!loaded.check_password("S3cret!"));
    }

    #[test]
    fn test_duplicate_username_and_email() {
        let store = store();
        store
            .create_user("alice", "alice@example.com", "pw", Role::Patient)
            .expect("Should create");

        let same_name = store.create_user("alice", "other@example.com", "pw", Role::Patient);
        assert!(
            matches!(same_name, Err(StoreError::DuplicateKey { ref field }) if field == "username")
        );

        let same_email = store.create_user("bob", "alice@example.com", "pw", Role::Staff);
        assert!(
            matches!(same_email, Err(StoreError::DuplicateKey { ref field }) if field == "email")
        );

        assert_eq!(store.list_users().expect("Should list").len(), 1);
    }

    #[test]
    fn test_empty_username_rejected() {
        let store = store();
        let result = store.create_user("", "x@example.com", "pw", Role::Patient);
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    }

    #[test]
    fn test_doctor_requires_department() {
        let store = store();
        let result = store.create_doctor("Dr. House", 42, None);
        assert!(matches!(
            result,
            Err(StoreError::ForeignKeyViolation { table: "doctors" })
        ));
    }

    #[test]
    fn test_doctor_requires_existing_user() {
        let store = store();
        let dept = store.create_department("Cardiology").expect("Should create");
        let result = store.create_doctor("Dr. Grey", dept.id, Some(99));
        assert!(matches!(result, Err(StoreError::ForeignKeyViolation { .. })));
    }

    #[test]
    fn test_one_doctor_per_user() {
        let store = store();
        let dept = store.create_department("Cardiology").expect("Should create");
        let user = store
            .create_user("drgrey", "grey@example.com", "pw", Role::Staff)
            .expect("Should create");

        let doctor = store
            .create_doctor("Dr. Grey", dept.id, Some(user.id))
            .expect("Should create");
        let second = store.create_doctor("Dr. Grey II", dept.id, Some(user.id));

        assert!(matches!(
            second,
            Err(StoreError::UniqueConstraintViolation { ref table, ref column })
                if table == "doctors" && column == "user_id"
        ));
        assert_eq!(
            store.doctor_for_user(user.id).expect("Should query"),
            Some(doctor)
        );

        // Unlinked doctors do not collide with each other.
        store.create_doctor("Dr. A", dept.id, None).expect("Should create");
        store.create_doctor("Dr. B", dept.id, None).expect("Should create");
    }

    #[test]
    fn test_duplicate_department_name() {
        let store = store();
        store.create_department("Pediatrics").expect("Should create");
        let result = store.create_department("Pediatrics");
        assert!(matches!(
            result,
            Err(StoreError::UniqueConstraintViolation { ref table, ref column })
                if table == "departments" && column == "name"
        ));
    }

    #[test]
    fn test_doctors_in_department_insertion_order() {
        let store = store();
        let cardio = store.create_department("Cardiology").expect("Should create");
        let neuro = store.create_department("Neurology").expect("Should create");

        let first = store.create_doctor("Dr. Z", cardio.id, None).expect("Should create");
        store.create_doctor("Dr. N", neuro.id, None).expect("Should create");
        let second = store.create_doctor("Dr. A", cardio.id, None).expect("Should create");

        let doctors = store.doctors_in_department(cardio.id).expect("Should list");
        assert_eq!(doctors, vec![first, second]);
    }

    #[test]
    fn test_appointment_lifecycle() {
        let store = store();
        let dept = store.create_department("Dermatology").expect("Should create");
        let doctor = store.create_doctor("Dr. Skin", dept.id, None).expect("Should create");
        let patient = store
            .create_user("pat", "pat@example.com", "pw", Role::Patient)
            .expect("Should create");

        let appointment = store
            .create_appointment(patient.id, doctor.id, None, AppointmentStatus::default())
            .expect("Should book");
        assert_eq!(appointment.status, AppointmentStatus::Pending);

        let loaded = store.get_appointment(appointment.id).expect("Should load");
        assert_eq!(loaded.appointment_date, appointment.appointment_date);

        let confirmed = store
            .update_appointment_status(appointment.id, AppointmentStatus::Confirmed)
            .expect("Should update");
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

        assert_eq!(store.appointments_for_doctor(doctor.id).expect("Should list").len(), 1);
        assert_eq!(store.appointments_for_patient(patient.id).expect("Should list").len(), 1);
    }

    #[test]
    fn test_appointment_requires_patient_and_doctor() {
        let store = store();
        let dept = store.create_department("ENT").expect("Should create");
        let doctor = store.create_doctor("Dr. Ear", dept.id, None).expect("Should create");
        let patient = store
            .create_user("pat", "pat@example.com", "pw", Role::Patient)
            .expect("Should create");

        let no_patient =
            store.create_appointment(999, doctor.id, None, AppointmentStatus::Pending);
        assert!(matches!(no_patient, Err(StoreError::ForeignKeyViolation { .. })));

        let no_doctor =
            store.create_appointment(patient.id, 999, None, AppointmentStatus::Pending);
        assert!(matches!(no_doctor, Err(StoreError::ForeignKeyViolation { .. })));
    }

    #[test]
    fn test_not_found() {
        let store = store();
        assert!(matches!(
            store.get_user(7),
            Err(StoreError::NotFound { entity: "User", id: 7 })
        ));
        assert!(matches!(store.get_medicine(1), Err(StoreError::NotFound { .. })));
        assert!(matches!(
            store.update_appointment_status(3, AppointmentStatus::Completed),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(store.set_medicine_quantity(3, 1), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_low_stock_view_follows_quantity() {
        let store = store();
        let aspirin = store.create_medicine("Aspirin", 5, 10).expect("Should create");
        store.create_medicine("Ibuprofen", 50, 10).expect("Should create");

        let low = store.low_stock_medicines().expect("Should query");
        assert_eq!(low, vec![aspirin.clone()]);

        store.create_purchase(aspirin.id, 15, None).expect("Should record");
        store.set_medicine_quantity(aspirin.id, 20).expect("Should update");

        assert!(store.low_stock_medicines().expect("Should query").is_empty());
    }

    #[test]
    fn test_restock_is_atomic() {
        let store = store();
        let med = store.create_medicine("Insulin", 2, 5).expect("Should create");

        let (updated, purchase) = store.restock(med.id, 18).expect("Should restock");
        assert_eq!(updated.quantity, 20);
        assert_eq!(purchase.medicine_id, med.id);
        assert_eq!(store.purchases_for_medicine(med.id).expect("Should list"), vec![purchase]);

        // A purchase for a missing medicine leaves nothing behind.
        let missing = store.restock(404, 10);
        assert!(matches!(missing, Err(StoreError::ForeignKeyViolation { .. })));

        // Stock can't go negative; the purchase row is rolled back with it.
        let negative = store.restock(med.id, -100);
        assert!(matches!(negative, Err(StoreError::InvalidInput(_))));
        assert_eq!(store.purchases_for_medicine(med.id).expect("Should list").len(), 1);
        assert_eq!(store.get_medicine(med.id).expect("Should load").quantity, 20);
    }

    #[test]
    fn test_medicine_validation() {
        let store = store();
        assert!(matches!(
            store.create_medicine("", 1, 1),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            store.create_medicine("Saline", -1, 1),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            store.create_medicine("Saline", 1, -1),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_purchase_requires_medicine() {
        let store = store();
        let result = store.create_purchase(1, 10, None);
        assert!(matches!(
            result,
            Err(StoreError::ForeignKeyViolation { table: "purchase_history" })
        ));
    }

    #[test]
    fn test_leads_roundtrip() {
        let store = store();
        store
            .record_lead(&Lead::new(Some("Alice".into()), Some("a@x.com".into()), None))
            .expect("Should save");
        store.record_lead(&Lead::new(None, None, None)).expect("Should save");

        let leads = store.leads().expect("Should load");
        assert_eq!(store.count_leads().expect("Should count"), 2);
        assert_eq!(leads[0].name.as_deref(), Some("Alice"));
        assert!(leads[1].email.is_none());
    }

    #[test]
    fn test_list_departments_insertion_order() {
        let store = store();
        let names = ["Radiology", "Cardiology", "Oncology"];
        for name in names {
            store.create_department(name).expect("Should create");
        }

        let listed: Vec<String> = store
            .list_departments()
            .expect("Should list")
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(listed, names);
    }

    #[test]
    fn test_concurrent_duplicate_username_single_winner() {
        let store = Arc::new(store());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store.create_user("same", &format!("same{i}@example.com"), "pw", Role::Patient)
                })
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("Thread should finish"))
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, StoreError::DuplicateKey { field } if field == "username")));
        assert_eq!(store.list_users().expect("Should list").len(), 1);
    }

    #[test]
    fn test_concurrent_doctor_for_same_user_single_winner() {
        let store = Arc::new(store());
        let dept = store.create_department("Cardiology").expect("Should create");
        let user = store
            .create_user("drgrey", "grey@example.com", "pw", Role::Staff)
            .expect("Should create");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.create_doctor(&format!("Dr. Grey {i}"), dept.id, Some(user.id)))
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("Thread should finish"))
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().filter_map(|r| r.as_ref().err()).all(|e| matches!(
            e,
            StoreError::UniqueConstraintViolation { table, column }
                if table == "doctors" && column == "user_id"
        )));
        assert_eq!(store.doctors_in_department(dept.id).expect("Should list").len(), 1);
    }

    #[test]
    fn test_unique_target_parsing() {
        assert_eq!(
            unique_target("UNIQUE constraint failed: users.email"),
            Some(("users", "email"))
        );
        assert_eq!(unique_target("NOT NULL constraint failed: users.email"), None);
    }
}
