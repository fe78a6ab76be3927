//! Entity store port: persistence of the clinic data model.
//!
//! Implementations enforce the model's invariants at write time:
//! uniqueness of usernames, e-mails, department names and doctor/user links,
//! and existence of every referenced row. Every create is a single
//! all-or-nothing write.

use chrono::{DateTime, Utc};

use crate::domain::{
    Appointment, AppointmentStatus, Department, Doctor, Medicine, PurchaseHistory, Role, User,
};

/// Trait for clinic entity storage.
///
/// Relationship lookups return rows in insertion order.
pub trait EntityStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    // -- users ---------------------------------------------------------

    /// Create a user, hashing `password` before it is stored.
    ///
    /// # Errors
    /// Returns a duplicate-key error if the username or e-mail is taken.
    fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, Self::Error>;

    /// # Errors
    /// Returns a not-found error if no user has this id.
    fn get_user(&self, id: i64) -> Result<User, Self::Error>;

    /// Find a user by exact username.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, Self::Error>;

    /// # Errors
    /// Returns error if storage operation fails.
    fn list_users(&self) -> Result<Vec<User>, Self::Error>;

    // -- departments and doctors ----------------------------------------

    /// # Errors
    /// Returns a unique-constraint error if the name is taken.
    fn create_department(&self, name: &str) -> Result<Department, Self::Error>;

    /// # Errors
    /// Returns a not-found error if no department has this id.
    fn get_department(&self, id: i64) -> Result<Department, Self::Error>;

    /// # Errors
    /// Returns error if storage operation fails.
    fn list_departments(&self) -> Result<Vec<Department>, Self::Error>;

    /// Create a doctor in a department, optionally linked to a user account.
    ///
    /// # Errors
    /// Returns a foreign-key error if the department or user does not exist,
    /// and a unique-constraint error if the user is already a doctor.
    fn create_doctor(
        &self,
        name: &str,
        department_id: i64,
        user_id: Option<i64>,
    ) -> Result<Doctor, Self::Error>;

    /// # Errors
    /// Returns a not-found error if no doctor has this id.
    fn get_doctor(&self, id: i64) -> Result<Doctor, Self::Error>;

    /// # Errors
    /// Returns error if storage operation fails.
    fn doctors_in_department(&self, department_id: i64) -> Result<Vec<Doctor>, Self::Error>;

    /// The doctor record linked to a user account, if any.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn doctor_for_user(&self, user_id: i64) -> Result<Option<Doctor>, Self::Error>;

    // -- appointments --------------------------------------------------

    /// Book an appointment. `appointment_date` defaults to now.
    ///
    /// # Errors
    /// Returns a foreign-key error if the patient or doctor does not exist.
    fn create_appointment(
        &self,
        patient_id: i64,
        doctor_id: i64,
        appointment_date: Option<DateTime<Utc>>,
        status: AppointmentStatus,
    ) -> Result<Appointment, Self::Error>;

    /// # Errors
    /// Returns a not-found error if no appointment has this id.
    fn get_appointment(&self, id: i64) -> Result<Appointment, Self::Error>;

    /// # Errors
    /// Returns error if storage operation fails.
    fn appointments_for_doctor(&self, doctor_id: i64) -> Result<Vec<Appointment>, Self::Error>;

    /// # Errors
    /// Returns error if storage operation fails.
    fn appointments_for_patient(&self, patient_id: i64)
        -> Result<Vec<Appointment>, Self::Error>;

    /// # Errors
    /// Returns a not-found error if no appointment has this id.
    fn update_appointment_status(
        &self,
        id: i64,
        status: AppointmentStatus,
    ) -> Result<Appointment, Self::Error>;

    // -- inventory -----------------------------------------------------

    /// # Errors
    /// Returns an invalid-input error for an empty name or negative amounts.
    fn create_medicine(
        &self,
        name: &str,
        quantity: i64,
        low_stock_threshold: i64,
    ) -> Result<Medicine, Self::Error>;

    /// # Errors
    /// Returns a not-found error if no medicine has this id.
    fn get_medicine(&self, id: i64) -> Result<Medicine, Self::Error>;

    /// # Errors
    /// Returns error if storage operation fails.
    fn list_medicines(&self) -> Result<Vec<Medicine>, Self::Error>;

    /// Medicines whose current quantity is at or below their threshold.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn low_stock_medicines(&self) -> Result<Vec<Medicine>, Self::Error> {
        Ok(self
            .list_medicines()?
            .into_iter()
            .filter(Medicine::is_low_stock)
            .collect())
    }

    /// Overwrite the on-hand quantity of a medicine.
    ///
    /// # Errors
    /// Returns a not-found error if no medicine has this id, or an
    /// invalid-input error for a negative quantity.
    fn set_medicine_quantity(&self, id: i64, quantity: i64) -> Result<Medicine, Self::Error>;

    /// Record a purchase. `date` defaults to now.
    ///
    /// Does not change the medicine's quantity; see [`EntityStore::restock`].
    ///
    /// # Errors
    /// Returns a foreign-key error if the medicine does not exist.
    fn create_purchase(
        &self,
        medicine_id: i64,
        quantity_purchased: i64,
        date: Option<DateTime<Utc>>,
    ) -> Result<PurchaseHistory, Self::Error>;

    /// # Errors
    /// Returns a not-found error if no purchase has this id.
    fn get_purchase(&self, id: i64) -> Result<PurchaseHistory, Self::Error>;

    /// # Errors
    /// Returns error if storage operation fails.
    fn purchases_for_medicine(&self, medicine_id: i64)
        -> Result<Vec<PurchaseHistory>, Self::Error>;

    /// Record a purchase and add it to the medicine's quantity atomically.
    ///
    /// # Errors
    /// Returns a foreign-key error if the medicine does not exist.
    fn restock(
        &self,
        medicine_id: i64,
        quantity_purchased: i64,
    ) -> Result<(Medicine, PurchaseHistory), Self::Error>;
}
