//! Client-side form validation.
//!
//! Runs before any request is made; the resulting messages are keyed per
//! field and never sent to the server.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{NewTask, Registration};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_AGE: u32 = 18;

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Names,
    Lastnames,
    Age,
    Email,
    Password,
    Title,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Names => "names",
            Field::Lastnames => "lastnames",
            Field::Age => "age",
            Field::Email => "email",
            Field::Password => "password",
            Field::Title => "title",
        }
    }
}

/// First failing rule per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, &'static str>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }

    fn add(&mut self, field: Field, message: &'static str) {
        self.0.entry(field).or_insert(message);
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {message}", field.name())?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

fn check_email(errors: &mut FieldErrors, email: &str) {
    let valid = EMAIL_RE
        .as_ref()
        .is_some_and(|re| re.is_match(email.trim()));
    if !valid {
        errors.add(Field::Email, "Invalid email format");
    }
}

fn check_password(errors: &mut FieldErrors, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(Field::Password, "Password must be at least 8 characters");
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        errors.add(
            Field::Password,
            "Password must include at least one letter and one number",
        );
    }
}

/// Validates the login form.
///
/// # Errors
/// Returns the per-field messages when any rule fails.
pub fn validate_login(email: &str, password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    check_email(&mut errors, email);
    check_password(&mut errors, password);
    errors.into_result()
}

/// Validates the registration form.
///
/// # Errors
/// Returns the per-field messages when any rule fails.
pub fn validate_registration(data: &Registration) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if data.names.trim().is_empty() {
        errors.add(Field::Names, "Name is required");
    }
    if data.lastnames.trim().is_empty() {
        errors.add(Field::Lastnames, "Last name is required");
    }
    if data.age < MIN_AGE {
        errors.add(Field::Age, "Must be at least 18 years old");
    }
    check_email(&mut errors, &data.email);
    check_password(&mut errors, &data.password);
    errors.into_result()
}

/// Validates a task title.
///
/// # Errors
/// Returns the title error when the title is blank.
pub fn validate_title(title: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if title.trim().is_empty() {
        errors.add(Field::Title, "Title is required");
    }
    errors.into_result()
}

/// Validates a new task.
///
/// # Errors
/// Returns the title error when the title is blank.
pub fn validate_new_task(task: &NewTask) -> Result<(), FieldErrors> {
    validate_title(&task.title)
}
