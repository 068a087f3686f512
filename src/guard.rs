// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Pure pre-flight checks run before any write leaves the client.
//!
//! These are advisory: they save a round-trip when the answer is already
//! known from cached data. The server's verdict always wins.

use crate::error::ValidationError;
use crate::models::{
    Aggregate, NewGoal, PasswordChange, ProfileUpdate, Registration, TransactionType,
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,18}[0-9]$").expect("valid phone regex"));

pub const MIN_PASSWORD_LEN: usize = 6;

/// Balance gate for a new transaction of `op` type against the last-known
/// aggregate.
pub fn validate(
    op: TransactionType,
    amount: Decimal,
    aggregate: Option<&Aggregate>,
) -> Result<(), ValidationError> {
    if !op.draws_balance() {
        return Ok(());
    }
    let aggregate = aggregate.ok_or(ValidationError::MissingAggregate)?;
    if amount > aggregate.net_balance {
        return Err(ValidationError::InsufficientBalance {
            requested: amount,
            available: aggregate.net_balance,
        });
    }
    Ok(())
}

pub fn check_amount(amount: Decimal) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount);
    }
    Ok(())
}

/// A saving is released back into the balance on or after its usage date.
pub fn check_maturity(usage_date: Option<NaiveDate>, today: NaiveDate) -> Result<(), ValidationError> {
    match usage_date {
        Some(usage_date) if usage_date > today => Err(ValidationError::NotMatured { usage_date }),
        _ => Ok(()),
    }
}

/// New savings need a usage date that is not already behind us.
pub fn check_usage_date(usage_date: Option<NaiveDate>, today: NaiveDate) -> Result<(), ValidationError> {
    match usage_date {
        None => Err(ValidationError::field("usage date", "required for savings")),
        Some(d) if d < today => Err(ValidationError::UsageDateInPast(d)),
        Some(_) => Ok(()),
    }
}

pub fn check_goal(goal: &NewGoal) -> Result<(), ValidationError> {
    if goal.category_name.trim().is_empty() {
        return Err(ValidationError::field("category", "required"));
    }
    check_amount(goal.limit_amount)?;
    if goal.starting_date > goal.ending_date {
        return Err(ValidationError::field(
            "ending date",
            format!("{} is before {}", goal.ending_date, goal.starting_date),
        ));
    }
    Ok(())
}

pub fn check_email(email: &str) -> Result<(), ValidationError> {
    if !EMAIL.is_match(email.trim()) {
        return Err(ValidationError::field("email", format!("'{}' is not an email address", email)));
    }
    Ok(())
}

pub fn check_phone(phone: &str) -> Result<(), ValidationError> {
    if !PHONE.is_match(phone.trim()) {
        return Err(ValidationError::field("phone number", format!("'{}' is not a phone number", phone)));
    }
    Ok(())
}

pub fn check_profile_update(update: &ProfileUpdate) -> Result<(), ValidationError> {
    if update.is_empty() {
        return Err(ValidationError::field("profile", "nothing to update"));
    }
    if let Some(username) = &update.username {
        if username.trim().is_empty() {
            return Err(ValidationError::field("username", "must not be blank"));
        }
    }
    if let Some(email) = &update.email {
        check_email(email)?;
    }
    if let Some(phone) = &update.phone_number {
        check_phone(phone)?;
    }
    Ok(())
}

pub fn check_password_change(change: &PasswordChange) -> Result<(), ValidationError> {
    if change.current_password.is_empty() {
        return Err(ValidationError::field("current password", "required"));
    }
    if change.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::field(
            "new password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if change.new_password == change.current_password {
        return Err(ValidationError::field("new password", "must differ from the current one"));
    }
    Ok(())
}

pub fn check_registration(r: &Registration) -> Result<(), ValidationError> {
    if r.username.trim().is_empty() {
        return Err(ValidationError::field("username", "required"));
    }
    check_email(&r.email)?;
    if r.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::field(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if r.password != r.confirm_password {
        return Err(ValidationError::field("confirm password", "passwords must match"));
    }
    if r.phone_number.trim().is_empty() {
        return Err(ValidationError::field("phone number", "required"));
    }
    Ok(())
}
