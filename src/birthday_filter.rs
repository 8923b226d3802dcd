//! Picks the employees whose birthday is still ahead (or today) in the
//! current month.

use chrono::{Datelike, NaiveDate};
use log::debug;

use crate::portal_model::Employee;

/// Parses the `YYYY-MM-DD` birth dates returned by the employee query.
/// A trailing time part (`1990-03-10T00:00:00`) is ignored.
pub fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub fn is_birthday_today(employee: &Employee, today: NaiveDate) -> bool {
    parse_birth_date(&employee.data_nascimento)
        .map(|born| born.month() == today.month() && born.day() == today.day())
        .unwrap_or(false)
}

/// Employees born in `today`'s month on or after `today`'s day, ordered by
/// day of month. Birthdays already past this month and next month's
/// birthdays are left out. Rows with an unreadable birth date are skipped.
pub fn eligible_birthdays(employees: &[Employee], today: NaiveDate) -> Vec<Employee> {
    let mut upcoming: Vec<(u32, &Employee)> = employees
        .iter()
        .filter_map(|employee| match parse_birth_date(&employee.data_nascimento) {
            Some(born) => Some((born, employee)),
            None => {
                debug!("Skipping {}: unreadable birth date {:?}", employee.matricula, employee.data_nascimento);
                None
            }
        })
        .filter(|(born, _)| born.month() == today.month() && born.day() >= today.day())
        .map(|(born, employee)| (born.day(), employee))
        .collect();

    upcoming.sort_by_key(|(day, _)| *day);
    upcoming.into_iter().map(|(_, employee)| employee.clone()).collect()
}
