//! Report aggregation over the transaction ledger.
//!
//! Scans a user's transactions in a date window and produces the overview
//! figures the reports page renders: income and expense totals, net
//! savings, and the single largest expense. This path favors availability
//! over error visibility: any internal failure is logged and degrades to
//! the all-zero structure so the UI renders a "no data" state instead of
//! crashing the report view.

use rusqlite::{Connection, named_params};
use serde::Serialize;
use time::{Date, Month};

use crate::{
    Error,
    database_id::OwnerId,
    options::resolve_category,
    transaction::TransactionKind,
};

/// An inclusive date window for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// The first date included in the report.
    pub from: Date,
    /// The last date included in the report.
    pub to: Date,
}

/// The preset windows offered by the reports page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePeriod {
    /// From the first of the current month through today.
    MonthToDate,
    /// From the first of January through today.
    YearToDate,
    /// Every transaction ever recorded.
    All,
}

impl TimePeriod {
    /// The date range this period covers, given today's date.
    pub fn date_range(self, today: Date) -> DateRange {
        match self {
            TimePeriod::MonthToDate => DateRange {
                from: today.replace_day(1).unwrap(),
                to: today,
            },
            TimePeriod::YearToDate => DateRange {
                from: Date::from_calendar_date(today.year(), Month::January, 1).unwrap(),
                to: today,
            },
            TimePeriod::All => DateRange {
                from: Date::MIN,
                to: Date::MAX,
            },
        }
    }
}

/// The single biggest expense in a report window.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LargestExpense {
    /// The display name of the expense's category, or an empty string if
    /// the category no longer exists or there were no expenses.
    pub name: String,
    /// The expense's amount.
    pub amount: f64,
}

/// The overview figures for a report window.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FinancialOverview {
    /// The sum of income amounts in the window.
    pub total_income: f64,
    /// The sum of expense amounts in the window.
    pub total_expense: f64,
    /// `total_income - total_expense`, computed once after the scan.
    pub net_savings: f64,
    /// The single biggest expense in the window.
    pub largest_expense: LargestExpense,
}

/// The current month's totals for the dashboard stat cards.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MonthlyTotals {
    /// The month's income so far.
    pub income: f64,
    /// The month's expenses so far.
    pub expense: f64,
    /// `income - expense` for the month.
    pub balance: f64,
}

/// Compute the overview figures for `owner_id`'s transactions in `range`.
///
/// Never fails: an empty window and an internal error both produce the
/// all-zero structure. Swallowing errors here hides real failures behind a
/// "no data" rendering, which is a deliberate tradeoff in this path; the
/// error is still logged.
pub fn compute_overview(
    owner_id: OwnerId,
    range: DateRange,
    connection: &Connection,
) -> FinancialOverview {
    match try_compute_overview(owner_id, range, connection) {
        Ok(overview) => overview,
        Err(error) => {
            tracing::error!("could not compute the financial overview: {error}");
            FinancialOverview::default()
        }
    }
}

fn try_compute_overview(
    owner_id: OwnerId,
    range: DateRange,
    connection: &Connection,
) -> Result<FinancialOverview, Error> {
    let mut overview = FinancialOverview::default();

    let mut statement = connection.prepare(
        "SELECT kind, amount, category_id FROM \"transaction\"
         WHERE owner_id = :owner_id AND date BETWEEN :from AND :to",
    )?;
    let mut rows = statement.query(named_params! {
        ":owner_id": owner_id,
        ":from": range.from,
        ":to": range.to,
    })?;

    while let Some(row) = rows.next()? {
        let kind: TransactionKind = row.get(0)?;
        let amount: f64 = row.get(1)?;

        match kind {
            TransactionKind::Income => overview.total_income += amount,
            TransactionKind::Expense => {
                overview.total_expense += amount;

                // Strictly greater, so the first expense seen wins a tie.
                // The category is resolved only when a new maximum is found,
                // not once per transaction.
                if amount > overview.largest_expense.amount {
                    let category_id = row.get(2)?;
                    let name = resolve_category(category_id, owner_id, connection)?
                        .map(|option| option.label)
                        .unwrap_or_default();

                    overview.largest_expense = LargestExpense { name, amount };
                }
            }
        }
    }

    overview.net_savings = overview.total_income - overview.total_expense;

    Ok(overview)
}

/// Compute the totals for the calendar month containing `today`, for the
/// dashboard stat cards.
///
/// Same swallow-to-zero policy as [compute_overview].
pub fn monthly_totals(
    owner_id: OwnerId,
    today: Date,
    connection: &Connection,
) -> MonthlyTotals {
    let last_day = today.month().length(today.year());
    let range = DateRange {
        from: today.replace_day(1).unwrap(),
        to: today.replace_day(last_day).unwrap(),
    };

    let overview = compute_overview(owner_id, range, connection);

    MonthlyTotals {
        income: overview.total_income,
        expense: overview.total_expense,
        balance: overview.net_savings,
    }
}
