use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::terms::{BondTerms, GraceKind};
use crate::error::BondCashFlowError;
use crate::types::{FlowDirection, Money, Rate};
use crate::BondCashFlowResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What happens to the balance in a given period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodPhase {
    /// Period 0: net proceeds received
    Issuance,
    /// Interest capitalizes, nothing is paid
    FullGrace,
    /// Interest only is paid
    PartialGrace,
    /// Constant installment, principal reduces
    Amortizing,
}

/// One ledger row. Amounts carry the sign given by `direction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub period: u32,
    pub date: NaiveDate,
    /// Net proceeds at period 0, installment paid afterwards
    pub installment: Money,
    pub interest: Money,
    pub amortization: Money,
    /// Outstanding principal after this period
    pub balance: Money,
    pub direction: FlowDirection,
    pub phase: PeriodPhase,
}

/// Totals over periods 1..n, as non-negative magnitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_installments: Money,
    pub total_interest: Money,
    pub total_amortization: Money,
    /// Interest added to the balance during full grace
    pub capitalized_interest: Money,
}

/// Inputs to the generator that are derived from the terms.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleParams {
    pub rate: Rate,
    pub installment: Money,
    pub periods: u32,
    pub balance_floor: Money,
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Build the full schedule: an issuance row followed by `periods` payment
/// rows. The running balance is threaded through a fold, never shared.
pub fn generate_schedule(
    terms: &BondTerms,
    params: &ScheduleParams,
) -> BondCashFlowResult<Vec<ScheduleRow>> {
    let grace = terms.effective_grace_periods();

    let issuance = ScheduleRow {
        period: 0,
        date: terms.issue_date,
        installment: FlowDirection::Inflow.signed(terms.net_proceeds()),
        interest: Decimal::ZERO,
        amortization: Decimal::ZERO,
        balance: terms.nominal_value,
        direction: FlowDirection::Inflow,
        phase: PeriodPhase::Issuance,
    };

    let mut rows = Vec::with_capacity(params.periods as usize + 1);
    rows.push(issuance);

    let (rows, _) = (1..=params.periods).try_fold(
        (rows, terms.nominal_value),
        |(mut rows, balance), period| -> BondCashFlowResult<_> {
            let phase = phase_for(period, grace, terms.grace_kind);
            let date = terms.period_date(period)?;
            let (row, next_balance) = payment_row(period, date, balance, phase, params)?;
            rows.push(row);
            Ok((rows, next_balance))
        },
    )?;

    Ok(rows)
}

fn phase_for(period: u32, grace: u32, kind: GraceKind) -> PeriodPhase {
    if period > grace {
        return PeriodPhase::Amortizing;
    }
    match kind {
        GraceKind::Full => PeriodPhase::FullGrace,
        GraceKind::Partial => PeriodPhase::PartialGrace,
        GraceKind::None => PeriodPhase::Amortizing,
    }
}

/// One payment period: returns the row and the balance carried forward.
fn payment_row(
    period: u32,
    date: NaiveDate,
    balance: Money,
    phase: PeriodPhase,
    params: &ScheduleParams,
) -> BondCashFlowResult<(ScheduleRow, Money)> {
    let interest = balance
        .checked_mul(params.rate)
        .ok_or_else(|| BondCashFlowError::overflow("period interest"))?;

    let (paid, amortization, mut next_balance) = match phase {
        PeriodPhase::FullGrace => {
            let capitalized = balance
                .checked_add(interest)
                .ok_or_else(|| BondCashFlowError::overflow("capitalized balance"))?;
            (Decimal::ZERO, Decimal::ZERO, capitalized)
        }
        PeriodPhase::PartialGrace => (interest, Decimal::ZERO, balance),
        PeriodPhase::Amortizing | PeriodPhase::Issuance => {
            let amortization = params.installment - interest;
            let remaining = balance
                .checked_sub(amortization)
                .ok_or_else(|| BondCashFlowError::overflow("outstanding balance"))?;
            (params.installment, amortization, remaining)
        }
    };

    if next_balance < params.balance_floor {
        next_balance = Decimal::ZERO;
    }

    let out = FlowDirection::Outflow;
    let row = ScheduleRow {
        period,
        date,
        installment: out.signed(paid),
        interest: out.signed(interest),
        amortization: out.signed(amortization),
        balance: next_balance,
        direction: out,
        phase,
    };
    Ok((row, next_balance))
}

/// Sum the payment rows of a schedule.
pub fn summarize_schedule(rows: &[ScheduleRow]) -> BondCashFlowResult<ScheduleSummary> {
    let add = |total: Money, amount: Money| {
        total
            .checked_add(amount.abs())
            .ok_or_else(|| BondCashFlowError::overflow("schedule totals"))
    };

    let mut summary = ScheduleSummary {
        total_installments: Decimal::ZERO,
        total_interest: Decimal::ZERO,
        total_amortization: Decimal::ZERO,
        capitalized_interest: Decimal::ZERO,
    };
    for row in rows.iter().filter(|r| r.direction == FlowDirection::Outflow) {
        summary.total_installments = add(summary.total_installments, row.installment)?;
        summary.total_amortization = add(summary.total_amortization, row.amortization)?;
        if row.phase == PeriodPhase::FullGrace {
            summary.capitalized_interest = add(summary.capitalized_interest, row.interest)?;
        } else {
            summary.total_interest = add(summary.total_interest, row.interest)?;
        }
    }
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
