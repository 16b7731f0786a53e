use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BondCashFlowError;
use crate::types::Money;
use crate::BondCashFlowResult;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// How the stated annual rate is quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    /// Annual rate divided evenly across periods
    Nominal,
    /// Annual rate compounded across periods
    #[serde(alias = "efectiva")]
    Effective,
}

/// Installment frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    #[serde(alias = "mensual")]
    Monthly,
    #[serde(alias = "bimestral")]
    Bimonthly,
    #[serde(alias = "trimestral")]
    Quarterly,
    #[serde(alias = "semestral")]
    Semiannual,
    #[serde(alias = "anual")]
    Annual,
}

impl PaymentFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::Bimonthly => 6,
            PaymentFrequency::Quarterly => 4,
            PaymentFrequency::Semiannual => 2,
            PaymentFrequency::Annual => 1,
        }
    }

    pub fn months_per_period(self) -> u32 {
        12 / self.periods_per_year()
    }
}

/// Grace-period treatment for the first periods of the schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraceKind {
    #[default]
    #[serde(alias = "ninguno")]
    None,
    /// Nothing is paid; interest capitalizes onto the balance
    #[serde(alias = "total")]
    Full,
    /// Only interest is paid; the balance is unchanged
    #[serde(alias = "parcial")]
    Partial,
}

// ---------------------------------------------------------------------------
// Bond terms
// ---------------------------------------------------------------------------

/// Contractual terms of a bond. Field aliases accept the host
/// application's stored records as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondTerms {
    /// Identifier of the bond record, echoed into the result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Face value raised by the issuer
    #[serde(alias = "valorNominal")]
    pub nominal_value: Money,
    #[serde(alias = "fechaEmision")]
    pub issue_date: NaiveDate,
    #[serde(alias = "fechaVencimiento")]
    pub maturity_date: NaiveDate,
    /// Annual interest rate in percentage units (12 = 12%)
    #[serde(alias = "tasaInteres")]
    pub annual_rate: Decimal,
    #[serde(alias = "tipoTasa")]
    pub rate_type: RateType,
    #[serde(alias = "frecuenciaPago")]
    pub frequency: PaymentFrequency,
    /// Issuance fee deducted from the proceeds
    #[serde(default, alias = "comisiones")]
    pub fee: Money,
    /// Issuance expenses deducted from the proceeds
    #[serde(default, alias = "gastos")]
    pub expense: Money,
    #[serde(default, alias = "periodoGracia")]
    pub grace_kind: GraceKind,
    /// Number of grace periods (installments, not months)
    #[serde(default, alias = "duracionPeriodoGracia")]
    pub grace_periods: u32,
}

impl BondTerms {
    /// Cash actually received at issuance.
    pub fn net_proceeds(&self) -> Money {
        self.nominal_value - self.fee - self.expense
    }

    /// Grace periods that take effect (zero when no grace applies).
    pub fn effective_grace_periods(&self) -> u32 {
        match self.grace_kind {
            GraceKind::None => 0,
            GraceKind::Full | GraceKind::Partial => self.grace_periods,
        }
    }

    /// Calendar months from issue to maturity, counting a trailing partial
    /// month as a whole one.
    pub fn total_months(&self) -> BondCashFlowResult<u32> {
        let start = self.issue_date;
        let end = self.maturity_date;
        if end <= start {
            return Ok(0);
        }

        let raw = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
        let mut whole = raw.max(0) as u32;
        while whole > 0 && add_months(start, whole)? > end {
            whole -= 1;
        }

        if add_months(start, whole)? < end {
            Ok(whole + 1)
        } else {
            Ok(whole)
        }
    }

    /// ceil(total months / months per period)
    pub fn number_of_installments(&self) -> BondCashFlowResult<u32> {
        let months = self.total_months()?;
        Ok(months.div_ceil(self.frequency.months_per_period()))
    }

    /// Date of installment `period` (period 0 is the issue date).
    pub fn period_date(&self, period: u32) -> BondCashFlowResult<NaiveDate> {
        add_months(self.issue_date, period * self.frequency.months_per_period())
    }

    /// Check every contractual invariant. Returns the installment count so
    /// callers do not recompute it.
    pub fn validate(&self) -> BondCashFlowResult<u32> {
        if self.nominal_value <= Decimal::ZERO {
            return Err(BondCashFlowError::invalid(
                "nominal_value",
                "Nominal value must be positive",
            ));
        }
        if self.maturity_date <= self.issue_date {
            return Err(BondCashFlowError::invalid(
                "maturity_date",
                "Maturity date must be after the issue date",
            ));
        }
        if self.annual_rate <= Decimal::ZERO {
            return Err(BondCashFlowError::invalid(
                "annual_rate",
                "Interest rate must be positive",
            ));
        }
        if self.fee < Decimal::ZERO {
            return Err(BondCashFlowError::invalid("fee", "Fee cannot be negative"));
        }
        if self.expense < Decimal::ZERO {
            return Err(BondCashFlowError::invalid(
                "expense",
                "Expense cannot be negative",
            ));
        }
        let costs = self.fee.checked_add(self.expense);
        if costs.map_or(true, |c| c >= self.nominal_value) {
            return Err(BondCashFlowError::invalid(
                "fee",
                "Fee plus expense must be less than the nominal value",
            ));
        }
        if self.grace_kind != GraceKind::None && self.grace_periods == 0 {
            return Err(BondCashFlowError::invalid(
                "grace_periods",
                "Grace duration must be positive when a grace period applies",
            ));
        }

        let installments = self.number_of_installments()?;
        let grace = self.effective_grace_periods();
        if grace >= installments {
            return Err(BondCashFlowError::invalid(
                "grace_periods",
                format!(
                    "Grace duration ({grace}) must be less than the number of installments ({installments})"
                ),
            ));
        }

        Ok(installments)
    }
}

fn add_months(date: NaiveDate, months: u32) -> BondCashFlowResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| BondCashFlowError::DateError(format!("{date} + {months} months is out of range")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
