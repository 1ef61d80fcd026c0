use serde::{Deserialize, Serialize};

use super::amortization::monthly_payment;
use super::coerce;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeType {
    Salary,
    Freelance,
    Investment,
    Equity,
    Other,
    Bonus,
    Rsu,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    #[default]
    #[serde(alias = "annual", alias = "yearly")]
    Annually,
}

impl Frequency {
    pub fn annualize(self, amount: f64) -> f64 {
        match self {
            Frequency::Monthly => amount * 12.0,
            Frequency::Annually => amount,
        }
    }
}

/// Federal filing status. Unrecognised strings fall back to `Single`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "String")]
pub enum FilingStatus {
    #[default]
    Single,
    MarriedFilingJointly,
    MarriedFilingSeparately,
    HeadOfHousehold,
}

impl FilingStatus {
    pub fn parse_lenient(raw: &str) -> Self {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "marriedfilingjointly" | "mfj" | "married" => FilingStatus::MarriedFilingJointly,
            "marriedfilingseparately" | "mfs" => FilingStatus::MarriedFilingSeparately,
            "headofhousehold" | "hoh" => FilingStatus::HeadOfHousehold,
            _ => FilingStatus::Single,
        }
    }
}

impl From<String> for FilingStatus {
    fn from(value: String) -> Self {
        FilingStatus::parse_lenient(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSource {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub income_type: IncomeType,
    #[serde(default, deserialize_with = "coerce::number")]
    pub amount: f64,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default, deserialize_with = "coerce::number")]
    pub growth_rate: f64,
    /// Advisory only; the tax engine recomputes tax from brackets.
    #[serde(default, deserialize_with = "coerce::number")]
    pub tax_rate: f64,
    #[serde(default, deserialize_with = "coerce::optional_whole")]
    pub vesting_length: Option<u32>,
    #[serde(default, deserialize_with = "coerce::optional_whole")]
    pub vesting_start_year: Option<u32>,
}

impl IncomeSource {
    /// Income realised from this source in a 1-based projection year.
    ///
    /// RSU grants pay `amount / vesting_length` inside the vesting window and
    /// nothing outside it; every other type compounds its annualised amount
    /// by `growth_rate`.
    pub fn amount_for_year(&self, year: u32) -> f64 {
        match self.income_type {
            IncomeType::Rsu => {
                let length = self.vesting_length.unwrap_or(0);
                let start = self.vesting_start_year.unwrap_or(1);
                if length == 0 || year < start || year >= start + length {
                    0.0
                } else {
                    self.amount / length as f64
                }
            }
            IncomeType::Salary
            | IncomeType::Freelance
            | IncomeType::Investment
            | IncomeType::Equity
            | IncomeType::Other
            | IncomeType::Bonus => {
                grown(self.frequency.annualize(self.amount), self.growth_rate, year)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategory {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "coerce::number")]
    pub amount: f64,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default, deserialize_with = "coerce::number")]
    pub growth_rate: f64,
    /// Display hint. Callers zero `growth_rate` for fixed items; the engine
    /// does not read this flag.
    #[serde(default)]
    pub is_fixed: bool,
}

impl ExpenseCategory {
    pub fn amount_for_year(&self, year: u32) -> f64 {
        grown(self.frequency.annualize(self.amount), self.growth_rate, year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPayout {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "coerce::number")]
    pub amount: f64,
    #[serde(default, deserialize_with = "coerce::whole")]
    pub year: u32,
    /// Informational; payouts are taxed as `equity` income.
    #[serde(default, deserialize_with = "coerce::number")]
    pub tax_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealEstateProperty {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "coerce::number")]
    pub purchase_price: f64,
    #[serde(default, deserialize_with = "coerce::number")]
    pub down_payment: f64,
    #[serde(default, deserialize_with = "coerce::number")]
    pub loan_amount: f64,
    #[serde(default, deserialize_with = "coerce::number")]
    pub interest_rate: f64,
    #[serde(default, deserialize_with = "coerce::number")]
    pub loan_term_years: f64,
    #[serde(default, deserialize_with = "coerce::whole")]
    pub purchase_year: u32,
    #[serde(default, deserialize_with = "coerce::number")]
    pub appreciation_rate: f64,
    #[serde(default, deserialize_with = "coerce::number")]
    pub maintenance_rate: f64,
    #[serde(default, deserialize_with = "coerce::number")]
    pub property_tax_rate: f64,
}

impl RealEstateProperty {
    pub fn is_owned_in(&self, year: u32) -> bool {
        year >= self.purchase_year
    }

    pub fn years_owned(&self, year: u32) -> u32 {
        if self.is_owned_in(year) {
            year - self.purchase_year + 1
        } else {
            0
        }
    }

    pub fn monthly_mortgage_payment(&self) -> f64 {
        monthly_payment(self.loan_amount, self.interest_rate, self.loan_term_years)
    }
}

/// A debt whose `minimum_payment` is always the amortized payment implied by
/// its balance, APR and term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "DebtRecord")]
pub struct Debt {
    pub id: String,
    pub name: String,
    pub balance: f64,
    pub apr: f64,
    pub minimum_payment: f64,
    pub loan_term_years: f64,
}

impl Debt {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        balance: f64,
        apr: f64,
        loan_term_years: f64,
    ) -> Self {
        let mut debt = Self {
            id: id.into(),
            name: name.into(),
            balance,
            apr,
            minimum_payment: 0.0,
            loan_term_years,
        };
        debt.recompute_minimum_payment();
        debt
    }

    pub fn recompute_minimum_payment(&mut self) {
        self.minimum_payment = if self.loan_term_years <= 0.0 {
            0.0
        } else {
            monthly_payment(self.balance, self.apr, self.loan_term_years)
        };
    }

    pub fn set_balance(&mut self, balance: f64) {
        self.balance = balance;
        self.recompute_minimum_payment();
    }

    pub fn set_apr(&mut self, apr: f64) {
        self.apr = apr;
        self.recompute_minimum_payment();
    }

    pub fn set_loan_term_years(&mut self, years: f64) {
        self.loan_term_years = years;
        self.recompute_minimum_payment();
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebtRecord {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "coerce::number")]
    balance: f64,
    #[serde(default, deserialize_with = "coerce::number")]
    apr: f64,
    #[serde(default, deserialize_with = "coerce::number")]
    loan_term_years: f64,
}

impl From<DebtRecord> for Debt {
    fn from(record: DebtRecord) -> Self {
        Debt::new(
            record.id,
            record.name,
            record.balance,
            record.apr,
            record.loan_term_years,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_retirement_age", deserialize_with = "coerce::whole")]
    pub retirement_age: u32,
    #[serde(default = "default_withdrawal_rate", deserialize_with = "coerce::number")]
    pub withdrawal_rate: f64,
}

fn default_retirement_age() -> u32 {
    65
}

fn default_withdrawal_rate() -> f64 {
    4.0
}

impl Default for RetirementSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            retirement_age: default_retirement_age(),
            withdrawal_rate: default_withdrawal_rate(),
        }
    }
}

/// The full input set of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioData {
    #[serde(default)]
    pub incomes: Vec<IncomeSource>,
    #[serde(default)]
    pub expenses: Vec<ExpenseCategory>,
    #[serde(default)]
    pub equity_payouts: Vec<EquityPayout>,
    #[serde(default)]
    pub properties: Vec<RealEstateProperty>,
    #[serde(default)]
    pub debts: Vec<Debt>,
    #[serde(default, deserialize_with = "coerce::number")]
    pub initial_wealth: f64,
    #[serde(default = "default_investment_return", deserialize_with = "coerce::number")]
    pub investment_return: f64,
    #[serde(default = "default_projection_years", deserialize_with = "coerce::whole")]
    pub projection_years: u32,
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default)]
    pub filing_status: FilingStatus,
    #[serde(default)]
    pub retirement: RetirementSettings,
}

fn default_investment_return() -> f64 {
    7.0
}

fn default_projection_years() -> u32 {
    30
}

fn default_state() -> String {
    "California".to_string()
}

impl Default for ScenarioData {
    fn default() -> Self {
        Self {
            incomes: Vec::new(),
            expenses: Vec::new(),
            equity_payouts: Vec::new(),
            properties: Vec::new(),
            debts: Vec::new(),
            initial_wealth: 0.0,
            investment_return: default_investment_return(),
            projection_years: default_projection_years(),
            state: default_state(),
            filing_status: FilingStatus::Single,
            retirement: RetirementSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WealthProjection {
    pub year: u32,
    pub gross_income: f64,
    pub net_income: f64,
    pub total_expenses: f64,
    pub savings: f64,
    pub cumulative_wealth: f64,
    pub taxes: f64,
    pub real_estate_value: f64,
    pub real_estate_equity: f64,
    pub loan_balance: f64,
}

fn grown(annual: f64, growth_rate: f64, year: u32) -> f64 {
    let exponent = year.saturating_sub(1) as i32;
    annual * (1.0 + growth_rate / 100.0).powi(exponent)
}
