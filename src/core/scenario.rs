//! In-memory scenario registry and side-by-side comparison.
//!
//! A [`ScenarioStore`] is an ordinary value: construct one per session (or per
//! test) and pass it to whoever needs it. Every scenario owns its own copy of
//! the inputs, so editing one never leaks into another.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::coerce;
use super::engine::{project, project_tax_breakdown};
use super::error::ScenarioError;
use super::tax::TaxBreakdown;
use super::types::{
    Debt, EquityPayout, ExpenseCategory, FilingStatus, IncomeSource, RealEstateProperty,
    RetirementSettings, ScenarioData,
};

pub const BASE_SCENARIO_ID: &str = "base";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub data: ScenarioData,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPatch {
    pub name: Option<String>,
    pub incomes: Option<Vec<IncomeSource>>,
    pub expenses: Option<Vec<ExpenseCategory>>,
    pub equity_payouts: Option<Vec<EquityPayout>>,
    pub properties: Option<Vec<RealEstateProperty>>,
    pub debts: Option<Vec<Debt>>,
    #[serde(default, deserialize_with = "coerce::optional_number")]
    pub initial_wealth: Option<f64>,
    #[serde(default, deserialize_with = "coerce::optional_number")]
    pub investment_return: Option<f64>,
    #[serde(default, deserialize_with = "coerce::optional_whole")]
    pub projection_years: Option<u32>,
    pub state: Option<String>,
    pub filing_status: Option<FilingStatus>,
    pub retirement: Option<RetirementSettings>,
}

impl ScenarioPatch {
    fn apply(self, scenario: &mut Scenario) {
        let data = &mut scenario.data;
        if let Some(v) = self.name {
            scenario.name = v;
        }
        if let Some(v) = self.incomes {
            data.incomes = v;
        }
        if let Some(v) = self.expenses {
            data.expenses = v;
        }
        if let Some(v) = self.equity_payouts {
            data.equity_payouts = v;
        }
        if let Some(v) = self.properties {
            data.properties = v;
        }
        if let Some(v) = self.debts {
            data.debts = v;
        }
        if let Some(v) = self.initial_wealth {
            data.initial_wealth = v;
        }
        if let Some(v) = self.investment_return {
            data.investment_return = v;
        }
        if let Some(v) = self.projection_years {
            data.projection_years = v;
        }
        if let Some(v) = self.state {
            data.state = v;
        }
        if let Some(v) = self.filing_status {
            data.filing_status = v;
        }
        if let Some(v) = self.retirement {
            data.retirement = v;
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioStore {
    scenarios: BTreeMap<String, Scenario>,
    current_id: String,
}

impl Default for ScenarioStore {
    fn default() -> Self {
        Self::new(ScenarioData::default())
    }
}

impl ScenarioStore {
    pub fn new(base: ScenarioData) -> Self {
        let mut scenarios = BTreeMap::new();
        scenarios.insert(
            BASE_SCENARIO_ID.to_string(),
            Scenario {
                id: BASE_SCENARIO_ID.to_string(),
                name: "Base".to_string(),
                is_default: true,
                data: base,
            },
        );
        Self {
            scenarios,
            current_id: BASE_SCENARIO_ID.to_string(),
        }
    }

    pub fn list(&self) -> Vec<&Scenario> {
        self.scenarios.values().collect()
    }

    pub fn get(&self, id: &str) -> Result<&Scenario, ScenarioError> {
        self.scenarios
            .get(id)
            .ok_or_else(|| ScenarioError::NotFound(id.to_string()))
    }

    pub fn current(&self) -> &Scenario {
        // The current id always refers to a live scenario: deletes move it
        // back to base, and base cannot be deleted.
        &self.scenarios[&self.current_id]
    }

    pub fn current_id(&self) -> &str {
        &self.current_id
    }

    pub fn set_current(&mut self, id: &str) -> Result<&Scenario, ScenarioError> {
        if !self.scenarios.contains_key(id) {
            return Err(ScenarioError::NotFound(id.to_string()));
        }
        self.current_id = id.to_string();
        log::info!("active scenario is now '{id}'");
        Ok(self.current())
    }

    pub fn update(&mut self, id: &str, patch: ScenarioPatch) -> Result<&Scenario, ScenarioError> {
        let scenario = self
            .scenarios
            .get_mut(id)
            .ok_or_else(|| ScenarioError::NotFound(id.to_string()))?;
        patch.apply(scenario);
        Ok(&*scenario)
    }

    /// Branch a new scenario from a deep copy of `base_id`'s data.
    pub fn create(&mut self, name: &str, base_id: &str) -> Result<&Scenario, ScenarioError> {
        let data = self.get(base_id)?.data.clone();
        let id = uuid::Uuid::new_v4().to_string();
        log::info!("creating scenario '{name}' ({id}) from '{base_id}'");
        let scenario = Scenario {
            id: id.clone(),
            name: name.to_string(),
            is_default: false,
            data,
        };
        Ok(&*self.scenarios.entry(id).or_insert(scenario))
    }

    pub fn delete(&mut self, id: &str) -> Result<Scenario, ScenarioError> {
        let scenario = self.get(id)?;
        if scenario.is_default {
            return Err(ScenarioError::DefaultNotDeletable(id.to_string()));
        }
        let removed = self
            .scenarios
            .remove(id)
            .ok_or_else(|| ScenarioError::NotFound(id.to_string()))?;
        if self.current_id == id {
            self.current_id = BASE_SCENARIO_ID.to_string();
        }
        log::info!("deleted scenario '{id}'");
        Ok(removed)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub id: String,
    pub name: String,
    pub years: u32,
    pub final_wealth: f64,
    pub total_gross_income: f64,
    pub total_expenses: f64,
    pub taxes: TaxBreakdown,
    pub total_taxes: f64,
}

pub fn summarize(scenario: &Scenario) -> ScenarioSummary {
    let projection = project(&scenario.data);
    let mut taxes = TaxBreakdown::default();
    for year in project_tax_breakdown(&scenario.data) {
        taxes += year;
    }
    ScenarioSummary {
        id: scenario.id.clone(),
        name: scenario.name.clone(),
        years: scenario.data.projection_years,
        final_wealth: projection
            .last()
            .map(|y| y.cumulative_wealth)
            .unwrap_or(scenario.data.initial_wealth),
        total_gross_income: projection.iter().map(|y| y.gross_income).sum(),
        total_expenses: projection.iter().map(|y| y.total_expenses).sum(),
        total_taxes: taxes.total(),
        taxes,
    }
}

/// Summaries for every scenario in the store, base first.
pub fn compare_scenarios(store: &ScenarioStore) -> Vec<ScenarioSummary> {
    let mut summaries: Vec<ScenarioSummary> = store.list().into_iter().map(summarize).collect();
    summaries.sort_by_key(|s| s.id != BASE_SCENARIO_ID);
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Frequency, IncomeType};

    fn salary(amount: f64) -> IncomeSource {
        IncomeSource {
            id: "salary".to_string(),
            name: "Salary".to_string(),
            income_type: IncomeType::Salary,
            amount,
            frequency: Frequency::Annually,
            growth_rate: 0.0,
            tax_rate: 0.0,
            vesting_length: None,
            vesting_start_year: None,
        }
    }

    fn store() -> ScenarioStore {
        let base = ScenarioData {
            incomes: vec![salary(90_000.0)],
            projection_years: 5,
            ..ScenarioData::default()
        };
        ScenarioStore::new(base)
    }

    #[test]
    fn new_store_starts_on_base() {
        let store = store();
        assert_eq!(store.current().id, BASE_SCENARIO_ID);
        assert!(store.current().is_default);
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn created_scenario_copies_base_and_stays_isolated() {
        let mut store = store();
        let branch_id = store.create("Raise", BASE_SCENARIO_ID).expect("create").id.clone();
        let captured_base = store.get(BASE_SCENARIO_ID).expect("base").data.clone();

        store
            .update(
                &branch_id,
                ScenarioPatch {
                    incomes: Some(vec![salary(150_000.0)]),
                    ..ScenarioPatch::default()
                },
            )
            .expect("update");

        assert_eq!(store.get(BASE_SCENARIO_ID).expect("base").data, captured_base);
        assert_eq!(store.get(&branch_id).expect("branch").data.incomes[0].amount, 150_000.0);
        assert!(!store.get(&branch_id).expect("branch").is_default);
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut store = store();
        let updated = store
            .update(
                BASE_SCENARIO_ID,
                ScenarioPatch {
                    name: Some("Renamed".to_string()),
                    investment_return: Some(4.0),
                    ..ScenarioPatch::default()
                },
            )
            .expect("update");
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.data.investment_return, 4.0);
        assert_eq!(updated.data.projection_years, 5);
        assert_eq!(updated.data.incomes.len(), 1);
    }

    #[test]
    fn patch_coerces_numeric_fields_like_scenario_input() {
        let patch: ScenarioPatch = serde_json::from_str(
            r#"{"initialWealth": "abc", "projectionYears": "10", "investmentReturn": " 5.5 "}"#,
        )
        .expect("patch json should parse");
        assert_eq!(patch.initial_wealth, Some(0.0));
        assert_eq!(patch.projection_years, Some(10));
        assert_eq!(patch.investment_return, Some(5.5));
        assert!(patch.name.is_none());

        let mut store = store();
        let updated = store.update(BASE_SCENARIO_ID, patch).expect("update");
        assert_eq!(updated.data.projection_years, 10);
        assert_eq!(updated.data.initial_wealth, 0.0);
    }

    #[test]
    fn base_cannot_be_deleted() {
        let mut store = store();
        assert_eq!(
            store.delete(BASE_SCENARIO_ID),
            Err(ScenarioError::DefaultNotDeletable(BASE_SCENARIO_ID.to_string()))
        );
    }

    #[test]
    fn deleting_current_falls_back_to_base() {
        let mut store = store();
        let id = store.create("Temp", BASE_SCENARIO_ID).expect("create").id.clone();
        store.set_current(&id).expect("switch");
        assert_eq!(store.current_id(), id);

        store.delete(&id).expect("delete");
        assert_eq!(store.current_id(), BASE_SCENARIO_ID);
        assert_eq!(store.get(&id), Err(ScenarioError::NotFound(id.clone())));
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut store = store();
        assert!(matches!(store.set_current("nope"), Err(ScenarioError::NotFound(_))));
        assert!(matches!(
            store.create("x", "nope"),
            Err(ScenarioError::NotFound(_))
        ));
        assert!(matches!(
            store.update("nope", ScenarioPatch::default()),
            Err(ScenarioError::NotFound(_))
        ));
    }

    #[test]
    fn comparison_lists_base_first_with_split_taxes() {
        let mut store = store();
        let id = store.create("Texas move", BASE_SCENARIO_ID).expect("create").id.clone();
        store
            .update(
                &id,
                ScenarioPatch {
                    state: Some("Texas".to_string()),
                    ..ScenarioPatch::default()
                },
            )
            .expect("update");

        let summaries = compare_scenarios(&store);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, BASE_SCENARIO_ID);
        let texas = &summaries[1];
        assert_eq!(texas.taxes.state, 0.0);
        assert!(summaries[0].taxes.state > 0.0);
        assert!(texas.final_wealth > summaries[0].final_wealth);
        assert!((texas.total_taxes - texas.taxes.federal).abs() < 1e-9);
    }
}
