use serde::{Deserialize, Serialize};

use super::coerce;
use super::types::WealthProjection;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GoalMetric {
    #[default]
    NetWorth,
    RealEstateEquity,
    AnnualSavings,
}

impl GoalMetric {
    fn read(self, year: &WealthProjection) -> f64 {
        match self {
            GoalMetric::NetWorth => year.cumulative_wealth,
            GoalMetric::RealEstateEquity => year.real_estate_equity,
            GoalMetric::AnnualSavings => year.savings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "coerce::number")]
    pub target_amount: f64,
    #[serde(default, deserialize_with = "coerce::optional_whole")]
    pub target_year: Option<u32>,
    #[serde(default)]
    pub metric: GoalMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub goal_id: String,
    pub achieved: bool,
    /// First projection year in which the metric reached the target.
    pub achieved_year: Option<u32>,
    pub on_track: bool,
    /// Metric at the target year (or the final year), as a percent of target,
    /// capped at 100.
    pub progress_pct: f64,
    pub shortfall: f64,
}

/// Checks a fixed set of goals against projections.
#[derive(Debug, Clone, Default)]
pub struct GoalTracker {
    goals: Vec<Goal>,
}

impl GoalTracker {
    pub fn new(goals: Vec<Goal>) -> Self {
        Self { goals }
    }

    pub fn evaluate(&self, projection: &[WealthProjection]) -> Vec<GoalProgress> {
        self.goals
            .iter()
            .map(|goal| evaluate_goal(goal, projection))
            .collect()
    }
}

fn evaluate_goal(goal: &Goal, projection: &[WealthProjection]) -> GoalProgress {
    let achieved_year = projection
        .iter()
        .find(|y| goal.metric.read(y) >= goal.target_amount)
        .map(|y| y.year);

    let checkpoint = match goal.target_year {
        Some(target) => projection
            .iter()
            .take_while(|y| y.year <= target)
            .last(),
        None => projection.last(),
    };
    let value_at_checkpoint = checkpoint.map(|y| goal.metric.read(y)).unwrap_or(0.0);

    let on_track = match (achieved_year, goal.target_year) {
        (Some(year), Some(target)) => year <= target,
        (Some(_), None) => true,
        (None, _) => false,
    };

    let progress_pct = if goal.target_amount <= 0.0 {
        100.0
    } else {
        (value_at_checkpoint / goal.target_amount * 100.0).clamp(0.0, 100.0)
    };

    GoalProgress {
        goal_id: goal.id.clone(),
        achieved: achieved_year.is_some(),
        achieved_year,
        on_track,
        progress_pct,
        shortfall: (goal.target_amount - value_at_checkpoint).max(0.0),
    }
}
