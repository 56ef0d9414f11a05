use chrono::NaiveDate;
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use uuid::Uuid;

use crate::models::user::User;

/// Recommended daily intake per kilogram of body weight, in milliliters.
pub const ML_PER_KG: f64 = 35.0;

pub fn goal_for_weight(weight: f64) -> f64 {
    weight * ML_PER_KG
}

pub fn missing_for(goal: f64, consumed: f64) -> f64 {
    (goal - consumed).max(0.0)
}

/// Share of the goal already consumed, rounded to two decimals and capped at 100.
pub fn goal_percent_for(goal: f64, consumed: f64) -> f64 {
    if goal <= 0.0 {
        return 100.0;
    }
    let percent = (consumed / goal * 100.0 * 100.0).round() / 100.0;
    percent.min(100.0)
}

/// A per-user, per-day hydration record.
#[derive(Serialize, Debug, Clone, PartialEq, sqlx::FromRow, JsonSchema)]
pub struct HydrationTracker {
    pub id: Uuid,
    pub id_owner: Uuid,
    pub weight_at_time: f64,
    pub date: NaiveDate,
    pub goal: f64,
    pub missing: f64,
    pub consumed: f64,
    pub goal_percent: f64,
    pub goal_reached: bool,
}

impl HydrationTracker {
    /// A fresh tracker for `owner` on `date`, with the goal taken from the owner's current weight.
    pub fn new_for(owner: &User, date: NaiveDate) -> Self {
        let goal = goal_for_weight(owner.weight);
        Self {
            id: Uuid::new_v4(),
            id_owner: owner.id,
            weight_at_time: owner.weight,
            date,
            goal,
            missing: goal,
            consumed: 0.0,
            goal_percent: 0.0,
            goal_reached: false,
        }
    }

    /// Adds `quantity` ml and recomputes the derived fields. Callers validate `quantity > 0`.
    pub fn add_consumption(&mut self, quantity: f64) {
        self.consumed += quantity;
        self.missing = missing_for(self.goal, self.consumed);
        self.goal_percent = goal_percent_for(self.goal, self.consumed);
        self.goal_reached = self.missing == 0.0;
    }
}

#[derive(Deserialize, Debug, Clone, JsonSchema)]
pub struct ConsumptionRequest {
    /// Milliliters to add to the day's consumption.
    pub cupsize: f64,
}
