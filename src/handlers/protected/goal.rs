// handlers/protected/goal.rs - /api/goal handlers

use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::{Goal, GoalDetail, GoalFields, NewHabit, Subgoal};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::validation::{parse_id, trim_in_place, Validate, ValidatedJson, ValidationErrors};

use super::ownership::load_owned;

/// Scalar goal fields, used as-is by PUT
#[derive(Debug, Default, Deserialize)]
pub struct GoalRequest {
    #[serde(default)]
    pub name: String,
    /// RFC 3339
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub what: String,
    #[serde(default)]
    pub how_much: String,
    #[serde(default)]
    pub resources: String,
    #[serde(default)]
    pub alignment: String,
}

impl GoalRequest {
    fn check(&self, errors: &mut ValidationErrors) {
        errors.length("name", &self.name, 1, 20);
        if self.deadline.is_none() {
            errors.add("deadline", "is required");
        }
    }

    fn into_fields(self) -> Result<GoalFields, ApiError> {
        let deadline = self
            .deadline
            .ok_or_else(|| ApiError::bad_request("Deadline is required"))?;
        Ok(GoalFields {
            name: self.name,
            deadline,
            description: self.description,
            what: self.what,
            how_much: self.how_much,
            resources: self.resources,
            alignment: self.alignment,
        })
    }
}

impl Validate for GoalRequest {
    fn normalize(&mut self) {
        trim_in_place(&mut self.name);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.check(&mut errors);
        errors.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct HabitRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub frequency: String,
}

/// POST body: goal fields plus children created in the same write
#[derive(Debug, Deserialize)]
pub struct CreateGoalRequest {
    #[serde(flatten)]
    pub goal: GoalRequest,
    #[serde(default)]
    pub subgoals: Vec<String>,
    #[serde(default)]
    pub habits: Vec<HabitRequest>,
}

impl Validate for CreateGoalRequest {
    fn normalize(&mut self) {
        self.goal.normalize();
        self.subgoals.iter_mut().for_each(trim_in_place);
        for habit in &mut self.habits {
            trim_in_place(&mut habit.name);
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.goal.check(&mut errors);
        for (i, name) in self.subgoals.iter().enumerate() {
            errors.length(&format!("subgoals[{}]", i), name, 1, 255);
        }
        for (i, habit) in self.habits.iter().enumerate() {
            errors.length(&format!("habits[{}].name", i), &habit.name, 1, 255);
        }
        errors.finish()
    }
}

async fn save_and_load(state: &AppState, goal: &Goal) -> Result<GoalDetail, ApiError> {
    let goal = state
        .store
        .save_goal(goal)
        .await?
        .ok_or_else(|| ApiError::not_found("No goal found with the provided ID"))?;
    Ok(state.store.goal_detail(goal).await?)
}

/// GET /api/goal/ - caller's goals with subgoals and habits
pub async fn goals_get(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Vec<GoalDetail>> {
    let goals = state.store.goals_for_user(auth.user_id).await?;
    Ok(ApiResponse::ok("Goals retrieved successfully", goals))
}

/// POST /api/goal/ - create a goal, optionally with subgoals and habits
///
/// ```json
/// {
///   "name": "Marathon",
///   "deadline": "2026-10-01T00:00:00Z",
///   "subgoals": ["5k", "half"],
///   "habits": [{ "name": "Run", "frequency": "daily" }]
/// }
/// ```
pub async fn goal_create(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateGoalRequest>,
) -> ApiResult<GoalDetail> {
    let fields = payload.goal.into_fields()?;
    let habits = payload
        .habits
        .into_iter()
        .map(|h| NewHabit {
            name: h.name,
            frequency: h.frequency,
        })
        .collect();

    let detail = state
        .store
        .insert_goal(auth.user_id, fields, payload.subgoals, habits)
        .await?;

    tracing::info!(user_id = auth.user_id, goal_id = detail.goal.id, "Goal created");
    Ok(ApiResponse::created("Goal created successfully", detail))
}

/// PUT /api/goal/:goal_id - replace every scalar field
pub async fn goal_put(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(goal_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<GoalRequest>,
) -> ApiResult<GoalDetail> {
    let goal_id = parse_id(&goal_id, "goal")?;
    let mut goal: Goal = load_owned(state.store.as_ref(), goal_id, auth).await?;

    let fields = payload.into_fields()?;
    goal.name = fields.name;
    goal.deadline = fields.deadline;
    goal.description = fields.description;
    goal.what = fields.what;
    goal.how_much = fields.how_much;
    goal.resources = fields.resources;
    goal.alignment = fields.alignment;

    let detail = save_and_load(&state, &goal).await?;
    tracing::info!(user_id = auth.user_id, goal_id, "Goal updated");
    Ok(ApiResponse::ok("Goal updated successfully", detail))
}

/// DELETE /api/goal/:goal_id
pub async fn goal_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(goal_id): Path<String>,
) -> ApiResult<()> {
    let goal_id = parse_id(&goal_id, "goal")?;
    let goal: Goal = load_owned(state.store.as_ref(), goal_id, auth).await?;

    if !state.store.delete_goal(goal.id).await? {
        return Err(ApiError::not_found("No goal found with the provided ID"));
    }

    tracing::info!(user_id = auth.user_id, goal_id, "Goal deleted");
    Ok(ApiResponse::empty("Goal deleted successfully"))
}

/// PATCH /api/goal/:goal_id/toggle - flip `completed`
pub async fn goal_toggle(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(goal_id): Path<String>,
) -> ApiResult<GoalDetail> {
    let goal_id = parse_id(&goal_id, "goal")?;
    let mut goal: Goal = load_owned(state.store.as_ref(), goal_id, auth).await?;

    goal.completed = !goal.completed;
    let detail = save_and_load(&state, &goal).await?;

    tracing::info!(
        user_id = auth.user_id,
        goal_id,
        completed = detail.goal.completed,
        "Goal toggled"
    );
    Ok(ApiResponse::ok("Goal completed status toggled", detail))
}

/// PATCH /api/goal/:goal_id/:subgoal_id/toggle - flip a subgoal's `completed`
pub async fn subgoal_toggle(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((goal_id, subgoal_id)): Path<(String, String)>,
) -> ApiResult<Subgoal> {
    let goal_id = parse_id(&goal_id, "goal")?;
    let subgoal_id = parse_id(&subgoal_id, "subgoal")?;
    let mut subgoal: Subgoal = load_owned(state.store.as_ref(), subgoal_id, auth).await?;

    if subgoal.goal_id != goal_id {
        return Err(ApiError::not_found("No subgoal found with the provided ID"));
    }

    subgoal.completed = !subgoal.completed;
    let subgoal = state
        .store
        .save_subgoal(&subgoal)
        .await?
        .ok_or_else(|| ApiError::not_found("No subgoal found with the provided ID"))?;

    tracing::info!(
        user_id = auth.user_id,
        goal_id,
        subgoal_id,
        completed = subgoal.completed,
        "Subgoal toggled"
    );
    Ok(ApiResponse::ok("Subgoal completed status toggled", subgoal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(body: serde_json::Value) -> CreateGoalRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn empty_name_is_rejected() {
        let req = create(json!({"name": "", "deadline": "2030-01-01T00:00:00Z"}));
        let errors = req.validate().unwrap_err().into_inner();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");
    }

    #[test]
    fn name_longer_than_twenty_is_rejected() {
        let req = create(json!({
            "name": "a".repeat(21),
            "deadline": "2030-01-01T00:00:00Z",
        }));
        assert!(req.validate().is_err());
    }

    #[test]
    fn deadline_is_required() {
        let req = create(json!({"name": "Marathon"}));
        let errors = req.validate().unwrap_err().into_inner();
        assert_eq!(errors[0].field, "deadline");
    }

    #[test]
    fn children_are_checked() {
        let req = create(json!({
            "name": "Marathon",
            "deadline": "2030-01-01T00:00:00Z",
            "subgoals": ["5k", ""],
            "habits": [{"name": "", "frequency": "daily"}],
        }));
        let errors = req.validate().unwrap_err().into_inner();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["subgoals[1]", "habits[0].name"]);
    }

    #[test]
    fn padding_is_trimmed_before_length_check() {
        let mut req = create(json!({
            "name": format!("  {}  ", "a".repeat(20)),
            "deadline": "2030-01-01T00:00:00Z",
            "subgoals": [" 5k "],
            "habits": [{"name": "\tRun\n", "frequency": "daily"}],
        }));
        req.normalize();
        assert!(req.validate().is_ok());
        assert_eq!(req.goal.name, "a".repeat(20));
        assert_eq!(req.subgoals, vec!["5k"]);
        assert_eq!(req.habits[0].name, "Run");

        let mut req = create(json!({
            "name": format!("a{}", " ".repeat(30)),
            "deadline": "2030-01-01T00:00:00Z",
            "subgoals": [format!("b{}", " ".repeat(300)), "x".repeat(256)],
        }));
        req.normalize();
        let errors = req.validate().unwrap_err().into_inner();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["subgoals[1]"]);
        assert_eq!(req.goal.name, "a");
    }

    #[test]
    fn valid_request_converts_to_fields() {
        let req = create(json!({
            "name": "Marathon",
            "deadline": "2030-01-01T00:00:00Z",
            "what": "42km",
        }));
        assert!(req.validate().is_ok());
        let fields = req.goal.into_fields().unwrap();
        assert_eq!(fields.what, "42km");
        assert_eq!(fields.deadline.to_rfc3339(), "2030-01-01T00:00:00+00:00");
    }
}
