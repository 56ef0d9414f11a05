use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, Debug, Clone, PartialEq, sqlx::FromRow, JsonSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Body weight in kilograms.
    pub weight: f64,
}

#[derive(Deserialize, Debug, Clone, Validate, JsonSchema)]
pub struct UserRequest {
    pub name: String,
    #[validate(range(exclusive_min = 0.0))]
    pub weight: f64,
}

/// Partial update. Fields other than `name` and `weight` are ignored.
#[derive(Deserialize, Debug, Clone, Default, Validate, JsonSchema)]
pub struct UserUpdateRequest {
    pub name: Option<String>,
    #[validate(range(exclusive_min = 0.0))]
    pub weight: Option<f64>,
}

impl UserUpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.weight.is_none()
    }

    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.weight.is_some() {
            fields.push("weight");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_ignores_unknown_fields() {
        let update: UserUpdateRequest = serde_json::from_str(r#"{"email": "a@b.c", "id": "x"}"#).unwrap();
        assert!(update.is_empty());

        let update: UserUpdateRequest = serde_json::from_str(r#"{"weight": 72.5, "email": "a@b.c"}"#).unwrap();
        assert!(!update.is_empty());
        assert_eq!(update.changed_fields(), vec!["weight"]);
    }

    #[test]
    fn weight_must_be_positive() {
        let request = UserRequest {
            name: "Ana".to_string(),
            weight: 0.0,
        };
        assert!(request.validate().is_err());

        let request = UserRequest {
            name: "Ana".to_string(),
            weight: 61.0,
        };
        assert!(request.validate().is_ok());

        let update = UserUpdateRequest {
            weight: Some(-3.0),
            ..UserUpdateRequest::default()
        };
        assert!(update.validate().is_err());

        let update = UserUpdateRequest {
            name: Some("Bea".to_string()),
            ..UserUpdateRequest::default()
        };
        assert!(update.validate().is_ok());
    }
}
