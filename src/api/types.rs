//! API request and response types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ==================== People ====================

/// A person.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Person {
    /// Full name.
    #[schema(min_length = 1)]
    pub name: String,
    /// Age in years.
    #[schema(minimum = 0)]
    pub age: i32,
    /// Height in centimetres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

// ==================== Pets ====================

/// A cat.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Cat {
    pub name: String,
    pub age: i32,
}

/// A dog.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Dog {
    pub name: String,
    pub age: i32,
    /// Weight in kilograms.
    pub weight: f64,
}

// ==================== Health ====================

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}
