//! Driver and vehicle records.
//!
//! Both are owned by out-of-scope fleet-management views; the engine only
//! reads them to validate dispatch preconditions (a driver's vehicle
//! association in particular).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    /// The vehicle this driver normally operates. Dispatch falls back to
    /// this when no vehicle is supplied explicitly.
    pub assigned_vehicle_id: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub plate: String,
    pub capacity_kg: Option<f64>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Driver {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            phone: String::new(),
            assigned_vehicle_id: None,
            active: true,
        }
    }

    pub fn with_vehicle(mut self, vehicle_id: &str) -> Self {
        self.assigned_vehicle_id = Some(vehicle_id.to_string());
        self
    }
}

impl Vehicle {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            plate: String::new(),
            capacity_kg: None,
            active: true,
        }
    }
}
