use crate::plate::Plate;
use serde::Serialize;

/// Legal situation tags as the registry displays them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VehicleStatus {
    #[serde(rename = "Regular")]
    Regular,
    #[serde(rename = "Débitos Pendentes")]
    Debts,
    #[serde(rename = "Roubo/Furto")]
    Theft,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleInfo {
    pub plate: Plate,
    pub model: String,
    pub year: u16,
    pub color: String,
    pub city: String,
    pub status: VehicleStatus,
    pub message: String,
}
