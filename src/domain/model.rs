use crate::domain::table::Table;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// File names of the tables under the data directory.
pub mod tables {
    pub const PLOTS: &str = "plots.csv";
    pub const LOTS: &str = "lots.csv";
    pub const OCCUPANTS: &str = "occupants.csv";
    pub const VETERANS: &str = "veterans.csv";
    pub const AVAILABLE_LOTS: &str = "available_lots.csv";
}

/// Column names shared by the tables.
pub mod columns {
    pub const PLOT_ID: &str = "plot_id";
    pub const MONUMENT_IMAGES: &str = "monument_images";
    pub const LOT_ID: &str = "lot_id";
    pub const LOT_NUMBER: &str = "lot_number";
    pub const PURCHASED_RIGHTS: &str = "purchased_rights";
    pub const REMAINING_RIGHTS: &str = "remaining_rights";
    pub const STATUS: &str = "status";
    pub const NAME: &str = "name";
    pub const BIRTH_DATE: &str = "birth_date";
    pub const DEATH_DATE: &str = "death_date";
    pub const VETERAN: &str = "veteran";
    pub const LOTS_AVAILABLE: &str = "lots_available";

    pub const FIRST_NAME: &str = "First Name";
    pub const MIDDLE_NAME: &str = "Middle Name/Initial";
    pub const LAST_NAME: &str = "Last Name";
    pub const SUFFIX: &str = "Suffix";
    pub const BRANCH: &str = "Branch";
    pub const SERVICE_PERIOD: &str = "Service Period";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LotStatus {
    Available,
    Unoccupied,
    #[serde(rename = "Partially Occupied")]
    PartiallyOccupied,
    #[serde(rename = "Fully Occupied")]
    FullyOccupied,
    #[serde(rename = "Not Available")]
    NotAvailable,
}

impl LotStatus {
    pub const ALL: [LotStatus; 5] = [
        LotStatus::Available,
        LotStatus::Unoccupied,
        LotStatus::PartiallyOccupied,
        LotStatus::FullyOccupied,
        LotStatus::NotAvailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LotStatus::Available => "Available",
            LotStatus::Unoccupied => "Unoccupied",
            LotStatus::PartiallyOccupied => "Partially Occupied",
            LotStatus::FullyOccupied => "Fully Occupied",
            LotStatus::NotAvailable => "Not Available",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value.trim())
    }
}

impl fmt::Display for LotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OccupantStatus {
    Occupant,
    Reserved,
    Cremation,
    Vault,
    Other(String),
}

impl OccupantStatus {
    pub fn from_field(value: &str) -> Self {
        match value.trim() {
            "Occupant" => OccupantStatus::Occupant,
            "Reserved" => OccupantStatus::Reserved,
            "Cremation" => OccupantStatus::Cremation,
            "Vault" => OccupantStatus::Vault,
            other => OccupantStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OccupantStatus::Occupant => "Occupant",
            OccupantStatus::Reserved => "Reserved",
            OccupantStatus::Cremation => "Cremation",
            OccupantStatus::Vault => "Vault",
            OccupantStatus::Other(s) => s,
        }
    }

    /// Reserved entries hold a place but are not buried there.
    pub fn is_live(&self) -> bool {
        !matches!(self, OccupantStatus::Reserved)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotRecord {
    pub row: usize,
    pub plot_id: String,
    pub monument_images: Vec<String>,
}

impl PlotRecord {
    pub fn read_all(table: &Table) -> Result<Vec<Self>> {
        let plot_idx = table.column_index(columns::PLOT_ID)?;
        let images_idx = table.column_index(columns::MONUMENT_IMAGES)?;

        Ok((0..table.len())
            .map(|row| PlotRecord {
                row,
                plot_id: table.get(row, plot_idx).trim().to_string(),
                monument_images: parse_image_list(table.get(row, images_idx)),
            })
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotRecord {
    pub row: usize,
    pub lot_id: String,
    pub plot_id: String,
    pub lot_number: i64,
    pub purchased_rights: i64,
    pub remaining_rights: i64,
    pub status: String,
}

impl LotRecord {
    /// Every numeric field must parse; a single bad cell fails the whole read.
    pub fn read_all(table: &Table) -> Result<Vec<Self>> {
        let lot_idx = table.column_index(columns::LOT_ID)?;
        let plot_idx = table.column_index(columns::PLOT_ID)?;
        let number_idx = table.column_index(columns::LOT_NUMBER)?;
        let purchased_idx = table.column_index(columns::PURCHASED_RIGHTS)?;
        let remaining_idx = table.column_index(columns::REMAINING_RIGHTS)?;
        let status_idx = table.column_index(columns::STATUS)?;

        (0..table.len())
            .map(|row| {
                Ok(LotRecord {
                    row,
                    lot_id: table.get(row, lot_idx).trim().to_string(),
                    plot_id: table.get(row, plot_idx).trim().to_string(),
                    lot_number: table.parse_int(row, number_idx)?,
                    purchased_rights: table.parse_int(row, purchased_idx)?,
                    remaining_rights: table.parse_int(row, remaining_idx)?,
                    status: table.get(row, status_idx).trim().to_string(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupantRecord {
    pub row: usize,
    pub lot_id: String,
    pub name: String,
    pub status: OccupantStatus,
    pub birth_date: String,
    pub death_date: String,
}

impl OccupantRecord {
    pub fn read_all(table: &Table) -> Result<Vec<Self>> {
        let lot_idx = table.column_index(columns::LOT_ID)?;
        let name_idx = table.column_index(columns::NAME)?;
        let status_idx = table.column_index(columns::STATUS)?;
        let birth_idx = table.column_index(columns::BIRTH_DATE).ok();
        let death_idx = table.column_index(columns::DEATH_DATE).ok();

        let optional = |row: usize, idx: Option<usize>| {
            idx.map(|i| table.get(row, i).trim().to_string())
                .unwrap_or_default()
        };

        Ok((0..table.len())
            .map(|row| OccupantRecord {
                row,
                lot_id: table.get(row, lot_idx).trim().to_string(),
                name: table.get(row, name_idx).trim().to_string(),
                status: OccupantStatus::from_field(table.get(row, status_idx)),
                birth_date: optional(row, birth_idx),
                death_date: optional(row, death_idx),
            })
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VeteranRecord {
    pub row: usize,
    pub first: String,
    pub middle: String,
    pub last: String,
    pub suffix: String,
    pub branch: String,
    pub service_period: String,
}

impl VeteranRecord {
    pub fn read_all(table: &Table) -> Result<Vec<Self>> {
        let first_idx = table.column_index(columns::FIRST_NAME)?;
        let middle_idx = table.column_index(columns::MIDDLE_NAME)?;
        let last_idx = table.column_index(columns::LAST_NAME)?;
        let suffix_idx = table.column_index(columns::SUFFIX).ok();
        let branch_idx = table.column_index(columns::BRANCH).ok();
        let service_idx = table.column_index(columns::SERVICE_PERIOD).ok();

        let optional = |row: usize, idx: Option<usize>| {
            idx.map(|i| table.get(row, i).trim().to_string())
                .unwrap_or_default()
        };

        Ok((0..table.len())
            .map(|row| VeteranRecord {
                row,
                first: table.get(row, first_idx).trim().to_string(),
                middle: table.get(row, middle_idx).trim().to_string(),
                last: table.get(row, last_idx).trim().to_string(),
                suffix: optional(row, suffix_idx),
                branch: optional(row, branch_idx),
                service_period: optional(row, service_idx),
            })
            .collect())
    }

    pub fn display_name(&self) -> String {
        [&self.first, &self.middle, &self.last, &self.suffix]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Split a `monument_images` cell into filenames, dropping blanks.
pub fn parse_image_list(cell: &str) -> Vec<String> {
    cell.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_image_list(images: &[String]) -> String {
    images.join("; ")
}
