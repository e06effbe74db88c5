//! Instrument register and maintenance schedule.

use crate::constants::{EQUIPMENT_ID_PREFIX, MAINTENANCE_WARNING_DAYS, SEQUENTIAL_ID_WIDTH};
use crate::{LabError, LabResult};
use chrono::{Duration, NaiveDate};
use lims_ids::SequentialIdGenerator;
use lims_types::NonEmptyText;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    #[default]
    Operational,
    Maintenance,
    OutOfService,
    Calibration,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,
    pub name: NonEmptyText,
    pub model: String,
    pub serial_number: String,
    pub manufacturer: String,
    pub install_date: NaiveDate,
    pub last_maintenance: Option<NaiveDate>,
    pub next_maintenance: NaiveDate,
    pub maintenance_interval_days: u32,
    pub status: EquipmentStatus,
    pub location: String,
    pub notes: Option<String>,
}

impl Equipment {
    /// Negative when maintenance is overdue.
    pub fn days_until_maintenance(&self, today: NaiveDate) -> i64 {
        self.next_maintenance.signed_duration_since(today).num_days()
    }

    pub fn maintenance_label(&self, today: NaiveDate) -> String {
        match self.days_until_maintenance(today) {
            d if d < 0 => format!("Overdue by {} days", -d),
            0 => "Due today".to_owned(),
            d => format!("{d} days"),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewEquipment {
    pub name: NonEmptyText,
    pub model: String,
    pub serial_number: String,
    pub manufacturer: String,
    pub install_date: NaiveDate,
    pub maintenance_interval_days: u32,
    #[serde(default)]
    pub status: EquipmentStatus,
    pub location: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceKind {
    Preventive,
    Corrective,
    Calibration,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub kind: MaintenanceKind,
    pub description: String,
    pub performed_by: NonEmptyText,
    pub performed_at: NaiveDate,
    /// Overrides the interval-based next date when set.
    #[serde(default)]
    pub next_maintenance: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EquipmentStats {
    pub total: usize,
    pub operational: usize,
    pub needs_maintenance: usize,
    pub out_of_service: usize,
}

#[derive(Clone, Debug)]
pub struct EquipmentStore {
    equipment: Vec<Equipment>,
    history: Vec<(String, MaintenanceRecord)>,
    ids: SequentialIdGenerator,
}

impl Default for EquipmentStore {
    fn default() -> Self {
        Self {
            equipment: Vec::new(),
            history: Vec::new(),
            ids: SequentialIdGenerator::new(EQUIPMENT_ID_PREFIX, SEQUENTIAL_ID_WIDTH),
        }
    }
}

impl EquipmentStore {
    pub fn list(&self) -> &[Equipment] {
        &self.equipment
    }

    pub fn get(&self, id: &str) -> Option<&Equipment> {
        self.equipment.iter().find(|e| e.id == id)
    }

    /// Register an instrument. The first service is due one interval after installation.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::InvalidInput`] if the first service date falls outside the
    /// supported calendar range.
    pub fn add(&mut self, new: NewEquipment) -> LabResult<Equipment> {
        let next_maintenance = due_after(new.install_date, new.maintenance_interval_days)?;
        let equipment = Equipment {
            id: self.ids.next_id(),
            name: new.name,
            model: new.model,
            serial_number: new.serial_number,
            manufacturer: new.manufacturer,
            install_date: new.install_date,
            last_maintenance: None,
            next_maintenance,
            maintenance_interval_days: new.maintenance_interval_days,
            status: new.status,
            location: new.location,
            notes: new.notes,
        };
        tracing::info!(equipment_id = %equipment.id, "equipment registered");
        self.equipment.push(equipment.clone());
        Ok(equipment)
    }

    pub fn set_status(&mut self, id: &str, status: EquipmentStatus) -> LabResult<Equipment> {
        let equipment = self.get_mut(id)?;
        equipment.status = status;
        Ok(equipment.clone())
    }

    pub fn record_maintenance(
        &mut self,
        id: &str,
        record: MaintenanceRecord,
    ) -> LabResult<Equipment> {
        let equipment = self.get_mut(id)?;
        let next_maintenance = match record.next_maintenance {
            Some(date) => date,
            None => due_after(record.performed_at, equipment.maintenance_interval_days)?,
        };
        equipment.last_maintenance = Some(record.performed_at);
        equipment.next_maintenance = next_maintenance;
        let updated = equipment.clone();

        tracing::info!(
            equipment_id = id,
            next = %updated.next_maintenance,
            "maintenance recorded"
        );
        self.history.push((id.to_owned(), record));
        Ok(updated)
    }

    /// Maintenance records for one instrument, oldest first.
    pub fn history(&self, id: &str) -> Vec<&MaintenanceRecord> {
        self.history
            .iter()
            .filter(|(equipment_id, _)| equipment_id == id)
            .map(|(_, record)| record)
            .collect()
    }

    pub fn stats(&self, today: NaiveDate) -> EquipmentStats {
        let mut stats = EquipmentStats {
            total: self.equipment.len(),
            ..EquipmentStats::default()
        };
        for e in &self.equipment {
            match e.status {
                EquipmentStatus::Operational => stats.operational += 1,
                EquipmentStatus::OutOfService => stats.out_of_service += 1,
                _ => {}
            }
            if e.days_until_maintenance(today) <= MAINTENANCE_WARNING_DAYS {
                stats.needs_maintenance += 1;
            }
        }
        stats
    }

    fn get_mut(&mut self, id: &str) -> LabResult<&mut Equipment> {
        self.equipment
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| LabError::EquipmentNotFound(id.to_owned()))
    }
}

fn due_after(from: NaiveDate, interval_days: u32) -> LabResult<NaiveDate> {
    from.checked_add_signed(Duration::days(i64::from(interval_days)))
        .ok_or_else(|| {
            LabError::InvalidInput(format!(
                "maintenance interval of {interval_days} days from {from} is out of range"
            ))
        })
}
