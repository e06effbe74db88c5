//! Constants used throughout the LIMS core crate.

/// Prefix for catalog test ids (`T001`).
pub const TEST_ID_PREFIX: &str = "T";

/// Prefix for patient ids (`P001`).
pub const PATIENT_ID_PREFIX: &str = "P";

/// Prefix for inventory item ids (`INV001`).
pub const INVENTORY_ID_PREFIX: &str = "INV";

/// Prefix for equipment ids (`EQ001`).
pub const EQUIPMENT_ID_PREFIX: &str = "EQ";

/// Zero-padding width of sequential ids.
pub const SEQUENTIAL_ID_WIDTH: usize = 3;

/// Default prefix for sample ids and barcodes (`SAM12345678`).
pub const DEFAULT_SAMPLE_ID_PREFIX: &str = "SAM";

/// Items expiring within this many days count as "expiring this week".
pub const EXPIRY_WARNING_DAYS: i64 = 7;

/// Equipment due for maintenance within this many days is flagged.
pub const MAINTENANCE_WARNING_DAYS: i64 = 7;

/// Prefix for report template ids (`RT001`).
pub const REPORT_TEMPLATE_ID_PREFIX: &str = "RT";

/// Laboratory name printed on reports unless configured otherwise.
pub const DEFAULT_LAB_NAME: &str = "Clinical Laboratory";
