// ── Controller snapshots ──
//
// Point-in-time readings with no cursor: weather and system diagnostics.

#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    pub temperature: f64,
    pub humidity: f64,
    pub wind: f64,
    pub temperature_unit: String,
    pub wind_unit: String,
    pub condition: String,
    pub condition_code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    pub memory: MemoryStats,
    pub storage: Vec<StorageVolume>,
    pub cpus: Vec<CpuStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    pub free: i64,
    pub cache: i64,
    pub buffers: i64,
    pub used: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageVolume {
    /// Storage group the volume was listed under (`internal`, `external`, ...).
    pub kind: String,
    pub name: String,
    pub used: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuStats {
    pub name: String,
    pub user: String,
    pub nice: i64,
    pub system: i64,
    pub idle: i64,
}
