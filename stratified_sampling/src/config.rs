// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// Urbanization class of a record, derived from its district status code.
///
/// In most cases the class is obtained through [DistrictStatus::urban_class]
/// rather than constructed directly.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum UrbanClass {
    /// Major-city center (status code 0).
    Metro,
    /// Central or outer district of a non-metropolitan province (status codes 1 and 2).
    Other,
}

impl Display for UrbanClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrbanClass::Metro => write!(f, "metro"),
            UrbanClass::Other => write!(f, "other"),
        }
    }
}

/// District status code as recorded in the national register.
///
/// Raw codes outside {0, 1, 2} exclude the record from the pipeline; they are
/// filtered at the loading boundary, before any classification happens.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum DistrictStatus {
    /// Code 0.
    MetropolitanCenter,
    /// Code 1: central district of a non-metropolitan province.
    Central,
    /// Code 2: outer district of a non-metropolitan province.
    Outer,
}

impl DistrictStatus {
    pub fn from_code(code: i64) -> Option<DistrictStatus> {
        match code {
            0 => Some(DistrictStatus::MetropolitanCenter),
            1 => Some(DistrictStatus::Central),
            2 => Some(DistrictStatus::Outer),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            DistrictStatus::MetropolitanCenter => 0,
            DistrictStatus::Central => 1,
            DistrictStatus::Outer => 2,
        }
    }

    pub fn urban_class(&self) -> UrbanClass {
        match self {
            DistrictStatus::MetropolitanCenter => UrbanClass::Metro,
            DistrictStatus::Central | DistrictStatus::Outer => UrbanClass::Other,
        }
    }
}

/// One register row: a neighborhood with its geographic codes and population.
///
/// Records are immutable once loaded. The loader guarantees that the
/// geographic codes are present and that the status code is one of the three
/// mapped values.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NeighborhoodRecord {
    /// Coarse geographic code (e.g. `TR3`).
    pub nuts1: String,
    /// Mid-level geographic code (e.g. `TR61`).
    pub nuts2: String,
    /// Finest geographic code (e.g. `TR310`).
    pub nuts3: String,
    pub province: String,
    pub district: String,
    pub neighborhood_code: String,
    pub status: DistrictStatus,
    pub population: u64,
}

/// Canonical column names of the register, used by adjustment predicates.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum RegisterField {
    Nuts1,
    Nuts2,
    Nuts3,
    Province,
    District,
    NeighborhoodCode,
    Status,
    Population,
}

impl RegisterField {
    pub fn from_name(name: &str) -> Option<RegisterField> {
        match name {
            "nuts1" => Some(RegisterField::Nuts1),
            "nuts2" => Some(RegisterField::Nuts2),
            "nuts3" => Some(RegisterField::Nuts3),
            "province" => Some(RegisterField::Province),
            "district" => Some(RegisterField::District),
            "neighborhood_code" => Some(RegisterField::NeighborhoodCode),
            "status" => Some(RegisterField::Status),
            "population" => Some(RegisterField::Population),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RegisterField::Nuts1 => "nuts1",
            RegisterField::Nuts2 => "nuts2",
            RegisterField::Nuts3 => "nuts3",
            RegisterField::Province => "province",
            RegisterField::District => "district",
            RegisterField::NeighborhoodCode => "neighborhood_code",
            RegisterField::Status => "status",
            RegisterField::Population => "population",
        }
    }

    /// The field's value for a record, rendered as text. Numeric fields use
    /// their plain decimal rendering so predicates stay simple string
    /// equalities.
    pub fn value_of(&self, record: &NeighborhoodRecord) -> String {
        match self {
            RegisterField::Nuts1 => record.nuts1.clone(),
            RegisterField::Nuts2 => record.nuts2.clone(),
            RegisterField::Nuts3 => record.nuts3.clone(),
            RegisterField::Province => record.province.clone(),
            RegisterField::District => record.district.clone(),
            RegisterField::NeighborhoodCode => record.neighborhood_code.clone(),
            RegisterField::Status => record.status.code().to_string(),
            RegisterField::Population => record.population.to_string(),
        }
    }
}

/// A single equality test over a canonical register column.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FieldPredicate {
    pub field: RegisterField,
    pub value: String,
}

impl FieldPredicate {
    pub fn matches(&self, record: &NeighborhoodRecord) -> bool {
        self.field.value_of(record) == self.value
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AdjustmentAction {
    /// Add the matched population to the named stratum's non-metropolitan total.
    AddPopulation,
}

/// A named population adjustment: the population of every record matching all
/// predicates is applied to the given stratum.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SpecialAdjustment {
    pub stratum: String,
    pub predicates: Vec<FieldPredicate>,
    pub action: AdjustmentAction,
}

impl SpecialAdjustment {
    pub fn matches(&self, record: &NeighborhoodRecord) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }
}

/// Parameters of a sampling run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SamplingParams {
    /// Total number of interviews to allocate across all strata.
    pub total_sample_size: u32,
    /// Average number of interviews per selected neighborhood.
    pub interviews_per_neighborhood: u32,
    /// Seed for every weighted draw. Fixed by default so that repeated runs
    /// over the same register produce the same fieldwork plan.
    pub seed: u64,
    /// When set, an adjustment that cannot be applied aborts the
    /// distribution build instead of being skipped with a diagnostic.
    pub strict_adjustments: bool,
}

impl SamplingParams {
    pub const DEFAULT_SEED: u64 = 42;

    pub fn new(total_sample_size: u32, interviews_per_neighborhood: u32) -> SamplingParams {
        SamplingParams {
            total_sample_size,
            interviews_per_neighborhood,
            seed: SamplingParams::DEFAULT_SEED,
            strict_adjustments: false,
        }
    }
}

// ******** Output data structures *********

/// Aggregated population of one stratum, split by urbanization class.
///
/// Invariant: `total_population == metro_population + other_population`,
/// including after special adjustments.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PopulationRow {
    pub stratum: String,
    pub metro_population: u64,
    pub other_population: u64,
    pub total_population: u64,
}

/// A population row extended with its allocation targets.
///
/// Invariant: `metro_neighborhoods + other_neighborhoods == neighborhood_count`,
/// and the sample sizes of all strata sum to the requested total.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FrameRow {
    pub stratum: String,
    pub metro_population: u64,
    pub other_population: u64,
    pub total_population: u64,
    pub sample_size: u32,
    pub neighborhood_count: u32,
    pub metro_neighborhoods: u32,
    pub other_neighborhoods: u32,
}

/// A sampled neighborhood, tagged with the stratum and class it was drawn for.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Selection {
    pub stratum: String,
    pub urban_class: UrbanClass,
    pub record: NeighborhoodRecord,
}

/// Achieved versus planned neighborhood counts for one stratum.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PlanComparison {
    pub stratum: String,
    pub planned_neighborhoods: u32,
    pub achieved_neighborhoods: u32,
}

/// Non-fatal events observed during a run. These are returned to the caller
/// for display; they are never silently dropped.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Diagnostic {
    /// A stratum received interviews but no neighborhoods on either road.
    ZeroAllocation { stratum: String, sample_size: u32 },
    /// The chosen district had no matching neighborhoods; the draw fell back
    /// to the whole status cell of the stratum.
    DistrictFallback {
        stratum: String,
        status: DistrictStatus,
        district: String,
    },
    /// A positive target could not be met because the pool was empty.
    EmptyPool {
        stratum: String,
        class: UrbanClass,
    },
    /// An adjustment did not apply and was skipped.
    AdjustmentSkipped { stratum: String, reason: String },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::ZeroAllocation {
                stratum,
                sample_size,
            } => write!(
                f,
                "stratum {}: {} interviews allocated but zero neighborhoods",
                stratum, sample_size
            ),
            Diagnostic::DistrictFallback {
                stratum,
                status,
                district,
            } => write!(
                f,
                "stratum {}: no neighborhoods in district {} (status {}), sampling the whole cell",
                stratum,
                district,
                status.code()
            ),
            Diagnostic::EmptyPool { stratum, class } => {
                write!(f, "stratum {}: no {} records to sample from", stratum, class)
            }
            Diagnostic::AdjustmentSkipped { stratum, reason } => {
                write!(f, "adjustment for stratum {} skipped: {}", stratum, reason)
            }
        }
    }
}

/// The outcome of the two sampling roads.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SamplingOutcome {
    pub selections: Vec<Selection>,
    pub comparison: Vec<PlanComparison>,
    pub diagnostics: Vec<Diagnostic>,
}

/// The outcome of a full run: distribution, frame and final sample.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PlanOutcome {
    pub distribution: Vec<PopulationRow>,
    pub frame: Vec<FrameRow>,
    pub selections: Vec<Selection>,
    pub comparison: Vec<PlanComparison>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Errors that prevent an allocation or sampling call from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SamplingError {
    /// A size or interview parameter was not strictly positive.
    InvalidParameter { name: &'static str, value: i64 },
    /// The sampling frame had no rows.
    EmptyFrame,
    /// The register sums to a zero grand total, nothing can be allocated.
    ZeroTotalPopulation,
    /// A positive number of selections was requested from an empty pool.
    EmptyPool,
    /// An adjustment failed to apply while strict mode was on.
    ConditionEval { stratum: String, reason: String },
}

impl Error for SamplingError {}

impl Display for SamplingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplingError::InvalidParameter { name, value } => {
                write!(f, "parameter {} must be positive, got {}", name, value)
            }
            SamplingError::EmptyFrame => write!(f, "the sampling frame is empty"),
            SamplingError::ZeroTotalPopulation => write!(f, "total population is zero"),
            SamplingError::EmptyPool => write!(f, "cannot sample from an empty pool"),
            SamplingError::ConditionEval { stratum, reason } => {
                write!(f, "adjustment for stratum {} failed: {}", stratum, reason)
            }
        }
    }
}
