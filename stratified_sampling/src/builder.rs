pub use crate::config::*;
use crate::{population_distribution, run_sampling_plan, sampling_frame};

/// A builder for assembling a register and running a sampling plan.
///
/// ```
/// pub use stratified_sampling::builder::Builder;
/// pub use stratified_sampling::SamplingParams;
/// # use stratified_sampling::SamplingError;
///
/// let mut builder = Builder::new(&SamplingParams::new(100, 10))?;
/// builder.add_record_simple("TR100", "Fatih", "N-0001", 0, 25_000)?;
/// builder.add_record_simple("TR100", "Fatih", "N-0002", 0, 12_000)?;
///
/// let outcome = builder.run()?;
/// assert_eq!(outcome.frame.len(), 1);
/// # Ok::<(), SamplingError>(())
/// ```
pub struct Builder {
    pub(crate) _params: SamplingParams,
    pub(crate) _adjustments: Vec<SpecialAdjustment>,
    pub(crate) _records: Vec<NeighborhoodRecord>,
}

impl Builder {
    pub fn new(params: &SamplingParams) -> Result<Builder, SamplingError> {
        Ok(Builder {
            _params: params.clone(),
            _adjustments: Vec::new(),
            _records: Vec::new(),
        })
    }

    pub fn adjustments(self, adjustments: &[SpecialAdjustment]) -> Result<Builder, SamplingError> {
        Ok(Builder {
            _params: self._params,
            _adjustments: adjustments.to_vec(),
            _records: self._records,
        })
    }

    /// Adds a register row from its essential fields.
    ///
    /// The coarse and mid-level codes are taken as prefixes of the finest
    /// code, and the province is taken from the district name, which is
    /// enough for the stratum rules. Use [Builder::add_record] when the full
    /// row is available.
    pub fn add_record_simple(
        &mut self,
        nuts3: &str,
        district: &str,
        neighborhood_code: &str,
        status_code: i64,
        population: u64,
    ) -> Result<(), SamplingError> {
        let status = DistrictStatus::from_code(status_code).ok_or(
            SamplingError::InvalidParameter {
                name: "status",
                value: status_code,
            },
        )?;
        self.add_record(&NeighborhoodRecord {
            nuts1: nuts3.get(..3).unwrap_or(nuts3).to_string(),
            nuts2: nuts3.get(..4).unwrap_or(nuts3).to_string(),
            nuts3: nuts3.to_string(),
            province: district.to_string(),
            district: district.to_string(),
            neighborhood_code: neighborhood_code.to_string(),
            status,
            population,
        })
    }

    pub fn add_record(&mut self, record: &NeighborhoodRecord) -> Result<(), SamplingError> {
        self._records.push(record.clone());
        Ok(())
    }

    /// The aggregated population table for the records added so far.
    pub fn population_distribution(
        &self,
    ) -> Result<(Vec<PopulationRow>, Vec<Diagnostic>), SamplingError> {
        population_distribution(
            &self._records,
            &self._adjustments,
            self._params.strict_adjustments,
        )
    }

    /// The sampling frame derived from the current records and parameters.
    pub fn sampling_frame(&self) -> Result<(Vec<FrameRow>, Vec<Diagnostic>), SamplingError> {
        let (distribution, _) = self.population_distribution()?;
        sampling_frame(&distribution, &self._params)
    }

    /// Runs the full pipeline over the assembled register.
    pub fn run(&self) -> Result<PlanOutcome, SamplingError> {
        run_sampling_plan(&self._records, &self._adjustments, &self._params)
    }
}
