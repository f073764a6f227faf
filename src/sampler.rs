use log::{debug, info, warn};

use stratified_sampling::*;
use snafu::{prelude::*, Snafu};

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::sampler::config_reader::*;
use crate::sampler::io_common::RawTable;

pub mod eligibility;
pub mod io_common;
pub mod io_csv;
pub mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum SampleError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display(""))]
    EmptyExcel {},
    #[snafu(display("Error opening file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display(""))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("File {path} has no rows"))]
    EmptyCsv { path: String },
    #[snafu(display(""))]
    OpeningJson { source: std::io::Error },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display(""))]
    MissingParentDir {},
    #[snafu(display("Missing columns in the register: {columns:?}"))]
    MissingColumns { columns: Vec<String> },
    #[snafu(display("Unknown canonical column {name}"))]
    UnknownColumn { name: String },
    #[snafu(display(""))]
    WritingOutput { source: std::io::Error },
    #[snafu(display("Sampling engine: {source}"))]
    Engine { source: SamplingError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SampleResult<T> = Result<T, SampleError>;

pub mod config_reader {
    use crate::sampler::*;

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct RegisterSource {
        #[serde(rename = "filePath")]
        pub file_path: String,
        /// "xlsx" or "csv".
        pub format: String,
        #[serde(rename = "worksheetName")]
        pub worksheet_name: Option<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct PlanParameters {
        #[serde(rename = "totalSampleSize")]
        pub total_sample_size: u32,
        #[serde(rename = "interviewsPerNeighborhood")]
        pub interviews_per_neighborhood: u32,
        #[serde(rename = "randomSeed")]
        pub random_seed: Option<u64>,
        #[serde(rename = "strictAdjustments")]
        pub strict_adjustments: Option<bool>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct PlanCondition {
        pub field: String,
        pub value: String,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct PlanAdjustment {
        pub stratum: String,
        pub action: String,
        pub conditions: Vec<PlanCondition>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct PlanConfig {
        #[serde(rename = "registerSource")]
        pub register_source: RegisterSource,
        /// Canonical column name to raw header name.
        pub columns: HashMap<String, String>,
        pub parameters: PlanParameters,
        #[serde(rename = "specialAdjustments")]
        pub special_adjustments: Option<Vec<PlanAdjustment>>,
    }

    pub fn read_plan(path: &str) -> SampleResult<PlanConfig> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu {})?;
        debug!("read plan: {:?}", contents);
        let config: PlanConfig =
            serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
        Ok(config)
    }

    pub fn read_summary(path: String) -> SampleResult<JSValue> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu {})?;
        let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
        Ok(js)
    }
}

fn validate_params(parameters: &PlanParameters) -> SamplingParams {
    let mut params = SamplingParams::new(
        parameters.total_sample_size,
        parameters.interviews_per_neighborhood,
    );
    if let Some(seed) = parameters.random_seed {
        params.seed = seed;
    }
    if let Some(strict) = parameters.strict_adjustments {
        params.strict_adjustments = strict;
    }
    params
}

fn validate_adjustments(adjustments: &[PlanAdjustment]) -> SampleResult<Vec<SpecialAdjustment>> {
    let mut res: Vec<SpecialAdjustment> = Vec::new();
    for adj in adjustments.iter() {
        let action = match adj.action.as_str() {
            "add_population" => AdjustmentAction::AddPopulation,
            x => {
                whatever!("Cannot use adjustment action {:?} (currently not implemented)", x)
            }
        };
        let mut predicates: Vec<FieldPredicate> = Vec::new();
        for condition in adj.conditions.iter() {
            let field = RegisterField::from_name(condition.field.as_str()).context(
                UnknownColumnSnafu {
                    name: condition.field.clone(),
                },
            )?;
            predicates.push(FieldPredicate {
                field,
                value: condition.value.clone(),
            });
        }
        res.push(SpecialAdjustment {
            stratum: adj.stratum.clone(),
            predicates,
            action,
        });
    }
    Ok(res)
}

fn read_register(config_path: &str, source: &RegisterSource) -> SampleResult<RawTable> {
    let config_p = Path::new(config_path);
    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
    let register_p: PathBuf = root_p.join(&source.file_path);
    let p = register_p.as_path().display().to_string();
    info!("Attempting to read register file {:?}", p);
    match source.format.as_str() {
        "xlsx" => io_xlsx::read_excel_register(&p, &source.worksheet_name),
        "csv" => io_csv::read_csv_register(&p),
        x => {
            whatever!("Register format not implemented {:?}", x)
        }
    }
}

fn build_summary_js(config: &PlanConfig, params: &SamplingParams, outcome: &PlanOutcome) -> JSValue {
    let distribution: Vec<JSValue> = outcome
        .distribution
        .iter()
        .map(|r| {
            json!({
                "stratum": r.stratum,
                "metroPopulation": r.metro_population,
                "otherPopulation": r.other_population,
                "totalPopulation": r.total_population,
            })
        })
        .collect();

    let frame: Vec<JSValue> = outcome
        .frame
        .iter()
        .map(|r| {
            json!({
                "stratum": r.stratum,
                "sampleSize": r.sample_size,
                "neighborhoodCount": r.neighborhood_count,
                "metroNeighborhoods": r.metro_neighborhoods,
                "otherNeighborhoods": r.other_neighborhoods,
            })
        })
        .collect();

    let selections: Vec<JSValue> = outcome
        .selections
        .iter()
        .map(|s| {
            json!({
                "stratum": s.stratum,
                "class": s.urban_class.to_string(),
                "province": s.record.province,
                "district": s.record.district,
                "neighborhoodCode": s.record.neighborhood_code,
                "population": s.record.population,
            })
        })
        .collect();

    let comparison: Vec<JSValue> = outcome
        .comparison
        .iter()
        .map(|c| {
            json!({
                "stratum": c.stratum,
                "plannedNeighborhoods": c.planned_neighborhoods,
                "achievedNeighborhoods": c.achieved_neighborhoods,
            })
        })
        .collect();

    let diagnostics: Vec<JSValue> = outcome
        .diagnostics
        .iter()
        .map(|d| json!(d.to_string()))
        .collect();

    json!({
        "config": {
            "registerFile": config.register_source.file_path,
            "totalSampleSize": params.total_sample_size,
            "interviewsPerNeighborhood": params.interviews_per_neighborhood,
            "randomSeed": params.seed,
        },
        "populationDistribution": distribution,
        "samplingFrame": frame,
        "selections": selections,
        "planComparison": comparison,
        "diagnostics": diagnostics,
    })
}

pub fn run_plan(args: &Args) -> SampleResult<()> {
    let config = config_reader::read_plan(&args.config)?;
    info!("config: {:?}", config);

    let params = validate_params(&config.parameters);
    let adjustments = validate_adjustments(config.special_adjustments.as_deref().unwrap_or(&[]))?;

    let table = read_register(&args.config, &config.register_source)?;
    let (mut records, drops) = io_common::parse_records(&table, &config.columns)?;
    info!("Register loaded with {} rows", records.len());
    if drops.missing_values > 0 {
        warn!("{} rows dropped for missing or unreadable values", drops.missing_values);
    }
    if drops.unmapped_status > 0 {
        warn!("{} rows dropped for unmapped status codes", drops.unmapped_status);
    }

    // Optional pre-filtering by province eligibility lists.
    if args.metropol_provinces.is_some() || args.other_provinces.is_some() {
        let metropol = match &args.metropol_provinces {
            Some(p) => eligibility::read_code_list(p)?,
            None => HashSet::new(),
        };
        let other = match &args.other_provinces {
            Some(p) => eligibility::read_code_list(p)?,
            None => HashSet::new(),
        };
        let before = records.len();
        records = eligibility::filter_register(records, &metropol, &other);
        info!(
            "Eligibility filter kept {} of {} rows ({} provinces)",
            records.len(),
            before,
            metropol.len() + other.len()
        );
        let dir = args.codes_dir.clone().unwrap_or_else(|| ".".to_string());
        let metropol_n = eligibility::export_neighborhood_codes(
            &records,
            UrbanClass::Metro,
            &Path::new(&dir).join("metropol.txt"),
        )?;
        let other_n = eligibility::export_neighborhood_codes(
            &records,
            UrbanClass::Other,
            &Path::new(&dir).join("other.txt"),
        )?;
        info!(
            "Exported {} metropol and {} other neighborhood codes",
            metropol_n, other_n
        );
        for stratum in eligibility::check_central_coverage(&records) {
            warn!(
                "stratum {}: no central-district neighborhoods after filtering",
                stratum
            );
        }
    }

    let outcome = run_sampling_plan(&records, &adjustments, &params).context(EngineSnafu)?;
    for diagnostic in outcome.diagnostics.iter() {
        warn!("{}", diagnostic);
    }

    // Assemble the final json
    let summary = build_summary_js(&config, &params, &outcome);
    let pretty_js_summary = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {})?;
    match args.out.as_deref() {
        None | Some("stdout") => println!("{}", pretty_js_summary),
        Some(path) => {
            fs::write(path, &pretty_js_summary).context(WritingOutputSnafu {})?;
            info!("Summary written to {}", path);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(reference_p) = args.reference.clone() {
        let summary_ref = config_reader::read_summary(reference_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_summary {
            warn!("Found differences with the reference plan");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_summary.as_ref(),
                "\n",
            );
            whatever!("Difference detected between computed plan and reference plan")
        }
        info!("Computed plan matches the reference");
    }

    Ok(())
}
