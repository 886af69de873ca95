use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// The six disposal classes a waste item can be sorted into.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WasteCategory {
    Recyclable,
    Compostable,
    Landfill,
    Hazardous,
    #[serde(rename = "e-waste")]
    #[strum(serialize = "e-waste")]
    EWaste,
    Textile,
}

impl WasteCategory {
    pub fn key(&self) -> &'static str {
        self.into()
    }
}

/// Environmental dimension highlighted by the educator feedback.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EnvironmentalMetric {
    #[serde(rename = "co2_emissions")]
    #[strum(serialize = "co2_emissions")]
    Co2Emissions,
    Energy,
    Water,
    LandfillSpace,
    RawMaterials,
    Pollution,
}

impl EnvironmentalMetric {
    pub fn key(&self) -> &'static str {
        self.into()
    }

    /// Human wording used in prompts and fallback messages.
    pub fn describe(&self) -> &'static str {
        match self {
            EnvironmentalMetric::Co2Emissions => "CO2 emissions avoided",
            EnvironmentalMetric::Energy => "energy saved",
            EnvironmentalMetric::Water => "water saved",
            EnvironmentalMetric::LandfillSpace => "landfill space diverted",
            EnvironmentalMetric::RawMaterials => "raw materials recovered",
            EnvironmentalMetric::Pollution => "pollution prevented",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

/// Why an upload was judged not to show a disposable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RejectionReason {
    Person,
    Animal,
    Landscape,
    Unclear,
    NotWaste,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub key: WasteCategory,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub bin: String,
    pub description: String,
    pub disposal_steps: Vec<String>,
    pub focus_metric: EnvironmentalMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub vision: f64,
    pub reasoning: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalImpact {
    pub primary_metric: EnvironmentalMetric,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidResult {
    pub success: bool,
    pub is_waste_item: bool,
    pub object: String,
    pub category: WasteCategory,
    pub category_info: CategoryInfo,
    pub preparation_steps: Vec<String>,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub confidence_breakdown: ConfidenceBreakdown,
    pub environmental_impact: EnvironmentalImpact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidResult {
    pub success: bool,
    pub is_waste_item: bool,
    pub rejection_reason: RejectionReason,
    pub object: String,
    pub message: String,
    pub confidence: f64,
}

/// Body of a 200 response from `POST /classify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassificationResult {
    Valid(ValidResult),
    Invalid(InvalidResult),
}

impl ClassificationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ClassificationResult::Valid(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                stage: None,
            },
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.error.stage = Some(stage.into());
        self
    }
}
