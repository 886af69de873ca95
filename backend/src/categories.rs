use lazy_static::lazy_static;
use shared::{CategoryInfo, EnvironmentalMetric, WasteCategory};
use std::str::FromStr;
use strum::IntoEnumIterator;

/// Alternative spellings models commonly answer with, normalised the same way as input.
const ALIASES: &[(&str, WasteCategory)] = &[
    ("recycle", WasteCategory::Recyclable),
    ("recycling", WasteCategory::Recyclable),
    ("recyclables", WasteCategory::Recyclable),
    ("compost", WasteCategory::Compostable),
    ("composting", WasteCategory::Compostable),
    ("organic", WasteCategory::Compostable),
    ("organics", WasteCategory::Compostable),
    ("food-waste", WasteCategory::Compostable),
    ("trash", WasteCategory::Landfill),
    ("garbage", WasteCategory::Landfill),
    ("rubbish", WasteCategory::Landfill),
    ("general-waste", WasteCategory::Landfill),
    ("hazardous-waste", WasteCategory::Hazardous),
    ("household-hazardous-waste", WasteCategory::Hazardous),
    ("toxic", WasteCategory::Hazardous),
    ("ewaste", WasteCategory::EWaste),
    ("electronic-waste", WasteCategory::EWaste),
    ("electronics", WasteCategory::EWaste),
    ("textiles", WasteCategory::Textile),
    ("clothing", WasteCategory::Textile),
    ("fabric", WasteCategory::Textile),
];

lazy_static! {
    // Indexed by discriminant, in declaration order.
    static ref REGISTRY: Vec<CategoryInfo> = WasteCategory::iter().map(build_info).collect();
}

struct Template {
    name: &'static str,
    icon: &'static str,
    color: &'static str,
    bin: &'static str,
    description: &'static str,
    steps: &'static [&'static str],
    focus_metric: EnvironmentalMetric,
}

fn build_info(key: WasteCategory) -> CategoryInfo {
    let template = match key {
        WasteCategory::Recyclable => Template {
            name: "Recyclable",
            icon: "♻️",
            color: "#1E88E5",
            bin: "Blue recycling bin",
            description: "Clean paper, cardboard, glass, metal and rigid plastics that can be reprocessed into new material.",
            steps: &[
                "Empty any remaining contents",
                "Rinse off food or liquid residue",
                "Remove caps and lids unless your program accepts them attached",
                "Flatten if possible and place it loose in the recycling bin",
            ],
            focus_metric: EnvironmentalMetric::Energy,
        },
        WasteCategory::Compostable => Template {
            name: "Compostable",
            icon: "🌱",
            color: "#43A047",
            bin: "Green organics bin",
            description: "Food scraps, yard trimmings and certified compostable packaging that break down into soil.",
            steps: &[
                "Remove stickers, ties and any non-compostable packaging",
                "Drain excess liquid",
                "Place it in the organics bin or a home compost",
            ],
            focus_metric: EnvironmentalMetric::Co2Emissions,
        },
        WasteCategory::Landfill => Template {
            name: "Landfill",
            icon: "🗑️",
            color: "#757575",
            bin: "General waste bin",
            description: "Items that cannot currently be recycled or composted.",
            steps: &[
                "Check whether any part can be separated and recycled",
                "Bag loose or messy items",
                "Place it in the general waste bin",
            ],
            focus_metric: EnvironmentalMetric::LandfillSpace,
        },
        WasteCategory::Hazardous => Template {
            name: "Hazardous",
            icon: "⚠️",
            color: "#E53935",
            bin: "Hazardous waste drop-off",
            description: "Batteries, chemicals, paint and other materials that are toxic, flammable or corrosive.",
            steps: &[
                "Keep the item in its original container if possible",
                "Do not mix it with other waste or pour it down a drain",
                "Tape battery terminals and seal leaking containers",
                "Take it to a hazardous waste collection point",
            ],
            focus_metric: EnvironmentalMetric::Pollution,
        },
        WasteCategory::EWaste => Template {
            name: "E-Waste",
            icon: "🔌",
            color: "#8E24AA",
            bin: "E-waste collection point",
            description: "Electronics and electrical devices containing recoverable metals and components.",
            steps: &[
                "Back up and wipe any personal data",
                "Remove batteries if they are removable",
                "Take it to an e-waste drop-off or a retailer take-back program",
            ],
            focus_metric: EnvironmentalMetric::RawMaterials,
        },
        WasteCategory::Textile => Template {
            name: "Textile",
            icon: "👕",
            color: "#FB8C00",
            bin: "Textile donation or collection bin",
            description: "Clothing, shoes and fabrics that can be reused or recycled into fibre.",
            steps: &[
                "Wash and dry the item",
                "Pair shoes and bag small items together",
                "Donate wearable items or use a textile recycling bin",
            ],
            focus_metric: EnvironmentalMetric::Water,
        },
    };

    CategoryInfo {
        key,
        name: template.name.to_string(),
        icon: template.icon.to_string(),
        color: template.color.to_string(),
        bin: template.bin.to_string(),
        description: template.description.to_string(),
        disposal_steps: template.steps.iter().map(|s| s.to_string()).collect(),
        focus_metric: template.focus_metric,
    }
}

pub fn lookup(category: WasteCategory) -> &'static CategoryInfo {
    &REGISTRY[category as usize]
}

pub fn all() -> &'static [CategoryInfo] {
    &REGISTRY
}

/// Map a model-supplied category string onto a registry key.
pub fn resolve(raw: &str) -> Option<WasteCategory> {
    let normalized = normalize(raw);
    if normalized.is_empty() {
        return None;
    }
    if let Ok(category) = WasteCategory::from_str(&normalized) {
        return Some(category);
    }
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, category)| *category)
}

/// Every spelling the keyword heuristic should look for, canonical keys first.
pub fn keywords() -> impl Iterator<Item = (&'static str, WasteCategory)> {
    WasteCategory::iter()
        .map(|c| (c.key(), c))
        .chain(ALIASES.iter().copied())
}

fn normalize(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
