use shared::{EnvironmentalMetric, WasteCategory};
use strum::IntoEnumIterator;

use crate::nim::Prompt;

pub fn vision() -> Prompt {
    Prompt {
        text: concat!(
            "Look at this image and decide whether it shows a single item someone might throw away. ",
            "People, animals, landscapes, rooms and blurry or empty pictures are not waste items. ",
            "Respond with only a JSON object: ",
            r#"{"is_waste_item": true or false, "item_name": "short name of the main object", "confidence": number between 0 and 1}"#
        )
        .to_string(),
        max_tokens: 200,
        temperature: 0.2,
    }
}

pub fn reasoning(item_name: &str) -> Prompt {
    let keys = WasteCategory::iter()
        .map(|category| category.key())
        .collect::<Vec<_>>()
        .join(", ");
    Prompt {
        text: format!(
            "An item was identified as: {item_name}.\n\
             Decide how it should be disposed of. Choose exactly one category from: {keys}.\n\
             Give two to four short preparation steps for disposing of it correctly.\n\
             Respond with only a JSON object: \
             {{\"category\": \"one of the categories\", \"confidence\": number between 0 and 1, \
             \"preparation_steps\": [\"step\", \"...\"]}}"
        ),
        max_tokens: 400,
        temperature: 0.1,
    }
}

pub fn educator(item_name: &str, category: WasteCategory, focus: EnvironmentalMetric) -> Prompt {
    Prompt {
        text: format!(
            "In 2-3 sentences, explain the environmental benefit of disposing of a {item_name} \
             as {category} waste. Focus on {} and include a concrete numeric estimate.\n\
             Respond with only a JSON object: \
             {{\"primary_metric\": \"{}\", \"message\": \"your explanation\"}}",
            focus.describe(),
            focus.key(),
        ),
        max_tokens: 250,
        temperature: 0.7,
    }
}
