//! Constitutional category derived from resting heart rate.

use serde::Serialize;

/// Ayurvedic constitutional category keyed off resting heart rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dosha {
    Kapha,
    Pitta,
    Vata,
}

impl Dosha {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dosha::Kapha => "Kapha",
            Dosha::Pitta => "Pitta",
            Dosha::Vata => "Vata",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DoshaProfile {
    pub dosha: Dosha,
    pub description: String,
    pub recommendations: Vec<String>,
}

/// Map a validated heart rate to its category.
///
/// Boundaries are inclusive on the lower edge: 70 BPM is Pitta, 85 BPM is
/// Vata. Callers must validate the rate first; this function classifies
/// whatever it is given.
pub fn classify(bpm: f64) -> DoshaProfile {
    let dosha = if bpm < 70.0 {
        Dosha::Kapha
    } else if bpm < 85.0 {
        Dosha::Pitta
    } else {
        Dosha::Vata
    };

    match dosha {
        Dosha::Kapha => DoshaProfile {
            dosha,
            description: "A slow, steady pulse suggests a dominant Kapha constitution: \
                          calm, grounded, with stable energy."
                .to_string(),
            recommendations: vec![
                "Focus on light, dry, and warm foods to invigorate your Kapha constitution."
                    .to_string(),
                "Incorporate pungent spices like ginger, black pepper, and turmeric to \
                 stimulate digestion."
                    .to_string(),
                "Favor vigorous morning exercise to counter sluggishness.".to_string(),
            ],
        },
        Dosha::Pitta => DoshaProfile {
            dosha,
            description: "A moderate pulse suggests a dominant Pitta constitution: \
                          focused, driven, with strong digestion."
                .to_string(),
            recommendations: vec![
                "Favor cooling foods like cucumber, coconut, and cilantro to balance your \
                 Pitta."
                    .to_string(),
                "Avoid spicy, oily, and excessively sour foods as they can aggravate your \
                 system."
                    .to_string(),
                "To manage stress, consider a short, calming walk after dinner.".to_string(),
            ],
        },
        Dosha::Vata => DoshaProfile {
            dosha,
            description: "A quick pulse suggests a dominant Vata constitution: \
                          energetic, creative, with variable appetite."
                .to_string(),
            recommendations: vec![
                "Emphasize warm, moist, and grounding foods to balance your airy Vata \
                 nature."
                    .to_string(),
                "Maintain a regular meal schedule to support stable digestion.".to_string(),
                "Sip warm water throughout the day rather than cold drinks.".to_string(),
            ],
        },
    }
}
