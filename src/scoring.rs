//! Condenses a product's categorical attributes into a bounded EcoScore.
//!
//! Material and packaging carry fixed weights (0.5 and 0.2) because they are
//! the most durable environmental signals; the remaining boolean and list
//! attributes contribute flat bonuses. The raw sum is rounded half away from
//! zero and clamped to the 1..=5 band.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;

/// Bounded sustainability rating, always within 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EcoScore(u8);

impl EcoScore {
    pub const MIN: EcoScore = EcoScore(1);
    pub const MAX: EcoScore = EcoScore(5);

    /// Rounds half away from zero, then clamps into the band.
    pub fn from_raw(raw: f32) -> Self {
        let rounded = raw.round();
        Self(rounded.clamp(1.0, 5.0) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for EcoScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signal groups feeding the score, kept distinct for transparent audits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSignal {
    Material,
    Packaging,
    Biodegradable,
    Recyclable,
    Certifications,
    CarbonNeutral,
    Local,
    FairTrade,
}

/// Discrete contribution to a score, allowing transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub signal: ScoreSignal,
    pub points: f32,
    pub notes: String,
}

/// Score plus the component trail that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub score: EcoScore,
    pub raw_total: f32,
    pub components: Vec<ScoreComponent>,
}

#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// An empty attribute map means the catalog record is broken, not that
    /// the product is merely unexceptional.
    #[error("product '{name}' carries no attributes to score")]
    MissingAttributes { name: String },
}

const MATERIAL_WEIGHT: f32 = 0.5;
const PACKAGING_WEIGHT: f32 = 0.2;

/// Material ranks, 5 = best. Lookup is exact; anything unrecognized ranks 1.
const MATERIAL_RANKS: &[(&str, u8)] = &[
    ("Bamboo", 5),
    ("Glass", 4),
    ("Stainless steel", 4),
    ("Organic", 4),
    ("Plant-based", 4),
    ("Recycled paper", 4),
    ("Recycled plastic", 3),
    ("Polypropylene", 2),
    ("Chemical-based", 1),
    ("Synthetic fibers", 1),
];

/// Packaging ranks, same scale and lookup rules as materials.
const PACKAGING_RANKS: &[(&str, u8)] = &[
    ("Compostable bag", 5),
    ("Cardboard", 5),
    ("Paper", 5),
    ("Glass jar", 4),
    ("Recycled cardboard", 4),
    ("Metal tin", 4),
    ("Recycled HDPE plastic", 3),
    ("Plastic bottle", 2),
    ("Plastic wrap", 1),
];

const UNRANKED: u8 = 1;

fn rank_of(table: &[(&str, u8)], value: Option<&str>) -> u8 {
    value
        .and_then(|name| {
            table
                .iter()
                .find(|(candidate, _)| *candidate == name)
                .map(|(_, rank)| *rank)
        })
        .unwrap_or(UNRANKED)
}

/// Full evaluation with the component trail. Pure: same product, same result.
pub fn evaluate(product: &Product) -> Result<ScoreBreakdown, ScoreError> {
    if product.attributes.is_empty() {
        return Err(ScoreError::MissingAttributes {
            name: product.name.clone(),
        });
    }

    let attrs = &product.attributes;
    let mut components = Vec::new();
    let mut raw_total = 0.0f32;

    let material = attrs.text("material");
    let material_rank = rank_of(MATERIAL_RANKS, material);
    let material_points = f32::from(material_rank) * MATERIAL_WEIGHT;
    components.push(ScoreComponent {
        signal: ScoreSignal::Material,
        points: material_points,
        notes: format!(
            "material '{}' ranks {material_rank}/5",
            material.unwrap_or("absent")
        ),
    });
    raw_total += material_points;

    let packaging = attrs.text("packaging");
    let packaging_rank = rank_of(PACKAGING_RANKS, packaging);
    let packaging_points = f32::from(packaging_rank) * PACKAGING_WEIGHT;
    components.push(ScoreComponent {
        signal: ScoreSignal::Packaging,
        points: packaging_points,
        notes: format!(
            "packaging '{}' ranks {packaging_rank}/5",
            packaging.unwrap_or("absent")
        ),
    });
    raw_total += packaging_points;

    if attrs.flag("biodegradable") {
        components.push(ScoreComponent {
            signal: ScoreSignal::Biodegradable,
            points: 1.5,
            notes: "biodegradable".to_string(),
        });
        raw_total += 1.5;
    }

    if attrs.flag("recyclable") {
        components.push(ScoreComponent {
            signal: ScoreSignal::Recyclable,
            points: 1.0,
            notes: "recyclable".to_string(),
        });
        raw_total += 1.0;
    }

    let certifications = attrs.list("certifications");
    if !certifications.is_empty() {
        let points = certifications.len() as f32 * 0.5;
        components.push(ScoreComponent {
            signal: ScoreSignal::Certifications,
            points,
            notes: format!("{} certification(s)", certifications.len()),
        });
        raw_total += points;
    }

    if attrs.flag("carbonNeutral") {
        components.push(ScoreComponent {
            signal: ScoreSignal::CarbonNeutral,
            points: 1.0,
            notes: "carbon neutral".to_string(),
        });
        raw_total += 1.0;
    }

    if attrs.flag("local") {
        components.push(ScoreComponent {
            signal: ScoreSignal::Local,
            points: 0.5,
            notes: "locally sourced".to_string(),
        });
        raw_total += 0.5;
    }

    if attrs.flag("fairTrade") {
        components.push(ScoreComponent {
            signal: ScoreSignal::FairTrade,
            points: 0.5,
            notes: "fair trade".to_string(),
        });
        raw_total += 0.5;
    }

    Ok(ScoreBreakdown {
        score: EcoScore::from_raw(raw_total),
        raw_total,
        components,
    })
}

/// Just the bounded score.
pub fn score(product: &Product) -> Result<EcoScore, ScoreError> {
    evaluate(product).map(|breakdown| breakdown.score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{attributes, flag, list, text, Product, ProductAttributes};

    fn product_with(attrs: ProductAttributes) -> Product {
        Product {
            item_id: "1".to_string(),
            name: "Test Product".to_string(),
            category: "Home".to_string(),
            price: "$1.00".to_string(),
            image: "/api/placeholder/300/300".to_string(),
            description: "test".to_string(),
            attributes: attrs,
        }
    }

    #[test]
    fn bamboo_cardboard_biodegradable_recyclable_scores_five() {
        // 5*0.5 + 5*0.2 + 1.5 + 1.0 = 6.0, clamped to 5.
        let product = product_with(attributes([
            ("material", text("Bamboo")),
            ("packaging", text("Cardboard")),
            ("biodegradable", flag(true)),
            ("recyclable", flag(true)),
        ]));
        let breakdown = evaluate(&product).expect("scoreable");
        assert!((breakdown.raw_total - 6.0).abs() < f32::EPSILON);
        assert_eq!(breakdown.score, EcoScore::MAX);
    }

    #[test]
    fn chemical_plastic_bottle_recyclable_rounds_to_two() {
        // 1*0.5 + 2*0.2 + 1.0 = 1.9, rounds to 2.
        let product = product_with(attributes([
            ("material", text("Chemical-based")),
            ("packaging", text("Plastic bottle")),
            ("biodegradable", flag(false)),
            ("recyclable", flag(true)),
        ]));
        let breakdown = evaluate(&product).expect("scoreable");
        assert!((breakdown.raw_total - 1.9).abs() < 1e-5);
        assert_eq!(breakdown.score.value(), 2);
    }

    #[test]
    fn score_never_leaves_band() {
        let floor = product_with(attributes([("material", text("Unknown"))]));
        assert_eq!(score(&floor).expect("scoreable"), EcoScore::MIN);

        let ceiling = product_with(attributes([
            ("material", text("Bamboo")),
            ("packaging", text("Paper")),
            ("biodegradable", flag(true)),
            ("recyclable", flag(true)),
            ("certifications", list(&["A", "B", "C", "D", "E", "F"])),
            ("carbonNeutral", flag(true)),
            ("local", flag(true)),
            ("fairTrade", flag(true)),
        ]));
        assert_eq!(score(&ceiling).expect("scoreable"), EcoScore::MAX);
    }

    #[test]
    fn half_points_round_away_from_zero() {
        assert_eq!(EcoScore::from_raw(2.5).value(), 3);
        assert_eq!(EcoScore::from_raw(3.5).value(), 4);
        assert_eq!(EcoScore::from_raw(4.49).value(), 4);
        assert_eq!(EcoScore::from_raw(0.0).value(), 1);
        assert_eq!(EcoScore::from_raw(9.0).value(), 5);
    }

    #[test]
    fn adding_any_positive_signal_never_lowers_the_score() {
        let base_attrs = [
            ("material", text("Recycled plastic")),
            ("packaging", text("Plastic bottle")),
        ];
        let base = product_with(attributes(base_attrs.clone()));
        let base_score = score(&base).expect("scoreable");

        let upgrades: Vec<(&str, crate::catalog::AttributeValue)> = vec![
            ("biodegradable", flag(true)),
            ("recyclable", flag(true)),
            ("certifications", list(&["USDA Organic"])),
            ("carbonNeutral", flag(true)),
            ("local", flag(true)),
            ("fairTrade", flag(true)),
        ];

        for (key, value) in upgrades {
            let mut attrs = attributes(base_attrs.clone());
            attrs.insert(key, value);
            let upgraded = score(&product_with(attrs)).expect("scoreable");
            assert!(
                upgraded >= base_score,
                "adding {key} lowered the score: {upgraded} < {base_score}"
            );
        }
    }

    #[test]
    fn scoring_is_idempotent() {
        let product = product_with(attributes([
            ("material", text("Glass")),
            ("packaging", text("Glass jar")),
            ("recyclable", flag(true)),
        ]));
        let first = score(&product).expect("scoreable");
        let second = score(&product).expect("scoreable");
        assert_eq!(first, second);
    }

    #[test]
    fn unrecognized_keys_do_not_affect_the_score() {
        let plain = product_with(attributes([("material", text("Glass"))]));
        let decorated = product_with(attributes([
            ("material", text("Glass")),
            ("brand", text("BeeGood")),
            ("shelfRow", text("7")),
        ]));
        assert_eq!(
            score(&plain).expect("scoreable"),
            score(&decorated).expect("scoreable")
        );
    }

    #[test]
    fn empty_attribute_map_is_a_catalog_bug() {
        let product = product_with(ProductAttributes::new());
        let err = score(&product).expect_err("nothing to score");
        assert!(matches!(err, ScoreError::MissingAttributes { .. }));
    }

    #[test]
    fn rank_tables_are_exact_match() {
        // "Glass jar with metal lid" is not the "Glass jar" entry.
        let product = product_with(attributes([
            ("material", text("Glass")),
            ("packaging", text("Glass jar with metal lid")),
        ]));
        let breakdown = evaluate(&product).expect("scoreable");
        let packaging = breakdown
            .components
            .iter()
            .find(|component| component.signal == ScoreSignal::Packaging)
            .expect("packaging component present");
        assert!((packaging.points - 0.2).abs() < 1e-6);
    }
}
