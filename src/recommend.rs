//! Curated alternatives and contextual guidance for a scanned product.
//!
//! Alternatives are an editorial mapping, not a similarity search: an ordered
//! dispatch table keyed by category and a lowercased name keyword, with an
//! explicit catch-all so the caller always receives at least one suggestion.

use serde::{Deserialize, Serialize};

use crate::catalog::{attributes, flag, list, text, Product, ProductAttributes};
use crate::scoring::EcoScore;

/// Hand-picked substitute with an equal-or-better EcoScore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alternative {
    pub id: String,
    pub name: String,
    pub ecoscore: EcoScore,
    pub price: String,
    pub image: String,
    pub improvement: String,
    pub attributes: ProductAttributes,
}

fn alternative(
    id: &str,
    name: &str,
    ecoscore: u8,
    price: &str,
    improvement: &str,
    attrs: ProductAttributes,
) -> Alternative {
    Alternative {
        id: id.to_string(),
        name: name.to_string(),
        ecoscore: EcoScore::from_raw(f32::from(ecoscore)),
        price: price.to_string(),
        image: "/api/placeholder/200/200".to_string(),
        improvement: improvement.to_string(),
        attributes: attrs,
    }
}

/// One dispatch rule: category match plus keyword containment on the
/// lowercased product name. First matching rule wins, in declared order.
struct SwapRule {
    category: &'static str,
    keyword: &'static str,
    build: fn() -> Vec<Alternative>,
}

const SWAP_RULES: &[SwapRule] = &[
    SwapRule {
        category: "Beauty",
        keyword: "shampoo",
        build: shampoo_swaps,
    },
    SwapRule {
        category: "Beauty",
        keyword: "hairbrush",
        build: hairbrush_swaps,
    },
    SwapRule {
        category: "Personal Care",
        keyword: "razor",
        build: razor_swaps,
    },
    SwapRule {
        category: "Home",
        keyword: "sponge",
        build: sponge_swaps,
    },
    SwapRule {
        category: "Home",
        keyword: "detergent",
        build: detergent_swaps,
    },
    SwapRule {
        category: "Grocery",
        keyword: "coffee",
        build: coffee_swaps,
    },
    SwapRule {
        category: "Grocery",
        keyword: "honey",
        build: honey_swaps,
    },
    SwapRule {
        category: "Kitchen",
        keyword: "container",
        build: container_swaps,
    },
];

/// Curated higher-scoring substitutes for `product`; never empty.
pub fn alternatives(product: &Product) -> Vec<Alternative> {
    let name = product.name.to_lowercase();
    for rule in SWAP_RULES {
        if rule.category == product.category && name.contains(rule.keyword) {
            return (rule.build)();
        }
    }
    vec![fallback_alternative()]
}

/// Generic suggestion used when no curated rule matches.
pub fn fallback_alternative() -> Alternative {
    alternative(
        "000001",
        "Eco-Friendly Alternative",
        4,
        "$8.99",
        "Better environmental profile",
        attributes([
            ("material", text("Sustainable alternative")),
            ("packaging", text("Eco-friendly")),
            ("impact", text("Reduced carbon footprint")),
        ]),
    )
}

fn shampoo_swaps() -> Vec<Alternative> {
    vec![
        alternative(
            "235689",
            "Shampoo Bar (Package Free)",
            5,
            "$7.99",
            "Eliminates plastic bottle entirely",
            attributes([
                ("material", text("Solid formulation")),
                ("packaging", text("None")),
                ("wasteReduction", text("100% packaging-free")),
                ("biodegradable", flag(true)),
                ("certifications", list(&["Vegan", "Cruelty-Free"])),
            ]),
        ),
        alternative(
            "874563",
            "Refillable Shampoo System",
            4,
            "$12.99 (includes bottle)",
            "Reduces packaging waste by 80%",
            attributes([
                ("material", text("Liquid concentrate")),
                ("packaging", text("Aluminum bottle")),
                ("refillCount", text("10+ uses")),
                ("recyclable", flag(true)),
            ]),
        ),
    ]
}

fn hairbrush_swaps() -> Vec<Alternative> {
    vec![alternative(
        "345712",
        "100% Biodegradable Hairbrush",
        5,
        "$14.99",
        "Fully compostable including bristles",
        attributes([
            ("material", text("Wood and natural bristles")),
            ("packaging", text("None")),
            ("biodegradable", flag(true)),
            ("compostTime", text("6-12 months")),
        ]),
    )]
}

fn razor_swaps() -> Vec<Alternative> {
    vec![alternative(
        "456123",
        "Compostable Bamboo Razor",
        5,
        "$9.99",
        "Fully biodegradable alternative",
        attributes([
            ("material", text("Bamboo with steel blade")),
            ("packaging", text("Compostable cellulose")),
            ("biodegradable", flag(true)),
            ("bladeReplacements", text("Yes")),
        ]),
    )]
}

fn sponge_swaps() -> Vec<Alternative> {
    vec![
        alternative(
            "678345",
            "Plant-Based Loofah Sponge",
            5,
            "$4.49",
            "100% natural and compostable",
            attributes([
                ("material", text("Loofah plant")),
                ("packaging", text("None")),
                ("compostTime", text("3-6 months")),
                ("biodegradable", flag(true)),
            ]),
        ),
        alternative(
            "789123",
            "Reusable Silicone Sponge",
            4,
            "$6.99",
            "Lasts years instead of weeks",
            attributes([
                ("material", text("Food-grade silicone")),
                ("packaging", text("Recycled paper")),
                ("lifespan", text("2+ years")),
                ("recyclable", flag(true)),
            ]),
        ),
    ]
}

fn detergent_swaps() -> Vec<Alternative> {
    vec![alternative(
        "890456",
        "Laundry Detergent Sheets",
        5,
        "$12.99 (60 loads)",
        "Ultra-lightweight, no plastic",
        attributes([
            ("material", text("Concentrated sheets")),
            ("packaging", text("Compostable pouch")),
            ("carbonFootprint", text("80% lower")),
            ("biodegradable", flag(true)),
        ]),
    )]
}

fn coffee_swaps() -> Vec<Alternative> {
    vec![
        alternative(
            "901234",
            "Shade-Grown Bird Friendly Coffee",
            5,
            "$9.99",
            "Preserves bird habitats",
            attributes([
                ("material", text("Organic coffee")),
                ("packaging", text("Compostable bag")),
                ("wildlifeImpact", text("Positive")),
                ("certifications", list(&["Bird Friendly", "Organic"])),
            ]),
        ),
        alternative(
            "012567",
            "Coffee Pod Refill System",
            5,
            "$24.99 (starter kit)",
            "Eliminates single-use pods",
            attributes([
                ("material", text("Stainless steel")),
                ("packaging", text("None")),
                ("wasteReduction", text("100% vs disposable pods")),
                ("reusable", flag(true)),
            ]),
        ),
    ]
}

fn honey_swaps() -> Vec<Alternative> {
    vec![alternative(
        "123890",
        "Local Raw Honey in Mason Jar",
        5,
        "$8.99",
        "Supports local beekeepers",
        attributes([
            ("material", text("Raw honey")),
            ("packaging", text("Reusable glass jar")),
            ("foodMiles", text("<50 miles")),
            ("reusable", flag(true)),
        ]),
    )]
}

fn container_swaps() -> Vec<Alternative> {
    vec![
        alternative(
            "234901",
            "Glass Food Storage Set",
            5,
            "$29.99 (5-piece set)",
            "Non-toxic and endlessly reusable",
            attributes([
                ("material", text("Glass with bamboo lids")),
                ("packaging", text("Recycled cardboard")),
                ("microwaveSafe", flag(true)),
                ("freezerSafe", flag(true)),
            ]),
        ),
        alternative(
            "345012",
            "Stainless Steel Lunch Box",
            5,
            "$18.99",
            "Unbreakable and durable",
            attributes([
                ("material", text("Stainless steel")),
                ("packaging", text("None")),
                ("lifespan", text("10+ years")),
                ("recyclable", flag(true)),
            ]),
        ),
    ]
}

/// Materials that warrant a plastic-reduction nudge.
const PROBLEMATIC_MATERIALS: &[&str] = &[
    "Plastic",
    "Synthetic fibers",
    "Polypropylene",
    "Chemical-based",
];

/// Contextual guidance, evaluated in fixed rule order; never empty.
pub fn tips(product: &Product, score: EcoScore) -> Vec<String> {
    let attrs = &product.attributes;
    let mut tips = Vec::new();

    if let Some(material) = attrs.text("material") {
        if PROBLEMATIC_MATERIALS.contains(&material) {
            tips.push(
                "Consider alternatives with less plastic content to reduce microplastic pollution"
                    .to_string(),
            );
        }
    }

    if !attrs.flag("recyclable") {
        tips.push(
            "This item cannot be recycled - please dispose properly to avoid contamination"
                .to_string(),
        );
    }

    if attrs.flag("biodegradable") {
        tips.push(
            "This product is biodegradable - compost if possible to complete the lifecycle"
                .to_string(),
        );
    }

    if score.value() < 3 {
        tips.push(
            "We found better alternatives with higher EcoScores - check the suggestions"
                .to_string(),
        );
    } else if score.value() >= 4 {
        tips.push("Great choice! This product has excellent sustainability credentials".to_string());
    }

    if let Some(packaging) = attrs.text("packaging") {
        if packaging.to_lowercase().contains("plastic") {
            tips.push(
                "Look for brands that offer take-back programs for their packaging".to_string(),
            );
        }
    }

    if tips.is_empty() {
        tips.push(
            "Small changes make a big difference - consider reusable options next time".to_string(),
        );
    }

    tips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{attributes, flag, text, CatalogLookup, StaticCatalog};
    use crate::scoring;

    fn product(name: &str, category: &str, attrs: ProductAttributes) -> Product {
        Product {
            item_id: "1".to_string(),
            name: name.to_string(),
            category: category.to_string(),
            price: "$1.00".to_string(),
            image: "/api/placeholder/300/300".to_string(),
            description: "test".to_string(),
            attributes: attrs,
        }
    }

    #[test]
    fn shampoo_rule_matches_on_category_and_keyword() {
        let shampoo = product(
            "Head & Shoulders Classic Clean Shampoo",
            "Beauty",
            attributes([("material", text("Chemical-based"))]),
        );
        let swaps = alternatives(&shampoo);
        assert_eq!(swaps.len(), 2);
        assert_eq!(swaps[0].name, "Shampoo Bar (Package Free)");
        assert_eq!(swaps[0].ecoscore.value(), 5);
    }

    #[test]
    fn keyword_requires_matching_category() {
        // A "shampoo" outside Beauty falls through to the generic suggestion.
        let misfiled = product(
            "Carpet Shampoo",
            "Home",
            attributes([("material", text("Chemical-based"))]),
        );
        let swaps = alternatives(&misfiled);
        assert_eq!(swaps.len(), 1);
        assert_eq!(swaps[0].name, "Eco-Friendly Alternative");
    }

    #[test]
    fn fallback_keeps_every_scan_with_a_suggestion() {
        let generic = product(
            "Generic Product",
            "Miscellaneous",
            attributes([("material", text("Unknown"))]),
        );
        let swaps = alternatives(&generic);
        assert_eq!(swaps.len(), 1);
        assert!(swaps[0].ecoscore.value() >= 4);
    }

    #[test]
    fn every_curated_entry_and_the_fallback_score_at_least_four() {
        // Data-quality sweep over the whole dispatch table.
        let mut all = Vec::new();
        for rule in SWAP_RULES {
            all.extend((rule.build)());
        }
        all.push(fallback_alternative());
        for entry in all {
            assert!(
                entry.ecoscore.value() >= 4,
                "curated entry '{}' scores below 4",
                entry.name
            );
        }
    }

    #[test]
    fn curated_entries_beat_the_products_they_replace() {
        // Every demo product that hits a curated rule must never out-score
        // its suggested swaps.
        let catalog = StaticCatalog::standard();
        for code in [
            "036000291452",
            "234567890",
            "456789012",
            "890123456",
            "789012345",
            "567890123",
            "678901234",
            "012345678",
        ] {
            let product = catalog.lookup(code).expect("demo code resolves");
            let score = scoring::score(&product).expect("demo product scores");
            for swap in alternatives(&product) {
                assert!(
                    swap.ecoscore >= score,
                    "'{}' (score {score}) out-scores suggested '{}'",
                    product.name,
                    swap.name
                );
            }
        }
    }

    #[test]
    fn tips_fire_in_declared_order() {
        let sponge = product(
            "Plastic Sponge",
            "Home",
            attributes([
                ("material", text("Synthetic fibers")),
                ("packaging", text("Plastic wrap")),
                ("biodegradable", flag(false)),
                ("recyclable", flag(false)),
            ]),
        );
        let score = scoring::score(&sponge).expect("scoreable");
        let tips = tips(&sponge, score);

        assert_eq!(tips.len(), 4);
        assert!(tips[0].contains("microplastic"));
        assert!(tips[1].contains("cannot be recycled"));
        assert!(tips[2].contains("better alternatives"));
        assert!(tips[3].contains("take-back"));
    }

    #[test]
    fn score_branches_are_mutually_exclusive() {
        let winner = product(
            "Bamboo Cutting Board",
            "Kitchen",
            attributes([
                ("material", text("Bamboo")),
                ("packaging", text("Recycled cardboard")),
                ("biodegradable", flag(true)),
                ("recyclable", flag(true)),
            ]),
        );
        let score = scoring::score(&winner).expect("scoreable");
        assert!(score.value() >= 4);

        let tips = tips(&winner, score);
        assert!(tips.iter().any(|tip| tip.contains("Great choice")));
        assert!(!tips.iter().any(|tip| tip.contains("better alternatives")));
    }

    #[test]
    fn middling_score_skips_both_score_tips() {
        // 3*0.5 + 3*0.2 + 1.0 = 3.1 -> 3: neither score branch fires.
        let exactly_three = product(
            "Plain Item",
            "Miscellaneous",
            attributes([
                ("material", text("Recycled plastic")),
                ("packaging", text("Recycled HDPE plastic")),
                ("recyclable", flag(true)),
            ]),
        );
        let score = scoring::score(&exactly_three).expect("scoreable");
        assert_eq!(score.value(), 3);

        let tips = tips(&exactly_three, score);
        assert!(!tips.iter().any(|tip| tip.contains("Great choice")));
        assert!(!tips.iter().any(|tip| tip.contains("better alternatives")));
    }

    #[test]
    fn fallback_tip_when_no_rule_fires() {
        // Recyclable, not biodegradable, score 3, packaging text free of
        // "plastic": 3*0.5 + 4*0.2 + 1.0 = 3.3 -> 3.
        let plain = product(
            "Plain Item",
            "Miscellaneous",
            attributes([
                ("material", text("Recycled plastic")),
                ("packaging", text("Metal tin")),
                ("recyclable", flag(true)),
            ]),
        );
        let score = scoring::score(&plain).expect("scoreable");
        assert_eq!(score.value(), 3);

        let tips = tips(&plain, score);
        assert_eq!(tips.len(), 1);
        assert!(tips[0].contains("Small changes"));
    }
}
