//! Product model and the keyed store that resolves decoded barcodes.
//!
//! The catalog is an injected collaborator: the scan pipeline only depends on
//! [`CatalogLookup`]. The built-in [`StaticCatalog`] carries the curated demo
//! inventory so the service is fully functional without an external store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single product attribute value. Attribute maps are open-ended: scoring
/// reads the keys it recognizes and ignores the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

/// Ordered attribute map attached to every product. Keys use the upstream
/// camelCase spellings (`carbonNeutral`, `fairTrade`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductAttributes(BTreeMap<String, AttributeValue>);

impl ProductAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text value of `key`, or `None` when absent or not textual.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(AttributeValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    /// Boolean value of `key`; absent or non-boolean reads as `false`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(AttributeValue::Flag(true)))
    }

    /// List value of `key`; absent or non-list reads as empty.
    pub fn list(&self, key: &str) -> &[String] {
        match self.0.get(key) {
            Some(AttributeValue::List(values)) => values,
            _ => &[],
        }
    }
}

/// Builder used by the static tables below and by tests.
pub fn attributes<const N: usize>(entries: [(&str, AttributeValue); N]) -> ProductAttributes {
    let mut attrs = ProductAttributes::new();
    for (key, value) in entries {
        attrs.insert(key, value);
    }
    attrs
}

pub fn text(value: &str) -> AttributeValue {
    AttributeValue::Text(value.to_string())
}

pub fn flag(value: bool) -> AttributeValue {
    AttributeValue::Flag(value)
}

pub fn list(values: &[&str]) -> AttributeValue {
    AttributeValue::List(values.iter().map(|value| value.to_string()).collect())
}

/// Catalog record for one purchasable item. Immutable once looked up; the
/// scan pipeline derives new views instead of mutating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub item_id: String,
    pub name: String,
    pub category: String,
    pub price: String,
    pub image: String,
    pub description: String,
    pub attributes: ProductAttributes,
}

impl Product {
    /// Stand-in record for codes the catalog does not know. Material and
    /// packaging are Unknown so the score engine lands on the floor rank
    /// instead of refusing to score.
    pub fn unknown() -> Self {
        Self {
            item_id: "0".to_string(),
            name: "Generic Product".to_string(),
            category: "Miscellaneous".to_string(),
            price: "$0.00".to_string(),
            image: "/api/placeholder/300/300".to_string(),
            description: "Product not found in database".to_string(),
            attributes: attributes([("material", text("Unknown")), ("packaging", text("Unknown"))]),
        }
    }
}

/// Keyed store mapping a decoded barcode payload to a product record.
pub trait CatalogLookup: Send + Sync {
    fn lookup(&self, code: &str) -> Option<Product>;
}

/// In-process catalog seeded with the curated demo inventory.
pub struct StaticCatalog {
    products: BTreeMap<String, Product>,
}

impl StaticCatalog {
    pub fn standard() -> Self {
        let mut products = BTreeMap::new();
        for (code, product) in demo_inventory() {
            products.insert(code.to_string(), product);
        }
        Self { products }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl CatalogLookup for StaticCatalog {
    fn lookup(&self, code: &str) -> Option<Product> {
        self.products.get(code).cloned()
    }
}

/// Display URL for a cosmetic placeholder image. Not consumed by scoring.
pub fn placeholder_url(width: u32, height: u32) -> String {
    format!("https://via.placeholder.com/{width}x{height}/4ade80/ffffff?text=EcoProduct")
}

fn demo_inventory() -> Vec<(&'static str, Product)> {
    fn entry(
        item_id: &str,
        name: &str,
        category: &str,
        price: &str,
        image: &str,
        description: &str,
        attrs: ProductAttributes,
    ) -> Product {
        Product {
            item_id: item_id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            price: price.to_string(),
            image: image.to_string(),
            description: description.to_string(),
            attributes: attrs,
        }
    }

    vec![
        (
            "036000291452",
            entry(
                "36000291452",
                "Head & Shoulders Classic Clean Shampoo",
                "Beauty",
                "$4.97",
                "/images/shampoo-barcode.png",
                "Anti-dandruff shampoo with zinc pyrithione for clean, healthy hair",
                attributes([
                    ("brand", text("Head & Shoulders")),
                    ("material", text("Chemical-based")),
                    ("packaging", text("Plastic bottle")),
                    ("ingredients", text("Zinc pyrithione, sulfates")),
                    ("certifications", list(&[])),
                    ("biodegradable", flag(false)),
                    ("recyclable", flag(true)),
                    ("size", text("13.5 fl oz")),
                    ("origin", text("USA")),
                ]),
            ),
        ),
        (
            "123456789",
            entry(
                "12417832",
                "Organic Lavender Shampoo",
                "Beauty",
                "$9.99",
                "/api/placeholder/300/300",
                "Gentle organic shampoo with natural lavender extract",
                attributes([
                    ("brand", text("EcoClean")),
                    ("material", text("Organic")),
                    ("packaging", text("Recycled plastic")),
                    ("ingredients", text("Plant-based, SLS-free")),
                    ("certifications", list(&["USDA Organic", "Leaping Bunny"])),
                    ("biodegradable", flag(false)),
                    ("recyclable", flag(true)),
                    ("size", text("16 fl oz")),
                    ("origin", text("USA")),
                ]),
            ),
        ),
        (
            "234567890",
            entry(
                "23568914",
                "Bamboo Hairbrush",
                "Beauty",
                "$12.99",
                "/api/placeholder/300/300",
                "Sustainable bamboo hairbrush with natural bristles",
                attributes([
                    ("brand", text("GreenTools")),
                    ("material", text("Bamboo")),
                    ("packaging", text("Cardboard")),
                    ("biodegradable", flag(true)),
                    ("recyclable", flag(true)),
                    ("durability", text("High")),
                    ("bristles", text("Natural boar hair")),
                    ("origin", text("China")),
                ]),
            ),
        ),
        (
            "345678901",
            entry(
                "34679025",
                "Recycled Paper Towels",
                "Home",
                "$4.99",
                "/api/placeholder/300/300",
                "Strong and absorbent paper towels made from 100% recycled materials",
                attributes([
                    ("brand", text("EcoHome")),
                    ("material", text("Recycled paper")),
                    ("packaging", text("Paper")),
                    ("biodegradable", flag(true)),
                    ("recyclable", flag(true)),
                    ("postConsumerWaste", text("80%")),
                    ("sheets", text("120 sheets per roll")),
                    ("rolls", text("6 rolls")),
                ]),
            ),
        ),
        (
            "456789012",
            entry(
                "45780136",
                "Metal Safety Razor",
                "Personal Care",
                "$19.99",
                "/api/placeholder/300/300",
                "Durable stainless steel safety razor for zero-waste shaving",
                attributes([
                    ("brand", text("ZeroWaste")),
                    ("material", text("Stainless steel")),
                    ("packaging", text("Metal tin")),
                    ("biodegradable", flag(false)),
                    ("recyclable", flag(true)),
                    ("lifespan", text("Lifetime")),
                    ("blades", text("10 replacement blades included")),
                    ("weight", text("3.2 oz")),
                ]),
            ),
        ),
        (
            "567890123",
            entry(
                "56891247",
                "Organic Fair Trade Coffee",
                "Grocery",
                "$8.49",
                "/api/placeholder/300/300",
                "Rich, full-bodied coffee beans sourced from sustainable farms",
                attributes([
                    ("brand", text("EarthBean")),
                    ("material", text("Organic coffee")),
                    ("packaging", text("Compostable bag")),
                    ("certifications", list(&["USDA Organic", "Fair Trade"])),
                    ("biodegradable", flag(true)),
                    ("carbonNeutral", flag(true)),
                    ("roast", text("Medium")),
                    ("origin", text("Guatemala")),
                    ("weight", text("12 oz")),
                ]),
            ),
        ),
        (
            "678901234",
            entry(
                "67902358",
                "Glass Jar Honey",
                "Grocery",
                "$6.99",
                "/api/placeholder/300/300",
                "Pure wildflower honey from local beekeepers",
                attributes([
                    ("brand", text("BeeGood")),
                    ("material", text("Glass")),
                    ("packaging", text("Glass jar with metal lid")),
                    ("local", flag(true)),
                    ("recyclable", flag(true)),
                    ("reusable", flag(true)),
                    ("type", text("Wildflower")),
                    ("size", text("16 oz")),
                    ("origin", text("Local farms")),
                ]),
            ),
        ),
        (
            "789012345",
            entry(
                "78013469",
                "Eco Laundry Detergent",
                "Home",
                "$11.49",
                "/api/placeholder/300/300",
                "Concentrated plant-based laundry detergent for sensitive skin",
                attributes([
                    ("brand", text("CleanGreen")),
                    ("material", text("Plant-based")),
                    ("packaging", text("Recycled HDPE plastic")),
                    ("biodegradable", flag(true)),
                    ("recyclable", flag(true)),
                    ("concentrated", flag(true)),
                    ("loads", text("64 loads")),
                    ("scent", text("Lavender")),
                    ("hypoallergenic", flag(true)),
                ]),
            ),
        ),
        (
            "890123456",
            entry(
                "89124570",
                "Plastic Sponge",
                "Home",
                "$2.49",
                "/api/placeholder/300/300",
                "Multi-purpose cleaning sponge for kitchen and bathroom",
                attributes([
                    ("brand", text("QuickClean")),
                    ("material", text("Synthetic fibers")),
                    ("packaging", text("Plastic wrap")),
                    ("biodegradable", flag(false)),
                    ("recyclable", flag(false)),
                    ("durability", text("Low")),
                    ("count", text("4 sponges")),
                    ("antimicrobial", flag(true)),
                ]),
            ),
        ),
        (
            "901234567",
            entry(
                "90235681",
                "Bamboo Cutting Board",
                "Kitchen",
                "$14.99",
                "/api/placeholder/300/300",
                "Durable bamboo cutting board with juice groove",
                attributes([
                    ("brand", text("BambooWare")),
                    ("material", text("Bamboo")),
                    ("packaging", text("Recycled cardboard")),
                    ("biodegradable", flag(true)),
                    ("recyclable", flag(true)),
                    ("lifespan", text("5+ years")),
                    ("size", text("12x8 inches")),
                    ("thickness", text("0.75 inches")),
                    ("antimicrobial", flag(true)),
                ]),
            ),
        ),
        (
            "012345678",
            entry(
                "01346792",
                "Plastic Food Container",
                "Kitchen",
                "$3.99",
                "/api/placeholder/300/300",
                "Airtight food storage container for meal prep",
                attributes([
                    ("brand", text("StoreRight")),
                    ("material", text("Polypropylene")),
                    ("packaging", text("Plastic wrap")),
                    ("biodegradable", flag(false)),
                    ("recyclable", flag(true)),
                    ("bpaFree", flag(true)),
                    ("capacity", text("32 oz")),
                    ("microwaveSafe", flag(true)),
                    ("dishwasherSafe", flag(true)),
                ]),
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_resolves_known_code() {
        let catalog = StaticCatalog::standard();
        let product = catalog
            .lookup("036000291452")
            .expect("shampoo code present in demo inventory");
        assert_eq!(product.name, "Head & Shoulders Classic Clean Shampoo");
        assert_eq!(product.attributes.text("material"), Some("Chemical-based"));
        assert!(product.attributes.flag("recyclable"));
        assert!(!product.attributes.flag("biodegradable"));
    }

    #[test]
    fn standard_catalog_misses_unknown_code() {
        let catalog = StaticCatalog::standard();
        assert!(catalog.lookup("999999999999").is_none());
        assert_eq!(catalog.len(), 11);
    }

    #[test]
    fn unknown_product_is_scoreable() {
        let product = Product::unknown();
        assert_eq!(product.category, "Miscellaneous");
        assert!(!product.attributes.is_empty());
        assert_eq!(product.attributes.text("material"), Some("Unknown"));
    }

    #[test]
    fn attribute_accessors_default_on_absent_keys() {
        let attrs = attributes([("material", text("Bamboo"))]);
        assert_eq!(attrs.text("material"), Some("Bamboo"));
        assert!(!attrs.flag("recyclable"));
        assert!(attrs.list("certifications").is_empty());
    }

    #[test]
    fn placeholder_url_embeds_dimensions() {
        assert_eq!(
            placeholder_url(300, 200),
            "https://via.placeholder.com/300x200/4ade80/ffffff?text=EcoProduct"
        );
    }
}
