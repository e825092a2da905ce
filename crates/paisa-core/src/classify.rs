//! Keyword-based merchant classification
//!
//! The description and merchant are joined, lowercased, and tested against each
//! category's keywords in table order. The first category with any substring hit
//! wins; there is no scoring and no longest-match preference.
//!
//! Table order therefore decides ambiguous text. "lunch at the mall" contains a
//! food keyword and a shopping keyword and resolves to `food` because food comes
//! first. "mobile" is listed under both shopping and bills and always yields
//! `shopping`. Short keywords also hit inside longer words ("bus" in "business",
//! "auto" in "automatic"). These outcomes are part of the contract and existing
//! data depends on them.

use crate::models::Category;

/// Category keywords, in match order
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Food,
        &[
            "swiggy",
            "zomato",
            "dominos",
            "pizzahut",
            "kfc",
            "mcdonalds",
            "burgerking",
            "subway",
            "starbucks",
            "cafe",
            "restaurant",
            "food",
            "dining",
            "meal",
            "lunch",
            "dinner",
            "breakfast",
            "tiffin",
        ],
    ),
    (
        Category::Shopping,
        &[
            "amazon",
            "flipkart",
            "myntra",
            "ajio",
            "nykaa",
            "tatacliq",
            "shop",
            "store",
            "mall",
            "market",
            "clothing",
            "fashion",
            "electronics",
            "gadgets",
            "mobile",
            "laptop",
            "shoes",
        ],
    ),
    (
        Category::Transport,
        &[
            "ola", "uber", "rapido", "meru", "taxi", "metro", "bus", "train", "railway", "airport",
            "cab", "auto", "rickshaw", "petrol", "diesel", "fuel", "parking", "toll",
        ],
    ),
    (
        Category::Bills,
        &[
            "recharge",
            "bill",
            "electricity",
            "water",
            "gas",
            "phone",
            "internet",
            "broadband",
            "mobile",
            "prepaid",
            "postpaid",
            "dth",
            "cable",
            "subscription",
            "netflix",
            "prime",
            "hotstar",
        ],
    ),
    (
        Category::Rent,
        &[
            "rent",
            "emi",
            "loan",
            "housing",
            "property",
            "flat",
            "apartment",
            "mortgage",
            "installment",
            "credit card",
            "personal loan",
        ],
    ),
    (
        Category::Health,
        &[
            "hospital",
            "doctor",
            "medical",
            "pharmacy",
            "medicine",
            "clinic",
            "health",
            "insurance",
            "diagnostic",
            "lab",
            "test",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "movie",
            "cinema",
            "theatre",
            "game",
            "pub",
            "bar",
            "concert",
            "event",
            "ticket",
            "show",
            "entertainment",
            "youtube",
            "spotify",
            "music",
            "gaming",
        ],
    ),
    (
        Category::Education,
        &[
            "school",
            "college",
            "university",
            "course",
            "fees",
            "education",
            "tutorial",
            "class",
            "exam",
            "book",
            "stationery",
        ],
    ),
];

/// Classifier over an ordered keyword table
#[derive(Debug, Clone)]
pub struct MerchantClassifier {
    table: Vec<(Category, Vec<String>)>,
}

impl Default for MerchantClassifier {
    fn default() -> Self {
        Self::with_table(CATEGORY_KEYWORDS)
    }
}

impl MerchantClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a classifier from a custom table; keywords are lowercased
    pub fn with_table(table: &[(Category, &[&str])]) -> Self {
        let table = table
            .iter()
            .map(|(category, keywords)| {
                (
                    *category,
                    keywords.iter().map(|k| k.to_lowercase()).collect(),
                )
            })
            .collect();
        Self { table }
    }

    /// First category (in table order) with a keyword inside the text, else `others`
    pub fn classify(&self, description: &str, merchant: &str) -> Category {
        let text = format!("{} {}", description, merchant).to_lowercase();

        self.table
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|(category, _)| *category)
            .unwrap_or(Category::Others)
    }
}

/// Classify with the built-in keyword table
pub fn classify(description: &str, merchant: &str) -> Category {
    MerchantClassifier::default().classify(description, merchant)
}
