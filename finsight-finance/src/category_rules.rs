//! Deterministic keyword rules mapping free-text descriptions to a spending
//! category. Used when the prediction service is unavailable.
//!
//! Rules are checked in order and the first hit wins, so more specific
//! buckets (groceries delivered by a food app, utility recharges) come first.

use finsight_core::Category;

const BILLS: &[&str] = &[
    "electricity", "water bill", "gas bill", "lpg", "broadband", "wifi",
    "recharge", "postpaid", "prepaid", "bill payment", "bill pay", "airtel",
    "jio", "bsnl", "vodafone", "house rent", "rent payment", "rent paid",
    "insurance", "loan emi", "maintenance charge", "utility",
];

const EDUCATION: &[&str] = &[
    "tuition", "school fee", "college", "university", "exam fee", "udemy",
    "coursera", "byju", "unacademy", "course fee", "textbook",
];

const HEALTH: &[&str] = &[
    "pharmacy", "pharmeasy", "medplus", "apollo", "1mg", "netmeds", "chemist",
    "hospital", "clinic", "doctor", "dental", "diagnostic", "lab test",
    "medical", "medicine", "gym", "fitness",
];

const GROCERIES: &[&str] = &[
    "grocery", "groceries", "supermarket", "bigbasket", "blinkit", "zepto",
    "instamart", "dmart", "kirana", "vegetable", "fruits", "milk",
    "reliance fresh", "more retail", "big bazaar",
];

const FOOD: &[&str] = &[
    "swiggy", "zomato", "restaurant", "cafe", "coffee", "pizza", "burger",
    "domino", "mcdonald", "kfc", "starbucks", "bakery", "dining",
    "lunch", "dinner", "breakfast", "food",
];

const TRANSPORT: &[&str] = &[
    "uber", "olacabs", "ola ride", "ola cab", "rapido", "metro", "redbus",
    "irctc", "railway", "train ticket", "petrol", "diesel", "fuel", "parking",
    "toll", "fastag", "taxi", "cab ride",
];

const ENTERTAINMENT: &[&str] = &[
    "netflix", "spotify", "prime video", "hotstar", "youtube premium",
    "movie", "cinema", "pvr", "inox", "bookmyshow", "concert", "gaming",
    "steam", "playstation",
];

const SHOPPING: &[&str] = &[
    "amazon", "flipkart", "myntra", "ajio", "meesho", "nykaa", "shopping",
    "clothing", "apparel", "footwear", "shoes", "electronics", "croma",
];

/// Ordered rule table
const RULES: &[(Category, &[&str])] = &[
    (Category::Bills, BILLS),
    (Category::Education, EDUCATION),
    (Category::Health, HEALTH),
    (Category::Groceries, GROCERIES),
    (Category::Food, FOOD),
    (Category::Transport, TRANSPORT),
    (Category::Entertainment, ENTERTAINMENT),
    (Category::Shopping, SHOPPING),
];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

/// First matching category, or `None` when nothing matches.
pub fn rule_based_category(text: &str) -> Option<Category> {
    let text = text.to_lowercase();
    if text.trim().is_empty() {
        return None;
    }
    RULES
        .iter()
        .find(|(_, keywords)| contains_any(&text, keywords))
        .map(|(category, _)| *category)
}

/// Like [`rule_based_category`], falling back to `default` on no match.
pub fn categorize_or(text: &str, default: Category) -> Category {
    rule_based_category(text).unwrap_or(default)
}
