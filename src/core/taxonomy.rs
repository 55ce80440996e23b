//! Static bilingual cuisine taxonomy and keyword expansion.
//!
//! The table maps canonical cuisine categories to English and Chinese
//! synonyms, including dish names and venue-type words. Expansion is pure
//! and stateless; the same table serves both desired-cuisine matching and
//! dietary-restriction matching.

/// Canonical categories in lookup order. The first matching category wins;
/// there is no multi-category union.
const CUISINE_MAP: &[(&str, &[&str])] = &[
    (
        "italian",
        &["italian", "italy", "pasta", "pizza", "risotto", "trattoria", "osteria", "意大利"],
    ),
    (
        "japanese",
        &[
            "japanese", "japan", "sushi", "ramen", "izakaya", "tempura", "sashimi", "udon",
            "yakitori", "日本",
        ],
    ),
    (
        "chinese",
        &[
            "chinese", "china", "cantonese", "sichuan", "dim sum", "dumpling", "noodle", "中菜",
            "中國",
        ],
    ),
    (
        "french",
        &["french", "france", "bistro", "brasserie", "croissant", "法國"],
    ),
    ("korean", &["korean", "korea", "bbq", "kimchi", "bibimbap", "韓國"]),
    ("thai", &["thai", "thailand", "pad thai", "tom yum", "泰國"]),
    ("vietnamese", &["vietnamese", "vietnam", "pho", "banh mi", "越南"]),
    ("indian", &["indian", "india", "curry", "tandoori", "naan", "印度"]),
    ("mexican", &["mexican", "mexico", "taco", "burrito", "nacho", "墨西哥"]),
    ("american", &["american", "burger", "steak", "bbq", "diner", "美國"]),
    ("spanish", &["spanish", "spain", "tapas", "paella", "西班牙"]),
    ("greek", &["greek", "greece", "gyro", "souvlaki", "希臘"]),
    ("turkish", &["turkish", "turkey", "kebab", "土耳其"]),
    (
        "middle eastern",
        &["middle eastern", "lebanese", "falafel", "hummus", "shawarma"],
    ),
    (
        "bar",
        &[
            "bar", "pub", "tavern", "wine bar", "cocktail", "lounge", "brewery", "酒吧", "wine",
            "beer",
        ],
    ),
    (
        "cafe",
        &["cafe", "coffee", "bakery", "dessert", "patisserie", "咖啡", "茶餐廳"],
    ),
    (
        "seafood",
        &["seafood", "fish", "oyster", "lobster", "crab", "prawn", "海鮮"],
    ),
    ("steak", &["steak", "steakhouse", "beef", "grill", "牛扒"]),
    (
        "vegetarian",
        &["vegetarian", "vegan", "plant-based", "veggie", "素食"],
    ),
    ("asian", &["asian", "pan-asian", "fusion"]),
    ("european", &["european", "continental"]),
    ("international", &["international", "fusion", "contemporary"]),
    ("buffet", &["buffet", "all you can eat", "自助餐"]),
    ("hotpot", &["hotpot", "hot pot", "steamboat", "火鍋"]),
    ("bbq", &["bbq", "barbecue", "grill", "yakiniku", "燒烤"]),
    ("noodles", &["noodles", "ramen", "udon", "pho", "麵"]),
    ("dim sum", &["dim sum", "yum cha", "點心", "飲茶"]),
];

/// Character count, not byte length. Length rules throughout the engine
/// count Unicode scalar values so Chinese terms behave like the legacy
/// system.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Expand a cuisine or restriction token into its search-term set.
///
/// The token itself and its whitespace-split words are always candidates.
/// If the lowercased token equals one of a category's synonyms, or any
/// synonym occurs as a substring of it, that category's entire synonym list
/// joins the result. Output is lowercased, de-duplicated in first-seen
/// order, and filtered to terms of at least three characters.
pub fn expand(token: &str) -> Vec<String> {
    let query = token.trim().to_lowercase();
    let mut terms: Vec<String> = Vec::new();

    let push = |term: &str, terms: &mut Vec<String>| {
        if char_len(term) >= 3 && !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }
    };

    push(&query, &mut terms);

    for (_, aliases) in CUISINE_MAP {
        if aliases.contains(&query.as_str()) || aliases.iter().any(|a| query.contains(a)) {
            for alias in *aliases {
                push(alias, &mut terms);
            }
            break;
        }
    }

    for word in query.split_whitespace() {
        push(word, &mut terms);
    }

    terms
}
