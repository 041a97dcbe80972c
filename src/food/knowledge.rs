//! Embedded reference tables used when no live source answers.

use super::models::{HealthNotes, Note, Nutrient, NutrientMap, Suggestion};

const NUTRITION_TABLE: &[(&str, &[(Nutrient, f64)])] = &[
    (
        "apple",
        &[
            (Nutrient::Calories, 52.0),
            (Nutrient::Carbs, 14.0),
            (Nutrient::Fiber, 2.4),
            (Nutrient::Sugar, 10.0),
            (Nutrient::Potassium, 107.0),
        ],
    ),
    (
        "banana",
        &[
            (Nutrient::Calories, 89.0),
            (Nutrient::Carbs, 23.0),
            (Nutrient::Fiber, 2.6),
            (Nutrient::Sugar, 12.0),
            (Nutrient::Potassium, 358.0),
        ],
    ),
    (
        "orange",
        &[
            (Nutrient::Calories, 47.0),
            (Nutrient::Carbs, 12.0),
            (Nutrient::Fiber, 2.4),
            (Nutrient::Sugar, 9.0),
            (Nutrient::Potassium, 181.0),
        ],
    ),
    (
        "chicken",
        &[
            (Nutrient::Calories, 165.0),
            (Nutrient::Protein, 31.0),
            (Nutrient::Fat, 3.6),
            (Nutrient::Sodium, 74.0),
        ],
    ),
    (
        "rice",
        &[
            (Nutrient::Calories, 130.0),
            (Nutrient::Carbs, 28.0),
            (Nutrient::Protein, 2.7),
            (Nutrient::Fat, 0.3),
        ],
    ),
    (
        "bread",
        &[
            (Nutrient::Calories, 265.0),
            (Nutrient::Carbs, 49.0),
            (Nutrient::Protein, 9.0),
            (Nutrient::Fat, 3.2),
            (Nutrient::Fiber, 2.7),
        ],
    ),
];

const WHOLE_FOODS: &[&str] = &[
    "apple", "banana", "orange", "chicken", "beef", "fish", "rice", "potato",
];

const PROCESSED_FOODS: &[(&str, &[&str])] = &[
    ("bread", &["Wheat flour", "Water", "Yeast", "Salt", "Sugar"]),
    ("pizza", &["Wheat flour", "Tomatoes", "Cheese", "Olive oil", "Herbs"]),
    ("pasta", &["Durum wheat", "Water", "Eggs"]),
    ("cookie", &["Flour", "Sugar", "Butter", "Eggs", "Baking powder"]),
];

pub const INGREDIENTS_UNAVAILABLE: &str = "Ingredients not available";

type NoteTable = &'static [(&'static str, &'static str)];

const HEALTH_TABLE: &[(&str, NoteTable, NoteTable)] = &[
    (
        "apple",
        &[
            ("Rich in Fiber", "Promotes digestive health and helps maintain healthy cholesterol levels"),
            ("Antioxidants", "Contains quercetin and other antioxidants that may reduce inflammation"),
            ("Heart Health", "May help reduce risk of heart disease and stroke"),
        ],
        &[(
            "Seeds",
            "Apple seeds contain small amounts of cyanide compounds - avoid eating large quantities of seeds",
        )],
    ),
    (
        "banana",
        &[
            ("Potassium Rich", "Excellent source of potassium for heart and muscle function"),
            ("Energy Boost", "Natural sugars provide quick energy for physical activity"),
            ("Digestive Health", "Contains prebiotics that support gut health"),
        ],
        &[(
            "High Sugar Content",
            "May raise blood sugar levels quickly - diabetics should monitor intake",
        )],
    ),
    (
        "chicken",
        &[
            ("High Protein", "Complete protein source essential for muscle maintenance and growth"),
            ("B Vitamins", "Rich in niacin, B6, and B12 for energy metabolism"),
            ("Low Saturated Fat", "Lean protein option when skin is removed"),
        ],
        &[
            ("Food Safety", "Must be cooked to 165°F to prevent foodborne illness"),
            ("Antibiotic Concerns", "Choose organic or antibiotic-free options when possible"),
        ],
    ),
];

const COMMON_FOODS: &[&str] = &[
    "Apple", "Banana", "Orange", "Chicken", "Beef", "Fish", "Rice", "Bread", "Pasta", "Pizza",
    "Salad", "Soup", "Sandwich", "Yogurt", "Cheese", "Eggs", "Milk", "Cereal", "Oatmeal", "Nuts",
    "Beans", "Potato",
];

/// Exact lookup by lowercased name; unknown foods get an empty map.
pub fn fallback_nutrition(food_name: &str) -> NutrientMap {
    let key = food_name.trim().to_lowercase();
    NUTRITION_TABLE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, values)| values.iter().copied().collect())
        .unwrap_or_default()
}

pub fn fallback_ingredients(food_name: &str) -> Vec<String> {
    let key = food_name.to_lowercase();

    if WHOLE_FOODS.iter().any(|food| key.contains(food)) {
        return vec![food_name.to_string()];
    }

    if let Some((_, ingredients)) = PROCESSED_FOODS.iter().find(|(food, _)| key.contains(food)) {
        return ingredients.iter().map(|i| i.to_string()).collect();
    }

    vec![INGREDIENTS_UNAVAILABLE.to_string()]
}

pub fn health_notes(food_name: &str) -> HealthNotes {
    let key = food_name.trim().to_lowercase();
    let to_notes = |table: NoteTable| -> Vec<Note> {
        table.iter().map(|(title, description)| Note::new(*title, *description)).collect()
    };

    match HEALTH_TABLE.iter().find(|(name, _, _)| *name == key) {
        Some((_, benefits, warnings)) => HealthNotes {
            benefits: to_notes(*benefits),
            warnings: to_notes(*warnings),
        },
        None => HealthNotes {
            benefits: vec![Note::new(
                "Nutritional Value",
                "Provides essential nutrients for overall health",
            )],
            warnings: vec![Note::new(
                "Allergies",
                "Check for potential allergens if you have known food sensitivities",
            )],
        },
    }
}

pub fn fallback_suggestions(query: &str) -> Vec<Suggestion> {
    let query = query.to_lowercase();
    COMMON_FOODS
        .iter()
        .filter(|food| food.to_lowercase().contains(&query))
        .take(5)
        .map(|name| Suggestion::new(*name))
        .collect()
}
