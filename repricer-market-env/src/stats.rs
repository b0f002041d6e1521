//! Category-level market statistics.
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

/// Fallback statistics used when a category id is unknown.
pub(crate) const FALLBACK_PRICE_MEAN: f64 = 500.0;
pub(crate) const FALLBACK_PRICE_STD: f64 = 200.0;
pub(crate) const FALLBACK_AVG_DAYS: f64 = 10.0;
pub(crate) const FALLBACK_STD_DAYS: f64 = 5.0;

/// Price and days-to-sell distribution summary of one category.
///
/// Produced by an external preprocessing stage; immutable within a run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CategoryStats {
    /// Mean listing price.
    pub price_mean: f64,

    /// Standard deviation of listing prices. A zero value is never used as a
    /// divisor; normalization falls back to a neutral value instead.
    pub price_std: f64,

    /// Smallest observed price.
    pub price_min: f64,

    /// Largest observed price.
    pub price_max: f64,

    /// Average days until a listing sells.
    pub avg_days_to_sell: f64,

    /// Standard deviation of days until a listing sells.
    pub std_days_to_sell: f64,
}

impl CategoryStats {
    fn new(
        price_mean: f64,
        price_std: f64,
        price_min: f64,
        price_max: f64,
        avg_days_to_sell: f64,
        std_days_to_sell: f64,
    ) -> Self {
        Self {
            price_mean,
            price_std,
            price_min,
            price_max,
            avg_days_to_sell,
            std_days_to_sell,
        }
    }
}

/// Static listing profile of a category: a feature slug, the plausible price
/// range for synthesized items and a title vocabulary.
///
/// The table below is data-driven on purpose: adding a category means adding
/// a row, not a branch.
#[derive(Debug, Clone, Copy)]
pub struct CategoryProfile {
    /// Short name used for the category's one-hot feature (`is_<slug>`).
    pub slug: &'static str,

    /// Plausible price range for synthesized items.
    pub price_range: (f64, f64),

    /// Title vocabulary for synthesized items.
    pub title_prefixes: &'static [&'static str],
}

const PROFILES: &[(&str, CategoryProfile)] = &[
    (
        "9355",
        CategoryProfile {
            slug: "laptop",
            price_range: (300.0, 2000.0),
            title_prefixes: &["Laptop", "Notebook", "MacBook", "ThinkPad", "Dell XPS"],
        },
    ),
    (
        "15032",
        CategoryProfile {
            slug: "phone",
            price_range: (200.0, 1200.0),
            title_prefixes: &["iPhone", "Samsung Galaxy", "Google Pixel", "OnePlus"],
        },
    ),
    (
        "11450",
        CategoryProfile {
            slug: "watch",
            price_range: (50.0, 1500.0),
            title_prefixes: &["Rolex", "Omega", "Seiko", "Casio", "Apple Watch", "Garmin"],
        },
    ),
    (
        "261007",
        CategoryProfile {
            slug: "camera",
            price_range: (150.0, 1800.0),
            title_prefixes: &["Canon", "Nikon", "Sony", "Fujifilm", "Panasonic", "Olympus"],
        },
    ),
    (
        "20081",
        CategoryProfile {
            slug: "tablet",
            price_range: (100.0, 1200.0),
            title_prefixes: &["iPad", "Samsung Tab", "Kindle", "Kobo", "Huawei MatePad"],
        },
    ),
    (
        "139971",
        CategoryProfile {
            slug: "game_console",
            price_range: (100.0, 800.0),
            title_prefixes: &["PlayStation", "Xbox", "Nintendo Switch", "Steam Deck", "Sega"],
        },
    ),
    (
        "175672",
        CategoryProfile {
            slug: "headphone",
            price_range: (20.0, 500.0),
            title_prefixes: &["Sony", "Bose", "Sennheiser", "AirPods", "Beats", "JBL"],
        },
    ),
    (
        "11700",
        CategoryProfile {
            slug: "computer_component",
            price_range: (30.0, 800.0),
            title_prefixes: &[
                "Intel",
                "AMD",
                "NVIDIA",
                "Corsair",
                "Kingston",
                "Western Digital",
            ],
        },
    ),
    (
        "3676",
        CategoryProfile {
            slug: "tv_audio",
            price_range: (100.0, 2000.0),
            title_prefixes: &["Samsung TV", "LG TV", "Sony TV", "TCL", "Vizio", "Bose Speaker"],
        },
    ),
    (
        "293",
        CategoryProfile {
            slug: "book",
            price_range: (5.0, 150.0),
            title_prefixes: &["Book", "Novel", "Textbook", "Magazine", "Comic", "Encyclopedia"],
        },
    ),
    (
        "15724",
        CategoryProfile {
            slug: "clothing",
            price_range: (10.0, 500.0),
            title_prefixes: &["Nike", "Adidas", "Gucci", "H&M", "Zara", "Uniqlo"],
        },
    ),
    (
        "11116",
        CategoryProfile {
            slug: "toy",
            price_range: (10.0, 200.0),
            title_prefixes: &["LEGO", "Barbie", "Hot Wheels", "Nerf", "Monopoly", "Puzzle"],
        },
    ),
    (
        "619",
        CategoryProfile {
            slug: "instrument",
            price_range: (50.0, 2000.0),
            title_prefixes: &["Guitar", "Piano", "Violin", "Drum", "Saxophone", "Flute"],
        },
    ),
    (
        "888",
        CategoryProfile {
            slug: "sport",
            price_range: (20.0, 800.0),
            title_prefixes: &[
                "Tennis Racket",
                "Golf Club",
                "Basketball",
                "Yoga Mat",
                "Dumbbell",
                "Treadmill",
            ],
        },
    ),
    (
        "26395",
        CategoryProfile {
            slug: "appliance",
            price_range: (50.0, 1000.0),
            title_prefixes: &[
                "Refrigerator",
                "Washing Machine",
                "Microwave",
                "Vacuum",
                "Blender",
                "Coffee Maker",
            ],
        },
    ),
    (
        "14308",
        CategoryProfile {
            slug: "furniture",
            price_range: (50.0, 1500.0),
            title_prefixes: &["Sofa", "Bed", "Table", "Chair", "Desk", "Bookshelf"],
        },
    ),
    (
        "550",
        CategoryProfile {
            slug: "art",
            price_range: (20.0, 2000.0),
            title_prefixes: &[
                "Painting",
                "Sculpture",
                "Antique",
                "Collectible",
                "Poster",
                "Vintage",
            ],
        },
    ),
    (
        "2984",
        CategoryProfile {
            slug: "jewelry",
            price_range: (30.0, 3000.0),
            title_prefixes: &["Ring", "Necklace", "Bracelet", "Earrings", "Watch", "Pendant"],
        },
    ),
    (
        "1249",
        CategoryProfile {
            slug: "tool",
            price_range: (30.0, 800.0),
            title_prefixes: &["Drill", "Saw", "Hammer", "Screwdriver", "Wrench", "Toolbox"],
        },
    ),
    (
        "220",
        CategoryProfile {
            slug: "bicycle",
            price_range: (50.0, 2500.0),
            title_prefixes: &[
                "Mountain Bike",
                "Road Bike",
                "BMX",
                "Electric Bike",
                "Folding Bike",
                "Hybrid Bike",
            ],
        },
    ),
];

/// Returns the static profile of a category id, if one exists.
pub fn profile(category_id: &str) -> Option<&'static CategoryProfile> {
    PROFILES
        .iter()
        .find(|(id, _)| *id == category_id)
        .map(|(_, p)| p)
}

/// Immutable per-category statistics, shared read-only across episodes.
///
/// Keys are kept in a [`BTreeMap`] so that iteration order — and with it the
/// order of the one-hot category features — is deterministic.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    stats: BTreeMap<String, CategoryStats>,
}

impl CategoryTable {
    /// Loads category statistics from a JSON file mapping category id to
    /// a statistics record.
    ///
    /// A missing or malformed file is logged and replaced by the built-in
    /// default table; this constructor never fails.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            None => Self::default_table(),
            Some(path) => match Self::try_load(path) {
                Ok(table) => {
                    info!(
                        "Loaded category statistics for {} categories from {:?}",
                        table.len(),
                        path
                    );
                    table
                }
                Err(e) => {
                    warn!(
                        "Failed to load category statistics from {:?} ({}); using the built-in table",
                        path, e
                    );
                    Self::default_table()
                }
            },
        }
    }

    fn try_load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let stats: BTreeMap<String, CategoryStats> = serde_json::from_reader(rdr)?;
        anyhow::ensure!(!stats.is_empty(), "statistics file holds no categories");
        Ok(Self { stats })
    }

    /// The built-in statistics table.
    pub fn default_table() -> Self {
        let stats = [
            ("9355", CategoryStats::new(800.0, 300.0, 200.0, 2000.0, 12.5, 5.2)),
            ("15032", CategoryStats::new(400.0, 150.0, 100.0, 1200.0, 8.3, 3.7)),
            ("11450", CategoryStats::new(300.0, 200.0, 50.0, 1500.0, 10.2, 4.5)),
            ("261007", CategoryStats::new(500.0, 250.0, 150.0, 1800.0, 14.8, 6.3)),
            ("20081", CategoryStats::new(350.0, 200.0, 100.0, 1200.0, 10.5, 4.8)),
            ("139971", CategoryStats::new(300.0, 150.0, 100.0, 800.0, 7.5, 3.2)),
            ("175672", CategoryStats::new(120.0, 80.0, 20.0, 500.0, 6.8, 2.9)),
            ("11700", CategoryStats::new(180.0, 120.0, 30.0, 800.0, 9.2, 4.1)),
            ("3676", CategoryStats::new(450.0, 300.0, 100.0, 2000.0, 15.3, 6.7)),
            ("293", CategoryStats::new(25.0, 20.0, 5.0, 150.0, 18.5, 8.2)),
            ("15724", CategoryStats::new(60.0, 50.0, 10.0, 500.0, 14.2, 6.5)),
            ("11116", CategoryStats::new(40.0, 30.0, 10.0, 200.0, 11.8, 5.3)),
            ("619", CategoryStats::new(350.0, 300.0, 50.0, 2000.0, 20.5, 9.8)),
            ("888", CategoryStats::new(120.0, 100.0, 20.0, 800.0, 13.7, 6.1)),
            ("26395", CategoryStats::new(200.0, 150.0, 50.0, 1000.0, 16.2, 7.4)),
            ("14308", CategoryStats::new(250.0, 200.0, 50.0, 1500.0, 22.3, 10.5)),
            ("550", CategoryStats::new(180.0, 200.0, 20.0, 2000.0, 25.8, 12.3)),
            ("2984", CategoryStats::new(220.0, 250.0, 30.0, 3000.0, 19.6, 8.9)),
            ("1249", CategoryStats::new(150.0, 120.0, 30.0, 800.0, 17.4, 7.8)),
            ("220", CategoryStats::new(280.0, 220.0, 50.0, 2500.0, 15.9, 7.2)),
        ]
        .iter()
        .map(|(id, s)| (id.to_string(), s.clone()))
        .collect();

        Self { stats }
    }

    /// Returns the statistics of a category, if known.
    pub fn get(&self, category_id: &str) -> Option<&CategoryStats> {
        self.stats.get(category_id)
    }

    /// Category ids in deterministic (sorted) order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.stats.keys().map(|k| k.as_str())
    }

    /// Number of known categories.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// Returns `true` if the table holds no categories.
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// The plausible price range for synthesizing an item of the category:
    /// the static profile's range when one exists, the observed min/max
    /// otherwise.
    pub fn price_range(&self, category_id: &str) -> (f64, f64) {
        match profile(category_id) {
            Some(p) => p.price_range,
            None => match self.get(category_id) {
                Some(s) => (s.price_min, s.price_max),
                None => (FALLBACK_PRICE_MEAN - FALLBACK_PRICE_STD, FALLBACK_PRICE_MEAN + FALLBACK_PRICE_STD),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempdir::TempDir;

    #[test]
    fn default_table_has_all_categories() {
        let table = CategoryTable::default_table();
        assert_eq!(table.len(), 20);
        let laptop = table.get("9355").unwrap();
        assert_eq!(laptop.price_mean, 800.0);
        assert_eq!(laptop.avg_days_to_sell, 12.5);
        // Every built-in category also carries a listing profile.
        for id in table.ids() {
            assert!(profile(id).is_some(), "no profile for category {}", id);
        }
    }

    #[test]
    fn ids_are_sorted() {
        let table = CategoryTable::default_table();
        let ids: Vec<&str> = table.ids().collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn malformed_source_falls_back_to_default() {
        let dir = TempDir::new("stats").unwrap();
        let path = dir.path().join("category_stats.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"not json at all").unwrap();

        let table = CategoryTable::load_or_default(Some(&path));
        assert_eq!(table.len(), 20);

        let missing = dir.path().join("missing.json");
        let table = CategoryTable::load_or_default(Some(&missing));
        assert_eq!(table.len(), 20);
    }

    #[test]
    fn loads_valid_source() {
        let dir = TempDir::new("stats").unwrap();
        let path = dir.path().join("category_stats.json");
        let json = r#"{
            "42": {
                "price_mean": 100.0, "price_std": 10.0,
                "price_min": 50.0, "price_max": 150.0,
                "avg_days_to_sell": 5.0, "std_days_to_sell": 1.0
            }
        }"#;
        let mut file = File::create(&path).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let table = CategoryTable::load_or_default(Some(&path));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("42").unwrap().price_mean, 100.0);
        // Unknown id: range comes from observed min/max.
        assert_eq!(table.price_range("42"), (50.0, 150.0));
    }
}
