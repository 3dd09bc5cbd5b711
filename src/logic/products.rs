use std::collections::BTreeMap;

/// Withdrawal period suggested when a product is not in the registry.
pub const DEFAULT_WITHDRAWAL_DAYS: u32 = 7;

const BUILTIN_PRODUCTS: &[(&str, u32)] = &[
    ("Mancozeb", 5),
    ("Copper Oxychloride", 7),
    ("Carbofuran", 21),
    ("Malathion", 14),
    ("Neem Oil", 3),
    ("Sulfur", 7),
    ("Thiram", 10),
    ("Zinc", 5),
];

/// Known pesticide products and their typical withdrawal periods.
///
/// Values only pre-fill the days field; nothing enforces them.
#[derive(Debug, Clone)]
pub struct ProductRegistry {
    // keyed by normalized name, value keeps the display name
    products: BTreeMap<String, (String, u32)>,
}

impl ProductRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            products: BTreeMap::new(),
        };
        for (name, days) in BUILTIN_PRODUCTS {
            registry.insert(name, *days);
        }
        registry
    }

    /// Add or override an entry. Zero-day entries are ignored.
    pub fn insert(&mut self, name: &str, withdrawal_days: u32) {
        let key = normalize(name);
        if key.is_empty() || withdrawal_days == 0 {
            tracing::warn!(product = %name, withdrawal_days, "Ignoring invalid product entry");
            return;
        }
        self.products
            .insert(key, (name.trim().to_string(), withdrawal_days));
    }

    pub fn lookup_default_withdrawal_days(&self, product_name: &str) -> Option<u32> {
        self.products
            .get(&normalize(product_name))
            .map(|(_, days)| *days)
    }

    pub fn suggested_withdrawal_days(&self, product_name: &str) -> u32 {
        self.lookup_default_withdrawal_days(product_name)
            .unwrap_or(DEFAULT_WITHDRAWAL_DAYS)
    }

    /// Display name and days, sorted by display name.
    pub fn entries(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> = self
            .products
            .values()
            .map(|(name, days)| (name.as_str(), *days))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries().into_iter().map(|(name, _)| name).collect()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl Default for ProductRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
