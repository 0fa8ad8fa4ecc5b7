use serde::{Deserialize, Serialize};

/// What a new screen session starts with.
pub const STAPLES: [&str; 7] = ["salt", "sugar", "corn flour", "water", "oil", "eggs", "cream"];

/// The user's ingredients, in the order they were entered.
///
/// Entries are trimmed and lowercased on the way in, and each appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct IngredientList {
    items: Vec<String>,
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl IngredientList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_staples() -> Self {
        STAPLES.iter().collect()
    }

    /// Append an ingredient unless it is blank or already present.
    /// Returns whether the list changed.
    pub fn add(&mut self, raw: &str) -> bool {
        let item = normalize(raw);
        if item.is_empty() || self.items.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Remove an ingredient by value. Returns whether the list changed.
    pub fn remove(&mut self, value: &str) -> bool {
        let item = normalize(value);
        let before = self.items.len();
        self.items.retain(|existing| *existing != item);
        self.items.len() != before
    }

    pub fn contains(&self, value: &str) -> bool {
        self.items.contains(&normalize(value))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn joined(&self, separator: &str) -> String {
        self.items.join(separator)
    }
}

impl<S: AsRef<str>> FromIterator<S> for IngredientList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = Self::new();
        for item in iter {
            list.add(item.as_ref());
        }
        list
    }
}

impl From<Vec<String>> for IngredientList {
    fn from(items: Vec<String>) -> Self {
        items.into_iter().collect()
    }
}

impl From<IngredientList> for Vec<String> {
    fn from(list: IngredientList) -> Self {
        list.items
    }
}

impl<'a> IntoIterator for &'a IngredientList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
