//! Search and score over portal records
//!
//! Each record exposes weighted text fields. A field scores by how well the
//! query matches it:
//!
//! - exact match: 100
//! - prefix: 80
//! - prefix of a word: 60
//! - substring: 40
//! - characters in order: 20 minus one per skipped character, at least 1
//!
//! Matching is case-insensitive on trimmed text. A record keeps the best
//! weighted field score; records scoring zero are dropped.

use portal_model::{Project, Task, UserProfile};

/// Record that can be searched
pub trait Searchable {
    /// Text fields with their weight
    fn search_fields(&self) -> Vec<(&str, u32)>;
}

impl Searchable for Project {
    fn search_fields(&self) -> Vec<(&str, u32)> {
        let mut fields = vec![(self.name.as_str(), 3), (self.description.as_str(), 1)];
        if let Some(tagline) = &self.tagline {
            fields.push((tagline.as_str(), 2));
        }
        fields
    }
}

impl Searchable for Task {
    fn search_fields(&self) -> Vec<(&str, u32)> {
        let mut fields = vec![(self.title.as_str(), 2)];
        if let Some(description) = &self.description {
            fields.push((description.as_str(), 1));
        }
        fields
    }
}

impl Searchable for UserProfile {
    fn search_fields(&self) -> Vec<(&str, u32)> {
        vec![(self.display_name.as_str(), 2), (self.email.as_str(), 2)]
    }
}

/// A record with its score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranked<T> {
    /// Matched record
    pub item: T,
    /// Weighted match score, higher is better
    pub score: u32,
}

/// Score one field against a query; both are compared lowercased
#[must_use]
pub fn score_field(query: &str, field: &str) -> u32 {
    let query = query.trim().to_lowercase();
    let field = field.trim().to_lowercase();
    if query.is_empty() || field.is_empty() {
        return 0;
    }
    if field == query {
        return 100;
    }
    if field.starts_with(&query) {
        return 80;
    }
    if field
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word.starts_with(&query))
    {
        return 60;
    }
    if field.contains(&query) {
        return 40;
    }
    subsequence_gaps(&query, &field).map_or(0, |gaps| 20u32.saturating_sub(gaps).max(1))
}

/// Characters skipped between the first and last matched character
fn subsequence_gaps(query: &str, field: &str) -> Option<u32> {
    let mut wanted = query.chars().peekable();
    let mut gaps = 0u32;
    let mut started = false;
    for c in field.chars() {
        match wanted.peek() {
            None => break,
            Some(&w) if w == c => {
                started = true;
                wanted.next();
            }
            Some(_) if started => gaps += 1,
            Some(_) => {}
        }
    }
    wanted.peek().is_none().then_some(gaps)
}

/// Rank records by query
///
/// An empty query returns every record with score 0 in input order.
/// Otherwise results are sorted by score, highest first, ties in input order.
#[must_use]
pub fn rank<'a, T: Searchable>(query: &str, records: &'a [T]) -> Vec<Ranked<&'a T>> {
    if query.trim().is_empty() {
        return records.iter().map(|item| Ranked { item, score: 0 }).collect();
    }

    let mut ranked: Vec<Ranked<&T>> = records
        .iter()
        .filter_map(|item| {
            let score = item
                .search_fields()
                .into_iter()
                .map(|(text, weight)| score_field(query, text) * weight)
                .max()
                .unwrap_or(0);
            (score > 0).then_some(Ranked { item, score })
        })
        .collect();
    // stable
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}
