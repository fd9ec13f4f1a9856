//! Keyword-based mapping from free-text class labels to symbolic categories.
//!
//! Labels produced by an image model come from a vocabulary this crate does not
//! control (e.g. `"golden retriever"`, `"tabby, tabby cat"`). [`tag`] buckets them
//! into a small closed set of [`CategoryTag`]s, each with a display glyph.
//!
//! # Matching rules
//!
//! The label is lowercased and checked against [`RULES`] in order. A rule
//! matches when the label contains any of its keywords as a substring. The
//! first matching rule wins; [`CategoryTag::Unclassified`] is returned when
//! nothing matches.
//!
//! A keyword does not count where it only appears inside a longer multi-word
//! keyword. `"hot dog stand"` skips canine, whose `"dog"` only occurs within
//! `"hot dog"`, and resolves to pizza-food. `"dog on a school bus"` is still
//! canine: the `"dog"` there is outside every phrase.
//!
//! # Known false positives
//!
//! Matching is by substring, not by whole word. `"cardigan"` contains `"car"`,
//! `"catamaran"` contains `"cat"` and `"grape"` contains `"ape"`, so those labels
//! resolve to car, feline and primate respectively.

use lazy_static::lazy_static;
use serde::Serialize;
use std::fmt;

/// Symbolic category assigned to a label.
///
/// The variant order mirrors the priority order of [`RULES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryTag {
    Canine,
    Feline,
    Bird,
    Fish,
    BearLike,
    Elephant,
    Primate,
    PizzaFood,
    Dessert,
    Coffee,
    AlcoholicBeverage,
    Car,
    Truck,
    Bus,
    Aircraft,
    Watercraft,
    Formalwear,
    Footwear,
    Flower,
    Tree,
    /// Fallback when no keyword group matches.
    Unclassified,
}

impl CategoryTag {
    /// Every tag, in rule priority order, fallback last.
    pub const ALL: [CategoryTag; 21] = [
        Self::Canine,
        Self::Feline,
        Self::Bird,
        Self::Fish,
        Self::BearLike,
        Self::Elephant,
        Self::Primate,
        Self::PizzaFood,
        Self::Dessert,
        Self::Coffee,
        Self::AlcoholicBeverage,
        Self::Car,
        Self::Truck,
        Self::Bus,
        Self::Aircraft,
        Self::Watercraft,
        Self::Formalwear,
        Self::Footwear,
        Self::Flower,
        Self::Tree,
        Self::Unclassified,
    ];

    /// Display glyph for the tag.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Canine => "🐶",
            Self::Feline => "🐱",
            Self::Bird => "🐦",
            Self::Fish => "🐟",
            Self::BearLike => "🐻",
            Self::Elephant => "🐘",
            Self::Primate => "🐵",
            Self::PizzaFood => "🍕",
            Self::Dessert => "🍰",
            Self::Coffee => "☕",
            Self::AlcoholicBeverage => "🍺",
            Self::Car => "🚗",
            Self::Truck => "🚚",
            Self::Bus => "🚌",
            Self::Aircraft => "✈️",
            Self::Watercraft => "🚢",
            Self::Formalwear => "👔",
            Self::Footwear => "👟",
            Self::Flower => "🌸",
            Self::Tree => "🌳",
            Self::Unclassified => "🔍",
        }
    }

    /// Stable kebab-case name, matching the serialized form.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Canine => "canine",
            Self::Feline => "feline",
            Self::Bird => "bird",
            Self::Fish => "fish",
            Self::BearLike => "bear-like",
            Self::Elephant => "elephant",
            Self::Primate => "primate",
            Self::PizzaFood => "pizza-food",
            Self::Dessert => "dessert",
            Self::Coffee => "coffee",
            Self::AlcoholicBeverage => "alcoholic-beverage",
            Self::Car => "car",
            Self::Truck => "truck",
            Self::Bus => "bus",
            Self::Aircraft => "aircraft",
            Self::Watercraft => "watercraft",
            Self::Formalwear => "formalwear",
            Self::Footwear => "footwear",
            Self::Flower => "flower",
            Self::Tree => "tree",
            Self::Unclassified => "unclassified",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Unclassified)
    }
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of the rule table: a category and the keywords that select it.
///
/// Keywords are stored lowercase.
#[derive(Debug, Clone, Copy)]
pub struct TagRule {
    pub tag: CategoryTag,
    pub keywords: &'static [&'static str],
}

impl TagRule {
    /// Returns the first keyword of this rule found in `normalized`, if any.
    ///
    /// Occurrences that fall inside one of `phrase_spans` (byte ranges of longer
    /// phrase keywords) are ignored.
    pub fn find_in(&self, normalized: &str, phrase_spans: &[(usize, usize)]) -> Option<&'static str> {
        self.keywords.iter().copied().find(|kw| {
            normalized.match_indices(kw).any(|(start, _)| {
                let end = start + kw.len();
                !phrase_spans
                    .iter()
                    .any(|&(ps, pe)| ps <= start && end <= pe && pe - ps > kw.len())
            })
        })
    }
}

/// The compiled-in rule table. Index is priority.
pub static RULES: &[TagRule] = &[
    TagRule { tag: CategoryTag::Canine, keywords: &["dog", "puppy", "pug", "corgi", "retriever"] },
    TagRule { tag: CategoryTag::Feline, keywords: &["cat", "kitten", "tabby"] },
    TagRule { tag: CategoryTag::Bird, keywords: &["bird", "parrot", "eagle", "owl"] },
    TagRule { tag: CategoryTag::Fish, keywords: &["fish", "goldfish", "shark"] },
    TagRule { tag: CategoryTag::BearLike, keywords: &["bear", "panda"] },
    TagRule { tag: CategoryTag::Elephant, keywords: &["elephant"] },
    TagRule { tag: CategoryTag::Primate, keywords: &["monkey", "ape", "gorilla"] },
    TagRule { tag: CategoryTag::PizzaFood, keywords: &["pizza", "burger", "sandwich", "hot dog", "taco"] },
    TagRule { tag: CategoryTag::Dessert, keywords: &["cake", "cupcake", "dessert", "ice cream"] },
    TagRule { tag: CategoryTag::Coffee, keywords: &["coffee", "espresso", "latte"] },
    TagRule { tag: CategoryTag::AlcoholicBeverage, keywords: &["beer", "wine", "cocktail"] },
    TagRule { tag: CategoryTag::Car, keywords: &["car", "sports car", "convertible", "racer"] },
    TagRule { tag: CategoryTag::Truck, keywords: &["truck", "pickup"] },
    TagRule { tag: CategoryTag::Bus, keywords: &["bus", "school bus"] },
    TagRule { tag: CategoryTag::Aircraft, keywords: &["plane", "airliner", "aircraft"] },
    TagRule { tag: CategoryTag::Watercraft, keywords: &["boat", "ship", "vessel"] },
    TagRule { tag: CategoryTag::Formalwear, keywords: &["suit", "tie", "gown", "dress"] },
    TagRule { tag: CategoryTag::Footwear, keywords: &["shoe", "sneaker", "boot"] },
    TagRule { tag: CategoryTag::Flower, keywords: &["flower", "rose", "daisy"] },
    TagRule { tag: CategoryTag::Tree, keywords: &["tree", "plant"] },
];

lazy_static! {
    /// Every multi-word keyword in the table.
    static ref PHRASES: Vec<&'static str> = RULES
        .iter()
        .flat_map(|rule| rule.keywords.iter().copied())
        .filter(|kw| kw.contains(char::is_whitespace))
        .collect();
}

/// Byte ranges of all phrase keyword occurrences in `normalized`.
fn phrase_spans(normalized: &str) -> Vec<(usize, usize)> {
    PHRASES
        .iter()
        .flat_map(|phrase| {
            normalized
                .match_indices(phrase)
                .map(move |(start, _)| (start, start + phrase.len()))
        })
        .collect()
}

/// Maps a label to its category. Total: never fails, any input yields a tag.
///
/// # Example
/// ```
/// use pictag::{tagger, CategoryTag};
///
/// assert_eq!(tagger::tag("Golden Retriever"), CategoryTag::Canine);
/// assert_eq!(tagger::tag("quasar"), CategoryTag::Unclassified);
/// ```
pub fn tag(label: &str) -> CategoryTag {
    matched_keyword(label)
        .map(|(_, tag)| tag)
        .unwrap_or(CategoryTag::Unclassified)
}

/// Like [`tag`], but also reports which keyword decided the match.
pub fn matched_keyword(label: &str) -> Option<(&'static str, CategoryTag)> {
    let normalized = label.to_lowercase();
    let spans = phrase_spans(&normalized);
    RULES
        .iter()
        .find_map(|rule| rule.find_in(&normalized, &spans).map(|kw| (kw, rule.tag)))
}
