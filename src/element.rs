//! Sortable elements, snapshots and index ranges.
//!
//! An [`Element`] carries the sort key plus the annotations a renderer needs.
//! Tags never take part in ordering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Highlight class currently applied to an element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    #[default]
    Neutral,
    Compare,
    Exchange,
    Pivot,
    Cursor,
    Bucket,
}

/// One sortable array slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub value: i32,
    #[serde(default)]
    pub tag: Tag,
    /// Zero-padded digit string, only present during a radix pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radix_key: Option<String>,
    /// Transformed pivot comparison key used by log-pivot partitioning
    #[serde(skip)]
    pub pivot_key: Option<f64>,
}

impl Element {
    pub fn new(value: i32) -> Self {
        Element { value, tag: Tag::Neutral, radix_key: None, pivot_key: None }
    }
}

impl From<i32> for Element {
    fn from(value: i32) -> Self {
        Element::new(value)
    }
}

/// Build an element array from raw values.
pub fn elements_from(values: &[i32]) -> Vec<Element> {
    values.iter().copied().map(Element::new).collect()
}

/// Extract the sort keys of an element array.
pub fn values_of(elements: &[Element]) -> Vec<i32> {
    elements.iter().map(|e| e.value).collect()
}

/// Requested output order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

impl Order {
    /// True if `a` may stay in front of `b`.
    #[inline]
    pub fn precedes(self, a: i32, b: i32) -> bool {
        match self {
            Order::Ascending => a <= b,
            Order::Descending => a >= b,
        }
    }

    pub fn reversed(self) -> Order {
        match self {
            Order::Ascending => Order::Descending,
            Order::Descending => Order::Ascending,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Ascending => f.write_str("ascending"),
            Order::Descending => f.write_str("descending"),
        }
    }
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Order::Ascending),
            "desc" | "descending" => Ok(Order::Descending),
            other => Err(format!("unknown order '{other}' (expected asc or desc)")),
        }
    }
}

/// Check if a slice is sorted in the given order.
#[inline]
pub fn is_sorted(data: &[Element], order: Order) -> bool {
    data.windows(2).all(|w| order.precedes(w[0].value, w[1].value))
}

/// Array state at one emission point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub step_count: u64,
    pub elements: Vec<Element>,
}

/// Inclusive index range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexRange {
    pub start: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn new(start: usize, end: usize) -> Self {
        IndexRange { start, end }
    }

    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty and single-element ranges need no further work.
    pub fn is_terminal(&self) -> bool {
        self.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_sorted() {
        assert!(is_sorted(&elements_from(&[1, 2, 3, 4, 5]), Order::Ascending));
        assert!(is_sorted(&elements_from(&[1, 1, 1, 1]), Order::Ascending));
        assert!(is_sorted(&elements_from(&[1]), Order::Descending));
        assert!(is_sorted(&elements_from(&[]), Order::Ascending));
        assert!(!is_sorted(&elements_from(&[5, 4, 3, 2, 1]), Order::Ascending));
        assert!(is_sorted(&elements_from(&[5, 4, 3, 2, 1]), Order::Descending));
        assert!(!is_sorted(&elements_from(&[1, 3, 2]), Order::Descending));
    }

    #[test]
    fn test_order_parse() {
        assert_eq!("asc".parse::<Order>().unwrap(), Order::Ascending);
        assert_eq!("Descending".parse::<Order>().unwrap(), Order::Descending);
        assert!("sideways".parse::<Order>().is_err());
    }

    #[test]
    fn test_index_range() {
        let range = IndexRange::new(3, 7);
        assert_eq!(range.len(), 5);
        assert!(!range.is_terminal());
        assert!(IndexRange::new(4, 4).is_terminal());
        assert!(IndexRange::new(5, 4).is_empty());
    }

    #[test]
    fn test_element_serde_skips_transient_keys() {
        let mut element = Element::new(12);
        element.pivot_key = Some(3.5);
        let json = serde_json::to_string(&element).unwrap();
        assert_eq!(json, r#"{"value":12,"tag":"neutral"}"#);
        let back: Element = serde_json::from_str(r#"{"value":4}"#).unwrap();
        assert_eq!(back, Element::new(4));
    }
}
