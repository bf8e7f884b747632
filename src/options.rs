//! Run options recognised by the algorithms.
//!
//! Every option is an enumerated set. Values outside the set are rejected at
//! construction or deserialization time; nothing is silently clamped.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SortError};

/// Digit alphabet size for radix passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum RadixBase {
    Binary,
    Octal,
    #[default]
    Decimal,
    Hexadecimal,
}

impl RadixBase {
    pub const ALLOWED: &'static [u32] = &[2, 8, 10, 16];

    pub fn get(self) -> u32 {
        match self {
            RadixBase::Binary => 2,
            RadixBase::Octal => 8,
            RadixBase::Decimal => 10,
            RadixBase::Hexadecimal => 16,
        }
    }

    /// Render `key` as a zero-padded digit string of `width` characters.
    pub fn render(self, key: u64, width: usize) -> String {
        match self {
            RadixBase::Binary => format!("{key:0width$b}"),
            RadixBase::Octal => format!("{key:0width$o}"),
            RadixBase::Decimal => format!("{key:0width$}"),
            RadixBase::Hexadecimal => format!("{key:0width$x}"),
        }
    }

    /// Number of digits needed to render `key` (at least one).
    pub fn width_of(self, mut key: u64) -> usize {
        let base = u64::from(self.get());
        let mut width = 1;
        while key >= base {
            key /= base;
            width += 1;
        }
        width
    }
}

impl TryFrom<u32> for RadixBase {
    type Error = SortError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            2 => Ok(RadixBase::Binary),
            8 => Ok(RadixBase::Octal),
            10 => Ok(RadixBase::Decimal),
            16 => Ok(RadixBase::Hexadecimal),
            _ => Err(SortError::InvalidOption { name: "radix_base", value, allowed: Self::ALLOWED }),
        }
    }
}

impl From<RadixBase> for u32 {
    fn from(base: RadixBase) -> u32 {
        base.get()
    }
}

macro_rules! width_option {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u32", into = "u32")]
        pub enum $name {
            Three,
            #[default]
            Four,
            Six,
            Eight,
        }

        impl $name {
            pub const ALLOWED: &'static [u32] = &[3, 4, 6, 8];

            pub fn get(self) -> usize {
                match self {
                    $name::Three => 3,
                    $name::Four => 4,
                    $name::Six => 6,
                    $name::Eight => 8,
                }
            }
        }

        impl TryFrom<u32> for $name {
            type Error = SortError;

            fn try_from(value: u32) -> Result<Self> {
                match value {
                    3 => Ok($name::Three),
                    4 => Ok($name::Four),
                    6 => Ok($name::Six),
                    8 => Ok($name::Eight),
                    _ => Err(SortError::InvalidOption { name: $field, value, allowed: Self::ALLOWED }),
                }
            }
        }

        impl From<$name> for u32 {
            fn from(option: $name) -> u32 {
                option.get() as u32
            }
        }
    };
}

width_option!(
    /// k-way merge width.
    MergeFanout,
    "merge_fanout"
);
width_option!(
    /// Children per heap node.
    HeapArity,
    "heap_arity"
);

/// Options recognised by every run; unused by algorithms that don't need them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortOptions {
    pub radix_base: RadixBase,
    pub merge_fanout: MergeFanout,
    pub heap_arity: HeapArity,
}

impl SortOptions {
    /// Validate raw option values.
    pub fn new(radix_base: u32, merge_fanout: u32, heap_arity: u32) -> Result<Self> {
        Ok(SortOptions {
            radix_base: RadixBase::try_from(radix_base)?,
            merge_fanout: MergeFanout::try_from(merge_fanout)?,
            heap_arity: HeapArity::try_from(heap_arity)?,
        })
    }

    /// Parse an options document such as `{"radix_base": 16, "heap_arity": 3}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Display for SortOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "radix_base={} merge_fanout={} heap_arity={}",
            self.radix_base.get(),
            self.merge_fanout.get(),
            self.heap_arity.get()
        )
    }
}
