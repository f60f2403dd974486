//! Grid layout presets.
//!
//! A grid is configured once, at construction: the variant selects a preset
//! and the preset is resolved into a fixed `GridConfig`.

use serde::{Deserialize, Serialize};

/// Display variant of a result grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridVariant {
    #[default]
    Full,
    Minimalist,
    Featured,
}

impl std::str::FromStr for GridVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(GridVariant::Full),
            "minimalist" => Ok(GridVariant::Minimalist),
            "featured" => Ok(GridVariant::Featured),
            other => Err(format!("Unknown grid variant: {}", other)),
        }
    }
}

/// How much of a record a card shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardVariant {
    #[default]
    Default,
    Compact,
    Minimal,
}

/// Spacing between cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gap {
    Sm,
    #[default]
    Md,
    Lg,
}

/// Viewport breakpoints, narrowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Breakpoint {
    Base,
    Sm,
    Md,
    Lg,
    Xl,
}

impl Breakpoint {
    /// Breakpoint for a viewport width in pixels (640/768/1024/1280)
    pub fn from_width(px: u32) -> Self {
        match px {
            0..=639 => Breakpoint::Base,
            640..=767 => Breakpoint::Sm,
            768..=1023 => Breakpoint::Md,
            1024..=1279 => Breakpoint::Lg,
            _ => Breakpoint::Xl,
        }
    }
}

/// Column count per breakpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Columns {
    pub base: u8,
    pub sm: u8,
    pub md: u8,
    pub lg: u8,
    pub xl: u8,
}

impl Columns {
    pub const fn new(base: u8, sm: u8, md: u8, lg: u8, xl: u8) -> Self {
        Self { base, sm, md, lg, xl }
    }

    pub fn at(&self, breakpoint: Breakpoint) -> u8 {
        let n = match breakpoint {
            Breakpoint::Base => self.base,
            Breakpoint::Sm => self.sm,
            Breakpoint::Md => self.md,
            Breakpoint::Lg => self.lg,
            Breakpoint::Xl => self.xl,
        };
        n.max(1)
    }
}

impl Default for Columns {
    fn default() -> Self {
        Columns::new(1, 2, 3, 4, 5)
    }
}

/// What the caller asks for
#[derive(Debug, Clone, PartialEq)]
pub struct GridOptions {
    pub variant: GridVariant,
    /// Overrides the preset's item cap
    pub limit: Option<usize>,
    /// Only honoured by the `Full` variant
    pub columns: Columns,
    /// Only honoured by the `Full` variant
    pub card: CardVariant,
    /// Only honoured by the `Full` variant
    pub gap: Gap,
    pub show_load_more: bool,
    pub show_stats: bool,
    /// Page size the fetcher asks for, used to infer end-of-data
    pub page_size: Option<usize>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            variant: GridVariant::Full,
            limit: None,
            columns: Columns::default(),
            card: CardVariant::Default,
            gap: Gap::Md,
            show_load_more: true,
            show_stats: true,
            page_size: None,
        }
    }
}

impl GridOptions {
    pub fn variant(variant: GridVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    /// Resolve the variant preset into a fixed configuration
    pub fn resolve(&self) -> GridConfig {
        let (columns, card, gap, cap) = match self.variant {
            GridVariant::Minimalist => (Columns::new(2, 3, 4, 6, 8), CardVariant::Minimal, Gap::Sm, 12),
            GridVariant::Featured => (Columns::new(1, 2, 3, 4, 4), CardVariant::Default, Gap::Lg, 8),
            GridVariant::Full => (self.columns, self.card, self.gap, 20),
        };

        GridConfig {
            variant: self.variant,
            columns,
            card,
            gap,
            cap: self.limit.unwrap_or(cap),
            show_load_more: self.show_load_more,
            show_stats: self.show_stats,
            page_size: self.page_size,
        }
    }
}

/// A resolved grid configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    pub variant: GridVariant,
    pub columns: Columns,
    pub card: CardVariant,
    pub gap: Gap,
    /// Soft cap on items shown without paging
    pub cap: usize,
    pub show_load_more: bool,
    pub show_stats: bool,
    pub page_size: Option<usize>,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridOptions::default().resolve()
    }
}

/// "Showing N of M anime"; the total is omitted when unknown or zero
pub fn stats_line(shown: usize, total: Option<u32>, noun: &str) -> String {
    match total {
        Some(total) if total > 0 => format!("Showing {} of {} {}", shown, total, noun),
        _ => format!("Showing {} {}", shown, noun),
    }
}
