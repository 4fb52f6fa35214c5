//! The clothing record stored in the catalog.
//!
//! [`ClothingItem`] is the only persisted entity. It is stored as one JSON
//! document per record: enums are written with their symbolic names and the
//! list-valued attributes (secondary colours, seasons, occasions, tags) as
//! JSON arrays.
//!
//! # Examples
//!
//! ```rust
//! use wardrobe_core::clothing_item::ClothingItem;
//! use wardrobe_core::vocabulary::{ClothingStatus, ClothingType, Season};
//!
//! let mut coat = ClothingItem::new("Red Coat", ClothingType::Coat, "红色");
//! coat.seasons = vec![Season::Winter];
//!
//! assert_eq!(coat.wear_count, 0);
//! assert_eq!(coat.status, ClothingStatus::Available);
//! assert!(coat.is_suitable_for_season(Season::Winter));
//! assert!(coat.validate().is_ok());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;
use crate::vocabulary::{ClothingCategory, ClothingStatus, ClothingType, Occasion, Season};

/// Highest accepted value for [`ClothingItem::rating`]. Zero means unrated.
pub const MAX_RATING: u8 = 5;

/// A single piece of clothing.
///
/// `id` is zero until the item has been inserted; storage assigns it and it
/// never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothingItem {
    #[serde(default)]
    pub id: u64,

    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(rename = "type")]
    pub clothing_type: ClothingType,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "Utc::now")]
    pub purchase_date: DateTime<Utc>,

    /// Primary colour. Free text, required.
    pub color: String,
    /// Secondary colours, in the order the user picked them.
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub seasons: Vec<Season>,
    #[serde(default)]
    pub occasions: Vec<Occasion>,
    #[serde(default)]
    pub style: Option<String>,

    #[serde(default)]
    pub wear_count: u32,
    #[serde(default)]
    pub last_worn_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_favorite: bool,
    /// 1 to 5, or 0 when unrated.
    #[serde(default)]
    pub rating: u8,

    #[serde(default)]
    pub status: ClothingStatus,
    /// Where the item is kept (wardrobe, drawer, box...).
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ClothingItem {
    /// Builds an item as the add-item flow does: never worn, not a favourite,
    /// unrated, available, purchased now.
    pub fn new(name: impl Into<String>, clothing_type: ClothingType, color: impl Into<String>) -> Self {
        ClothingItem {
            id: 0,
            name: name.into(),
            description: None,
            image_path: None,
            clothing_type,
            brand: None,
            price: 0.0,
            purchase_date: Utc::now(),
            color: color.into(),
            colors: Vec::new(),
            material: None,
            size: None,
            seasons: Vec::new(),
            occasions: Vec::new(),
            style: None,
            wear_count: 0,
            last_worn_date: None,
            is_favorite: false,
            rating: 0,
            status: ClothingStatus::Available,
            location: None,
            tags: Vec::new(),
        }
    }

    /// Checks the fields a record cannot be stored without.
    pub fn validate(&self) -> Result<(), AppResponse> {
        if self.name.trim().is_empty() {
            return Err(AppResponse::ValidationError("Name must not be empty".to_string()));
        }
        if self.color.trim().is_empty() {
            return Err(AppResponse::ValidationError("Primary color must not be empty".to_string()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppResponse::ValidationError(format!(
                "Price must be a non-negative number, got {}",
                self.price
            )));
        }
        validate_rating(self.rating)
    }

    pub fn category(&self) -> ClothingCategory {
        self.clothing_type.category()
    }

    pub fn is_available(&self) -> bool {
        self.status.is_wearable()
    }

    pub fn is_suitable_for_season(&self, season: Season) -> bool {
        self.seasons.contains(&season)
    }

    pub fn is_suitable_for_occasion(&self, occasion: Occasion) -> bool {
        self.occasions.contains(&occasion)
    }

    /// Primary colour equals `color` or it is listed among the secondary colours.
    pub fn has_color(&self, color: &str) -> bool {
        self.color == color || self.colors.iter().any(|c| c == color)
    }

    /// Case-insensitive substring match on the name or the description.
    ///
    /// `needle_lower` must already be lowercased.
    pub(crate) fn matches_search(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle_lower))
    }

    /// Records one wear at `worn_at`.
    pub fn mark_worn(&mut self, worn_at: DateTime<Utc>) {
        self.wear_count = self.wear_count.saturating_add(1);
        self.last_worn_date = Some(worn_at);
    }
}

pub fn validate_rating(rating: u8) -> Result<(), AppResponse> {
    if rating > MAX_RATING {
        return Err(AppResponse::ValidationError(format!(
            "Rating must be between 0 and {MAX_RATING}, got {rating}"
        )));
    }
    Ok(())
}
