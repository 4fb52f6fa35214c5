//! Closed classification tables for clothing items.
//!
//! Each vocabulary is a fixed enum whose variants carry two names:
//!
//! - a **symbolic name** (`"T_SHIRT"`, `"NEED_REPAIR"`), used for storage,
//!   serde and the C ABI. Parsing it is strict: unknown names are rejected.
//! - a **display name** (`"T恤"`, `"需修补"`), shown by the host UI. Parsing it
//!   is lossy: an unknown label falls back to the vocabulary's default variant.
//!
//! ```rust
//! use wardrobe_core::vocabulary::{ClothingCategory, ClothingType, Season};
//!
//! assert_eq!(ClothingType::Coat.category(), ClothingCategory::Top);
//! assert_eq!(ClothingType::from_display_name("不存在"), ClothingType::Other);
//! assert_eq!(Season::from_month(7), Season::Summer);
//! ```

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{Datelike, Local};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::app_response::AppResponse;

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, fallback = $fallback:ident {
            $( $variant:ident => $symbol:literal, $label:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            /// Symbolic name used for persistence.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $symbol, )+
                }
            }

            /// Label shown to users.
            pub const fn display_name(self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }

            /// Reverse label lookup. Unknown labels map to the fallback variant.
            pub fn from_display_name(label: &str) -> Self {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.display_name() == label)
                    .unwrap_or($name::$fallback)
            }
        }

        impl FromStr for $name {
            type Err = AppResponse;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $symbol => Ok($name::$variant), )+
                    other => Err(AppResponse::ValidationError(format!(
                        "Unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.display_name())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let symbol = String::deserialize(deserializer)?;
                symbol.parse().map_err(|e: AppResponse| D::Error::custom(e))
            }
        }
    };
}

vocabulary! {
    /// Coarse grouping used by the UI filter chips.
    ClothingCategory, fallback = Other {
        Top => "TOP", "上装";
        Bottom => "BOTTOM", "下装";
        Shoes => "SHOES", "鞋类";
        Underwear => "UNDERWEAR", "内衣";
        Accessories => "ACCESSORIES", "配饰";
        Sportswear => "SPORTSWEAR", "运动装";
        Other => "OTHER", "其他";
    }
}

vocabulary! {
    /// Fine-grained garment type.
    ClothingType, fallback = Other {
        TShirt => "T_SHIRT", "T恤";
        Shirt => "SHIRT", "衬衫";
        Blouse => "BLOUSE", "女式衬衫";
        Sweater => "SWEATER", "毛衣";
        Hoodie => "HOODIE", "连帽衫";
        Jacket => "JACKET", "夹克";
        Coat => "COAT", "外套";
        Blazer => "BLAZER", "西装外套";
        Cardigan => "CARDIGAN", "开衫";
        Vest => "VEST", "背心";
        TankTop => "TANK_TOP", "吊带";
        Jeans => "JEANS", "牛仔裤";
        Trousers => "TROUSERS", "长裤";
        Shorts => "SHORTS", "短裤";
        Skirt => "SKIRT", "裙子";
        Dress => "DRESS", "连衣裙";
        Leggings => "LEGGINGS", "打底裤";
        Sneakers => "SNEAKERS", "运动鞋";
        DressShoes => "DRESS_SHOES", "正装鞋";
        Boots => "BOOTS", "靴子";
        Sandals => "SANDALS", "凉鞋";
        Flats => "FLATS", "平底鞋";
        Heels => "HEELS", "高跟鞋";
        Slippers => "SLIPPERS", "拖鞋";
        Underwear => "UNDERWEAR", "内衣";
        Socks => "SOCKS", "袜子";
        Tights => "TIGHTS", "丝袜";
        Hat => "HAT", "帽子";
        Scarf => "SCARF", "围巾";
        Gloves => "GLOVES", "手套";
        Belt => "BELT", "腰带";
        Bag => "BAG", "包包";
        Jewelry => "JEWELRY", "首饰";
        Watch => "WATCH", "手表";
        Sunglasses => "SUNGLASSES", "太阳镜";
        Sportswear => "SPORTSWEAR", "运动服";
        Swimwear => "SWIMWEAR", "泳装";
        Pajamas => "PAJAMAS", "睡衣";
        Uniform => "UNIFORM", "制服";
        Other => "OTHER", "其他";
    }
}

vocabulary! {
    /// Where an item currently is in its care cycle.
    ClothingStatus, fallback = Available {
        Available => "AVAILABLE", "可穿";
        Dirty => "DIRTY", "需洗";
        Washing => "WASHING", "洗涤中";
        Drying => "DRYING", "晾晒中";
        NeedRepair => "NEED_REPAIR", "需修补";
        Stored => "STORED", "收纳中";
        Donated => "DONATED", "已捐赠";
        Discarded => "DISCARDED", "已丢弃";
        Lost => "LOST", "丢失";
        Borrowed => "BORROWED", "借出";
        SeasonalStorage => "SEASONAL_STORAGE", "季节性收纳";
    }
}

vocabulary! {
    Season, fallback = AllSeason {
        Spring => "SPRING", "春季";
        Summer => "SUMMER", "夏季";
        Autumn => "AUTUMN", "秋季";
        Winter => "WINTER", "冬季";
        AllSeason => "ALL_SEASON", "四季";
    }
}

vocabulary! {
    Occasion, fallback = Other {
        Casual => "CASUAL", "休闲";
        Work => "WORK", "工作";
        Formal => "FORMAL", "正式";
        Party => "PARTY", "聚会";
        Sport => "SPORT", "运动";
        Travel => "TRAVEL", "旅行";
        Date => "DATE", "约会";
        Business => "BUSINESS", "商务";
        Wedding => "WEDDING", "婚礼";
        Interview => "INTERVIEW", "面试";
        School => "SCHOOL", "上学";
        Home => "HOME", "居家";
        Outdoor => "OUTDOOR", "户外";
        Beach => "BEACH", "海滩";
        Shopping => "SHOPPING", "购物";
        Dinner => "DINNER", "晚餐";
        Meeting => "MEETING", "会议";
        Vacation => "VACATION", "度假";
        Festival => "FESTIVAL", "节日";
        Other => "OTHER", "其他";
    }
}

impl ClothingType {
    /// Category this type is grouped under.
    ///
    /// The match is exhaustive on purpose: adding a type without assigning it
    /// a category does not compile.
    pub const fn category(self) -> ClothingCategory {
        use ClothingType::*;
        match self {
            TShirt | Shirt | Blouse | Sweater | Hoodie | Jacket | Coat | Blazer | Cardigan
            | Vest | TankTop => ClothingCategory::Top,
            Jeans | Trousers | Shorts | Skirt | Dress | Leggings => ClothingCategory::Bottom,
            Sneakers | DressShoes | Boots | Sandals | Flats | Heels | Slippers => {
                ClothingCategory::Shoes
            }
            Underwear | Socks | Tights => ClothingCategory::Underwear,
            Hat | Scarf | Gloves | Belt | Bag | Jewelry | Watch | Sunglasses => {
                ClothingCategory::Accessories
            }
            Sportswear | Swimwear => ClothingCategory::Sportswear,
            Pajamas | Uniform | Other => ClothingCategory::Other,
        }
    }

    pub const fn is_outerwear(self) -> bool {
        matches!(self, ClothingType::Jacket | ClothingType::Coat | ClothingType::Blazer)
    }

    pub const fn is_formal(self) -> bool {
        matches!(
            self,
            ClothingType::Shirt
                | ClothingType::Blouse
                | ClothingType::Blazer
                | ClothingType::Trousers
                | ClothingType::DressShoes
                | ClothingType::Dress
        )
    }

    /// All types belonging to `category`, in declaration order.
    pub fn in_category(category: ClothingCategory) -> impl Iterator<Item = ClothingType> {
        Self::ALL
            .iter()
            .copied()
            .filter(move |t| t.category() == category)
    }
}

impl Default for ClothingStatus {
    fn default() -> Self {
        ClothingStatus::Available
    }
}

impl ClothingStatus {
    pub const fn is_wearable(self) -> bool {
        matches!(self, ClothingStatus::Available)
    }

    pub const fn needs_attention(self) -> bool {
        matches!(
            self,
            ClothingStatus::Dirty | ClothingStatus::NeedRepair | ClothingStatus::Lost
        )
    }

    pub const fn is_in_process(self) -> bool {
        matches!(self, ClothingStatus::Washing | ClothingStatus::Drying)
    }
}

impl Season {
    /// Northern-hemisphere season for a 1-based month. Out-of-range months
    /// yield [`Season::AllSeason`].
    pub const fn from_month(month: u32) -> Season {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            12 | 1 | 2 => Season::Winter,
            _ => Season::AllSeason,
        }
    }

    /// Season for today's date on the local clock.
    pub fn current() -> Season {
        Season::from_month(Local::now().month())
    }
}

impl Occasion {
    pub const fn is_formal(self) -> bool {
        matches!(
            self,
            Occasion::Formal
                | Occasion::Business
                | Occasion::Wedding
                | Occasion::Interview
                | Occasion::Meeting
                | Occasion::Dinner
        )
    }

    pub const fn is_casual(self) -> bool {
        matches!(
            self,
            Occasion::Casual | Occasion::Home | Occasion::Shopping | Occasion::Travel | Occasion::Vacation
        )
    }

    pub const fn is_sport(self) -> bool {
        matches!(self, Occasion::Sport | Occasion::Outdoor | Occasion::Beach)
    }
}
