use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dish categories on the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DishCategory {
    Wok,
    Pizza,
    Soup,
    Dessert,
    Drink,
}

impl fmt::Display for DishCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DishCategory::Wok => write!(f, "wok"),
            DishCategory::Pizza => write!(f, "pizza"),
            DishCategory::Soup => write!(f, "soup"),
            DishCategory::Dessert => write!(f, "dessert"),
            DishCategory::Drink => write!(f, "drink"),
        }
    }
}

impl FromStr for DishCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wok" => Ok(DishCategory::Wok),
            "pizza" => Ok(DishCategory::Pizza),
            "soup" => Ok(DishCategory::Soup),
            "dessert" => Ok(DishCategory::Dessert),
            "drink" => Ok(DishCategory::Drink),
            _ => Err(format!("Invalid dish category: {}", s)),
        }
    }
}

/// Sort orders a caller may request for menu listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DishSorting {
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    RatingAsc,
    RatingDesc,
}

impl fmt::Display for DishSorting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DishSorting::NameAsc => write!(f, "name_asc"),
            DishSorting::NameDesc => write!(f, "name_desc"),
            DishSorting::PriceAsc => write!(f, "price_asc"),
            DishSorting::PriceDesc => write!(f, "price_desc"),
            DishSorting::RatingAsc => write!(f, "rating_asc"),
            DishSorting::RatingDesc => write!(f, "rating_desc"),
        }
    }
}

impl FromStr for DishSorting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name_asc" => Ok(DishSorting::NameAsc),
            "name_desc" => Ok(DishSorting::NameDesc),
            "price_asc" => Ok(DishSorting::PriceAsc),
            "price_desc" => Ok(DishSorting::PriceDesc),
            "rating_asc" => Ok(DishSorting::RatingAsc),
            "rating_desc" => Ok(DishSorting::RatingDesc),
            _ => Err(format!("Invalid dish sorting: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dish_category_string_conversion() {
        assert_eq!(DishCategory::Wok.to_string(), "wok");
        assert_eq!(DishCategory::Pizza.to_string(), "pizza");
        assert_eq!(DishCategory::Soup.to_string(), "soup");
        assert_eq!(DishCategory::Dessert.to_string(), "dessert");
        assert_eq!(DishCategory::Drink.to_string(), "drink");

        assert_eq!("wok".parse::<DishCategory>().unwrap(), DishCategory::Wok);
        assert_eq!("PIZZA".parse::<DishCategory>().unwrap(), DishCategory::Pizza);
        assert_eq!("Soup".parse::<DishCategory>().unwrap(), DishCategory::Soup);

        assert!("invalid".parse::<DishCategory>().is_err());
    }

    #[test]
    fn test_dish_sorting_string_conversion() {
        assert_eq!(DishSorting::NameAsc.to_string(), "name_asc");
        assert_eq!(DishSorting::RatingDesc.to_string(), "rating_desc");

        assert_eq!(
            "price_asc".parse::<DishSorting>().unwrap(),
            DishSorting::PriceAsc
        );
        assert_eq!(
            "RATING_DESC".parse::<DishSorting>().unwrap(),
            DishSorting::RatingDesc
        );

        assert!("sideways".parse::<DishSorting>().is_err());
    }

    #[test]
    fn test_serde_serialization() {
        let category = DishCategory::Dessert;
        let json = serde_json::to_string(&category).unwrap();
        assert_eq!(json, "\"dessert\"");

        let deserialized: DishCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, DishCategory::Dessert);

        let sorting = DishSorting::PriceDesc;
        let json = serde_json::to_string(&sorting).unwrap();
        assert_eq!(json, "\"price_desc\"");
    }
}
