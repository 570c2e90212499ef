//! Venue, Restaurant and Menu Item Models (read-only reference data)

use crate::geo::Coordinate;
use serde::{Deserialize, Serialize};

/// Section title for menu items without a section
pub const DEFAULT_MENU_SECTION: &str = "Menu";

/// Venue entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Venue {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Venue {
    /// Both coordinates, if the venue has them
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }
}

/// Restaurant (concession stand) inside a venue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Restaurant {
    pub id: String,
    #[serde(default)]
    pub venue_id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub eta_minutes: u32,
}

/// Menu item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub id: String,
    #[serde(default)]
    pub restaurant_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price in currency unit
    pub price: f64,
    #[serde(default)]
    pub section: Option<String>,
}

/// Menu items grouped under one section heading
#[derive(Debug, Clone, PartialEq)]
pub struct MenuSection {
    pub title: String,
    pub items: Vec<MenuItem>,
}

/// Group items by section, keeping first-seen section order.
pub fn group_menu_sections(items: Vec<MenuItem>) -> Vec<MenuSection> {
    let mut sections: Vec<MenuSection> = Vec::new();
    for item in items {
        let title = item
            .section
            .clone()
            .unwrap_or_else(|| DEFAULT_MENU_SECTION.to_string());
        match sections.iter_mut().find(|s| s.title == title) {
            Some(section) => section.items.push(item),
            None => sections.push(MenuSection {
                title,
                items: vec![item],
            }),
        }
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, section: Option<&str>) -> MenuItem {
        MenuItem {
            id: id.into(),
            restaurant_id: "r".into(),
            name: id.into(),
            description: None,
            price: 5.0,
            section: section.map(Into::into),
        }
    }

    #[test]
    fn test_venue_coordinate_requires_both() {
        let mut venue = Venue {
            id: "v".into(),
            name: "Arena".into(),
            slug: None,
            city: None,
            state: None,
            latitude: Some(40.0),
            longitude: None,
        };
        assert!(venue.coordinate().is_none());
        venue.longitude = Some(-70.0);
        assert_eq!(venue.coordinate(), Some(Coordinate::new(40.0, -70.0)));
    }

    #[test]
    fn test_group_menu_sections() {
        let sections = group_menu_sections(vec![
            item("burger", Some("Mains")),
            item("water", None),
            item("hotdog", Some("Mains")),
            item("cola", Some("Drinks")),
        ]);
        let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Mains", "Menu", "Drinks"]);
        assert_eq!(sections[0].items.len(), 2);
    }
}
