//! The closed set of hotel-review aspects a model may report on.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Cleanliness,
    StaffBehaviour,
    RoomQuality,
    FoodAndBeverage,
    Location,
    Facilities,
    ValueForMoney,
    CheckInCheckOut,
    SafetyAndSecurity,
    NoiseLevels,
    Maintenance,
}

impl Category {
    /// Every category, in output column order.
    pub const ALL: [Category; 11] = [
        Category::Cleanliness,
        Category::StaffBehaviour,
        Category::RoomQuality,
        Category::FoodAndBeverage,
        Category::Location,
        Category::Facilities,
        Category::ValueForMoney,
        Category::CheckInCheckOut,
        Category::SafetyAndSecurity,
        Category::NoiseLevels,
        Category::Maintenance,
    ];

    /// The label used as the JSON key in model output and as the CSV column header.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Cleanliness => "Cleanliness",
            Category::StaffBehaviour => "Staff Behaviour / Hospitality",
            Category::RoomQuality => "Room Quality / Comfort",
            Category::FoodAndBeverage => "Food & Beverage",
            Category::Location => "Location",
            Category::Facilities => "Facilities / Amenities",
            Category::ValueForMoney => "Value for Money",
            Category::CheckInCheckOut => "Check-in / Check-out Process",
            Category::SafetyAndSecurity => "Safety & Security",
            Category::NoiseLevels => "Noise Levels",
            Category::Maintenance => "Maintenance",
        }
    }

    /// Exact label match. Keys are case-sensitive because they are also column headers.
    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
