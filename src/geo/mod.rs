use std::fmt;

use serde::{Deserialize, Serialize};

/// Cities served by the platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum City {
    Yaounde,
    Douala,
    Bafoussam,
}

impl City {
    pub fn slug(self) -> &'static str {
        match self {
            City::Yaounde => "yaounde",
            City::Douala => "douala",
            City::Bafoussam => "bafoussam",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            City::Yaounde => "Yaoundé",
            City::Douala => "Douala",
            City::Bafoussam => "Bafoussam",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// An unordered pair of cities. `Route::new(a, b) == Route::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    a: City,
    b: City,
}

impl Route {
    pub fn new(from: City, to: City) -> Self {
        if (from as u8) <= (to as u8) {
            Self { a: from, b: to }
        } else {
            Self { a: to, b: from }
        }
    }

    pub fn cities(&self) -> (City, City) {
        (self.a, self.b)
    }
}
