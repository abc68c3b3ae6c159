// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::Serialize;

/// A wire value in three-valued logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Logic {
    Zero,
    One,
    #[default]
    Unknown,
}

impl Logic {
    /// Parses a single vector character; `u` is accepted for `U`.
    pub fn from_char(c: char) -> Option<Logic> {
        match c {
            '0' => Some(Logic::Zero),
            '1' => Some(Logic::One),
            'U' | 'u' => Some(Logic::Unknown),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Logic::Zero => '0',
            Logic::One => '1',
            Logic::Unknown => 'U',
        }
    }

    pub fn is_known(self) -> bool {
        self != Logic::Unknown
    }

    /// Complement; `U` stays `U`.
    pub fn not(self) -> Logic {
        match self {
            Logic::Zero => Logic::One,
            Logic::One => Logic::Zero,
            Logic::Unknown => Logic::Unknown,
        }
    }
}

impl From<bool> for Logic {
    fn from(value: bool) -> Self {
        if value {
            Logic::One
        } else {
            Logic::Zero
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}
