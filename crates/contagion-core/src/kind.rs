//! The closed set of place kinds the scheduler buckets by.

use std::fmt;

/// Kind of place an agent can visit.
///
/// Each kind gets its own infectious-place bucket in the daily scheduler,
/// so places of unrelated kinds never contend on registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlaceKind {
    /// A household or group quarters.
    Household,
    /// A neighborhood (community contact).
    Neighborhood,
    /// A school as a whole.
    School,
    /// A classroom within a school.
    Classroom,
    /// A workplace as a whole.
    Workplace,
    /// An office within a workplace.
    Office,
}

impl PlaceKind {
    /// Number of place kinds.
    pub const COUNT: usize = 6;

    /// All kinds, in bucket order.
    pub const ALL: [PlaceKind; Self::COUNT] = [
        PlaceKind::Household,
        PlaceKind::Neighborhood,
        PlaceKind::School,
        PlaceKind::Classroom,
        PlaceKind::Workplace,
        PlaceKind::Office,
    ];

    /// Bucket index of this kind.
    pub fn index(self) -> usize {
        match self {
            PlaceKind::Household => 0,
            PlaceKind::Neighborhood => 1,
            PlaceKind::School => 2,
            PlaceKind::Classroom => 3,
            PlaceKind::Workplace => 4,
            PlaceKind::Office => 5,
        }
    }

    /// Lower-case label used in logs.
    pub fn label(self) -> &'static str {
        match self {
            PlaceKind::Household => "household",
            PlaceKind::Neighborhood => "neighborhood",
            PlaceKind::School => "school",
            PlaceKind::Classroom => "classroom",
            PlaceKind::Workplace => "workplace",
            PlaceKind::Office => "office",
        }
    }
}

impl fmt::Display for PlaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_position_in_all() {
        for (i, kind) in PlaceKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn labels_are_distinct() {
        let mut labels: Vec<_> = PlaceKind::ALL.iter().map(|k| k.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), PlaceKind::COUNT);
    }
}
