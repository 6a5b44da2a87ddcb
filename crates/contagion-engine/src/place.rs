//! Places and the place registry.

use contagion_core::{DiseaseId, PlaceId, PlaceKind};

use crate::buffer::PlaceDayState;

/// A location agents visit, with one visitor state per disease.
#[derive(Debug)]
pub struct Place {
    id: PlaceId,
    kind: PlaceKind,
    days: Box<[PlaceDayState]>,
}

impl Place {
    /// This place's id.
    pub fn id(&self) -> PlaceId {
        self.id
    }

    /// This place's kind.
    pub fn kind(&self) -> PlaceKind {
        self.kind
    }

    /// Today's visitor state for `disease`.
    ///
    /// # Panics
    ///
    /// Panics if `disease` is not tracked.
    #[inline]
    pub fn state(&self, disease: DiseaseId) -> &PlaceDayState {
        match self.days.get(disease.index()) {
            Some(state) => state,
            None => panic!("disease {disease} is not tracked at place {}", self.id),
        }
    }
}

/// Owns every place. Ids are dense and assigned in insertion order.
#[derive(Debug)]
pub struct Places {
    places: Vec<Place>,
    diseases: u16,
    shards_per_place: usize,
}

impl Places {
    /// Empty registry tracking `diseases` diseases, with
    /// `shards_per_place` visitor shards per place-per-disease.
    pub fn new(diseases: u16, shards_per_place: usize) -> Self {
        Self {
            places: Vec::new(),
            diseases,
            shards_per_place: shards_per_place.max(1),
        }
    }

    /// Add a place of `kind` and return its id.
    pub fn add_place(&mut self, kind: PlaceKind) -> PlaceId {
        let id = PlaceId(self.places.len() as u32);
        self.places.push(Place {
            id,
            kind,
            days: (0..self.diseases)
                .map(|_| PlaceDayState::new(self.shards_per_place))
                .collect(),
        });
        id
    }

    /// The place with `id`.
    ///
    /// # Panics
    ///
    /// Panics if no such place exists.
    #[inline]
    pub fn get(&self, id: PlaceId) -> &Place {
        match self.places.get(id.index()) {
            Some(place) => place,
            None => panic!("unknown place {id}"),
        }
    }

    /// The place with `id`, if it exists.
    pub fn try_get(&self, id: PlaceId) -> Option<&Place> {
        self.places.get(id.index())
    }

    /// Number of places.
    pub fn len(&self) -> usize {
        self.places.len()
    }

    /// Whether there are no places.
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Number of diseases tracked per place.
    pub fn diseases(&self) -> u16 {
        self.diseases
    }

    /// Visitor shards in each place-per-disease buffer.
    pub fn shards_per_place(&self) -> usize {
        self.shards_per_place
    }

    /// Number of places of `kind`.
    pub fn count_of(&self, kind: PlaceKind) -> usize {
        self.places.iter().filter(|p| p.kind == kind).count()
    }

    /// All places in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Place> {
        self.places.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contagion_core::Slot;

    #[test]
    fn ids_are_dense() {
        let mut places = Places::new(2, 1);
        let a = places.add_place(PlaceKind::Household);
        let b = places.add_place(PlaceKind::Office);
        assert_eq!((a, b), (PlaceId(0), PlaceId(1)));
        assert_eq!(places.get(b).kind(), PlaceKind::Office);
        assert_eq!(places.count_of(PlaceKind::Household), 1);
        assert_eq!(places.len(), 2);
        assert!(places.try_get(PlaceId(2)).is_none());
    }

    #[test]
    fn diseases_have_separate_state() {
        let mut places = Places::new(2, 3);
        let id = places.add_place(PlaceKind::School);
        let place = places.get(id);
        place.state(DiseaseId(0)).add_infectious(Slot(1));
        assert!(place.state(DiseaseId(0)).is_infectious());
        assert!(!place.state(DiseaseId(1)).is_infectious());
        assert_eq!(place.state(DiseaseId(1)).shard_count(), 3);
    }

    #[test]
    #[should_panic(expected = "disease 2 is not tracked")]
    fn untracked_disease_panics() {
        let mut places = Places::new(2, 1);
        let id = places.add_place(PlaceKind::School);
        places.get(id).state(DiseaseId(2));
    }

    #[test]
    #[should_panic(expected = "unknown place 5")]
    fn unknown_place_panics() {
        Places::new(1, 1).get(PlaceId(5));
    }
}
