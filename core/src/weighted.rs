use crate::GenerationRng;

/// Collection of candidates drawn uniformly by weight.
///
/// Used for unbiased tie-breaking: every candidate added with weight `1` is
/// equally likely to be drawn.
#[derive(Clone, Debug)]
pub struct WeightedList<T> {
    entries: Vec<(T, u32)>,
    total: u32,
}

impl<T> Default for WeightedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WeightedList<T> {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            total: 0,
        }
    }

    /// Adds a candidate. Zero weights are ignored.
    pub fn push(&mut self, item: T, weight: u32) {
        if weight == 0 {
            return;
        }
        self.total = self.total.saturating_add(weight);
        self.entries.push((item, weight));
    }

    /// Sum of all weights.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list holds no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every candidate.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.total = 0;
    }

    /// Draws one candidate, consuming a single roll from the stream.
    pub fn draw(&self, rng: &mut GenerationRng) -> Option<&T> {
        if self.total == 0 {
            return None;
        }

        let mut roll = rng.between(1, self.total);
        for (item, weight) in &self.entries {
            if roll <= *weight {
                return Some(item);
            }
            roll -= weight;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_draws_nothing() {
        let list: WeightedList<u8> = WeightedList::new();
        let mut rng = GenerationRng::new(0);
        assert!(list.draw(&mut rng).is_none());
    }

    #[test]
    fn zero_weight_entries_are_skipped() {
        let mut list = WeightedList::new();
        list.push('a', 0);
        list.push('b', 1);
        let mut rng = GenerationRng::new(11);

        assert_eq!(list.len(), 1);
        for _ in 0..20 {
            assert_eq!(list.draw(&mut rng), Some(&'b'));
        }
    }

    #[test]
    fn every_unit_weight_candidate_is_reachable() {
        let mut list = WeightedList::new();
        for value in 0..4u8 {
            list.push(value, 1);
        }
        let mut rng = GenerationRng::new(5);
        let mut seen = [false; 4];

        for _ in 0..200 {
            if let Some(value) = list.draw(&mut rng) {
                seen[usize::from(*value)] = true;
            }
        }

        assert!(seen.iter().all(|hit| *hit), "draws never covered {seen:?}");
    }

    #[test]
    fn clear_resets_total() {
        let mut list = WeightedList::new();
        list.push(1, 3);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.total(), 0);
    }
}
