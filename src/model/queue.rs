//! Ordered play queue and the navigation rules for next/previous

use rand::Rng;

use super::types::{RepeatMode, Track};

/// Ordered sequence of tracks plus the selected position.
///
/// `current` is `None` or a valid index after every mutation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Queue {
    tracks: Vec<Track>,
    current: Option<usize>,
}

impl Queue {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            current: None,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|idx| self.tracks.get(idx))
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Select a position; anything out of range clears the selection.
    pub fn select(&mut self, index: Option<usize>) {
        self.current = index.filter(|idx| *idx < self.tracks.len());
    }

    /// Install a fresh sequence. Nothing is selected until a track is played.
    pub fn set_queue(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.current = None;
    }

    /// Swap in a new sequence (a reorder, a filtered copy...) keeping the
    /// selected track selected if it is still present.
    pub fn replace(&mut self, tracks: Vec<Track>) {
        let selected_id = self.current_track().map(|t| t.id.clone());
        self.tracks = tracks;
        self.current = selected_id.and_then(|id| self.index_of(&id));
    }

    /// Append unless a track with the same id is already queued.
    pub fn append(&mut self, track: Track) -> bool {
        if self.index_of(&track.id).is_some() {
            return false;
        }
        self.tracks.push(track);
        true
    }

    /// Remove by id. Removing the selected track moves the selection back one
    /// slot so the track that followed it is what `next` lands on.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(removed) = self.index_of(id) else {
            return false;
        };
        self.tracks.remove(removed);

        self.current = match self.current {
            Some(current) if removed < current => Some(current - 1),
            Some(current) if removed == current => current.checked_sub(1),
            other => other,
        };
        if self.tracks.is_empty() {
            self.current = None;
        }
        true
    }

    /// Target index for a forward step. `None` means nothing should be played:
    /// the queue is empty, or a natural track end reached the last slot with
    /// repeat off.
    pub fn next_index<R: Rng + ?Sized>(
        &self,
        shuffle: bool,
        repeat: RepeatMode,
        auto_advance: bool,
        rng: &mut R,
    ) -> Option<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }

        if auto_advance && repeat == RepeatMode::One {
            if let Some(current) = self.current {
                return Some(current);
            }
        }

        let shuffled = if shuffle { self.random_other(rng) } else { None };
        let next = shuffled.unwrap_or_else(|| match self.current {
            Some(current) => (current + 1) % len,
            None => 0,
        });

        let wrapped = matches!(self.current, Some(current) if current + 1 >= len);
        if auto_advance && repeat == RepeatMode::None && !shuffle && wrapped {
            return None;
        }

        Some(next)
    }

    /// Target index for a backward step. Shuffle picks another random slot,
    /// there is no shuffle history.
    pub fn previous_index<R: Rng + ?Sized>(&self, shuffle: bool, rng: &mut R) -> Option<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }

        let shuffled = if shuffle { self.random_other(rng) } else { None };
        Some(shuffled.unwrap_or_else(|| match self.current {
            Some(current) => (current + len - 1) % len,
            None => len - 1,
        }))
    }

    // Uniform pick excluding the current slot. With fewer than two tracks
    // there is no alternative and the caller falls back to sequential order.
    fn random_other<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        let len = self.tracks.len();
        if len <= 1 {
            return None;
        }
        loop {
            let candidate = rng.random_range(0..len);
            if Some(candidate) != self.current {
                return Some(candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prop_assert;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            title: id.to_uppercase(),
            artist: "artist".to_string(),
            image_url: String::new(),
            audio_url: format!("https://cdn.example/{id}.mp4"),
            local_uri: None,
            duration_secs: 30,
            lyrics: None,
        }
    }

    fn queue_of(ids: &[&str], current: Option<usize>) -> Queue {
        let mut queue = Queue::new(ids.iter().map(|id| track(id)).collect());
        queue.select(current);
        queue
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn sequential_navigation_wraps_both_ways() {
        let queue = queue_of(&["a", "b", "c"], Some(2));
        assert_eq!(queue.next_index(false, RepeatMode::None, false, &mut rng()), Some(0));

        let queue = queue_of(&["a", "b", "c"], Some(0));
        assert_eq!(queue.previous_index(false, &mut rng()), Some(2));
    }

    #[test]
    fn auto_advance_stops_at_end_without_repeat() {
        let queue = queue_of(&["a", "b"], Some(1));
        assert_eq!(queue.next_index(false, RepeatMode::None, true, &mut rng()), None);
        assert_eq!(queue.next_index(false, RepeatMode::All, true, &mut rng()), Some(0));
    }

    #[test]
    fn auto_advance_mid_queue_continues_without_repeat() {
        let queue = queue_of(&["a", "b", "c"], Some(0));
        assert_eq!(queue.next_index(false, RepeatMode::None, true, &mut rng()), Some(1));
    }

    #[test]
    fn shuffle_keeps_auto_advancing_past_the_last_slot() {
        let queue = queue_of(&["a", "b", "c"], Some(2));
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let next = queue.next_index(true, RepeatMode::None, true, &mut rng);
            assert!(matches!(next, Some(0 | 1)), "seed {seed} gave {next:?}");
        }
    }

    #[test]
    fn repeat_one_replays_only_on_natural_end() {
        let queue = queue_of(&["a", "b", "c"], Some(1));
        assert_eq!(queue.next_index(false, RepeatMode::One, true, &mut rng()), Some(1));
        assert_eq!(queue.next_index(false, RepeatMode::One, false, &mut rng()), Some(2));
    }

    #[test]
    fn single_track_shuffle_does_not_spin() {
        let queue = queue_of(&["only"], Some(0));
        assert_eq!(queue.next_index(true, RepeatMode::None, false, &mut rng()), Some(0));
        assert_eq!(queue.next_index(true, RepeatMode::None, true, &mut rng()), Some(0));
        assert_eq!(queue.previous_index(true, &mut rng()), Some(0));
    }

    #[test]
    fn empty_queue_has_no_target() {
        let queue = Queue::default();
        assert_eq!(queue.next_index(true, RepeatMode::All, false, &mut rng()), None);
        assert_eq!(queue.previous_index(false, &mut rng()), None);
    }

    #[test]
    fn append_ignores_duplicate_ids() {
        let mut queue = queue_of(&["a", "b"], Some(0));
        assert!(!queue.append(track("b")));
        assert!(queue.append(track("c")));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn removing_before_selection_shifts_it() {
        let mut queue = queue_of(&["a", "b", "c"], Some(2));
        assert!(queue.remove("a"));
        assert_eq!(queue.current_index(), Some(1));
        assert_eq!(queue.current_track().map(|t| t.id.as_str()), Some("c"));
    }

    #[test]
    fn removing_selected_track_lands_next_on_its_follower() {
        let mut queue = queue_of(&["a", "b", "c"], Some(1));
        assert!(queue.remove("b"));
        let next = queue.next_index(false, RepeatMode::None, false, &mut rng());
        assert_eq!(next.and_then(|idx| queue.get(idx)).map(|t| t.id.as_str()), Some("c"));

        let mut queue = queue_of(&["a", "b"], Some(0));
        assert!(queue.remove("a"));
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn replace_keeps_selected_track_by_id() {
        let mut queue = queue_of(&["a", "b", "c"], Some(1));
        queue.replace(vec![track("c"), track("b"), track("a")]);
        assert_eq!(queue.current_index(), Some(1));

        queue.replace(vec![track("x")]);
        assert_eq!(queue.current_index(), None);
    }

    proptest::proptest! {
        #[test]
        fn shuffle_never_repeats_current(len in 2usize..40, current in 0usize..40, seed in 0u64..1000) {
            let ids: Vec<String> = (0..len).map(|n| format!("t{n}")).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let current = current % len;
            let queue = queue_of(&refs, Some(current));
            let mut rng = StdRng::seed_from_u64(seed);

            let next = queue.next_index(true, RepeatMode::All, false, &mut rng);
            let prev = queue.previous_index(true, &mut rng);
            prop_assert!(next.is_some_and(|idx| idx != current && idx < len));
            prop_assert!(prev.is_some_and(|idx| idx != current && idx < len));
        }

        #[test]
        fn selection_stays_valid_after_random_ops(ops in proptest::collection::vec((0u8..5, 0usize..10), 1..150)) {
            let mut queue = queue_of(&["a", "b", "c", "d"], Some(0));
            let mut rng = StdRng::seed_from_u64(11);

            for (op, arg) in ops {
                match op {
                    0 => { queue.append(track(&format!("t{arg}"))); }
                    1 => { queue.remove(&format!("t{arg}")); }
                    2 => queue.select(Some(arg)),
                    3 => {
                        let next = queue.next_index(arg % 2 == 0, RepeatMode::None, arg % 3 == 0, &mut rng);
                        queue.select(next);
                    }
                    _ => {
                        let mut reordered = queue.tracks().to_vec();
                        reordered.reverse();
                        queue.replace(reordered);
                    }
                }

                if let Some(idx) = queue.current_index() {
                    prop_assert!(idx < queue.len());
                }
            }
        }
    }
}
