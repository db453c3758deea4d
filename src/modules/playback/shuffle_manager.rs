use rand::seq::SliceRandom;
use std::collections::HashSet;

/// Shuffle state for a queue.
///
/// Keeps a permutation of queue indices whose first element is the track that
/// was current when it was generated, a cursor into it, and the set of queue
/// indices played since the last generation. The sequencer uses the played
/// set to decide when a shuffle pass is exhausted.
#[derive(Debug, Clone, Default)]
pub struct ShuffleManager {
    /// Whether shuffle is currently enabled
    enabled: bool,

    /// Queue indices in shuffled order; `order[0]` is the anchor
    order: Vec<usize>,

    /// Cursor into `order` pointing at the current track
    position: usize,

    /// Queue indices played since the order was last generated
    played: HashSet<usize>,
}

impl ShuffleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle shuffle on/off, returning the new state.
    pub fn toggle(&mut self, current_index: Option<usize>, queue_len: usize) -> bool {
        self.set_enabled(!self.enabled, current_index, queue_len);
        self.enabled
    }

    /// Set shuffle state explicitly.
    ///
    /// Turning it on clears the played set and regenerates the order anchored
    /// at `current_index`. Turning it off drops both.
    pub fn set_enabled(&mut self, enabled: bool, current_index: Option<usize>, queue_len: usize) {
        if self.enabled == enabled {
            return;
        }

        self.enabled = enabled;
        self.played.clear();
        if enabled {
            match current_index {
                Some(anchor) if queue_len > 0 => self.regenerate(anchor, queue_len),
                _ => self.clear_order(),
            }
        } else {
            self.clear_order();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Build a new order: every index except `anchor`, uniformly permuted,
    /// with `anchor` prepended. Resets the cursor to 0.
    pub fn regenerate(&mut self, anchor: usize, queue_len: usize) {
        if queue_len == 0 {
            self.clear_order();
            return;
        }

        let mut rest: Vec<usize> = (0..queue_len).filter(|&i| i != anchor).collect();
        let mut rng = rand::rng();
        rest.shuffle(&mut rng);

        self.order = Vec::with_capacity(queue_len);
        self.order.push(anchor);
        self.order.extend(rest);
        self.position = 0;
    }

    /// Move the cursor forward (wrapping) and return the queue index there.
    pub fn advance(&mut self) -> Option<usize> {
        if self.order.is_empty() {
            return None;
        }
        self.position = (self.position + 1) % self.order.len();
        self.order.get(self.position).copied()
    }

    /// Move the cursor backward (wrapping) and return the queue index there.
    pub fn retreat(&mut self) -> Option<usize> {
        if self.order.is_empty() {
            return None;
        }
        let len = self.order.len();
        self.position = (self.position + len - 1) % len;
        self.order.get(self.position).copied()
    }

    pub fn mark_played(&mut self, index: usize) {
        self.played.insert(index);
    }

    pub fn clear_played(&mut self) {
        self.played.clear();
    }

    /// True once every queue index has been played since the last generation.
    pub fn is_exhausted(&self, queue_len: usize) -> bool {
        self.played.len() >= queue_len
    }

    /// Reflect the removal of queue entry `removed`.
    ///
    /// Drops it from the order and the played set and shifts higher indices
    /// down. Returns the queue index now under the cursor, which is the
    /// current track unless the removed entry was current.
    pub fn remove_index(&mut self, removed: usize) -> Option<usize> {
        self.played.remove(&removed);
        self.played = self
            .played
            .iter()
            .map(|&i| if i > removed { i - 1 } else { i })
            .collect();

        if let Some(pos) = self.order.iter().position(|&i| i == removed) {
            self.order.remove(pos);
            if pos < self.position {
                self.position -= 1;
            }
        }
        for index in self.order.iter_mut() {
            if *index > removed {
                *index -= 1;
            }
        }

        if self.order.is_empty() {
            self.position = 0;
            return None;
        }
        if self.position >= self.order.len() {
            self.position = 0;
        }
        self.order.get(self.position).copied()
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn played(&self) -> &HashSet<usize> {
        &self.played
    }

    /// Get remaining tracks before the current pass is exhausted
    pub fn remaining_in_pass(&self, queue_len: usize) -> usize {
        queue_len.saturating_sub(self.played.len())
    }

    fn clear_order(&mut self) {
        self.order.clear();
        self.position = 0;
    }
}
