use std::collections::BTreeMap;

/// Fixed dispatch priorities, lowest first.
pub mod priority {
    pub const SHIP: i32 = 0;
    pub const UFO: i32 = 10;
    pub const ASTEROID: i32 = 20;
    pub const PROJECTILE: i32 = 30;
    pub const COSMETIC: i32 = 40;
}

/// Owner of a [`TickQueue`] that knows how to advance a single item.
///
/// The queue hands control back to its owner for every item so the owner can
/// add or remove items mid-dispatch without aliasing the queue.
pub trait Tickable<K> {
    fn tick_queue(&self) -> &TickQueue<K>;

    fn tick_item(&mut self, item: K, timestamp: f64, elapsed: f64);
}

/// Priority-bucketed set of items dispatched in ascending priority order,
/// insertion order within a bucket.
#[derive(Clone, Debug)]
pub struct TickQueue<K> {
    buckets: BTreeMap<i32, Vec<K>>,
    len: usize,
}

impl<K> Default for TickQueue<K> {
    fn default() -> Self {
        Self {
            buckets: BTreeMap::new(),
            len: 0,
        }
    }
}

impl<K: Copy + PartialEq> TickQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the item was already queued at this priority.
    pub fn add(&mut self, priority: i32, item: K) -> bool {
        let bucket = self.buckets.entry(priority).or_default();
        if bucket.contains(&item) {
            return false;
        }
        bucket.push(item);
        self.len += 1;
        true
    }

    /// Returns `false` if the item was not queued at this priority.
    pub fn remove(&mut self, priority: i32, item: K) -> bool {
        let Some(bucket) = self.buckets.get_mut(&priority) else {
            return false;
        };
        let Some(index) = bucket.iter().position(|queued| *queued == item) else {
            return false;
        };
        bucket.remove(index);
        if bucket.is_empty() {
            self.buckets.remove(&priority);
        }
        self.len -= 1;
        true
    }

    pub fn contains(&self, priority: i32, item: K) -> bool {
        self.buckets
            .get(&priority)
            .is_some_and(|bucket| bucket.contains(&item))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }

    /// Current dispatch order.
    pub fn schedule(&self) -> Vec<(i32, K)> {
        self.buckets
            .iter()
            .flat_map(|(priority, bucket)| bucket.iter().map(move |item| (*priority, *item)))
            .collect()
    }

    /// Dispatches every queued item to `owner`. Items removed before their
    /// turn are skipped; items added during the pass wait for the next one.
    /// Returns the number of items dispatched.
    pub fn tick<T>(owner: &mut T, timestamp: f64, elapsed: f64) -> usize
    where
        T: Tickable<K> + ?Sized,
    {
        let order = owner.tick_queue().schedule();
        let mut dispatched = 0;
        for (priority, item) in order {
            if !owner.tick_queue().contains(priority, item) {
                continue;
            }
            owner.tick_item(item, timestamp, elapsed);
            dispatched += 1;
        }
        dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        queue: TickQueue<u32>,
        seen: Vec<u32>,
        remove_on: Option<(u32, i32, u32)>,
        add_on: Option<(u32, i32, u32)>,
    }

    impl Tickable<u32> for Recorder {
        fn tick_queue(&self) -> &TickQueue<u32> {
            &self.queue
        }

        fn tick_item(&mut self, item: u32, _timestamp: f64, _elapsed: f64) {
            self.seen.push(item);
            if let Some((trigger, priority, victim)) = self.remove_on {
                if trigger == item {
                    self.queue.remove(priority, victim);
                }
            }
            if let Some((trigger, priority, newcomer)) = self.add_on {
                if trigger == item {
                    self.queue.add(priority, newcomer);
                }
            }
        }
    }

    #[test]
    fn dispatches_by_priority_then_insertion() {
        let mut recorder = Recorder::default();
        recorder.queue.add(priority::PROJECTILE, 1);
        recorder.queue.add(priority::SHIP, 2);
        recorder.queue.add(priority::ASTEROID, 3);
        recorder.queue.add(priority::ASTEROID, 4);
        recorder.queue.add(priority::UFO, 5);

        assert_eq!(TickQueue::tick(&mut recorder, 16.0, 0.016), 5);
        assert_eq!(recorder.seen, vec![2, 5, 3, 4, 1]);
    }

    #[test]
    fn removal_during_tick_skips_pending_item() {
        let mut recorder = Recorder {
            remove_on: Some((1, priority::ASTEROID, 3)),
            ..Recorder::default()
        };
        recorder.queue.add(priority::SHIP, 1);
        recorder.queue.add(priority::ASTEROID, 2);
        recorder.queue.add(priority::ASTEROID, 3);
        recorder.queue.add(priority::PROJECTILE, 4);

        assert_eq!(TickQueue::tick(&mut recorder, 0.0, 0.016), 3);
        assert_eq!(recorder.seen, vec![1, 2, 4]);
        assert_eq!(recorder.queue.len(), 3);
    }

    #[test]
    fn items_added_mid_tick_wait_for_next_pass() {
        let mut recorder = Recorder {
            add_on: Some((1, priority::PROJECTILE, 9)),
            ..Recorder::default()
        };
        recorder.queue.add(priority::SHIP, 1);

        TickQueue::tick(&mut recorder, 0.0, 0.016);
        assert_eq!(recorder.seen, vec![1]);

        recorder.add_on = None;
        TickQueue::tick(&mut recorder, 16.0, 0.016);
        assert_eq!(recorder.seen, vec![1, 1, 9]);
    }

    #[test]
    fn duplicate_add_and_missing_remove_are_ignored() {
        let mut queue = TickQueue::new();
        assert!(queue.add(priority::UFO, 7u32));
        assert!(!queue.add(priority::UFO, 7));
        assert!(!queue.remove(priority::SHIP, 7));
        assert!(!queue.remove(priority::UFO, 8));
        assert_eq!(queue.len(), 1);
        assert!(queue.remove(priority::UFO, 7));
        assert!(queue.is_empty());
        assert!(queue.schedule().is_empty());
    }

    #[test]
    fn clear_empties_every_bucket() {
        let mut queue = TickQueue::new();
        queue.add(priority::SHIP, 1u32);
        queue.add(priority::COSMETIC, 2);
        queue.clear();
        assert!(queue.is_empty());
        assert!(!queue.contains(priority::SHIP, 1));
    }
}
