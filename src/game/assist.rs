//! Kill-assist window: who recently damaged whom

use std::collections::HashMap;

use super::player::PlayerId;

/// Per-victim map of attacker to the match time of their last damage
#[derive(Debug, Clone, Default)]
pub struct AssistTracker {
    window: f32,
    recent: HashMap<PlayerId, HashMap<PlayerId, f32>>,
}

impl AssistTracker {
    pub fn new(window: f32) -> Self {
        Self {
            window,
            recent: HashMap::new(),
        }
    }

    /// Record that `attacker` damaged `victim` at `now`
    pub fn record(&mut self, victim: PlayerId, attacker: PlayerId, now: f32) {
        if victim == attacker {
            return;
        }
        self.recent.entry(victim).or_default().insert(attacker, now);
    }

    /// Drop entries older than the window
    pub fn prune(&mut self, now: f32) {
        let window = self.window;
        self.recent.retain(|_, attackers| {
            attackers.retain(|_, at| now - *at <= window);
            !attackers.is_empty()
        });
    }

    /// Attackers still inside the window for `victim`, excluding the killer.
    /// The victim's window is cleared. Sorted by most recent damage first.
    pub fn take_assists(
        &mut self,
        victim: PlayerId,
        killer: Option<PlayerId>,
        now: f32,
    ) -> Vec<PlayerId> {
        let Some(attackers) = self.recent.remove(&victim) else {
            return Vec::new();
        };

        let mut eligible: Vec<(PlayerId, f32)> = attackers
            .into_iter()
            .filter(|(attacker, at)| Some(*attacker) != killer && now - *at <= self.window)
            .collect();
        eligible.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        eligible.into_iter().map(|(attacker, _)| attacker).collect()
    }

    /// Forget one victim's window (respawn or leave)
    pub fn clear_victim(&mut self, victim: PlayerId) {
        self.recent.remove(&victim);
    }

    /// Forget everything a player did or suffered
    pub fn forget(&mut self, player: PlayerId) {
        self.recent.remove(&player);
        for attackers in self.recent.values_mut() {
            attackers.remove(&player);
        }
    }

    pub fn clear(&mut self) {
        self.recent.clear();
    }

    /// Number of attackers currently tracked against `victim`
    pub fn tracked(&self, victim: PlayerId) -> usize {
        self.recent.get(&victim).map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn killer_is_not_an_assist() {
        let mut tracker = AssistTracker::new(5.0);
        let (victim, killer, helper) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        tracker.record(victim, helper, 1.0);
        tracker.record(victim, killer, 2.0);

        let assists = tracker.take_assists(victim, Some(killer), 3.0);

        assert_eq!(assists, vec![helper]);
        assert_eq!(tracker.tracked(victim), 0);
    }

    #[test]
    fn stale_damage_expires() {
        let mut tracker = AssistTracker::new(5.0);
        let (victim, helper) = (Uuid::new_v4(), Uuid::new_v4());
        tracker.record(victim, helper, 1.0);

        tracker.prune(7.0);
        assert_eq!(tracker.tracked(victim), 0);

        tracker.record(victim, helper, 8.0);
        assert!(tracker.take_assists(victim, None, 14.0).is_empty());
    }

    #[test]
    fn repeated_damage_refreshes_timestamp() {
        let mut tracker = AssistTracker::new(5.0);
        let (victim, helper) = (Uuid::new_v4(), Uuid::new_v4());
        tracker.record(victim, helper, 1.0);
        tracker.record(victim, helper, 5.0);

        assert_eq!(tracker.take_assists(victim, None, 9.0), vec![helper]);
    }

    #[test]
    fn self_damage_is_ignored() {
        let mut tracker = AssistTracker::new(5.0);
        let victim = Uuid::new_v4();
        tracker.record(victim, victim, 1.0);
        assert_eq!(tracker.tracked(victim), 0);
    }
}
