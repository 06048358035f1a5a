use rocket_td_core::{Event, Gold};

/// Currency and base health owned by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Treasury {
    gold: Gold,
    base_hp: u32,
    kills: u32,
    leaks: u32,
}

impl Treasury {
    pub(crate) const fn new(gold: Gold, base_hp: u32) -> Self {
        Self {
            gold,
            base_hp,
            kills: 0,
            leaks: 0,
        }
    }

    pub(crate) const fn gold(&self) -> Gold {
        self.gold
    }

    pub(crate) const fn base_hp(&self) -> u32 {
        self.base_hp
    }

    pub(crate) const fn kills(&self) -> u32 {
        self.kills
    }

    pub(crate) const fn leaks(&self) -> u32 {
        self.leaks
    }

    pub(crate) const fn is_defeated(&self) -> bool {
        self.base_hp == 0
    }

    /// Deducts `cost` when the balance covers it.
    pub(crate) fn try_spend(&mut self, cost: Gold) -> bool {
        let Some(left) = self.gold.get().checked_sub(cost.get()) else {
            return false;
        };
        self.gold = Gold::new(left);
        true
    }

    /// Credits kill bonuses and charges base damage.
    pub(crate) fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::EnemyKilled { kill_bonus, .. } => {
                    self.kills += 1;
                    self.gold = Gold::new(self.gold.get().saturating_add(kill_bonus.get()));
                }
                Event::EnemyReachedBase { damage, .. } => {
                    self.leaks += 1;
                    self.base_hp = self.base_hp.saturating_sub(*damage);
                }
                _ => {}
            }
        }
    }
}
