use chrono::NaiveDateTime;
use dashmap::DashMap;
use merkaz_lib::cooldown::{self, CooldownState, Decision};

/// per user suggestion cooldowns, kept in memory only
#[derive(Debug)]
pub struct Feedback {
    levels: Vec<u64>,
    states: DashMap<String, CooldownState>,
}

impl Feedback {
    pub fn new(levels: Vec<u64>) -> Self {
        Feedback {
            levels,
            states: DashMap::new(),
        }
    }

    /// one based level for the given user
    pub fn level(&self, email: &str) -> usize {
        self.states.get(email)
            .map(|state| state.level())
            .unwrap_or(1)
    }

    /// evaluates the submission and records it when allowed. a refused
    /// submission still keeps a new day's level reset
    pub fn submit(&self, email: &str, now: NaiveDateTime) -> Decision {
        let mut entry = self.states.entry(email.to_owned()).or_default();

        let decision = cooldown::evaluate(&self.levels, &entry, now);

        if decision.allowed || decision.next.index != entry.index {
            *entry = decision.next.clone();
        }

        decision
    }
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, Duration};

    use super::*;

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
            .and_hms_opt(hour, min, 0).unwrap()
    }

    #[test]
    fn tracks_users_separately() {
        let feedback = Feedback::new(cooldown::DEFAULT_LEVELS.to_vec());

        assert_eq!(feedback.level("a@example.com"), 1);
        assert!(feedback.submit("a@example.com", at(9, 0)).allowed);
        assert_eq!(feedback.level("a@example.com"), 2);

        let refused = feedback.submit("a@example.com", at(9, 1));

        assert!(!refused.allowed);
        assert_eq!(refused.wait_seconds, 240);
        assert_eq!(feedback.level("a@example.com"), 2);

        assert!(feedback.submit("b@example.com", at(9, 1)).allowed);
        assert!(feedback.submit("a@example.com", at(9, 0) + Duration::seconds(300)).allowed);
        assert_eq!(feedback.level("a@example.com"), 3);
    }

    #[test]
    fn refusal_keeps_new_day_reset() {
        let feedback = Feedback::new(cooldown::DEFAULT_LEVELS.to_vec());
        let late = at(23, 59) + Duration::seconds(30);

        assert!(feedback.submit("a@example.com", late - Duration::seconds(400)).allowed);
        assert!(feedback.submit("a@example.com", late).allowed);
        assert_eq!(feedback.level("a@example.com"), 3);

        // past midnight, inside of the first level
        let refused = feedback.submit("a@example.com", late + Duration::seconds(40));

        assert!(!refused.allowed);
        assert_eq!(refused.wait_seconds, 20);
        assert_eq!(feedback.level("a@example.com"), 1);
    }
}
