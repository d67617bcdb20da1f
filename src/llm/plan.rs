use rand::seq::SliceRandom;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub key: String,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    // The credential itself is throttled; no point trying its other models.
    RateLimited,
    Failed,
}

// Ordered (credential, model) attempt list. Credential order is shuffled so
// load spreads across keys; within a credential, models run in priority order.
pub struct AttemptPlan {
    attempts: Vec<Attempt>,
    pos: usize,
}

impl AttemptPlan {
    pub fn new(keys: &[String], models: &[&str]) -> Self {
        let mut shuffled: Vec<String> = keys.to_vec();
        shuffled.shuffle(&mut rand::thread_rng());
        Self::with_order(&shuffled, models)
    }

    pub fn with_order(keys: &[String], models: &[&str]) -> Self {
        let mut attempts = Vec::with_capacity(keys.len() * models.len());
        for key in keys {
            for model in models {
                attempts.push(Attempt {
                    key: key.clone(),
                    model: (*model).to_string(),
                });
            }
        }
        Self { attempts, pos: 0 }
    }

    pub fn current(&self) -> Option<&Attempt> {
        self.attempts.get(self.pos)
    }

    pub fn advance(&mut self, outcome: Outcome) {
        let Some(current) = self.attempts.get(self.pos) else {
            return;
        };
        match outcome {
            Outcome::Success => self.pos = self.attempts.len(),
            Outcome::RateLimited => {
                let key = current.key.clone();
                while self
                    .attempts
                    .get(self.pos)
                    .map(|a| a.key == key)
                    .unwrap_or(false)
                {
                    self.pos += 1;
                }
            }
            Outcome::Failed => self.pos += 1,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.attempts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plan_covers_every_key_model_pair_in_order() {
        let mut plan = AttemptPlan::with_order(&keys(&["k1", "k2"]), &["m1", "m2"]);
        let mut seen = Vec::new();
        while let Some(attempt) = plan.current() {
            seen.push((attempt.key.clone(), attempt.model.clone()));
            plan.advance(Outcome::Failed);
        }
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], ("k1".to_string(), "m1".to_string()));
        assert_eq!(seen[1], ("k1".to_string(), "m2".to_string()));
        assert_eq!(seen[2], ("k2".to_string(), "m1".to_string()));
    }

    #[test]
    fn rate_limit_abandons_the_whole_credential() {
        let mut plan = AttemptPlan::with_order(&keys(&["k1", "k2"]), &["m1", "m2", "m3"]);
        plan.advance(Outcome::RateLimited);
        let next = plan.current().unwrap();
        assert_eq!(next.key, "k2");
        assert_eq!(next.model, "m1");
    }

    #[test]
    fn success_exhausts_the_plan() {
        let mut plan = AttemptPlan::with_order(&keys(&["k1"]), &["m1", "m2"]);
        plan.advance(Outcome::Success);
        assert!(plan.is_exhausted());
        assert!(plan.current().is_none());
    }

    #[test]
    fn empty_key_list_is_immediately_exhausted() {
        let plan = AttemptPlan::with_order(&[], &["m1"]);
        assert!(plan.is_exhausted());
    }
}
