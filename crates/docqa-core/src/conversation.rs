//! Ordered, append-only log of conversation turns.

use crate::models::Turn;

/// Conversation log for one session. No cap, no deduplication.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns in the order they were appended.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn reset(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn append_preserves_order_and_duplicates() {
        let mut c = Conversation::new();
        c.append(Turn::user("hi"));
        c.append(Turn::assistant("hello"));
        c.append(Turn::user("hi"));
        let roles: Vec<Role> = c.all().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(c.len(), 3);
        assert_eq!(c.last().map(|t| t.content.as_str()), Some("hi"));
    }

    #[test]
    fn reset_clears() {
        let mut c = Conversation::new();
        c.append(Turn::user("hi"));
        c.reset();
        assert!(c.is_empty());
    }
}
