//! Two-phase like state for clients that update optimistically.
//!
//! `begin_toggle` yields a tentative view to show immediately. The pending
//! value must then be resolved exactly once: `confirm` adopts the server's
//! numbers (never the tentative ones), `rollback` restores the prior view.

use serde::{Deserialize, Serialize};

use crate::models::LikeToggle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeView {
    pub liked: bool,
    pub like_count: u64,
}

impl LikeView {
    pub fn new(liked: bool, like_count: u64) -> Self {
        Self { liked, like_count }
    }

    pub fn begin_toggle(self) -> PendingLike {
        let tentative = if self.liked {
            LikeView::new(false, self.like_count.saturating_sub(1))
        } else {
            LikeView::new(true, self.like_count + 1)
        };
        PendingLike {
            previous: self,
            tentative,
        }
    }
}

impl From<LikeToggle> for LikeView {
    fn from(outcome: LikeToggle) -> Self {
        LikeView::new(outcome.liked, outcome.like_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a pending like must be confirmed or rolled back"]
pub struct PendingLike {
    previous: LikeView,
    tentative: LikeView,
}

impl PendingLike {
    pub fn tentative(&self) -> LikeView {
        self.tentative
    }

    pub fn confirm(self, outcome: LikeToggle) -> LikeView {
        outcome.into()
    }

    pub fn rollback(self) -> LikeView {
        self.previous
    }

    /// Resolves against the server response in one step.
    pub fn settle<E>(self, response: Result<LikeToggle, E>) -> LikeView {
        match response {
            Ok(outcome) => self.confirm(outcome),
            Err(_) => self.rollback(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tentative_flips_state() {
        let pending = LikeView::new(false, 3).begin_toggle();
        assert_eq!(pending.tentative(), LikeView::new(true, 4));
        let _ = pending.rollback();
    }

    #[test]
    fn confirm_trusts_server_not_guess() {
        // Someone else liked in the meantime: server says 6, not our 5.
        let pending = LikeView::new(false, 4).begin_toggle();
        let view = pending.confirm(LikeToggle { liked: true, like_count: 6 });
        assert_eq!(view, LikeView::new(true, 6));
    }

    #[test]
    fn failure_rolls_back() {
        let before = LikeView::new(true, 1);
        let view = before.begin_toggle().settle::<&str>(Err("network down"));
        assert_eq!(view, before);
    }

    #[test]
    fn tentative_unlike_never_goes_negative() {
        let pending = LikeView::new(true, 0).begin_toggle();
        assert_eq!(pending.tentative(), LikeView::new(false, 0));
        let _ = pending.rollback();
    }
}
