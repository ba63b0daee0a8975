//! Streak bonus calculator
//!
//! Engaging with other players' classifications during the week earns extra
//! deploys: one per qualifying comment, plus one per `votes_per_bonus`
//! qualifying upvotes (rounded down). An interaction qualifies only when the
//! classification it targets has a known author who is someone else.

use serde::Serialize;

use crate::types::{InteractionRow, UserId};

/// Breakdown of the week's engagement credit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakCredit {
    pub qualifying_comments: i64,
    pub qualifying_votes: i64,
    /// Extra deploys earned this window
    pub bonus: i64,
}

/// Count interactions aimed at someone else's classification. Authors are
/// compared as stored text, so ids that are not UUIDs still count.
pub fn count_qualifying(user: UserId, rows: &[InteractionRow]) -> i64 {
    let me = user.to_string();
    rows.iter()
        .filter(|row| matches!(row.target_author.as_deref(), Some(author) if author != me))
        .count() as i64
}

/// `floor(votes / votes_per_bonus) + comments`
pub fn bonus(qualifying_comments: i64, qualifying_votes: i64, votes_per_bonus: i64) -> i64 {
    qualifying_votes / votes_per_bonus.max(1) + qualifying_comments
}

/// Compute the credit from the user's raw comment and upvote rows.
pub fn streak_credit(
    user: UserId,
    comments: &[InteractionRow],
    upvotes: &[InteractionRow],
    votes_per_bonus: i64,
) -> StreakCredit {
    let qualifying_comments = count_qualifying(user, comments);
    let qualifying_votes = count_qualifying(user, upvotes);
    StreakCredit {
        qualifying_comments,
        qualifying_votes,
        bonus: bonus(qualifying_comments, qualifying_votes, votes_per_bonus),
    }
}
