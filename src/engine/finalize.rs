//! End-of-game finalization
//!
//! The final score and the three stars are each posted once, gated by the
//! game's [`FinalChecklist`](crate::domain::FinalChecklist). Stars arrive in
//! the feed some time after the horn, so a missing stars block is retried on
//! later polls up to a ceiling.

use tracing::{debug, info, warn};

use super::reconcile::ReconciliationEngine;
use crate::adapters::Post;
use crate::announce;
use crate::domain::Game;
use crate::feed::PlayByPlayDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeStatus {
    /// Both posts handled
    Complete,
    /// Waiting on data, poll again
    Pending,
    /// Stars never showed up within the retry ceiling
    GaveUp,
}

impl ReconciliationEngine {
    pub async fn finalize(
        &mut self,
        game: &mut Game,
        doc: &PlayByPlayDocument,
        final_retry_limit: u32,
    ) -> FinalizeStatus {
        let checklist = game.final_checklist;

        if !checklist.final_score_sent {
            let text = announce::final_score_text(game);
            // at most once, a failed post is not retried
            if self.deliver(Post::new(text)).await.is_none() {
                warn!(game_id = game.game_id, "final score post failed");
            }
            game.final_checklist.final_score_sent = true;
        }

        if !checklist.three_stars_sent {
            match &doc.three_stars {
                Some(stars) => {
                    let text = announce::three_stars_text(stars, &doc.roster);
                    self.deliver(Post::new(text)).await;
                    game.final_checklist.three_stars_sent = true;
                }
                None => {
                    game.final_checklist.stars_attempts += 1;
                    let attempts = game.final_checklist.stars_attempts;
                    if attempts >= final_retry_limit {
                        warn!(
                            game_id = game.game_id,
                            attempts, "three stars never published, giving up"
                        );
                        return FinalizeStatus::GaveUp;
                    }
                    debug!(game_id = game.game_id, attempts, "three stars not available yet");
                    return FinalizeStatus::Pending;
                }
            }
        }

        info!(game_id = game.game_id, "final checklist complete");
        FinalizeStatus::Complete
    }
}
