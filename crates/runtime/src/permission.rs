//! Attribute-driven permission evaluation.
//!
//! Each action slot on an interaction root may carry an `Action{i}_Restrict`
//! expression. Evaluation is fail-closed for everything except a missing or
//! unparsable expression:
//!
//! | expression                 | outcome                                    |
//! |----------------------------|--------------------------------------------|
//! | absent / not `type:value`  | allow                                      |
//! | `team:<name>`              | allow iff actor's team is exactly `<name>` |
//! | `player:<a>, <b>`          | allow iff actor's name is listed           |
//! | `rank:<group>:<min>`       | allow iff rank lookup succeeds and `>= min`|
//! | anything else              | deny                                       |

use std::sync::Arc;

use interaction_core::{ActorSnapshot, EntityId, Restriction};
use thiserror::Error;
use tracing::warn;

use crate::cache::AttributeCache;
use crate::oracle::{RankLookupError, RankOracle};

/// Why the evaluator refused an actor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("action is not declared on the interaction root")]
    NotDeclared,

    #[error("actor is not on team {required:?}")]
    WrongTeam { required: String },

    #[error("actor is not on the player allow-list")]
    NotListed,

    #[error("rank {rank} in group {group_id} is below {min_rank}")]
    RankTooLow {
        group_id: u64,
        rank: u64,
        min_rank: u64,
    },

    #[error("rank lookup for group {group_id} failed")]
    RankLookupFailed {
        group_id: u64,
        #[source]
        source: RankLookupError,
    },

    #[error("malformed rank restriction {0:?}")]
    MalformedRank(String),

    #[error("unknown restriction type {0:?}")]
    UnknownRestriction(String),
}

/// Evaluates slot restrictions against a requesting actor.
pub struct PermissionEvaluator {
    cache: Arc<AttributeCache>,
    ranks: Arc<dyn RankOracle>,
}

impl PermissionEvaluator {
    pub fn new(cache: Arc<AttributeCache>, ranks: Arc<dyn RankOracle>) -> Self {
        Self { cache, ranks }
    }

    pub async fn is_allowed(&self, actor: &ActorSnapshot, root: EntityId, action: &str) -> bool {
        self.evaluate(actor, root, action).await.is_ok()
    }

    /// Like [`is_allowed`](Self::is_allowed) but reports the reason for a denial.
    ///
    /// Only `rank:` restrictions reach the rank service, and only after the
    /// expression has been fully validated.
    pub async fn evaluate(
        &self,
        actor: &ActorSnapshot,
        root: EntityId,
        action: &str,
    ) -> Result<(), Denial> {
        let attrs = self.cache.get(root);
        let slot = attrs.slot_for(action).ok_or(Denial::NotDeclared)?;
        let Some(restriction) = slot.restrict.as_deref().and_then(Restriction::parse) else {
            return Ok(());
        };

        match restriction {
            Restriction::Team(required) => {
                if actor.team_name() == Some(required) {
                    Ok(())
                } else {
                    Err(Denial::WrongTeam {
                        required: required.to_string(),
                    })
                }
            }
            Restriction::Players(_) => {
                if restriction.lists_player(&actor.name) {
                    Ok(())
                } else {
                    Err(Denial::NotListed)
                }
            }
            Restriction::Rank { group_id, min_rank } => {
                let rank = self
                    .ranks
                    .rank_in_group(actor, group_id)
                    .await
                    .map_err(|source| {
                        warn!(
                            target: "interaction::dispatch",
                            actor = %actor.id,
                            group_id,
                            error = %source,
                            "rank lookup failed, denying"
                        );
                        Denial::RankLookupFailed { group_id, source }
                    })?;
                if rank >= min_rank {
                    Ok(())
                } else {
                    Err(Denial::RankTooLow {
                        group_id,
                        rank,
                        min_rank,
                    })
                }
            }
            Restriction::MalformedRank(value) => Err(Denial::MalformedRank(value.to_string())),
            Restriction::Unknown(kind) => Err(Denial::UnknownRestriction(kind.to_string())),
        }
    }
}
