use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::api::{Page, Paginated};
use crate::context::SharedContext;
use crate::database::daos::poll_dao::PollFilter;
use crate::database::daos::{PollDao, UserDao};
use crate::database::models::{Poll, PollOption};
use crate::error::ApiError;

pub struct PollService {
    polls: PollDao,
    users: UserDao,
}

#[derive(Debug)]
pub struct NewPoll {
    pub title: String,
    pub description: Option<String>,
    pub options: Vec<String>,
    pub closes_at: Option<DateTime<Utc>>,
    pub university: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default)]
pub struct PollUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub closes_at: Option<DateTime<Utc>>,
    /// Replacing the options discards existing votes and resets counters.
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Default)]
pub struct PollListQuery {
    pub category: Option<String>,
    pub university: Option<String>,
    pub open: Option<bool>,
}

/// Poll plus options, the shape returned by every poll endpoint.
#[derive(Debug, Serialize)]
pub struct PollView {
    #[serde(flatten)]
    pub poll: Poll,
    pub options: Vec<PollOption>,
    pub open: bool,
}

#[derive(Debug, Serialize)]
pub struct PollResults {
    pub poll_id: Uuid,
    pub title: String,
    pub total_votes: i64,
    pub options: Vec<PollOption>,
    pub open: bool,
}

/// Attach options to a batch of polls with a single query.
pub(crate) async fn attach_options(
    dao: &PollDao,
    polls: Vec<Poll>,
) -> Result<Vec<PollView>, ApiError> {
    let ids: Vec<Uuid> = polls.iter().map(|p| p.id).collect();
    let mut by_poll: HashMap<Uuid, Vec<PollOption>> = HashMap::new();
    for option in dao.options_for_polls(&ids).await? {
        by_poll.entry(option.poll_id).or_default().push(option);
    }

    let now = Utc::now();
    Ok(polls
        .into_iter()
        .map(|poll| {
            let options = by_poll.remove(&poll.id).unwrap_or_default();
            let open = poll.is_open(now);
            PollView {
                poll,
                options,
                open,
            }
        })
        .collect())
}

impl PollService {
    pub fn new(ctx: &SharedContext) -> Self {
        Self {
            polls: PollDao::new(ctx.db.clone()),
            users: UserDao::new(ctx.db.clone()),
        }
    }

    pub async fn create(&self, author_id: Uuid, new: NewPoll) -> Result<PollView, ApiError> {
        let author = self.users.get_active(author_id).await?;

        if new.options.len() < 2 {
            return Err(ApiError::validation_error(
                "A poll needs at least two options",
                None,
            ));
        }
        if let Some(closes_at) = new.closes_at {
            if closes_at <= Utc::now() {
                return Err(ApiError::validation_error(
                    "Poll expiry must be in the future",
                    None,
                ));
            }
        }

        let now = Utc::now();
        let poll = Poll {
            id: Uuid::new_v4(),
            author_id,
            title: new.title,
            description: new.description,
            closes_at: new.closes_at,
            university: new.university.or(author.university),
            category: new.category,
            created_at: now,
            updated_at: now,
            is_active: true,
        };

        let options = self.polls.insert_with_options(&poll, &new.options).await?;
        info!(poll_id = %poll.id, author_id = %author_id, "Poll created");

        Ok(PollView {
            open: poll.is_open(now),
            poll,
            options,
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<PollView, ApiError> {
        let poll = self.polls.get_active(id).await?;
        let options = self.polls.options(id).await?;
        Ok(PollView {
            open: poll.is_open(Utc::now()),
            poll,
            options,
        })
    }

    pub async fn list(
        &self,
        query: &PollListQuery,
        page: Page,
    ) -> Result<Paginated<PollView>, ApiError> {
        let filter = PollFilter {
            category: query.category.as_deref(),
            university: query.university.as_deref(),
            open: query.open,
        };
        let (polls, total) = self.polls.list(&filter, page).await?;
        let views = attach_options(&self.polls, polls).await?;
        Ok(Paginated::new(views, page, total))
    }

    pub async fn update(
        &self,
        id: Uuid,
        actor_id: Uuid,
        update: PollUpdate,
    ) -> Result<PollView, ApiError> {
        let poll = self.polls.get_active(id).await?;

        if poll.author_id != actor_id {
            let actor = self.users.get_active(actor_id).await?;
            if !actor.is_admin() {
                return Err(ApiError::forbidden("Not allowed to edit this poll"));
            }
        }

        if let Some(closes_at) = update.closes_at {
            if closes_at <= Utc::now() {
                return Err(ApiError::validation_error(
                    "Poll expiry must be in the future",
                    None,
                ));
            }
        }

        let poll = self
            .polls
            .update(
                id,
                update.title.as_deref(),
                update.description.as_deref(),
                update.category.as_deref(),
                update.closes_at,
            )
            .await?;

        let options = match update.options {
            Some(labels) => {
                if labels.len() < 2 {
                    return Err(ApiError::validation_error(
                        "A poll needs at least two options",
                        None,
                    ));
                }
                let options = self.polls.replace_options(id, &labels).await?;
                info!(poll_id = %id, "Poll options replaced, votes discarded");
                options
            }
            None => self.polls.options(id).await?,
        };

        info!(poll_id = %id, "Poll updated");
        Ok(PollView {
            open: poll.is_open(Utc::now()),
            poll,
            options,
        })
    }

    pub async fn delete(&self, id: Uuid, actor_id: Uuid) -> Result<(), ApiError> {
        let poll = self.polls.get_active(id).await?;

        if poll.author_id != actor_id {
            let actor = self.users.get_active(actor_id).await?;
            if !actor.is_admin() {
                return Err(ApiError::forbidden("Not allowed to delete this poll"));
            }
        }

        self.polls.soft_delete(id).await?;
        info!(poll_id = %id, actor_id = %actor_id, "Poll deleted");
        Ok(())
    }

    /// Cast a vote. One vote per user per poll: a second attempt is a
    /// conflict and leaves every counter untouched.
    pub async fn vote(
        &self,
        poll_id: Uuid,
        user_id: Uuid,
        option_id: Uuid,
    ) -> Result<PollResults, ApiError> {
        self.users.get_active(user_id).await?;
        let poll = self.polls.get_active(poll_id).await?;

        if !poll.is_open(Utc::now()) {
            return Err(ApiError::validation_error("Poll is closed", None));
        }

        self.polls.record_vote(poll_id, user_id, option_id).await?;
        info!(poll_id = %poll_id, user_id = %user_id, "Vote recorded");

        self.results(poll_id).await
    }

    pub async fn results(&self, poll_id: Uuid) -> Result<PollResults, ApiError> {
        let poll = self.polls.get_active(poll_id).await?;
        let options = self.polls.options(poll_id).await?;
        let total_votes = options.iter().map(|o| o.vote_count).sum();

        Ok(PollResults {
            poll_id: poll.id,
            title: poll.title.clone(),
            total_votes,
            options,
            open: poll.is_open(Utc::now()),
        })
    }
}
