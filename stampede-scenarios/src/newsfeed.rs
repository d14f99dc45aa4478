//! Newsfeed browsing session
//!
//! State machine: fetch a page, decide between acting and scrolling, act on
//! every item of an acting page, stop when the iteration budget or the feed
//! is exhausted. Action ratios are tracked cumulatively across the whole
//! session; resetting them per page would change the load profile.

use tracing::{debug, info};

use stampede_actor::{ActorResult, Comment, Content, ContentType, VirtualActor};
use stampede_config::domains::scenario::NewsfeedConfig;

use crate::sampling::{pause, random_number, random_text, think, REACTION_NAMES};

const REPLY_TEXT: &str = "This is a reply comment";

/// Cumulative per-session counters driving the sampling ratios
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionStats {
    pub reaction_count: u64,
    pub mark_as_read_count: u64,
    pub read_content_count: u64,
    pub loaded_content_count: u64,
}

impl SessionStats {
    /// Whether the cumulative count is still below `ceiling` of loaded
    /// content
    fn ratio_below(&self, count: u64, ceiling: f64) -> bool {
        self.loaded_content_count > 0
            && (count as f64) / (self.loaded_content_count as f64) < ceiling
    }
}

/// Save fires on a fixed cadence of the global item index, not
/// probabilistically
fn save_due(page_index: u64, item_index: u64, page_size: u64, cadence: u64) -> bool {
    (page_index * page_size + item_index) % cadence == 0
}

/// One newsfeed browsing session for one virtual actor
pub struct NewsfeedSession<'a> {
    actor: &'a VirtualActor,
    config: NewsfeedConfig,
    stats: SessionStats,
    comment_reactions: u64,
    replied: bool,
}

impl<'a> NewsfeedSession<'a> {
    pub fn new(actor: &'a VirtualActor, config: NewsfeedConfig) -> Self {
        Self {
            actor,
            config,
            stats: SessionStats::default(),
            comment_reactions: 0,
            replied: false,
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Run the session to completion: iteration budget spent or feed
    /// exhausted
    pub async fn run(&mut self) -> ActorResult<SessionStats> {
        let iterations =
            random_number(self.config.page_iterations.min, self.config.page_iterations.max);
        debug!(username = %self.actor.username(), iterations, "newsfeed session started");

        let mut has_next_page = true;
        let mut end_cursor: Option<String> = None;

        for page_index in 0..iterations {
            if !has_next_page {
                break;
            }

            match self.actor.get_newsfeed(end_cursor.as_deref()).await? {
                Some(page) => {
                    has_next_page = page.meta.has_next_page;
                    end_cursor = page.meta.end_cursor.clone();
                    self.stats.loaded_content_count += page.list.len() as u64;

                    if random_number(0, 3) == 1 {
                        self.act_on_page(page_index, &page.list).await?;
                    } else {
                        think(self.config.scroll_delay).await;
                    }
                }
                None => has_next_page = false,
            }
        }

        info!(
            username = %self.actor.username(),
            loaded = self.stats.loaded_content_count,
            reactions = self.stats.reaction_count,
            reads = self.stats.read_content_count,
            "newsfeed session finished"
        );
        Ok(self.stats)
    }

    /// Process every item of one acting page
    async fn act_on_page(&mut self, page_index: u64, contents: &[Content]) -> ActorResult<()> {
        for (item_index, content) in contents.iter().enumerate() {
            if content.kind != ContentType::Series
                && self
                    .stats
                    .ratio_below(self.stats.reaction_count, self.config.reaction_ratio)
            {
                let names = content.owner_reaction_names();
                if self
                    .make_reaction(&content.id, content.kind.as_str(), &names)
                    .await?
                {
                    self.stats.reaction_count += 1;
                }
            }

            if content.setting.is_important {
                // Reading pause happens whether or not the mark-as-read fires
                pause(self.config.important_read_delay).await;

                if !content.marked_read_post
                    && self
                        .stats
                        .ratio_below(self.stats.mark_as_read_count, self.config.mark_as_read_ratio)
                    && self.try_mark_as_read(&content.id).await?
                {
                    self.stats.mark_as_read_count += 1;
                }
            }

            if save_due(
                page_index,
                item_index as u64,
                self.config.page_size,
                self.config.save_cadence,
            ) {
                self.save_content(&content.id).await?;
            }

            if self
                .stats
                .ratio_below(self.stats.read_content_count, self.config.read_ratio)
                && self.read_content(content).await?
            {
                self.stats.read_content_count += 1;
            }
        }
        Ok(())
    }

    /// Submit a random subset of the reactions the actor has not placed
    /// yet. Returns whether anything was submitted.
    async fn make_reaction(
        &self,
        target_id: &str,
        target_type: &str,
        owner_reaction_names: &[&str],
    ) -> ActorResult<bool> {
        if random_number(0, 5) != 1 {
            return Ok(false);
        }

        let candidates: Vec<&str> = REACTION_NAMES
            .iter()
            .copied()
            .filter(|name| !owner_reaction_names.contains(name))
            .collect();
        if candidates.is_empty() {
            return Ok(false);
        }

        let count = random_number(1, candidates.len() as u64) as usize;
        for name in &candidates[..count] {
            think(self.config.reaction_pick_delay).await;
            self.actor.react(target_id, target_type, name).await?;
        }
        Ok(true)
    }

    async fn try_mark_as_read(&self, content_id: &str) -> ActorResult<bool> {
        if random_number(0, 5) != 1 {
            return Ok(false);
        }
        self.actor.mark_as_read(content_id).await?;
        Ok(true)
    }

    /// Save unless the menu settings say the content is already saved
    async fn save_content(&self, content_id: &str) -> ActorResult<()> {
        if let Some(settings) = self.actor.get_menu_settings(content_id).await? {
            if !settings.is_save {
                self.actor.save_content(content_id).await?;
            }
        }
        Ok(())
    }

    /// Open the content detail, read for a while, browse comments, then
    /// leave exactly one top-level comment
    async fn read_content(&mut self, content: &Content) -> ActorResult<bool> {
        if random_number(0, 5) != 1 {
            return Ok(false);
        }

        self.actor.get_content_details(&content.id, content.kind).await?;
        think(self.config.reading_delay).await;
        self.browse_comments(&content.id).await?;

        think(self.config.typing_delay).await;
        let length = random_number(self.config.comment_length.min, self.config.comment_length.max);
        self.actor.comment(&content.id, &random_text(length)).await?;
        Ok(true)
    }

    /// Nested pagination over the comment list, with its own per-session
    /// reaction cap and a single reply budget
    async fn browse_comments(&mut self, content_id: &str) -> ActorResult<()> {
        let pages = random_number(self.config.comment_pages.min, self.config.comment_pages.max);

        let mut has_next_page = true;
        let mut end_cursor: Option<String> = None;

        for _ in 0..pages {
            if !has_next_page {
                break;
            }

            match self.actor.get_comments(content_id, end_cursor.as_deref()).await? {
                Some(page) => {
                    has_next_page = page.meta.has_next_page;
                    end_cursor = page.meta.end_cursor.clone();

                    if random_number(0, 1) == 1 {
                        self.act_on_comments(content_id, &page.list).await?;
                    } else {
                        think(self.config.comment_scroll_delay).await;
                    }
                }
                None => has_next_page = false,
            }
        }
        Ok(())
    }

    async fn act_on_comments(&mut self, content_id: &str, comments: &[Comment]) -> ActorResult<()> {
        for comment in comments {
            if self.comment_reactions < self.config.comment_reaction_cap {
                let names = comment.owner_reaction_names();
                if self.make_reaction(&comment.id, "COMMENT", &names).await? {
                    self.comment_reactions += 1;
                }
            }

            if !self.replied {
                self.replied = self.try_reply(content_id, &comment.id).await?;
            }
        }
        Ok(())
    }

    async fn try_reply(&self, content_id: &str, comment_id: &str) -> ActorResult<bool> {
        if random_number(0, 5) != 1 {
            return Ok(false);
        }
        think(self.config.typing_delay).await;
        self.actor.reply_comment(content_id, comment_id, REPLY_TEXT).await?;
        Ok(true)
    }
}
