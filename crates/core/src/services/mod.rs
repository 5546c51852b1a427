//! Business logic services.

#![allow(missing_docs)]

pub mod authorization;
pub mod bookmark;
pub mod moderation;
pub mod notification;
pub mod poll;
pub mod recount;
pub mod report;
pub mod reputation;
pub mod search;
pub mod subscription;
pub mod topic;
pub mod vote;

pub use authorization::{AuthorizationService, Principal};
pub use bookmark::{BookmarkService, BookmarkedTopic};
pub use moderation::{ModerationAction, ModerationRequest, ModerationService};
pub use notification::{DirectNotification, NotificationPage, NotificationService};
pub use poll::{CreatePollInput, PollService};
pub use recount::{RecountReport, RecountService};
pub use report::{FileReportInput, ReportPage, ReportResolution, ReportService};
pub use reputation::{
    LeaderboardEntry, ReputationChange, ReputationService, ReputationSummary, ReputationTier,
};
pub use search::{SearchInput, SearchResults, SearchService};
pub use subscription::SubscriptionService;
pub use topic::{
    CategoryWithForums, CreateTopicInput, CreatedTopic, ForumIndex, ForumView, PostContentInput,
    PostView, TopicService, TopicView,
};
pub use vote::{VoteService, VoteSummary};

use crate::context::ForumContext;

/// Every forum service, wired over one shared context.
#[derive(Clone)]
pub struct ForumServices {
    pub ctx: ForumContext,
    pub auth: AuthorizationService,
    pub topics: TopicService,
    pub votes: VoteService,
    pub reputation: ReputationService,
    pub moderation: ModerationService,
    pub subscriptions: SubscriptionService,
    pub notifications: NotificationService,
    pub search: SearchService,
    pub polls: PollService,
    pub bookmarks: BookmarkService,
    pub recount: RecountService,
    pub reports: ReportService,
}

impl ForumServices {
    /// Build every service over `ctx`.
    #[must_use]
    pub fn new(ctx: ForumContext) -> Self {
        let auth = AuthorizationService::new(ctx.clone());
        let reputation = ReputationService::new(ctx.clone());
        let notifications = NotificationService::new(ctx.clone());
        let search = SearchService::new(ctx.clone());
        let polls = PollService::new(ctx.clone());
        let topics = TopicService::new(
            ctx.clone(),
            auth.clone(),
            reputation.clone(),
            notifications.clone(),
            search.clone(),
            polls.clone(),
        );

        let moderation =
            ModerationService::new(ctx.clone(), topics.clone(), notifications.clone());

        Self {
            votes: VoteService::new(ctx.clone(), reputation.clone()),
            reports: ReportService::new(ctx.clone(), moderation.clone()),
            moderation,
            subscriptions: SubscriptionService::new(ctx.clone()),
            bookmarks: BookmarkService::new(ctx.clone()),
            recount: RecountService::new(
                ctx.clone(),
                topics.clone(),
                reputation.clone(),
                search.clone(),
            ),
            ctx,
            auth,
            topics,
            reputation,
            notifications,
            search,
            polls,
        }
    }
}
