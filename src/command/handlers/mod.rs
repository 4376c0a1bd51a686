//! Builtin handlers for the RFC 3977/4643 command surface
//!
//! Grouped the way the RFC groups them: session administration
//! (CAPABILITIES, MODE, QUIT), information commands (DATE, HELP, LIST,
//! NEWGROUPS, NEWNEWS), group selection (GROUP, LISTGROUP), article
//! retrieval (ARTICLE, HEAD, BODY, STAT, LAST, NEXT), posting (POST,
//! IHAVE) and authentication (AUTHINFO).

use std::sync::Arc;

use crate::command::handler::CommandHandler;

mod admin;
mod article;
mod authinfo;
mod group;
mod info;
mod post;

pub use admin::{CapabilitiesHandler, ModeHandler, QuitHandler};
pub use article::{ArticleHandler, NavigationHandler};
pub use authinfo::AuthinfoHandler;
pub use group::GroupHandler;
pub use info::{DateHandler, HelpHandler, ListHandler, NewgroupsHandler, NewnewsHandler};
pub use post::{IhaveHandler, PostHandler};

/// The full builtin handler set in capability-advertisement order
pub fn builtin_handlers() -> Vec<Arc<dyn CommandHandler>> {
    vec![
        Arc::new(ArticleHandler),
        Arc::new(NavigationHandler),
        Arc::new(GroupHandler),
        Arc::new(IhaveHandler),
        Arc::new(PostHandler),
        Arc::new(NewnewsHandler),
        Arc::new(NewgroupsHandler),
        Arc::new(ListHandler),
        Arc::new(ModeHandler),
        Arc::new(AuthinfoHandler),
        Arc::new(CapabilitiesHandler),
        Arc::new(DateHandler),
        Arc::new(HelpHandler),
        Arc::new(QuitHandler),
    ]
}
