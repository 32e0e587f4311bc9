pub mod account_service;
pub use account_service::{AccountError, AccountService, NewAccount, UserInfo};

pub mod account_service_impl;
pub use account_service_impl::SeaOrmAccountService;

pub mod feedback_service;
pub use feedback_service::{FeedbackError, FeedbackInfo, FeedbackService};

pub mod feedback_service_impl;
pub use feedback_service_impl::SeaOrmFeedbackService;

pub mod mailer;
pub use mailer::{LogMailer, Mailer};
