pub mod account;
pub mod referral_event;

// Re-export common types
pub use account::{Account, NewAccount, SubscriptionPlan, SubscriptionStatus};
pub use referral_event::{
    CommissionPayout, NewCommissionPayout, NewProcessedEvent, NewReferralEvent, ReferralEvent,
    ReferralEventKind,
};
