pub mod caregiver;
pub mod error;
pub mod events;
pub mod id;
pub mod member;
pub mod time;

pub use caregiver::Caregiver;
pub use error::{CoreError, Result};
pub use events::{EventBus, HookError, MemberEvent, MemberEventKind, MemberHook, SubscriptionId};
pub use id::generate_id;
pub use member::{
    CreateMemberInput, MemberStatus, ProtectedMember, Relationship, UpdateMemberInput,
};
pub use time::{format_rfc3339, now_utc, parse_rfc3339};
