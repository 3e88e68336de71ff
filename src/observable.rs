//! Observable primitives: subscriber lists, plain and persisted properties, and
//! the lazily refreshed collection.

mod collection;
mod property;
mod setting;
mod subscribers;

pub use collection::{compare_ignore_case, Comparator, LazyCollection, Producer};
pub use property::Observable;
pub use setting::Setting;
pub use subscribers::{Callback, Subscribers, SubscriptionId};
