pub mod ai;
pub mod captions;
pub mod catalog;
pub mod channels;
pub mod materializer;
pub mod recurrence;
pub mod rotation;
pub mod rules;
pub mod timezone;
pub mod usage_store;
