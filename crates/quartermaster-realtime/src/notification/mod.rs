//! User-visible side effects of newly observed events.

pub mod alert;
