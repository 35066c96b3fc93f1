pub mod waitlist;

pub use waitlist::{waitlist_exists, waitlist_signup};
