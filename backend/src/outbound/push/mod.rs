//! Push channel adapter streaming newline-delimited JSON notifications.

mod http_feed;

pub use http_feed::HttpNotificationFeed;
