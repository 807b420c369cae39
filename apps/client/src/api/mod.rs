/// Backend REST surface.
///
/// Every call goes through `ApiClient`, which owns the bearer-token
/// handling and error decoding. The endpoint groups below only shape
/// requests and pick response types.
pub mod applications;
pub mod client;
pub mod cover_letters;
pub mod cv;
pub mod photos;
pub mod subscriptions;
pub mod upload;
pub mod users;

pub use client::{ApiClient, Blob, Body, RequestOptions};
pub use upload::Upload;
