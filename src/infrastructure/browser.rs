//! Session controller: browser attachment, page seams and scoped interception

pub mod interception;
pub mod page;
pub mod session;

pub use interception::Interception;
pub use page::{BrowserPage, CdpElement, CdpPage, DomElement, InterceptedResponse, ResponseSource};
pub use session::BrowserSession;
