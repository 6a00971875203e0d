//! Page Components

mod chat;
mod requirements;

pub use chat::ChatPage;
pub use requirements::RequirementsPage;
