//! General-purpose commands.

mod ping;
mod server;
mod user;

pub use ping::PingCommand;
pub use server::ServerCommand;
pub use user::UserCommand;

use super::CommandCategory;

pub fn category() -> CommandCategory {
    CommandCategory::new("utility")
        .with(PingCommand)
        .with(ServerCommand)
        .with(UserCommand)
}
