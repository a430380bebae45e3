//! Subcommand implementations.

mod connect;
mod info;
mod list;
mod messages;
mod post;
mod serve;
mod servers;
mod sync;
mod watch;

use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a relay server
    Serve(serve::ServeArgs),

    /// Register a relay in the local directory
    Connect(connect::ConnectArgs),

    /// List relays in the local directory
    Servers(servers::ServersArgs),

    /// Show a relay's self-description
    Info(info::InfoArgs),

    /// Post a message to a relay
    Post(post::PostArgs),

    /// List messages stored on a relay
    List(list::ListArgs),

    /// Print new messages as they reach a relay
    Watch(watch::WatchArgs),

    /// Pull new messages from a relay into a local channel
    Sync(sync::SyncArgs),

    /// Show messages stored in a local channel
    Messages(messages::MessagesArgs),
}

pub async fn handle(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Connect(args) => connect::run(args).await,
        Commands::Servers(args) => servers::run(args).await,
        Commands::Info(args) => info::run(args).await,
        Commands::Post(args) => post::run(args).await,
        Commands::List(args) => list::run(args).await,
        Commands::Watch(args) => watch::run(args).await,
        Commands::Sync(args) => sync::run(args).await,
        Commands::Messages(args) => messages::run(args).await,
    }
}
