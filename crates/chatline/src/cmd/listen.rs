use chatline_connection::{ChatClient, ConnectionStatus};

use crate::cmd::ListenArgs;
use crate::exit::{chat_error, io_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::items::ChatItem;
use crate::output::{print_feed, print_item, OutputFormat};

pub async fn run(args: ListenArgs, client: ChatClient, format: OutputFormat) -> CliResult<i32> {
    // Subscribe before logging in so nothing pushed after the join is missed.
    let mut feeds = client.feeds();
    let mut status = client.status();

    client
        .login(&args.nick)
        .await
        .map_err(|err| chat_error("login failed", err))?;
    for room in &args.join {
        let joined = client
            .join_room(room)
            .await
            .map_err(|err| chat_error(&format!("join {room} failed"), err))?;
        tracing::info!(room = %joined.room, people = joined.people.len(), "joined");
        print_item(
            &ChatItem::notice(format!("joined {} ({} present)", joined.room, joined.people.len())),
            format,
        );
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut printed = 0usize;
    let outcome = loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                break signal.map(|()| SUCCESS).map_err(|err| io_error("signal handler failed", err));
            }
            next = status.recv() => {
                if let Some(ConnectionStatus::Closed) | None = next {
                    break Err(CliError::new(FAILURE, "connection closed"));
                }
            }
            feed = feeds.recv() => {
                let Some(feed) = feed else {
                    break Err(CliError::new(FAILURE, "connection closed"));
                };
                print_feed(&feed, format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    break Ok(SUCCESS);
                }
            }
        }
    };

    let _ = client.close().await;
    outcome
}
