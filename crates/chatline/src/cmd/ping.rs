use chatline_connection::ChatClient;

use crate::cmd::{parse_duration, PingArgs};
use crate::exit::{chat_error, CliResult, SUCCESS};
use crate::output::{print_ping, OutputFormat};

pub async fn run(args: PingArgs, client: ChatClient, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;

    for seq in 0..args.count {
        if seq > 0 {
            tokio::time::sleep(interval).await;
        }
        let round_trip = match client.ping().await {
            Ok(round_trip) => round_trip,
            Err(err) => {
                let _ = client.close().await;
                return Err(chat_error("ping failed", err));
            }
        };
        print_ping(seq, round_trip, format);
    }

    let _ = client.close().await;
    Ok(SUCCESS)
}
