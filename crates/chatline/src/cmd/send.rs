use chatline_connection::ChatClient;

use crate::cmd::SendArgs;
use crate::cmdline::{self, Input, HELP};
use crate::exit::{chat_error, CliError, CliResult, SUCCESS};
use crate::output::{print_response, OutputFormat};

pub async fn run(args: SendArgs, client: ChatClient, format: OutputFormat) -> CliResult<i32> {
    let line = args.line.join(" ");
    let message = match cmdline::parse(&line, args.room.as_deref())
        .map_err(|err| CliError::usage(err.to_string()))?
    {
        Input::Request(message) => message,
        Input::Help => {
            println!("{HELP}");
            return Ok(SUCCESS);
        }
        Input::Quit => return Ok(SUCCESS),
    };

    if let Some(nick) = &args.nick {
        client
            .login(nick)
            .await
            .map_err(|err| chat_error("login failed", err))?;
    }

    let kind = message.kind.clone();
    let result = client.send(message).await;
    let _ = client.close().await;
    let response = result.map_err(|err| chat_error(&format!("{kind} failed"), err))?;

    print_response(&response, format);
    Ok(SUCCESS)
}
