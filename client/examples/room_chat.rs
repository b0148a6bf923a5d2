use std::io::{self, Write};

use anyhow::Result;
use banter_client::{ApiClient, MessageKind, RoomSession};
use tokio::io::{AsyncBufReadExt, BufReader};

const HTTP_BASE: &str = "http://localhost:3000";
const WS_BASE: &str = "ws://localhost:3000";

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("banter room chat");
    println!("================");

    let api = ApiClient::new(HTTP_BASE)?;
    if !api.auth().await? {
        let account = prompt("Account")?;
        let password = prompt("Password")?;
        api.login(&account, &password).await?;
        println!("Logged in as {account}.");
    }

    let rooms = api.rooms().await?;
    if rooms.is_empty() {
        println!("No open rooms.");
    } else {
        println!("Open rooms:");
        for room in &rooms {
            println!("  {}  {}", room.room_id, room.room_name);
        }
    }

    let choice = prompt("Room id to join (leave blank to create a room)")?;
    let mut session = if choice.is_empty() {
        let room_name = prompt("Room name")?;
        RoomSession::create(&room_name)?
    } else {
        RoomSession::join(Some(&choice))?
    };

    session.connect(WS_BASE).await?;
    println!("Connected. Type messages; Ctrl-D leaves the room.\n");

    let handle = session.handle()?;
    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        while let Ok(Some(line)) = lines.next_line().await {
            if handle.send_chat(line.trim()).is_err() {
                break;
            }
        }

        handle.close();
    });

    while let Some(message) = session.next_message().await {
        match message {
            Ok(message) => match message.kind() {
                MessageKind::System => println!("* {}", message.message),
                MessageKind::Own => println!("me: {}", message.message),
                MessageKind::Other => println!("{}: {}", message.sender, message.message),
            },
            Err(e) => {
                eprintln!("session error: {e}");
                break;
            }
        }
    }

    println!("connection closed");
    Ok(())
}
