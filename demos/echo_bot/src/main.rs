//! Echo Bot Example
//!
//! Demonstrates the Gap SDK: structural event handlers, ordered text routes
//! with an unhandled-text fallback, keyboards, media uploads and payment
//! verification.
//!
//! # Routing
//!
//! ```text
//! text "/echo hi"  ──▶ main handler (log) ──▶ route "^/echo (.+)"
//! text "/photo"    ──▶ main handler (log) ──▶ route "^/photo$"
//! text "whatever"  ──▶ main handler (log) ──▶ unhandled fallback
//! paycallback      ──▶ paid handler (payVerify)
//! ```
//!
//! # Usage
//!
//! ```bash
//! GAP_TOKEN=... cargo run --package echo-bot -- --port 3000 --photo ./cat.jpg
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use gap::prelude::*;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "echo-bot", about = "Echoes text back to Gap chats")]
struct Args {
    /// Bot token.
    #[arg(long, env = "GAP_TOKEN")]
    token: Option<String>,

    /// Webhook port.
    #[arg(long)]
    port: Option<u16>,

    /// Configuration file (gap.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Image sent in reply to /photo.
    #[arg(long, default_value = "photo.jpg")]
    photo: PathBuf,
}

const HELP: &str = "Commands:\n\
    /echo <text>  Echo text\n\
    /menu         Show a reply keyboard\n\
    /buttons      Show inline buttons\n\
    /photo        Send a photo\n\
    /survey       Show a form";

fn chat_of(update: &Update) -> String {
    update.chat_id.clone().unwrap_or_default()
}

fn menu() -> ReplyKeyboard {
    ReplyKeyboard::new(vec![
        vec![Button::new("/help", "Help"), Button::new("/photo", "Photo")],
        vec![
            Button::request_contact("Share contact"),
            Button::request_location("Share location"),
        ],
    ])
    .selective(true)
}

fn buttons() -> InlineKeyboard {
    InlineKeyboard::new(Vec::new())
        .row(vec![
            InlineButton::callback("Like", "like"),
            InlineButton::callback("Dislike", "dislike"),
        ])
        .row(vec![InlineButton::link("Website", "https://gap.im")])
}

fn survey() -> Form {
    Form::new()
        .field(FormField::new("name", FieldType::Text, "Your name"))
        .field(
            FormField::new("rating", FieldType::Radio, "Rating")
                .option("5", "Great")
                .option("1", "Bad"),
        )
        .field(FormField::new("send", FieldType::Submit, "Send"))
}

fn register(bot: &mut GapBot, photo: PathBuf) -> Result<()> {
    let client = bot.client();

    bot.on_text(|update: Update| async move {
        info!(chat = ?update.chat_id, kind = %update.kind, text = ?update.text(), "Received");
    });

    bot.on_join({
        let client = client.clone();
        move |update: Update| {
            let client = client.clone();
            async move {
                let options = TextOptions::new().reply_keyboard(menu());
                client
                    .send_text(&chat_of(&update), "Welcome!", &options)
                    .await
            }
        }
    });

    bot.on_trigger_button({
        let client = client.clone();
        move |update: Update| {
            let client = client.clone();
            async move {
                let chat = chat_of(&update);
                let callback_id = update
                    .get("callback_id")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                let choice = update.data.clone().unwrap_or_default();
                client
                    .answer_callback(&chat, &callback_id, &format!("You chose {choice}"), false)
                    .await?;
                if let Some(message_id) = update.get("message_id").and_then(|v| v.as_str()) {
                    client
                        .edit_text(&chat, message_id, Some("Thanks for voting"), None)
                        .await?;
                }
                Ok::<_, OutboundError>(())
            }
        }
    });

    bot.on_submit_form({
        let client = client.clone();
        move |update: Update| {
            let client = client.clone();
            async move {
                let answers = update.data.clone().unwrap_or_default();
                client
                    .send_text(&chat_of(&update), &format!("Got: {answers}"), &TextOptions::new())
                    .await
            }
        }
    });

    bot.on_paid({
        let client = client.clone();
        move |payment: Payment| {
            let client = client.clone();
            async move {
                let Some(ref_id) = payment.ref_id.clone() else {
                    warn!(fields = ?payment.fields, "Payment callback without ref_id");
                    return Ok(());
                };
                let Some(chat) = payment.chat_id.as_deref() else {
                    warn!(%ref_id, "Payment callback without chat_id");
                    return Ok(());
                };
                client.pay_verify(chat, &ref_id).await
            }
        }
    });

    bot.on_text_matching("^/echo (.+)", {
        let client = client.clone();
        move |update: Update| {
            let client = client.clone();
            async move {
                let text = update.text().unwrap_or_default();
                let reply = text.strip_prefix("/echo ").unwrap_or(text);
                client
                    .send_text(&chat_of(&update), reply, &TextOptions::new())
                    .await
            }
        }
    })?;

    bot.on_text_matching("^/help$", {
        let client = client.clone();
        move |update: Update| {
            let client = client.clone();
            async move {
                client
                    .send_text(&chat_of(&update), HELP, &TextOptions::new())
                    .await
            }
        }
    })?;

    bot.on_text_matching("^/menu$", {
        let client = client.clone();
        move |update: Update| {
            let client = client.clone();
            async move {
                let options = TextOptions::new().reply_keyboard(menu());
                client
                    .send_text(&chat_of(&update), "Pick one", &options)
                    .await
            }
        }
    })?;

    bot.on_text_matching("^/buttons$", {
        let client = client.clone();
        move |update: Update| {
            let client = client.clone();
            async move {
                let options = TextOptions::new().inline_keyboard(buttons());
                client
                    .send_text(&chat_of(&update), "Vote:", &options)
                    .await
            }
        }
    })?;

    bot.on_text_matching("^/survey$", {
        let client = client.clone();
        move |update: Update| {
            let client = client.clone();
            async move {
                let options = TextOptions::new().form(survey());
                client
                    .send_text(&chat_of(&update), "Tell us", &options)
                    .await
            }
        }
    })?;

    bot.on_text_matching("^/photo$", {
        let client = client.clone();
        move |update: Update| {
            let client = client.clone();
            let photo = photo.clone();
            async move {
                client
                    .send_image(&chat_of(&update), photo, "A photo", None)
                    .await
            }
        }
    })?;

    bot.on_unhandled_text(move |update: Update| {
        let client = client.clone();
        async move {
            client
                .send_text(&chat_of(&update), "Unknown command, try /help", &TextOptions::new())
                .await
        }
    });

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = GapBot::builder().load_config();
    if let Some(path) = args.config {
        builder = builder.config_file(path);
    }
    if let Some(token) = args.token {
        builder = builder.token(token);
    }
    if let Some(port) = args.port {
        builder = builder.port(port);
    }

    let mut bot = builder.build()?;
    register(&mut bot, args.photo)?;

    info!(routes = bot.registry().text_routes().len(), "Echo bot ready");
    bot.run().await?;

    Ok(())
}
