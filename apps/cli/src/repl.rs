//! Interactive chat loop.

use color_eyre::eyre::Result;
use tenantchat_core::export::export_summary;
use tenantchat_core::{ChatSession, SessionStore, SpeechPlayer};
use tenantchat_gateway::WebhookClient;
use tenantchat_markdown::{BubbleLine, layout_bubble, to_plain};
use tenantchat_shared::{AppConfig, Message, SessionKey, config_dir};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::commands::spinner;

const HELP: &str = "\
Type a message and press Enter. Other commands:
  <number>   pick an option from the last reply
  /speak     read the last reply aloud
  /stop      stop reading
  /copy      save the last diagnosis summary to a file
  /docs      list documents shared so far
  /history   show the whole conversation
  /help      show this help
  /quit      leave the chat";

/// Print one message the way a chat bubble lays it out.
pub(crate) fn print_message(message: &Message, selected: Option<&str>) {
    let card = layout_bubble(message);
    let who = if card.is_user { "You" } else { "Assistant" };
    println!("{who}:");

    for line in &card.lines {
        match line {
            BubbleLine::Text(runs) => println!("  {}", to_plain(runs)),
            BubbleLine::Option(opt) => {
                let marker = if selected == Some(opt.value.as_str()) { '*' } else { ' ' };
                println!("  {marker}[{}] {}", opt.value, opt.label);
            }
        }
    }
    if !card.documents.is_empty() {
        println!("  Documents:");
        for doc in &card.documents {
            println!("    - {}: {}", doc.name, doc.url);
        }
    }
    if card.copyable {
        println!("  (type /copy to save this summary)");
    }
    println!();
}

/// Run the chat until `/quit` or end of input.
pub(crate) async fn run(
    config: &AppConfig,
    client: &WebhookClient,
    store: &SessionStore,
    mut chat: ChatSession,
) -> Result<()> {
    let speech = SpeechPlayer::new(config.speech.clone());

    if let Some(name) = store.get(SessionKey::Name).await? {
        println!("Welcome, {name}");
    }
    println!("Type /help for commands.\n");
    for message in chat.messages() {
        print_message(message, None);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => println!("{HELP}\n"),
            "/history" => {
                for message in chat.messages() {
                    print_message(message, chat.selected_option(message.id));
                }
            }
            "/stop" => speech.stop(),
            "/speak" => match last_assistant(&chat) {
                Some(message) => {
                    if let Err(e) = speech.speak(&message.text) {
                        warn!(error = %e, "speech failed");
                        println!("Could not start speech: {e}\n");
                    }
                }
                None => println!("Nothing to read yet.\n"),
            },
            "/copy" => copy_summary(&chat)?,
            "/docs" => list_documents(&chat),
            _ => {
                let picked = option_on_last_reply(&chat, input);
                let progress = spinner("Assistant is typing...");
                let result = match picked {
                    Some(message_id) => chat.choose(client, store, message_id, input).await,
                    None => chat.send(client, store, &line).await,
                };
                progress.finish_and_clear();

                if let Some(reply) = result? {
                    print_message(reply, None);
                }
            }
        }
    }

    speech.stop();
    Ok(())
}

fn last_assistant(chat: &ChatSession) -> Option<&Message> {
    chat.messages().iter().rev().find(|m| !m.is_user())
}

/// Id of the last assistant message if `input` names one of its options.
fn option_on_last_reply(chat: &ChatSession, input: &str) -> Option<u64> {
    let message = last_assistant(chat)?;
    let card = layout_bubble(message);
    (card.interactive && card.options().any(|o| o.value == input)).then_some(message.id)
}

fn copy_summary(chat: &ChatSession) -> Result<()> {
    let Some(message) = chat
        .messages()
        .iter()
        .rev()
        .find(|m| !m.is_user() && layout_bubble(m).copyable)
    else {
        println!("No diagnosis summary to copy yet.\n");
        return Ok(());
    };

    println!("{}\n", message.text);
    let path = export_summary(&config_dir()?, &message.text)?;
    println!("Saved to {}\n", path.display());
    Ok(())
}

fn list_documents(chat: &ChatSession) {
    let docs: Vec<_> = chat
        .messages()
        .iter()
        .flat_map(|m| layout_bubble(m).documents)
        .collect();
    if docs.is_empty() {
        println!("No documents shared yet.\n");
        return;
    }
    for doc in docs {
        println!("  - {}: {}", doc.name, doc.url);
    }
    println!();
}
