//! Terminal chat front end: sends a prompt, prints the reply as it streams,
//! and cancels the in-flight reply on Ctrl-C. Ctrl-C at the prompt exits.

use std::io::Write as _;

use chat_stream::observability::init_observability;
use chat_stream::prelude::*;
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, BufReader, Lines};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a knowledgeable, friendly assistant. \
Answer questions across any domain accurately and clearly, structure longer answers \
for readability, and say so when you are unsure. If the user mentions an uploaded \
image, answer based on what they tell you about it.";

#[derive(Parser, Debug)]
#[command(name = "chat-stream", about = "Stream chat completions in the terminal")]
struct Args {
    /// Question to ask. Starts an interactive session when omitted.
    prompt: Vec<String>,
    /// Completion endpoint URL (defaults to CHAT_STREAM_ENDPOINT).
    #[arg(long)]
    endpoint: Option<String>,
    /// Name of an image to mention as attached to the first question.
    #[arg(long)]
    image: Option<String>,
    /// Overrides the system instruction.
    #[arg(long)]
    system: Option<String>,
    /// Fail the reply on the first malformed frame instead of skipping it.
    #[arg(long)]
    strict: bool,
    /// Default log filter when neither CHAT_STREAM_LOG_LEVEL nor RUST_LOG is set.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_observability(&args.log_level);

    let config = match &args.endpoint {
        Some(endpoint) => ChatClientConfig::new(endpoint.as_str()),
        None => ChatClientConfig::from_env()?,
    };
    let policy = if args.strict {
        MalformedPolicy::Fail
    } else {
        MalformedPolicy::Skip
    };
    let client =
        ChatClient::http(config)?.session_config(SessionConfig::default().malformed_policy(policy));
    let system_prompt = args
        .system
        .clone()
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
    let mut conversation = Conversation::new();
    let mut image = args.image.clone().map(ImageAttachment::new);

    if !args.prompt.is_empty() {
        let question = args.prompt.join(" ");
        let request = build_request(&system_prompt, &conversation, &question, image.take());
        ask(&client, &mut conversation, &request).await?;
        return Ok(());
    }

    eprintln!("Type a question and press Enter. /clear resets the chat, /quit or Ctrl-C exits.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        std::io::stderr().flush()?;
        let Some(line) = next_question(&mut lines, tokio::signal::ctrl_c()).await? else {
            break;
        };
        match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => {
                conversation.clear();
                eprintln!("(chat cleared)");
            }
            question => {
                let request = build_request(&system_prompt, &conversation, question, image.take());
                if let Err(err) = ask(&client, &mut conversation, &request).await {
                    eprintln!("error: {err}");
                }
            }
        }
    }
    Ok(())
}

/// Reads the next line, or `None` at end of input or once `interrupt` fires.
async fn next_question<R, F>(lines: &mut Lines<R>, interrupt: F) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    F: std::future::Future<Output = std::io::Result<()>>,
{
    // `next_line` is cancel-safe, so losing the race to Ctrl-C drops no input.
    tokio::select! {
        line = lines.next_line() => line,
        _ = interrupt => {
            eprintln!();
            Ok(None)
        }
    }
}

fn build_request(
    system_prompt: &str,
    conversation: &Conversation,
    question: &str,
    image: Option<ImageAttachment>,
) -> ChatRequest {
    let request = ChatRequest::new(question)
        .system_prompt(system_prompt)
        .history(conversation.messages().iter().cloned());
    match image {
        Some(image) => request.image(image),
        None => request,
    }
}

/// Streams one reply to stdout and records the turn in `conversation`.
async fn ask(
    client: &ChatClient,
    conversation: &mut Conversation,
    request: &ChatRequest,
) -> Result<(), ChatError> {
    let user_message = request.user_message()?;

    let mut printed = 0usize;
    let callbacks = SessionCallbacks::new()
        .on_chunk(move |reply| {
            let mut stdout = std::io::stdout().lock();
            let _ = stdout.write_all(reply.as_str()[printed..].as_bytes());
            let _ = stdout.flush();
            printed = reply.len();
        })
        .on_malformed(|raw| tracing::debug!(frame = raw, "skipped malformed frame"));

    let handle = client.stream(request, callbacks).await?;
    conversation.push(user_message);
    let abort = handle.abort_handle();
    let pending = handle.outcome();
    tokio::pin!(pending);
    let settled = tokio::select! {
        outcome = &mut pending => Some(outcome),
        _ = tokio::signal::ctrl_c() => None,
    };
    let outcome = match settled {
        Some(outcome) => outcome,
        None => {
            abort.abort();
            pending.await
        }
    };

    println!();
    match outcome {
        SessionOutcome::Finished { final_text } => {
            conversation.push(ChatMessage::assistant(final_text));
            Ok(())
        }
        SessionOutcome::Failed { cause } => Err(ChatError::Session(cause)),
        SessionOutcome::Cancelled => {
            eprintln!("(reply cancelled)");
            Ok(())
        }
    }
}
