use chat_stream::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ChatError> {
    chat_stream::observability::init_observability("info");
    let client = ChatClient::http(ChatClientConfig::from_env()?)?;

    let request = ChatRequest::new("Stream a short greeting.")
        .system_prompt("Reply in one sentence.");

    let mut printed = 0usize;
    let handle = client
        .stream(
            &request,
            SessionCallbacks::new()
                .on_chunk(move |reply| {
                    print!("{}", &reply.as_str()[printed..]);
                    printed = reply.len();
                })
                .on_error(|cause| eprintln!("stream error: {cause}")),
        )
        .await?;

    match handle.outcome().await {
        SessionOutcome::Finished { .. } => println!(),
        SessionOutcome::Failed { cause } => return Err(cause.into()),
        SessionOutcome::Cancelled => eprintln!("cancelled"),
    }
    Ok(())
}
